pub mod manifest;
pub mod version;

pub use manifest::NpmProject;
pub use version::VersionComparator;

pub const MANIFEST_PATH: &str = "package.json";
pub const LOCKFILE_PATH: &str = "package-lock.json";
