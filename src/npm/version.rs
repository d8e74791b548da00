use std::cmp::Ordering;

use semver::Version;

pub const INVALID_VERSION_MESSAGE: &str =
    "Invalid input: version must follow semver format (ex. X.X.X)";
pub const NOT_NEWER_MESSAGE: &str =
    "Invalid input: version must be greater than the current version";

pub struct VersionComparator;

impl VersionComparator {
    /// Check whether `text` is a semantic version (`MAJOR.MINOR.PATCH` with
    /// optional pre-release and build metadata).
    pub fn is_valid(text: &str) -> bool {
        Version::parse(text).is_ok()
    }

    /// Check if `candidate` has higher precedence than `current`.
    ///
    /// Build metadata does not take part in precedence, so `1.0.0+a` and
    /// `1.0.0+b` are equal. Unparseable input is never newer.
    pub fn is_newer(candidate: &str, current: &str) -> bool {
        match (Version::parse(candidate), Version::parse(current)) {
            (Ok(candidate), Ok(current)) => precedence(&candidate, &current) == Ordering::Greater,
            _ => false,
        }
    }

    /// Validate a requested upgrade, returning the message to show the user
    /// when it is rejected.
    pub fn validate_upgrade(candidate: &str, current: &str) -> Result<(), String> {
        if !Self::is_valid(candidate) {
            return Err(INVALID_VERSION_MESSAGE.to_string());
        }

        if !Self::is_newer(candidate, current) {
            return Err(NOT_NEWER_MESSAGE.to_string());
        }

        Ok(())
    }
}

fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_versions() {
        assert!(VersionComparator::is_valid("1.2.3"));
        assert!(VersionComparator::is_valid("1.2.3-beta.1"));
        assert!(VersionComparator::is_valid("1.2.3-rc.1+build.5"));
        assert!(VersionComparator::is_valid("0.0.0"));
    }

    #[test]
    fn rejects_non_semver_strings() {
        for input in ["1.2", "abc", "", "1.2.3.4", "01.2.3", "v1.2.3", "1.2.x"] {
            assert!(!VersionComparator::is_valid(input), "accepted {input:?}");
        }
    }

    #[test]
    fn compares_numeric_components() {
        assert!(VersionComparator::is_newer("4.17.21", "4.17.0"));
        assert!(VersionComparator::is_newer("1.10.0", "1.9.9"));
        assert!(VersionComparator::is_newer("2.0.0", "1.99.99"));
        assert!(!VersionComparator::is_newer("4.17.0", "4.17.21"));
    }

    #[test]
    fn equal_versions_are_not_newer() {
        assert!(!VersionComparator::is_newer("1.2.3", "1.2.3"));
        assert!(!VersionComparator::is_newer("1.2.3-alpha", "1.2.3-alpha"));
    }

    #[test]
    fn prerelease_orders_before_release() {
        assert!(VersionComparator::is_newer("1.0.0", "1.0.0-rc.1"));
        assert!(!VersionComparator::is_newer("1.0.0-rc.1", "1.0.0"));
        assert!(VersionComparator::is_newer("1.0.0-beta.11", "1.0.0-beta.2"));
        assert!(VersionComparator::is_newer("1.0.0-beta", "1.0.0-alpha.1"));
    }

    #[test]
    fn build_metadata_is_ignored() {
        assert!(!VersionComparator::is_newer("1.0.0+b", "1.0.0+a"));
        assert!(!VersionComparator::is_newer("1.0.0+a", "1.0.0+b"));
    }

    #[test]
    fn invalid_input_is_never_newer() {
        assert!(!VersionComparator::is_newer("abc", "1.0.0"));
        assert!(!VersionComparator::is_newer("2.0.0", "latest"));
    }

    #[test]
    fn validate_upgrade_reports_reason() {
        assert_eq!(
            VersionComparator::validate_upgrade("4.17", "4.17.0"),
            Err(INVALID_VERSION_MESSAGE.to_string())
        );
        assert_eq!(
            VersionComparator::validate_upgrade("4.16.0", "4.17.0"),
            Err(NOT_NEWER_MESSAGE.to_string())
        );
        assert_eq!(VersionComparator::validate_upgrade("4.17.21", "4.17.0"), Ok(()));
    }
}
