use crate::error::{BbdepsError, Result};
use serde_json::{Map, Value};

const DEPENDENCY_SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];

/// In-memory view of a `package.json` / `package-lock.json` pair.
///
/// Both documents are kept as ordered JSON values so every field the tool does
/// not touch is written back unchanged. Shapes are checked once in [`NpmProject::new`];
/// the accessors below rely on those checks.
#[derive(Debug, Clone)]
pub struct NpmProject {
    manifest: Value,
    lockfile: Value,
}

impl NpmProject {
    pub fn new(manifest: Value, lockfile: Value) -> Result<Self> {
        let manifest_root = manifest.as_object().ok_or_else(|| {
            BbdepsError::Manifest("package.json must contain a JSON object".to_string())
        })?;

        for section in DEPENDENCY_SECTIONS {
            if let Some(value) = manifest_root.get(section) {
                let entries = value.as_object().ok_or_else(|| {
                    BbdepsError::Manifest(format!("\"{section}\" in package.json is not an object"))
                })?;

                if let Some((name, _)) = entries.iter().find(|(_, range)| !range.is_string()) {
                    return Err(BbdepsError::Manifest(format!(
                        "version range of \"{name}\" in \"{section}\" is not a string"
                    )));
                }
            }
        }

        let lock_root = lockfile.as_object().ok_or_else(|| {
            BbdepsError::Manifest("package-lock.json must contain a JSON object".to_string())
        })?;

        match lock_root.get("packages") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(BbdepsError::Manifest(
                    "\"packages\" in package-lock.json is not an object".to_string(),
                ));
            }
            None => {
                return Err(BbdepsError::Manifest(
                    "package-lock.json has no \"packages\" section".to_string(),
                ));
            }
        }

        Ok(Self { manifest, lockfile })
    }

    /// Names from `dependencies` followed by `devDependencies`, in document
    /// order. A name declared in both sections is listed once.
    pub fn updatable_packages(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();

        for section in DEPENDENCY_SECTIONS {
            if let Some(entries) = self.manifest_section(section) {
                for name in entries.keys() {
                    if !names.iter().any(|existing| existing == name) {
                        names.push(name.clone());
                    }
                }
            }
        }

        names
    }

    /// Version currently resolved in the lockfile for `name`.
    pub fn locked_version(&self, name: &str) -> Result<&str> {
        self.lock_entry(name)
            .and_then(|entry| entry.get("version"))
            .and_then(Value::as_str)
            .ok_or_else(|| BbdepsError::PackageNotFound(name.to_string()))
    }

    /// Point `name` at `version` in the manifest and the lockfile.
    ///
    /// The lockfile entry is checked before anything changes, so a failed call
    /// leaves both documents untouched. The version itself is not validated here.
    pub fn set_version(&mut self, name: &str, version: &str) -> Result<()> {
        if !self.lock_entry(name).is_some_and(Value::is_object) {
            return Err(BbdepsError::PackageNotFound(name.to_string()));
        }

        let section = DEPENDENCY_SECTIONS
            .into_iter()
            .find(|section| self.manifest_section(section).is_some_and(|e| e.contains_key(name)));

        match section {
            Some(section) => {
                if let Some(range) = self
                    .manifest
                    .get_mut(section)
                    .and_then(|entries| entries.get_mut(name))
                {
                    *range = Value::String(version.to_string());
                }
            }
            None => log::warn!(
                "\"{name}\" is not declared in package.json; only package-lock.json is updated"
            ),
        }

        if let Some(entry) = self
            .lockfile
            .get_mut("packages")
            .and_then(|packages| packages.get_mut(lock_key(name)))
            .and_then(Value::as_object_mut)
        {
            entry.insert("version".to_string(), Value::String(version.to_string()));
        }

        // lockfileVersion 1 and 2 also carry a flat "dependencies" tree
        if let Some(entry) = self
            .lockfile
            .get_mut("dependencies")
            .and_then(|deps| deps.get_mut(name))
            .and_then(Value::as_object_mut)
        {
            entry.insert("version".to_string(), Value::String(version.to_string()));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    #[cfg(test)]
    pub fn lockfile(&self) -> &Value {
        &self.lockfile
    }

    /// Consume the project, returning `(manifest, lockfile)`.
    pub fn into_documents(self) -> (Value, Value) {
        (self.manifest, self.lockfile)
    }

    fn manifest_section(&self, section: &str) -> Option<&Map<String, Value>> {
        self.manifest.get(section).and_then(Value::as_object)
    }

    fn lock_entry(&self, name: &str) -> Option<&Value> {
        self.lockfile
            .get("packages")
            .and_then(|packages| packages.get(lock_key(name)))
    }
}

fn lock_key(name: &str) -> String {
    format!("node_modules/{name}")
}
