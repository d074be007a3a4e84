//! # File Storage
//!
//! File-backed [`Gateway`] rooted at the KuBel data directory, plus the
//! data-directory resolution and first-run bootstrap.
//!
//! ## Data directory resolution
//!
//! 1. `--data-dir` command-line argument
//! 2. `KUBEL_DATA_DIR` environment variable
//! 3. Platform data directory joined with `KuBel`

use kubel_core::primitives::{CATEGORIES_FILE, DATA_FILE};
use kubel_core::{Data, Gateway, KubelError, save_json};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "KUBEL_DATA_DIR";

/// Directory name below the platform data directory.
pub const APP_DIR_NAME: &str = "KuBel";

/// Maximum size of a stored document (50 MB).
const MAX_DOCUMENT_SIZE: u64 = 50 * 1024 * 1024;

// =============================================================================
// DATA DIRECTORY
// =============================================================================

/// Resolve the data directory (CLI argument, then env, then platform default).
pub fn resolve_data_dir(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = std::env::var(DATA_DIR_ENV).ok().filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    default_data_dir()
}

/// Platform default: `~/.local/share/KuBel`, `%APPDATA%\KuBel`, ...
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR_NAME))
}

/// What the first-run bootstrap did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created_dir: bool,
    pub copied: Vec<String>,
    pub created_empty_data: bool,
}

// =============================================================================
// FILE GATEWAY
// =============================================================================

/// Gateway storing each document as a file in one directory.
#[derive(Debug, Clone)]
pub struct FileGateway {
    root: PathBuf,
}

impl FileGateway {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prepare the data directory.
    ///
    /// Creates it when missing and copies `data.json`/`categories.json`
    /// from `resources` when they are not present yet. Without a bundled
    /// `data.json`, an empty store is written instead.
    pub fn bootstrap(&self, resources: Option<&Path>) -> Result<BootstrapReport, KubelError> {
        let mut report = BootstrapReport::default();

        if !self.root.is_dir() {
            fs::create_dir_all(&self.root).map_err(|e| {
                KubelError::IoError(format!(
                    "Cannot create data directory '{}': {}",
                    self.root.display(),
                    e
                ))
            })?;
            report.created_dir = true;
            tracing::info!(dir = %self.root.display(), "Created data directory");
        }

        for name in [DATA_FILE, CATEGORIES_FILE] {
            let target = self.root.join(name);
            if target.exists() {
                continue;
            }
            let Some(source) = resources.map(|dir| dir.join(name)).filter(|p| p.is_file()) else {
                continue;
            };
            tracing::info!(
                from = %source.display(),
                to = %target.display(),
                "No {} found, copying bundled file",
                name
            );
            fs::copy(&source, &target).map_err(|e| {
                KubelError::IoError(format!("Cannot copy '{}': {}", source.display(), e))
            })?;
            report.copied.push(name.to_string());
        }

        if !self.root.join(DATA_FILE).exists() {
            save_json(self, DATA_FILE, &Data::new())?;
            report.created_empty_data = true;
            tracing::info!("Created empty {}", DATA_FILE);
        }

        if !self.root.join(CATEGORIES_FILE).exists() {
            tracing::warn!(
                "No {} in {}; evaluations need category definitions",
                CATEGORIES_FILE,
                self.root.display()
            );
        }

        Ok(report)
    }

    /// Resolve a document name to a path inside the root.
    ///
    /// Names are plain file names: no separators, no `..`.
    fn path_for(&self, name: &str) -> Result<PathBuf, KubelError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && Path::new(name).file_name().is_some_and(|f| f == name);
        if !valid {
            return Err(KubelError::IoError(format!("Invalid document name '{name}'")));
        }
        Ok(self.root.join(name))
    }
}

impl Gateway for FileGateway {
    fn load(&self, name: &str) -> Result<String, KubelError> {
        let path = self.path_for(name)?;
        let metadata = fs::metadata(&path)
            .map_err(|e| KubelError::IoError(format!("could not read file: {name} ({e})")))?;
        if metadata.len() > MAX_DOCUMENT_SIZE {
            return Err(KubelError::IoError(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_DOCUMENT_SIZE
            )));
        }
        fs::read_to_string(&path)
            .map_err(|e| KubelError::IoError(format!("could not read file: {name} ({e})")))
    }

    /// Write to a temporary file next to the target, then rename over it.
    fn save(&self, name: &str, content: &str) -> Result<(), KubelError> {
        let path = self.path_for(name)?;
        let tmp = self.root.join(format!(".{name}.tmp"));
        fs::write(&tmp, content)
            .map_err(|e| KubelError::IoError(format!("could not write file: {name} ({e})")))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            KubelError::IoError(format!("could not write file: {name} ({e})"))
        })?;
        tracing::debug!(file = name, bytes = content.len(), "Saved document");
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kubel_core::load_data;

    #[test]
    fn rejects_path_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = FileGateway::new(dir.path());
        for name in ["", "..", "../data.json", "sub/data.json", "a\\b"] {
            assert!(gateway.load(name).is_err(), "{name}");
            assert!(gateway.save(name, "{}").is_err(), "{name}");
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = FileGateway::new(dir.path());
        gateway.save("config.json", "{\"a\":1}").expect("save");
        assert_eq!(gateway.load("config.json").expect("load"), "{\"a\":1}");
        assert!(gateway.exists("config.json"));
        assert!(!dir.path().join(".config.json.tmp").exists());
    }

    #[test]
    fn bootstrap_writes_empty_store_without_resources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = FileGateway::new(dir.path().join("KuBel"));

        let report = gateway.bootstrap(None).expect("bootstrap");

        assert!(report.created_dir);
        assert!(report.created_empty_data);
        let data = load_data(&gateway).expect("data");
        assert!(data.people.is_empty());
    }

    #[test]
    fn bootstrap_copies_missing_resources_only() {
        let resources = tempfile::tempdir().expect("tempdir");
        fs::write(resources.path().join(DATA_FILE), "{\"version\":\"1.0.0\",\"people\":{}}")
            .expect("write");
        fs::write(resources.path().join(CATEGORIES_FILE), "{}").expect("write");

        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CATEGORIES_FILE), "{\"keep\":true}").expect("write");
        let gateway = FileGateway::new(dir.path());

        let report = gateway.bootstrap(Some(resources.path())).expect("bootstrap");

        assert_eq!(report.copied, vec![DATA_FILE.to_string()]);
        assert!(!report.created_empty_data);
        assert_eq!(
            gateway.load(CATEGORIES_FILE).expect("load"),
            "{\"keep\":true}"
        );
    }

    #[test]
    fn cli_argument_wins() {
        let path = resolve_data_dir(Some(Path::new("/tmp/kubel-test")));
        assert_eq!(path, PathBuf::from("/tmp/kubel-test"));
    }
}
