use anyhow::{bail, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MANIFEST_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];
const SKIPPED_DIRS: [&str; 3] = ["target", "vendor", "node_modules"];

/// Finds manifest fragments under a directory.
///
/// Walks the tree collecting `.json`, `.yaml` and `.yml` files, skipping hidden directories
/// and dependency or build directories (`target`, `vendor`, `node_modules`). A root that is a
/// file is returned as the only manifest. Results are sorted so fragments merge in a stable
/// order.
///
/// # Example
///
/// ```no_run
/// use openapi_from_metadata::scanner::ManifestScanner;
/// use std::path::PathBuf;
///
/// let result = ManifestScanner::new(PathBuf::from("./storage/openapi")).scan().unwrap();
/// println!("Found {} manifests", result.manifests.len());
/// ```
pub struct ManifestScanner {
    root_path: PathBuf,
}

pub struct ScanResult {
    pub manifests: Vec<PathBuf>,
    /// Paths that could not be read while walking
    pub warnings: Vec<String>,
}

impl ManifestScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// # Errors
    ///
    /// Returns an error if the root does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            bail!("Manifest path does not exist: {}", self.root_path.display());
        }
        if self.root_path.is_file() {
            return Ok(ScanResult {
                manifests: vec![self.root_path.clone()],
                warnings: Vec::new(),
            });
        }

        let mut manifests = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root_path).into_iter().filter_entry(|e| {
            if e.path() == self.root_path || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
        });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_manifest(entry.path()) {
                        manifests.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        manifests.sort();
        debug!("Found {} manifests under {}", manifests.len(), self.root_path.display());

        Ok(ScanResult {
            manifests,
            warnings,
        })
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
