//! Raw HTML snapshots for post-mortem replay
//!
//! Snapshots are diagnostics: a failed write is logged and otherwise
//! ignored.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    dir: Option<PathBuf>,
}

fn url_key(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl SnapshotStore {
    /// Store that writes nothing
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// `page_content_{index}.html`
    pub fn save_page(&self, index: usize, html: &str) -> Option<PathBuf> {
        self.write(&format!("page_content_{index}.html"), html)
    }

    /// `detail_content_{hash}.html`
    pub fn save_detail(&self, url: &str, html: &str) -> Option<PathBuf> {
        self.write(&format!("detail_content_{}.html", url_key(url)), html)
    }

    /// `failed_product_{hash}.html`, for pages without any description
    pub fn save_failed(&self, url: &str, html: &str) -> Option<PathBuf> {
        self.write(&format!("failed_product_{}.html", url_key(url)), html)
    }

    fn write(&self, file_name: &str, html: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(file_name);
        let result = fs::create_dir_all(dir).and_then(|_| fs::write(&path, html));
        match result {
            Ok(()) => {
                debug!("Saved snapshot {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to save snapshot {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_writes_nothing() {
        assert!(SnapshotStore::disabled().save_page(0, "<html></html>").is_none());
    }

    #[test]
    fn test_saves_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::in_dir(dir.path().join("snapshots"));

        let page = store.save_page(3, "<html>page</html>").unwrap();
        assert!(page.ends_with("page_content_3.html"));
        assert_eq!(fs::read_to_string(&page).unwrap(), "<html>page</html>");

        let a = store.save_detail("https://d.example.com/1", "a").unwrap();
        let b = store.save_detail("https://d.example.com/2", "b").unwrap();
        assert_ne!(a, b);

        let failed = store.save_failed("https://d.example.com/1", "x").unwrap();
        let name = failed.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("failed_product_"));
    }
}
