//! Recently opened documents, most recent first.

use std::path::{Path, PathBuf};

pub const DEFAULT_RECENT_FILES_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RecentFiles {
    files: Vec<PathBuf>,
    limit: usize,
}

impl RecentFiles {
    pub fn new(limit: usize) -> Self {
        Self { files: Vec::new(), limit: limit.max(1) }
    }

    /// Rebuild from a stored list, dropping entries that no longer exist.
    pub fn from_stored(files: Vec<PathBuf>, limit: usize) -> Self {
        let mut recent = Self::new(limit);
        for path in files {
            if !path.exists() {
                log::debug!("dropping missing recent file {}", path.display());
                continue;
            }
            if !recent.files.contains(&path) {
                recent.files.push(path);
            }
        }
        recent.files.truncate(recent.limit);
        recent
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Move `path` to the front. Paths that do not exist are refused.
    pub fn add(&mut self, path: impl AsRef<Path>) -> bool {
        let Some(path) = absolute(path.as_ref()) else {
            return false;
        };
        if !path.exists() {
            return false;
        }

        self.files.retain(|existing| existing != &path);
        self.files.insert(0, path);
        self.files.truncate(self.limit);
        true
    }

    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        let Some(path) = absolute(path.as_ref()) else {
            return false;
        };
        let before = self.files.len();
        self.files.retain(|existing| existing != &path);
        self.files.len() != before
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_FILES_LIMIT)
    }
}

fn absolute(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    std::env::current_dir().ok().map(|cwd| cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"%PDF-1.4").expect("fixture should be written");
        path
    }

    #[test]
    fn add_moves_existing_entry_to_front() {
        let dir = TempDir::new().expect("temp dir");
        let first = touch(&dir, "a.pdf");
        let second = touch(&dir, "b.pdf");
        let mut recent = RecentFiles::default();

        assert!(recent.add(&first));
        assert!(recent.add(&second));
        assert!(recent.add(&first));

        assert_eq!(recent.files(), &[first, second]);
    }

    #[test]
    fn list_is_capped_at_the_limit() {
        let dir = TempDir::new().expect("temp dir");
        let mut recent = RecentFiles::new(3);

        for index in 0..5 {
            recent.add(touch(&dir, &format!("{index}.pdf")));
        }

        assert_eq!(recent.files().len(), 3);
        assert_eq!(recent.files()[0], dir.path().join("4.pdf"));
    }

    #[test]
    fn missing_files_are_refused_and_filtered() {
        let dir = TempDir::new().expect("temp dir");
        let present = touch(&dir, "present.pdf");
        let missing = dir.path().join("missing.pdf");
        let mut recent = RecentFiles::default();

        assert!(!recent.add(&missing));
        assert!(recent.files().is_empty());

        let restored = RecentFiles::from_stored(vec![missing, present.clone()], 10);
        assert_eq!(restored.files(), &[present]);
    }

    #[test]
    fn remove_and_clear() {
        let dir = TempDir::new().expect("temp dir");
        let path = touch(&dir, "a.pdf");
        let mut recent = RecentFiles::default();
        recent.add(&path);

        assert!(recent.remove(&path));
        assert!(!recent.remove(&path));

        recent.add(&path);
        recent.clear();
        assert!(recent.files().is_empty());
    }
}
