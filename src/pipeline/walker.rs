//! File discovery.
//!
//! Walks the repository root honoring .gitignore plus configured ignore
//! globs, and returns relative paths tagged with their detected language.

use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::extract::FileInfo;
use crate::lang::Language;

/// Walks directories to find source files to index.
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Discover indexable files under `root`, sorted by relative path.
    pub fn discover(&self, root: &Path) -> IndexResult<Vec<FileInfo>> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false);

        let mut overrides = OverrideBuilder::new(root);
        for pattern in &self.settings.indexing.ignore_patterns {
            overrides
                .add(&format!("!{pattern}"))
                .map_err(|e| IndexError::Discover {
                    root: root.to_path_buf(),
                    reason: format!("invalid ignore pattern '{pattern}': {e}"),
                })?;
        }
        if let Ok(overrides) = overrides.build() {
            builder.overrides(overrides);
        }

        let max_size = self.settings.indexing.max_file_size_bytes;
        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| IndexError::Discover {
                root: root.to_path_buf(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.path();
            let Some(language) = Language::from_path(path) else {
                continue;
            };
            if !self.settings.language_enabled(language) {
                continue;
            }
            if let Ok(meta) = entry.metadata()
                && meta.len() > max_size
            {
                continue;
            }
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");
            files.push(FileInfo::new(rel, language));
        }
        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn walker() -> FileWalker {
        FileWalker::new(Arc::new(Settings::default()))
    }

    #[test]
    fn discovers_supported_languages_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/a.go"), "package pkg\n").unwrap();
        fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("README.md"), "# hi\n").unwrap();

        let files = walker().discover(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["b.py", "pkg/a.go"]);
        assert_eq!(files[1].language, Language::Go);
    }

    #[test]
    fn ignore_patterns_are_applied() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        fs::write(dir.path().join("node_modules/lib/x.js"), "let a = 1;\n").unwrap();
        fs::write(dir.path().join("app.js"), "let b = 2;\n").unwrap();

        let files = walker().discover(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["app.js"]);
    }

    #[test]
    fn disabled_language_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.lua"), "local x = 1\n").unwrap();
        fs::write(dir.path().join("b.go"), "package b\n").unwrap();

        let mut settings = Settings::default();
        settings
            .languages
            .get_mut("lua")
            .map(|c| c.enabled = false);
        let walker = FileWalker::new(Arc::new(settings));
        let files = walker.discover(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "b.go");
    }
}
