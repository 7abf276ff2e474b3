// Book Splitter - Audiobook chapter splitting and tagging
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Persisted title cache
//!
//! # File Format
//! The whole file is one JSON array of `[key, value]` pairs:
//! ```json
//! [["disambiguate:[\"dune.m4b\",[\"Dune\",\"Dune (Unabridged)\"]]", "Dune"]]
//! ```
//!
//! A missing or unparsable file is an empty cache. Entries are loaded on
//! first use and the file is rewritten in full after every insert (write to
//! a sibling temp file, then rename). Last write wins; there is no locking,
//! so two processes sharing one cache file can lose each other's entries.

use crate::error::{Result, SplitterError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Flat key/value store backed by a JSON file
#[derive(Debug)]
pub struct TitleCache {
    path: PathBuf,
    /// `None` until the file has been read
    entries: Option<Vec<(String, String)>>,
}

impl TitleCache {
    /// Cache backed by `path`; nothing is read until first use
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a cached value
    pub async fn get(&mut self, key: &str) -> Option<String> {
        self.entries()
            .await
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Insert or replace a value and flush the file
    ///
    /// # Errors
    /// - FileIoError if the cache file cannot be written
    pub async fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        let entries = self.entries().await;
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }

        self.flush().await
    }

    /// Number of entries (loads the file if needed)
    pub async fn len(&mut self) -> usize {
        self.entries().await.len()
    }

    pub async fn is_empty(&mut self) -> bool {
        self.len().await == 0
    }

    async fn entries(&mut self) -> &mut Vec<(String, String)> {
        if self.entries.is_none() {
            self.entries = Some(load_entries(&self.path).await);
        }
        self.entries.get_or_insert_with(Vec::new)
    }

    async fn flush(&self) -> Result<()> {
        let entries = self.entries.as_deref().unwrap_or_default();
        let json = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SplitterError::file_io("create_dir", parent, e))?;
        }

        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, json)
            .await
            .map_err(|e| SplitterError::file_io("write", &temp, e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| SplitterError::file_io("rename", &self.path, e))?;

        debug!(path = %self.path.display(), entries = entries.len(), "flushed title cache");
        Ok(())
    }
}

async fn load_entries(path: &Path) -> Vec<(String, String)> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read title cache, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "title cache is not valid JSON, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = TitleCache::open(dir.path().join("titles.json"));
        assert!(cache.is_empty().await);
        assert_eq!(cache.get("anything").await, None);
    }

    #[tokio::test]
    async fn test_insert_persists_as_pair_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("titles.json");

        let mut cache = TitleCache::open(&path);
        cache.insert("a", "1").await.unwrap();
        cache.insert("b", "2").await.unwrap();
        cache.insert("a", "3").await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!([["a", "3"], ["b", "2"]]));

        let mut reopened = TitleCache::open(&path);
        assert_eq!(reopened.get("a").await.as_deref(), Some("3"));
        assert_eq!(reopened.len().await, 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titles.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut cache = TitleCache::open(&path);
        assert!(cache.is_empty().await);

        // Next insert replaces the corrupt file
        cache.insert("k", "v").await.unwrap();
        let mut reopened = TitleCache::open(&path);
        assert_eq!(reopened.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_load_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titles.json");

        let mut cache = TitleCache::open(&path);
        // Written after open but before first use
        std::fs::write(&path, r#"[["k", "late"]]"#).unwrap();
        assert_eq!(cache.get("k").await.as_deref(), Some("late"));
    }
}
