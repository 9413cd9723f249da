//! Where dataset parts come from.
//!
//! [`HubTransport`] talks to the public dataset hub through the system `curl`
//! binary; [`MirrorTransport`] reads a local directory holding the same files.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use walkdir::WalkDir;

use crate::constants::{DEFAULT_DOWNLOAD_URL, DEFAULT_LIST_URL, PARQUET_EXTENSION};
use crate::error::{PuzzleError, Result};

/// Remote listing and download of dataset parts.
pub trait DatasetTransport: Send + Sync {
    /// Paths of every part of the current dataset revision, in read order.
    fn list(&self) -> Result<Vec<String>>;

    /// Raw bytes of one listed part.
    fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// One node of the hub's tree listing.
#[derive(Debug, Deserialize)]
struct TreeNode {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    #[serde(default)]
    entries: Vec<TreeNode>,
}

fn collect_parquet(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        match node.kind.as_str() {
            "file" if is_parquet(&node.path) => out.push(node.path.clone()),
            "directory" => collect_parquet(&node.entries, out),
            _ => {}
        }
    }
}

fn is_parquet(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(PARQUET_EXTENSION))
}

/// Parse a tree listing into sorted parquet paths.
pub fn parse_tree_listing(json: &[u8]) -> Result<Vec<String>> {
    let nodes: Vec<TreeNode> = serde_json::from_slice(json)
        .map_err(|e| PuzzleError::transport("parsing dataset listing", e.to_string()))?;
    let mut paths = Vec::new();
    collect_parquet(&nodes, &mut paths);
    paths.sort();
    Ok(paths)
}

/// HTTP transport backed by the `curl` binary.
#[derive(Debug, Clone)]
pub struct HubTransport {
    list_url: String,
    download_url: String,
}

impl Default for HubTransport {
    fn default() -> Self {
        Self::new(DEFAULT_LIST_URL, DEFAULT_DOWNLOAD_URL)
    }
}

impl HubTransport {
    pub fn new(list_url: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            list_url: list_url.into(),
            download_url: download_url.into(),
        }
    }

    fn download_url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.download_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn curl(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);
        let output = Command::new("curl")
            .args(["-sSfL", url])
            .output()
            .map_err(|e| PuzzleError::transport(url, format!("failed to run curl: {}", e)))?;

        if !output.status.success() {
            return Err(PuzzleError::transport(
                url,
                format!(
                    "curl exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(output.stdout)
    }
}

impl DatasetTransport for HubTransport {
    fn list(&self) -> Result<Vec<String>> {
        let body = self.curl(&self.list_url)?;
        let paths = parse_tree_listing(&body)?;
        log::info!("Dataset listing has {} parquet files", paths.len());
        Ok(paths)
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let bytes = self.curl(&self.download_url_for(path))?;
        log::info!("Downloaded {} ({} bytes)", path, bytes.len());
        Ok(bytes)
    }
}

/// Transport over a local directory laid out like the dataset.
#[derive(Debug, Clone)]
pub struct MirrorTransport {
    root: PathBuf,
}

impl MirrorTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DatasetTransport for MirrorTransport {
    fn list(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| {
                PuzzleError::transport(self.root.display().to_string(), e.to_string())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if is_parquet(&relative) {
                paths.push(relative);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(path);
        fs::read(&full).map_err(|e| PuzzleError::transport(full.display().to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_tree_listing() {
        let json = br#"[
            {"type": "file", "oid": "a", "size": 10, "path": "data/train-00001-of-00002.parquet"},
            {"type": "file", "oid": "b", "size": 10, "path": "data/README.md"},
            {"type": "directory", "oid": "c", "size": 0, "path": "data/extra", "entries": [
                {"type": "file", "path": "data/extra/more.PARQUET"}
            ]},
            {"type": "file", "oid": "d", "size": 10, "path": "data/train-00000-of-00002.parquet"}
        ]"#;
        let paths = parse_tree_listing(json).unwrap();
        assert_eq!(
            paths,
            vec![
                "data/extra/more.PARQUET",
                "data/train-00000-of-00002.parquet",
                "data/train-00001-of-00002.parquet",
            ]
        );
    }

    #[test]
    fn test_parse_tree_listing_rejects_garbage() {
        let err = parse_tree_listing(b"<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, PuzzleError::Transport { .. }));
    }

    #[test]
    fn test_download_url_join() {
        let hub = HubTransport::new("http://x/list", "http://x/resolve/main/");
        assert_eq!(
            hub.download_url_for("data/a.parquet"),
            "http://x/resolve/main/data/a.parquet"
        );
    }

    #[test]
    fn test_mirror_lists_and_fetches() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/b.parquet"), b"bb").unwrap();
        fs::write(dir.path().join("data/a.parquet"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

        let mirror = MirrorTransport::new(dir.path());
        assert_eq!(mirror.list().unwrap(), vec!["data/a.parquet", "data/b.parquet"]);
        assert_eq!(mirror.fetch("data/b.parquet").unwrap(), b"bb");
        assert!(matches!(
            mirror.fetch("data/missing.parquet"),
            Err(PuzzleError::Transport { .. })
        ));
    }
}
