//! Nested file tree for reviewing generated output
//!
//! Generated files arrive as a flat `path -> content` map. For review they
//! are shown as a tree: every `/`-separated segment becomes a key, the
//! last segment holds the content and the others are directories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A directory level: entry name to subtree
pub type TreeLevel = BTreeMap<String, FileTree>;

/// A node in the review tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileTree {
    /// File content
    File(String),
    /// Nested entries
    Directory(TreeLevel),
}

impl FileTree {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub fn as_directory(&self) -> Option<&TreeLevel> {
        match self {
            Self::Directory(level) => Some(level),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&str> {
        match self {
            Self::File(content) => Some(content),
            Self::Directory(_) => None,
        }
    }
}

/// Build a nested tree from a flat path map
///
/// Empty segments are ignored, so `"/a//b"` is the same as `"a/b"`. When
/// a file and a directory claim the same name the directory wins and the
/// file is dropped.
pub fn build_tree<'a, I>(files: I) -> TreeLevel
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut root = TreeLevel::new();

    'paths: for (path, content) in files {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, dirs)) = segments.split_last() else {
            log::warn!("Skipping generated file with empty path {:?}", path);
            continue;
        };

        let mut level = &mut root;
        for dir in dirs {
            let entry = level
                .entry(dir.to_string())
                .or_insert_with(|| FileTree::Directory(TreeLevel::new()));
            if entry.is_file() {
                log::warn!("Generated path {:?} replaces file '{}' with a directory", path, dir);
                *entry = FileTree::Directory(TreeLevel::new());
            }
            let FileTree::Directory(next) = entry else {
                continue 'paths;
            };
            level = next;
        }

        if matches!(level.get(*leaf), Some(FileTree::Directory(_))) {
            log::warn!("Dropping generated file {:?}: a directory has that name", path);
        } else {
            level.insert(leaf.to_string(), FileTree::File(content.clone()));
        }
    }

    root
}

/// Count files in a tree
pub fn file_count(level: &TreeLevel) -> usize {
    level
        .values()
        .map(|node| match node {
            FileTree::File(_) => 1,
            FileTree::Directory(inner) => file_count(inner),
        })
        .sum()
}

/// List file paths in a tree, depth-first in key order
pub fn file_paths(level: &TreeLevel) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(level, "", &mut paths);
    paths
}

fn collect_paths(level: &TreeLevel, prefix: &str, out: &mut Vec<String>) {
    for (name, node) in level {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        match node {
            FileTree::File(_) => out.push(path),
            FileTree::Directory(inner) => collect_paths(inner, &path, out),
        }
    }
}
