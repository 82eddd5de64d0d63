// src/haste/index.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace, warn};

use crate::config::ProjectConfig;
use crate::fs::{has_extension, FileSystem};
use crate::haste::deps::{extract_specifiers, resolve_specifier};
use crate::haste::graph::DependencyGraph;
use crate::haste::hash::content_hash;
use crate::haste::{snapshot_source_path, ChangeEvent, ChangeKind, SNAPSHOT_EXTENSION};

#[derive(Debug, Clone)]
struct FileEntry {
    hash: String,
    /// Raw specifiers found in the file; resolved when the graph is rebuilt.
    specifiers: Vec<String>,
}

/// Snapshot of every indexed file of one project plus its dependency graph.
///
/// This is the "context" a test selection is computed against. Instances are
/// cheap to share (`Arc<FileIndex>`); the watcher produces a new one for
/// every change batch.
#[derive(Debug, Clone)]
pub struct FileIndex {
    project: Arc<ProjectConfig>,
    files: BTreeMap<PathBuf, FileEntry>,
    graph: DependencyGraph,
}

impl FileIndex {
    /// An index with no files; useful before the first crawl finishes.
    pub fn empty(project: Arc<ProjectConfig>) -> Self {
        Self {
            project,
            files: BTreeMap::new(),
            graph: DependencyGraph::new(),
        }
    }

    /// Crawl every root of `project` and index the matching files.
    pub fn build(project: Arc<ProjectConfig>, fs: &dyn FileSystem) -> Result<Self> {
        let extensions = indexed_extensions(&project);
        let mut index = Self::empty(Arc::clone(&project));

        for root in &project.roots {
            if !fs.is_dir(root) {
                warn!(root = ?root, project = %project.name, "project root is not a directory");
                continue;
            }
            for path in fs.crawl(root, &extensions)? {
                match read_entry(fs, &path, &project) {
                    Ok(entry) => {
                        index.files.insert(path, entry);
                    }
                    Err(err) => warn!(path = ?path, "skipping unreadable file: {err:#}"),
                }
            }
        }

        index.rebuild_graph();
        debug!(
            project = %project.name,
            files = index.files.len(),
            "built file index"
        );
        Ok(index)
    }

    pub fn project(&self) -> &Arc<ProjectConfig> {
        &self.project
    }

    /// Every indexed file, sorted.
    pub fn all_files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.files.keys().map(|p| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Files transitively depending on any of `seeds` that satisfy `is_test`.
    ///
    /// A changed snapshot file seeds the test file it belongs to. Seeds not
    /// present in the index are ignored.
    pub fn resolve_inverse(&self, seeds: &[PathBuf], is_test: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
        let seeds: Vec<PathBuf> = seeds
            .iter()
            .map(|seed| snapshot_source_path(seed).unwrap_or_else(|| seed.clone()))
            .filter(|seed| self.contains(seed))
            .collect();
        self.graph.inverse_closure(&seeds, is_test)
    }

    /// Re-read `paths` and return the events that actually changed the index.
    ///
    /// A modified file whose content hash is unchanged produces no event.
    /// Paths outside the project roots or with an unindexed extension are
    /// ignored.
    pub fn apply_changes(&mut self, fs: &dyn FileSystem, paths: &[PathBuf]) -> Vec<ChangeEvent> {
        let extensions = indexed_extensions(&self.project);
        let mut events = Vec::new();

        for path in paths {
            if !self.project.is_under_roots(path) || !has_extension(path, &extensions) {
                continue;
            }

            if !fs.is_file(path) {
                if self.files.remove(path).is_some() {
                    events.push(ChangeEvent::new(path.clone(), ChangeKind::Deleted));
                }
                continue;
            }

            let entry = match read_entry(fs, path, &self.project) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(path = ?path, "failed to read changed file: {err:#}");
                    continue;
                }
            };

            let kind = match self.files.get(path) {
                Some(existing) if existing.hash == entry.hash => {
                    trace!(path = ?path, "content unchanged; dropping event");
                    continue;
                }
                Some(_) => ChangeKind::Modified,
                None => ChangeKind::Added,
            };
            self.files.insert(path.clone(), entry);
            events.push(ChangeEvent::new(path.clone(), kind));
        }

        if !events.is_empty() {
            self.rebuild_graph();
        }
        events
    }

    fn rebuild_graph(&mut self) {
        let mut graph = DependencyGraph::new();
        let known = |p: &Path| self.files.contains_key(p);

        for (path, entry) in &self.files {
            graph.add_file(path);
            for spec in &entry.specifiers {
                if let Some(dep) =
                    resolve_specifier(path, spec, &self.project.module_file_extensions, &known)
                {
                    graph.add_dependency(path, &dep);
                }
            }
        }
        self.graph = graph;
    }
}

fn indexed_extensions(project: &ProjectConfig) -> Vec<String> {
    let mut exts = project.module_file_extensions.clone();
    if !exts.iter().any(|e| e == SNAPSHOT_EXTENSION) {
        exts.push(SNAPSHOT_EXTENSION.to_string());
    }
    exts
}

fn read_entry(fs: &dyn FileSystem, path: &Path, project: &ProjectConfig) -> Result<FileEntry> {
    let bytes = fs.read(path)?;
    let hash = content_hash(&bytes);
    let specifiers = if has_extension(path, &project.module_file_extensions) {
        extract_specifiers(&String::from_utf8_lossy(&bytes))
    } else {
        Vec::new()
    };
    Ok(FileEntry { hash, specifiers })
}
