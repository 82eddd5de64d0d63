// src/haste/watcher.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::WatchEvent;
use crate::fs::FileSystem;
use crate::haste::{FileIndex, HasteChange};

/// Keeps the underlying notify watchers alive. Dropping it stops watching.
pub struct WatcherHandle {
    _inner: Vec<RecommendedWatcher>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("watchers", &self._inner.len())
            .finish()
    }
}

/// Watch every root of every project and emit one
/// [`WatchEvent::FilesChanged`] per project whose index changed.
///
/// Events arriving within `debounce` of each other are coalesced into a
/// single batch. Indexes are updated on the blocking pool since hashing
/// reads file contents.
pub fn spawn_watcher(
    indexes: Vec<FileIndex>,
    fs: Arc<dyn FileSystem>,
    debounce: Duration,
    runtime_tx: mpsc::UnboundedSender<WatchEvent>,
) -> Result<WatcherHandle> {
    let (path_tx, mut path_rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let roots: BTreeSet<PathBuf> = indexes
        .iter()
        .flat_map(|idx| idx.project().roots.iter().cloned())
        .collect();

    let mut watchers = Vec::with_capacity(roots.len());
    for root in roots {
        let path_tx = path_tx.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    // Receiver gone means the runtime is shutting down.
                    let _ = path_tx.send(event.paths);
                }
                Err(err) => error!("file watch error: {err}"),
            },
            Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("file watcher started on {:?}", root);
        watchers.push(watcher);
    }

    tokio::spawn(async move {
        let mut indexes = indexes;

        while let Some(first) = path_rx.recv().await {
            let mut batch: BTreeSet<PathBuf> = first.into_iter().collect();
            let mut closed = false;
            loop {
                match tokio::time::timeout(debounce, path_rx.recv()).await {
                    Ok(Some(more)) => batch.extend(more),
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            let paths: Vec<PathBuf> = batch.into_iter().collect();
            debug!(count = paths.len(), "processing change batch");

            let fs = Arc::clone(&fs);
            let applied = tokio::task::spawn_blocking(move || {
                let changes: Vec<_> = indexes
                    .iter_mut()
                    .map(|idx| idx.apply_changes(fs.as_ref(), &paths))
                    .collect();
                (indexes, changes)
            })
            .await;

            let (updated, changes) = match applied {
                Ok(res) => res,
                Err(err) => {
                    error!("file index update task failed: {err}");
                    return;
                }
            };
            indexes = updated;

            for (project, events) in changes.into_iter().enumerate() {
                if events.is_empty() {
                    continue;
                }
                let change = HasteChange {
                    events,
                    index: Arc::new(indexes[project].clone()),
                };
                if runtime_tx
                    .send(WatchEvent::FilesChanged { project, change })
                    .is_err()
                {
                    debug!("runtime channel closed; stopping watcher task");
                    return;
                }
            }

            if closed {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watchers })
}
