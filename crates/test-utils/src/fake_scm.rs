use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Mutex;

use testwatch::errors::{Result, TestwatchError};
use testwatch::search::{ChangedFiles, ChangedFilesOptions, ChangedFilesProvider, Scm};
use testwatch::types::BoxFuture;

/// Changed-files provider with a fixed answer.
///
/// Records the roots and options of every lookup.
#[derive(Debug)]
pub struct FakeScm {
    answer: Option<ChangedFiles>,
    pub lookups: Mutex<Vec<(Vec<PathBuf>, ChangedFilesOptions)>>,
}

impl FakeScm {
    /// A git repository at `repo` in which `changed` were modified.
    pub fn git(repo: &str, changed: &[PathBuf]) -> Self {
        let mut repos = BTreeMap::new();
        repos.insert(Scm::Git, BTreeSet::from([PathBuf::from(repo)]));
        repos.insert(Scm::Hg, BTreeSet::new());
        Self::answering(ChangedFiles {
            repos,
            changed_files: changed.iter().cloned().collect(),
        })
    }

    /// No repository in any root.
    pub fn none() -> Self {
        Self::answering(ChangedFiles::default())
    }

    /// Every lookup fails.
    pub fn failing() -> Self {
        Self {
            answer: None,
            lookups: Mutex::default(),
        }
    }

    fn answering(answer: ChangedFiles) -> Self {
        Self {
            answer: Some(answer),
            lookups: Mutex::default(),
        }
    }
}

impl ChangedFilesProvider for FakeScm {
    fn changed_files<'a>(
        &'a self,
        roots: &'a [PathBuf],
        options: &'a ChangedFilesOptions,
    ) -> BoxFuture<'a, Result<ChangedFiles>> {
        Box::pin(async move {
            self.lookups
                .lock()
                .unwrap()
                .push((roots.to_vec(), options.clone()));
            self.answer
                .clone()
                .ok_or_else(|| TestwatchError::ChangedFiles("git diff failed: not a repository".into()))
        })
    }
}
