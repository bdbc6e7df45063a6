// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Registry access.
//!
//! The __registry__ is a bare-alias repository: a bare Git repository whose
//! tracked files deploy directly into a target directory by designating that
//! directory as a work tree alias through the "--work-tree" argument. The
//! target never becomes a repository of its own; Git simply treats it as the
//! working tree of the registry gitdir. This is the standard bare-alias
//! technique for tracking dotfile configurations.
//!
//! # Prerequisite, Not Product
//!
//! The registry must already exist at its fixed gitdir before a run starts.
//! This module never creates or clones one: the bootstrap binary can only be
//! running because it was itself retrieved from the registry, so a missing
//! registry is an inconsistency to report, not a first-run condition to
//! recover from.
//!
//! # Status Hygiene
//!
//! A work tree alias over a home directory would make `git status` list every
//! unrelated file in it as untracked. Opening the registry therefore pins
//! `status.showUntrackedFiles = no` in the repository configuration, so later
//! status queries only ever speak about tracked files.
//!
//! # See Also
//!
//! 1. [ArchWiki - dotfiles](https://wiki.archlinux.org/title/Dotfiles#Tracking_dotfiles_directly_with_Git)

use crate::syscall;

use git2::{ObjectType, Repository};
use std::{
    collections::VecDeque,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Current revision of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Commit id of HEAD.
    pub id: String,

    /// Branch shorthand, or [`DETACHED_LABEL`] when HEAD is not symbolic.
    pub label: String,
}

/// Sentinel label reported for a registry in a detached HEAD state.
pub const DETACHED_LABEL: &str = "detached";

/// Layer of indirection for registry access.
///
/// The narrow surface the rest of the bootstrap needs from a version-control
/// client. Tests substitute fakes; production wires [`Git2Registry`].
pub trait RegistryAccess {
    /// Enumerate tracked file paths at the current revision, relative to the
    /// work tree alias.
    fn tracked_files(&self) -> Result<Vec<PathBuf>>;

    /// Read the current revision id and symbolic label.
    fn revision(&self) -> Result<Revision>;

    /// Force-checkout every tracked file into the target directory.
    fn checkout(&self, target: &Path) -> Result<()>;
}

/// Registry access through libgit2, plus the Git binary for checkout.
pub struct Git2Registry {
    repository: Repository,
}

impl std::fmt::Debug for Git2Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Registry")
            .field("repository", &self.repository.path())
            .finish()
    }
}

impl Git2Registry {
    /// Open existing registry at target gitdir.
    ///
    /// Verifies the gitdir exists and opens as a bare repository, then pins
    /// `status.showUntrackedFiles = no` so the work tree alias never reports
    /// unrelated files.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::Missing`] if no directory exists at the
    ///   gitdir path.
    /// - Return [`RegistryError::Git2`] if the directory is not a valid bare
    ///   repository, or its configuration cannot be written.
    #[instrument(skip(gitdir), level = "debug")]
    pub fn try_open(gitdir: impl AsRef<Path>) -> Result<Self> {
        let gitdir = gitdir.as_ref();
        debug!("open registry: {:?}", gitdir.display());
        if !gitdir.is_dir() {
            return Err(RegistryError::Missing {
                gitdir: gitdir.to_path_buf(),
            });
        }

        let repository = Repository::open_bare(gitdir)?;
        let mut config = repository.config()?;
        config.set_str("status.showUntrackedFiles", "no")?;

        Ok(Self { repository })
    }

    fn expand_bin_args(
        &self,
        target: &Path,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Vec<OsString> {
        let gitdir = self.repository.path().to_string_lossy().into_owned().into();
        let mut bin_args: Vec<OsString> = vec![
            "--git-dir".into(),
            gitdir,
            "--work-tree".into(),
            target.as_os_str().to_os_string(),
        ];
        bin_args.extend(args.into_iter().map(Into::into));

        bin_args
    }
}

impl RegistryAccess for Git2Registry {
    // Thank you Eric at https://www.hydrogen18.com/blog/list-all-files-git-repo-pygit2.html.
    fn tracked_files(&self) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let commit = self.repository.head()?.peel_to_commit()?;
        let tree = commit.tree()?;
        let mut trees_and_paths = VecDeque::new();
        trees_and_paths.push_front((tree, PathBuf::new()));

        // Use DFS to traverse index tree.
        while let Some((tree, path)) = trees_and_paths.pop_front() {
            for tree_entry in &tree {
                match tree_entry.kind() {
                    // INVARIANT: Hit a tree? Traverse it!
                    Some(ObjectType::Tree) => {
                        let next_tree = self.repository.find_tree(tree_entry.id())?;
                        let next_path = path.join(bytes_to_path(tree_entry.name_bytes()));
                        trees_and_paths.push_front((next_tree, next_path));
                    }
                    // INVARIANT: Hit a blob? Record our current path!
                    Some(ObjectType::Blob) => {
                        let full_path = path.join(bytes_to_path(tree_entry.name_bytes()));
                        entries.push(full_path);
                    }
                    _ => continue,
                }
            }
        }

        Ok(entries)
    }

    fn revision(&self) -> Result<Revision> {
        let head = self.repository.head()?;
        let id = head.peel_to_commit()?.id().to_string();
        let label = if self.repository.head_detached()? {
            DETACHED_LABEL.to_string()
        } else {
            head.shorthand().unwrap_or(DETACHED_LABEL).to_string()
        };

        Ok(Revision { id, label })
    }

    #[instrument(skip(self), level = "debug")]
    fn checkout(&self, target: &Path) -> Result<()> {
        let output = syscall::run_capture(
            "git",
            self.expand_bin_args(target, ["checkout", "-f"]),
        )?;
        if !output.is_empty() {
            debug!("{output}");
        }

        Ok(())
    }
}

fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    #[cfg(unix)]
    {
        use std::os::unix::prelude::*;
        PathBuf::from(OsStr::from_bytes(bytes))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Registry access error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No registry exists at the fixed gitdir path. Never auto-recovered.
    #[error(
        "no registry at {:?}; retrieve your dotfiles there before running dotboot",
        gitdir.display()
    )]
    Missing { gitdir: PathBuf },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Git binary invocation fails.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
