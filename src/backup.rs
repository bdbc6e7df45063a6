// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Backup of pre-existing tracked files.
//!
//! Any registry-tracked path that already exists under the target directory
//! would collide with checkout. Those paths are snapshotted into one
//! timestamped archive in the scratch directory, then the originals are
//! removed.
//!
//! Ordering is the whole point: originals are deleted only after the archive
//! has durably completed, so a failure mid-archive never loses data. There is
//! no undo here; restoring is a manual `tar -xzf <archive> -C <target>` by
//! the operator. Archives accumulate in the scratch directory and are never
//! pruned by this tool.

use crate::syscall::{self, SyscallError};

use chrono::Local;
use std::{
    ffi::OsString,
    fs::{remove_file, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Base name shared by every backup archive and its file list.
pub const ARCHIVE_PREFIX: &str = "dotfiles-backup";

/// Layer of indirection for the external archive utility.
pub trait Archiver {
    /// Create `archive` from the paths listed one-per-line in `list_file`,
    /// with entries recorded relative to `root`.
    fn create(&self, archive: &Path, root: &Path, list_file: &Path) -> syscall::Result<()>;
}

/// Archive creation through the tar binary.
#[derive(Debug, Default)]
pub struct TarArchiver;

impl Archiver for TarArchiver {
    fn create(&self, archive: &Path, root: &Path, list_file: &Path) -> syscall::Result<()> {
        let args: Vec<OsString> = vec![
            "-czf".into(),
            archive.into(),
            "-C".into(),
            root.into(),
            "-T".into(),
            list_file.into(),
        ];
        syscall::run_capture("tar", args)?;

        Ok(())
    }
}

/// Filter tracked paths down to the ones already present under the target
/// directory.
///
/// Symlinks count as present even when dangling; checkout would clobber them
/// all the same.
pub fn existing_tracked_files(tracked: &[PathBuf], target: &Path) -> Vec<PathBuf> {
    tracked
        .iter()
        .filter(|path| target.join(path).symlink_metadata().is_ok())
        .cloned()
        .collect()
}

/// Archive every pre-existing tracked file, then remove the originals.
///
/// Returns the archive path, or `None` when no tracked file existed under
/// the target directory (in which case nothing is created and nothing is
/// deleted).
///
/// # Errors
///
/// - Return [`BackupError::CreateScratchDir`] if the scratch directory cannot
///   be created.
/// - Return [`BackupError::WriteFileList`] if the transient file list cannot
///   be written.
/// - Return [`BackupError::Archive`] if the archive utility fails. No
///   original has been removed at that point.
/// - Return [`BackupError::RemoveOriginal`] if an archived original cannot be
///   deleted afterwards.
pub fn run_backup(
    tracked: &[PathBuf],
    target: &Path,
    scratch: &Path,
    archiver: &impl Archiver,
) -> Result<Option<PathBuf>> {
    let existing = existing_tracked_files(tracked, target);
    if existing.is_empty() {
        debug!("no tracked files present under {:?}", target.display());
        return Ok(None);
    }

    mkdirp::mkdirp(scratch).map_err(|source| BackupError::CreateScratchDir {
        source,
        path: scratch.to_path_buf(),
    })?;

    let stamp = Local::now().format("%Y%m%d-%H%M").to_string();
    let (list_path, archive_path) = free_slot(scratch, &stamp);

    let mut list = String::new();
    for path in &existing {
        list.push_str(path.to_string_lossy().as_ref());
        list.push('\n');
    }
    write(&list_path, list.as_bytes()).map_err(|source| BackupError::WriteFileList {
        source,
        path: list_path.clone(),
    })?;

    info!(
        "backing up {} existing tracked file(s) to {:?}",
        existing.len(),
        archive_path.display()
    );
    archiver.create(&archive_path, target, &list_path)?;

    // INVARIANT: Originals go away only after the archive durably exists.
    for path in &existing {
        let full_path = target.join(path);
        remove_file(&full_path).map_err(|source| BackupError::RemoveOriginal {
            source,
            path: full_path.clone(),
        })?;
    }

    Ok(Some(archive_path))
}

// INVARIANT: Archives are never overwritten; a rerun within the same minute
// gets a numeric suffix.
fn free_slot(scratch: &Path, stamp: &str) -> (PathBuf, PathBuf) {
    let mut suffix = String::new();
    let mut attempt = 1;
    loop {
        let archive = scratch.join(format!("{ARCHIVE_PREFIX}-{stamp}{suffix}.tar.gz"));
        if !archive.exists() {
            let list = scratch.join(format!("{ARCHIVE_PREFIX}-{stamp}{suffix}.list"));
            return (list, archive);
        }
        attempt += 1;
        suffix = format!("-{attempt}");
    }
}

/// Backup error types.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Scratch directory cannot be created when missing.
    #[error("failed to create scratch directory {:?}", path.display())]
    CreateScratchDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Transient file list cannot be written to the scratch directory.
    #[error("failed to write backup file list {:?}", path.display())]
    WriteFileList {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Archive utility fails before anything was deleted.
    #[error(transparent)]
    Archive(#[from] SyscallError),

    /// An archived original cannot be removed from the target directory.
    #[error("failed to remove archived original {:?}", path.display())]
    RemoveOriginal {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = BackupError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::fs::{create_dir_all, read_to_string};

    fn tracked() -> Vec<PathBuf> {
        vec![
            PathBuf::from(".zshrc"),
            PathBuf::from(".config/iterm2/com.googlecode.iterm2.plist"),
            PathBuf::from(".Brewfile"),
        ]
    }

    fn seed_target() {
        create_dir_all("home/.config/iterm2").unwrap();
        std::fs::write("home/.zshrc", "old zshrc\n").unwrap();
        std::fs::write(
            "home/.config/iterm2/com.googlecode.iterm2.plist",
            "old plist\n",
        )
        .unwrap();
        std::fs::write("home/untracked.txt", "keep me\n").unwrap();
    }

    fn archive_entries(archive: &Path) -> Vec<String> {
        let output = syscall::run_capture("tar", ["-tzf", &archive.to_string_lossy()]).unwrap();
        let mut entries: Vec<String> = output
            .lines()
            .map(|line| line.trim_start_matches("./").to_string())
            .filter(|line| !line.is_empty())
            .collect();
        entries.sort();
        entries
    }

    #[sealed_test]
    fn backup_archives_then_removes_existing_tracked_files() {
        seed_target();

        let archive = run_backup(&tracked(), Path::new("home"), Path::new("scratch"), &TarArchiver)
            .unwrap()
            .unwrap();

        // Completeness: originals are gone from the target.
        assert!(!Path::new("home/.zshrc").exists());
        assert!(!Path::new("home/.config/iterm2/com.googlecode.iterm2.plist").exists());

        // Soundness: only tracked paths were captured.
        let expect = vec![
            ".config/iterm2/com.googlecode.iterm2.plist".to_string(),
            ".zshrc".to_string(),
        ];
        assert_eq!(archive_entries(&archive), expect);
        assert!(Path::new("home/untracked.txt").exists());

        // Original content survives inside the archive.
        create_dir_all("restore").unwrap();
        syscall::run_capture(
            "tar",
            ["-xzf", &archive.to_string_lossy(), "-C", "restore"],
        )
        .unwrap();
        assert_eq!(read_to_string("restore/.zshrc").unwrap(), "old zshrc\n");
        assert_eq!(
            read_to_string("restore/.config/iterm2/com.googlecode.iterm2.plist").unwrap(),
            "old plist\n"
        );
    }

    #[sealed_test]
    fn backup_is_noop_when_nothing_tracked_exists() {
        create_dir_all("home").unwrap();

        let result =
            run_backup(&tracked(), Path::new("home"), Path::new("scratch"), &TarArchiver).unwrap();

        assert_eq!(result, None);
        assert!(!Path::new("scratch").exists());
    }

    #[sealed_test]
    fn second_run_after_removal_is_noop() {
        seed_target();

        let first = run_backup(&tracked(), Path::new("home"), Path::new("scratch"), &TarArchiver)
            .unwrap();
        assert!(first.is_some());

        let second = run_backup(&tracked(), Path::new("home"), Path::new("scratch"), &TarArchiver)
            .unwrap();
        assert_eq!(second, None);
    }

    #[sealed_test]
    fn reruns_never_overwrite_an_earlier_archive() {
        seed_target();
        let first = run_backup(&tracked(), Path::new("home"), Path::new("scratch"), &TarArchiver)
            .unwrap()
            .unwrap();

        std::fs::write("home/.zshrc", "newer zshrc\n").unwrap();
        let second = run_backup(&tracked(), Path::new("home"), Path::new("scratch"), &TarArchiver)
            .unwrap()
            .unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }

    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn create(&self, _: &Path, _: &Path, _: &Path) -> syscall::Result<()> {
            Err(SyscallError::NonZeroExit {
                name: "tar".into(),
                message: "boom".into(),
            })
        }
    }

    #[sealed_test]
    fn failed_archive_deletes_nothing() {
        seed_target();

        let result = run_backup(
            &tracked(),
            Path::new("home"),
            Path::new("scratch"),
            &FailingArchiver,
        );

        assert!(matches!(result, Err(BackupError::Archive(_))));
        assert!(Path::new("home/.zshrc").exists());
        assert!(Path::new("home/.config/iterm2/com.googlecode.iterm2.plist").exists());
    }
}
