// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way. Nothing here touches the file
//! system; callers decide when a path must exist.

use std::path::{Path, PathBuf};

/// Directory name of the registry gitdir under the target directory.
pub const REGISTRY_DIR_NAME: &str = ".dotfiles.git";

/// File name of the declared package manifest under the target directory.
pub const MANIFEST_NAME: &str = ".Brewfile";

/// Tracked settings directory for the terminal emulator, relative to the
/// target directory.
pub const ITERM_PREFS_DIR: &str = ".config/iterm2";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the scratch directory.
///
/// Uses XDG Base Directory path `$XDG_CACHE_HOME/dotboot` as the default
/// absolute path. Holds transient file lists and backup archives. Does not
/// check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn scratch_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|path| path.join("dotboot"))
        .ok_or(NoWayHome)
}

/// Fixed locations of one bootstrap run.
///
/// The __target__ is the checkout destination for the registry, normally the
/// user's home directory. Every other fixed path hangs off of it, except the
/// scratch directory, which lives under the user's cache directory so backup
/// archives survive without cluttering the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub target: PathBuf,
    pub scratch: PathBuf,
}

impl Layout {
    /// Construct layout rooted at an explicit target and scratch directory.
    pub fn new(target: impl Into<PathBuf>, scratch: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            scratch: scratch.into(),
        }
    }

    /// Construct default layout: home directory target, XDG cache scratch.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if home directory path cannot be determined.
    pub fn try_default() -> Result<Self> {
        Ok(Self::new(home_dir()?, scratch_dir()?))
    }

    /// Gitdir of the registry under the target directory.
    pub fn registry_dir(&self) -> PathBuf {
        self.target.join(REGISTRY_DIR_NAME)
    }

    /// Declared package manifest under the target directory.
    pub fn manifest(&self) -> PathBuf {
        self.target.join(MANIFEST_NAME)
    }

    /// Tracked terminal-emulator settings directory under the target
    /// directory.
    pub fn iterm_prefs_dir(&self) -> PathBuf {
        self.target.join(ITERM_PREFS_DIR)
    }

    /// Treat target directory as [`Path`] slice.
    pub fn target(&self) -> &Path {
        self.target.as_path()
    }
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn layout_fixed_paths_hang_off_target() {
        let layout = Layout::new("/home/blah", "/home/blah/.cache/dotboot");

        assert_eq!(
            layout.registry_dir(),
            PathBuf::from("/home/blah/.dotfiles.git")
        );
        assert_eq!(layout.manifest(), PathBuf::from("/home/blah/.Brewfile"));
        assert_eq!(
            layout.iterm_prefs_dir(),
            PathBuf::from("/home/blah/.config/iterm2")
        );
    }
}
