// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shared fixtures and collaborator fakes for test modules.

use crate::{
    apply::{LookupError, PrefStore, UserDirectory},
    brew::{self, PackageManager},
    syscall::{self, SyscallError},
};

use anyhow::Result;
use git2::{IndexEntry, IndexTime, Repository, RepositoryInitOptions};
use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
};

pub(crate) struct RepoFixture {
    repo: Repository,
}

impl RepoFixture {
    /// Initialize a bare fixture repository posing as a registry.
    pub(crate) fn new_bare(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        opts.bare(true);
        let repo = Repository::init_opts(path.as_ref(), &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { repo })
    }

    /// Stage file content straight into the index and commit it to HEAD.
    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<()> {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: contents.as_ref().len() as u32,
            id: self.repo.blob(contents.as_ref().as_bytes())?,
            flags: 0,
            flags_extended: 0,
            path: filename
                .as_ref()
                .as_os_str()
                .to_string_lossy()
                .into_owned()
                .as_bytes()
                .to_vec(),
        };

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_frombuffer(&entry, contents.as_ref().as_bytes())?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        // INVARIANT: Always determine latest parent commits to append to.
        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        // INVARIANT: Commit to HEAD by appending to obtained parent commits.
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            format!("chore: add {:?}", filename.as_ref()).as_ref(),
            &tree,
            &parents,
        )?;

        Ok(())
    }

    /// Detach HEAD at the current commit.
    pub(crate) fn detach_head(&self) -> Result<()> {
        let oid = self
            .repo
            .head()?
            .target()
            .ok_or_else(|| anyhow::anyhow!("HEAD has no target"))?;
        self.repo.set_head_detached(oid)?;

        Ok(())
    }
}

/// Package manager fake that records every mutating call.
pub(crate) struct FakeBrew {
    present: Cell<bool>,
    present_after_install: bool,
    pub(crate) bundle_fails: bool,
    pub(crate) cask_installed: bool,
    pub(crate) calls: RefCell<Vec<&'static str>>,
}

impl FakeBrew {
    pub(crate) fn new(present: bool, present_after_install: bool) -> Self {
        Self {
            present: Cell::new(present),
            present_after_install,
            bundle_fails: false,
            cask_installed: false,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl PackageManager for FakeBrew {
    fn resolve(&mut self) -> bool {
        self.calls.borrow_mut().push("resolve");
        self.present.get()
    }

    fn version(&self) -> brew::Result<String> {
        Ok("Homebrew 4.0.0".into())
    }

    fn prefix(&self) -> brew::Result<PathBuf> {
        Ok(PathBuf::from("/opt/homebrew"))
    }

    fn self_install(&self) -> brew::Result<()> {
        self.calls.borrow_mut().push("self_install");
        self.present.set(self.present_after_install);
        Ok(())
    }

    fn load_shellenv(&self) -> brew::Result<()> {
        self.calls.borrow_mut().push("load_shellenv");
        Ok(())
    }

    fn bundle_install(&self, _: &Path) -> brew::Result<()> {
        self.calls.borrow_mut().push("bundle_install");
        if self.bundle_fails {
            return Err(SyscallError::NonZeroExit {
                name: "brew".into(),
                message: "bundle failed".into(),
            }
            .into());
        }
        Ok(())
    }

    fn install_cask(&self, _: &str) -> brew::Result<()> {
        self.calls.borrow_mut().push("install_cask");
        Ok(())
    }

    fn is_cask_installed(&self, _: &str) -> brew::Result<bool> {
        Ok(self.cask_installed)
    }

    fn shell_path(&self, shell: &str) -> brew::Result<PathBuf> {
        Ok(PathBuf::from("/opt/homebrew/bin").join(shell))
    }
}

/// Preference store fake that records writes as key/value strings.
#[derive(Default)]
pub(crate) struct FakePrefs {
    pub(crate) writes: RefCell<Vec<(String, String)>>,
    pub(crate) flushed: Cell<bool>,
}

impl PrefStore for FakePrefs {
    fn write_string(&self, _: &str, key: &str, value: &str) -> syscall::Result<()> {
        self.writes.borrow_mut().push((key.into(), value.into()));
        Ok(())
    }

    fn write_bool(&self, _: &str, key: &str, value: bool) -> syscall::Result<()> {
        self.writes.borrow_mut().push((key.into(), value.to_string()));
        Ok(())
    }

    fn write_int(&self, _: &str, key: &str, value: i64) -> syscall::Result<()> {
        self.writes.borrow_mut().push((key.into(), value.to_string()));
        Ok(())
    }

    fn flush(&self) -> syscall::Result<()> {
        self.flushed.set(true);
        Ok(())
    }
}

/// User directory fake with a fixed login shell.
pub(crate) struct FakeUsers {
    shell: PathBuf,
}

impl FakeUsers {
    pub(crate) fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl UserDirectory for FakeUsers {
    fn login_shell(&self) -> Result<PathBuf, LookupError> {
        Ok(self.shell.clone())
    }
}
