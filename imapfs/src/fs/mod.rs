//! # Filesystem module
//!
//! Module dedicated to the generic filesystem abstraction. A
//! filesystem only needs to implement a handful of operations
//! ([`FileSystem::entries`], [`FileSystem::info`],
//! [`FileSystem::cat_file`] and [`FileSystem::created`]); everything
//! else (existence checks, globbing, recursive listing, reading
//! text…) is provided on top of them.
//!
//! Paths are `/`-separated. Leading and trailing slashes are not
//! significant.

mod file;
pub mod imap;

use std::{collections::HashSet, fmt::Debug};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::{
    glob::{self, Pattern},
    info::FileInfo,
    path, Error, Result,
};

#[doc(inline)]
pub use self::{file::File, imap::ImapFileSystem};

/// A directory visited by [`FileSystem::walk`]: its path, its
/// sub-directories and its files.
pub type WalkEntry = (String, Vec<FileInfo>, Vec<FileInfo>);

#[async_trait]
pub trait FileSystem: Debug + Send + Sync {
    /// List the entries of the given directory. A file lists itself.
    async fn entries(&self, path: &str) -> Result<Vec<FileInfo>>;

    /// Get information about the given path.
    async fn info(&self, path: &str) -> Result<FileInfo>;

    /// Read the content of the given file, between `start` and `end`
    /// bytes. Bounds are clamped to the size of the file.
    async fn cat_file(&self, path: &str, start: Option<u64>, end: Option<u64>) -> Result<Vec<u8>>;

    /// Get the creation date of the given path.
    async fn created(&self, path: &str) -> Result<DateTime<FixedOffset>>;

    /// Get the modification date of the given path.
    ///
    /// Defaults to the creation date, for filesystems that never
    /// modify entries.
    async fn modified(&self, path: &str) -> Result<DateTime<FixedOffset>> {
        self.created(path).await
    }

    /// Forget any cached information about the given path, or about
    /// everything if no path is given.
    async fn invalidate_cache(&self, _path: Option<&str>) {}

    /// List the given path.
    ///
    /// If the path contains glob characters, the matching entries
    /// are returned instead (see [`FileSystem::glob`]). Brackets are
    /// common in folder names (`[Gmail]/Sent Mail`), so a path whose
    /// only glob characters are brackets is first listed as is.
    async fn ls(&self, path: &str) -> Result<Vec<FileInfo>> {
        if !path::has_magic(path) {
            return self.entries(path).await;
        }

        if path::has_wildcard(path) {
            return self.glob(path).await;
        }

        match self.entries(path).await {
            Err(err) if err.is_not_found() => {
                let entries = self.glob(path).await?;
                if entries.is_empty() {
                    Err(err)
                } else {
                    Ok(entries)
                }
            }
            res => res,
        }
    }

    /// List the names of the given path. See [`FileSystem::ls`].
    async fn ls_names(&self, path: &str) -> Result<Vec<String>> {
        let entries = self.ls(path).await?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.info(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn is_dir(&self, path: &str) -> Result<bool> {
        match self.info(path).await {
            Ok(info) => Ok(info.is_dir()),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn is_file(&self, path: &str) -> Result<bool> {
        match self.info(path).await {
            Ok(info) => Ok(info.is_file()),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn size(&self, path: &str) -> Result<u64> {
        Ok(self.info(path).await?.size)
    }

    /// Read the whole content of the given file.
    async fn cat(&self, path: &str) -> Result<Vec<u8>> {
        self.cat_file(path, None, None).await
    }

    /// Read the whole content of the given file as UTF-8 text.
    async fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.cat(path).await?;
        String::from_utf8(bytes).map_err(|err| Error::ReadTextError(err, path::normalize(path)))
    }

    /// Open the given file for reading.
    async fn open(&self, path: &str) -> Result<File> {
        let info = self.info(path).await?;

        if info.is_dir() {
            return Err(Error::IsADirectory(info.name));
        }

        let content = self.cat(&info.name).await?;
        Ok(File::new(info, content))
    }

    /// Find all entries matching the given glob pattern.
    ///
    /// The pattern is expanded component by component. A `**`
    /// component matches any number of levels. A pattern without
    /// glob characters matches the path itself, if it exists.
    async fn glob(&self, pattern: &str) -> Result<Vec<FileInfo>> {
        let pattern = path::normalize(pattern);
        debug!("expanding glob pattern {pattern:?}");

        if !path::has_magic(&pattern) {
            return match self.info(&pattern).await {
                Ok(info) => Ok(vec![info]),
                Err(err) if err.is_not_found() => Ok(vec![]),
                Err(err) => Err(err),
            };
        }

        let parts = path::components(&pattern);
        let literal_len = parts
            .iter()
            .position(|part| path::has_magic(part) || glob::is_recursive(part))
            .unwrap_or(parts.len());

        let prefix = parts[..literal_len].join("/");
        let mut candidates = match self.info(&prefix).await {
            Ok(info) if info.is_dir() => vec![info],
            Ok(_) => return Ok(vec![]),
            Err(err) if err.is_not_found() => return Ok(vec![]),
            Err(err) => return Err(err),
        };

        for part in &parts[literal_len..] {
            let mut next = Vec::new();

            if glob::is_recursive(part) {
                // zero level, then every level below
                for candidate in candidates {
                    let descendants = self.find(&candidate.name, true).await?;
                    next.push(candidate);
                    next.extend(descendants);
                }
            } else if path::has_magic(part) {
                let pattern = Pattern::new(part)?;

                for candidate in candidates.iter().filter(|c| c.is_dir()) {
                    for entry in self.list_dir_or_skip(&candidate.name).await? {
                        let name = path::basename(&entry.name);
                        if name == *part || pattern.matches(name) {
                            next.push(entry);
                        }
                    }
                }
            } else {
                for candidate in candidates.iter().filter(|c| c.is_dir()) {
                    let child = path::join(&candidate.name, part);
                    match self.info(&child).await {
                        Ok(info) => next.push(info),
                        Err(err) if err.is_not_found() => continue,
                        Err(err) => return Err(err),
                    }
                }
            }

            candidates = next;
        }

        let mut seen = HashSet::new();
        candidates.retain(|entry| seen.insert(entry.name.clone()));

        Ok(candidates)
    }

    /// Find all files below the given path, depth-first and in listing
    /// order. Directories are included when `with_dirs` is `true`.
    async fn find(&self, path: &str, with_dirs: bool) -> Result<Vec<FileInfo>> {
        let mut found = Vec::new();
        let mut stack = vec![path::normalize(path)];

        while let Some(dir) = stack.pop() {
            let entries = self.list_dir_or_skip(&dir).await?;
            let mut dirs = Vec::new();

            for entry in entries {
                if entry.is_dir() {
                    dirs.push(entry.name.clone());
                    if with_dirs {
                        found.push(entry);
                    }
                } else {
                    found.push(entry);
                }
            }

            stack.extend(dirs.into_iter().rev());
        }

        Ok(found)
    }

    /// Walk the tree below the given directory, top-down.
    async fn walk(&self, path: &str) -> Result<Vec<WalkEntry>> {
        let mut walked = Vec::new();
        let mut stack = vec![path::normalize(path)];

        while let Some(dir) = stack.pop() {
            let (dirs, files): (Vec<_>, Vec<_>) = self
                .list_dir_or_skip(&dir)
                .await?
                .into_iter()
                .partition(FileInfo::is_dir);

            stack.extend(dirs.iter().rev().map(|d| d.name.clone()));
            walked.push((dir, dirs, files));
        }

        Ok(walked)
    }

    /// List the given directory, or return nothing if it vanished or
    /// is not a directory.
    #[doc(hidden)]
    async fn list_dir_or_skip(&self, dir: &str) -> Result<Vec<FileInfo>> {
        match self.entries(dir).await {
            Ok(entries) => {
                let dir = path::normalize(dir);
                Ok(entries.into_iter().filter(|e| e.name != dir).collect())
            }
            Err(err) if err.is_not_found() => Ok(vec![]),
            Err(err) => Err(err),
        }
    }
}
