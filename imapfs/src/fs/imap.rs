//! # IMAP filesystem
//!
//! The [`FileSystem`] implementation exposing a [`Mailbox`]:
//!
//! - the root lists top-level folders;
//! - a folder lists itself, its sub-folders then its messages, as
//!   directories named after their UID;
//! - a message lists its named attachments, as files.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    cache::Cache,
    config::{CacheConfig, ImapConfig},
    info::FileInfo,
    mailbox::{ImapMailbox, Mailbox},
    message::Message,
    path::{self, FolderTree, Node},
    Error, Result,
};

use super::FileSystem;

/// The IMAP filesystem.
///
/// Generic over the [`Mailbox`] so it can be backed by a remote IMAP
/// server (the default) or by anything else implementing the trait.
#[derive(Debug)]
pub struct ImapFileSystem<M: Mailbox = ImapMailbox> {
    mailbox: M,
    cache: Mutex<Cache>,
}

impl ImapFileSystem<ImapMailbox> {
    /// Connect to the IMAP server and build the filesystem on top of
    /// it.
    pub async fn new(config: ImapConfig) -> Result<Self> {
        let mailbox = ImapMailbox::new(config).await?;
        Ok(Self::from_mailbox(mailbox))
    }
}

impl<M: Mailbox> ImapFileSystem<M> {
    pub fn from_mailbox(mailbox: M) -> Self {
        Self {
            mailbox,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Cache config setter following the builder pattern.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = Mutex::new(Cache::new(config));
        self
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    async fn folders(&self) -> Result<Arc<FolderTree>> {
        if let Some(folders) = self.cache.lock().await.folders() {
            return Ok(folders);
        }

        let folders = self.mailbox.list_folders().await?;
        let folders = Arc::new(FolderTree::new(&folders));
        self.cache.lock().await.set_folders(folders.clone());

        Ok(folders)
    }

    async fn resolve(&self, path: &str) -> Result<Node> {
        let node = self.folders().await?.resolve(path)?;
        debug!("resolved path {path:?} to {node:?}");
        Ok(node)
    }

    /// Fetch and parse the given message, or fail with
    /// [`Error::NotFound`] if it does not exist.
    async fn message(&self, folder: &str, uid: u32) -> Result<Arc<Message>> {
        if let Some(message) = self.cache.lock().await.message(folder, uid) {
            return Ok(message);
        }

        let message = match self.mailbox.fetch_message(folder, uid).await {
            Ok(Some(raw)) => Arc::new(Message::from(raw)),
            Ok(None) | Err(Error::FolderNotFound(_)) => {
                return Err(Error::NotFound(path::join(folder, &uid.to_string())));
            }
            Err(err) => return Err(err),
        };

        self.cache
            .lock()
            .await
            .set_message(folder.to_owned(), message.clone());

        Ok(message)
    }

    async fn list(&self, path: &str, node: Node) -> Result<Vec<FileInfo>> {
        match node {
            Node::Root => {
                let folders = self.folders().await?;
                Ok(folders.children("").map(FileInfo::directory).collect())
            }
            Node::Folder(folder) => {
                let folders = self.folders().await?;

                // a folder lists itself first, like an IMAP LIST of it
                let mut entries = vec![FileInfo::directory(&folder)];
                entries.extend(folders.children(&folder).map(FileInfo::directory));

                if folders.is_selectable(&folder) {
                    let uids = match self.mailbox.list_uids(&folder).await {
                        Ok(uids) => uids,
                        Err(Error::FolderNotFound(_)) => {
                            return Err(Error::NotFound(path.to_owned()));
                        }
                        Err(err) => return Err(err),
                    };

                    entries.extend(
                        uids.into_iter()
                            .map(|uid| FileInfo::directory(path::join(&folder, &uid.to_string()))),
                    );
                }

                Ok(entries)
            }
            Node::Message { folder, uid } => {
                let message = self.message(&folder, uid).await?;
                let entries = message
                    .attachments
                    .iter()
                    .map(|attachment| {
                        FileInfo::file(path::join(path, &attachment.filename), attachment.size())
                            .with_created(message.created)
                    })
                    .collect();

                Ok(entries)
            }
            node @ Node::Attachment { .. } => Ok(vec![self.info_node(path, node).await?]),
        }
    }

    async fn info_node(&self, path: &str, node: Node) -> Result<FileInfo> {
        match node {
            Node::Root | Node::Folder(_) => Ok(FileInfo::directory(path)),
            Node::Message { folder, uid } => {
                let message = self.message(&folder, uid).await?;
                Ok(FileInfo::directory(path).with_created(message.created))
            }
            Node::Attachment {
                folder,
                uid,
                filename,
            } => {
                let message = self.message(&folder, uid).await?;
                let attachment = message
                    .attachment(&filename)
                    .ok_or_else(|| Error::NotFound(path.to_owned()))?;
                Ok(FileInfo::file(path, attachment.size()).with_created(message.created))
            }
        }
    }
}

#[async_trait]
impl<M: Mailbox> FileSystem for ImapFileSystem<M> {
    async fn entries(&self, path: &str) -> Result<Vec<FileInfo>> {
        let path = path::normalize(path);
        info!("listing entries of {path:?}");

        if let Some(entries) = self.cache.lock().await.listing(&path) {
            return Ok(entries.as_ref().clone());
        }

        let node = self.resolve(&path).await?;
        let is_dir = node.is_dir();
        let entries = self.list(&path, node).await?;

        if is_dir {
            self.cache
                .lock()
                .await
                .set_listing(path.clone(), Arc::new(entries.clone()));
        }

        debug!("found {} entries in {path:?}", entries.len());
        Ok(entries)
    }

    async fn info(&self, path: &str) -> Result<FileInfo> {
        let path = path::normalize(path);
        info!("getting info of {path:?}");

        let node = self.resolve(&path).await?;
        self.info_node(&path, node).await
    }

    async fn cat_file(&self, path: &str, start: Option<u64>, end: Option<u64>) -> Result<Vec<u8>> {
        let path = path::normalize(path);
        info!("reading content of {path:?}");

        let content = match self.resolve(&path).await? {
            Node::Root | Node::Folder(_) => return Err(Error::IsADirectory(path)),
            Node::Message { folder, uid } => {
                // make sure the message exists before complaining
                self.message(&folder, uid).await?;
                return Err(Error::IsADirectory(path));
            }
            Node::Attachment {
                folder,
                uid,
                filename,
            } => {
                let message = self.message(&folder, uid).await?;
                let attachment = message
                    .attachment(&filename)
                    .ok_or_else(|| Error::NotFound(path.clone()))?;

                let len = attachment.size();
                let start = start.unwrap_or(0).min(len) as usize;
                let end = end.unwrap_or(len).min(len) as usize;

                if start >= end {
                    Vec::new()
                } else {
                    attachment.content[start..end].to_vec()
                }
            }
        };

        Ok(content)
    }

    async fn created(&self, path: &str) -> Result<DateTime<FixedOffset>> {
        let path = path::normalize(path);
        info!("getting creation date of {path:?}");

        match self.resolve(&path).await? {
            Node::Root | Node::Folder(_) => Err(Error::TimestampUnavailable(path)),
            node => {
                let info = self.info_node(&path, node).await?;
                info.created.ok_or(Error::TimestampUnavailable(path))
            }
        }
    }

    async fn invalidate_cache(&self, path: Option<&str>) {
        let mut cache = self.cache.lock().await;

        match path {
            Some(path) => cache.invalidate(&path::normalize(path)),
            None => cache.clear(),
        }
    }
}
