//! # Memory mailbox
//!
//! A [`Mailbox`] living entirely in memory. Mostly useful for testing
//! filesystem code without an IMAP server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{path, Error, Result};

use super::{Folder, Mailbox, RawMessage, INBOX};

#[derive(Debug, Default)]
struct MemoryFolder {
    selectable: bool,
    next_uid: u32,
    messages: BTreeMap<u32, RawMessage>,
}

/// The in-memory mailbox.
///
/// UIDs are assigned per folder, starting at 1, and are never
/// reused. The INBOX folder always exists.
#[derive(Debug)]
pub struct MemoryMailbox {
    folders: RwLock<BTreeMap<String, MemoryFolder>>,
}

impl Default for MemoryMailbox {
    fn default() -> Self {
        let inbox = MemoryFolder {
            selectable: true,
            next_uid: 1,
            ..Default::default()
        };

        Self {
            folders: RwLock::new(BTreeMap::from_iter([(INBOX.to_owned(), inbox)])),
        }
    }
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the given folder. Does nothing if it already exists.
    pub async fn add_folder(&self, folder: impl AsRef<str>) {
        self.insert_folder(folder.as_ref(), true).await
    }

    /// Create the given folder as a container of sub-folders only,
    /// like IMAP folders flagged `\Noselect`.
    pub async fn add_container_folder(&self, folder: impl AsRef<str>) {
        self.insert_folder(folder.as_ref(), false).await
    }

    async fn insert_folder(&self, folder: &str, selectable: bool) {
        let folder = path::normalize(folder);
        debug!("adding memory folder {folder}");

        self.folders
            .write()
            .await
            .entry(folder)
            .or_insert_with(|| MemoryFolder {
                selectable,
                next_uid: 1,
                ..Default::default()
            });
    }

    /// Delete the given folder and all its messages.
    pub async fn delete_folder(&self, folder: impl AsRef<str>) -> Result<()> {
        let folder = path::normalize(folder.as_ref());

        match self.folders.write().await.remove(&folder) {
            Some(_) => Ok(()),
            None => Err(Error::FolderNotFound(folder)),
        }
    }

    /// Append the given raw message to the given folder, using the
    /// current date as internal date. Returns the UID of the new
    /// message.
    pub async fn add_message(&self, folder: impl AsRef<str>, body: impl Into<Vec<u8>>) -> Result<u32> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        self.add_message_with_date(folder, body, Some(now)).await
    }

    /// Append the given raw message to the given folder, using the
    /// given internal date. Returns the UID of the new message.
    pub async fn add_message_with_date(
        &self,
        folder: impl AsRef<str>,
        body: impl Into<Vec<u8>>,
        internal_date: Option<DateTime<FixedOffset>>,
    ) -> Result<u32> {
        let name = path::normalize(folder.as_ref());
        let mut folders = self.folders.write().await;

        let folder = folders
            .get_mut(&name)
            .filter(|folder| folder.selectable)
            .ok_or_else(|| Error::FolderNotFound(name.clone()))?;

        let uid = folder.next_uid;
        folder.next_uid += 1;

        let message = RawMessage {
            uid,
            internal_date,
            body: body.into(),
        };

        folder.messages.insert(uid, message);
        debug!("added memory message {uid} to folder {name}");

        Ok(uid)
    }

    /// Move the given message to another folder. Returns the UID of
    /// the message in the target folder.
    pub async fn move_message(&self, from: impl AsRef<str>, uid: u32, to: impl AsRef<str>) -> Result<u32> {
        let from = path::normalize(from.as_ref());
        let to = path::normalize(to.as_ref());
        let mut folders = self.folders.write().await;

        if !folders.get(&to).is_some_and(|folder| folder.selectable) {
            return Err(Error::FolderNotFound(to));
        }

        let mut message = folders
            .get_mut(&from)
            .ok_or_else(|| Error::FolderNotFound(from.clone()))?
            .messages
            .remove(&uid)
            .ok_or_else(|| Error::NotFound(path::join(&from, &uid.to_string())))?;

        let target = folders
            .get_mut(&to)
            .ok_or_else(|| Error::FolderNotFound(to.clone()))?;

        message.uid = target.next_uid;
        target.next_uid += 1;

        let uid = message.uid;
        target.messages.insert(uid, message);

        Ok(uid)
    }
}

#[async_trait]
impl Mailbox for MemoryMailbox {
    async fn list_folders(&self) -> Result<Vec<Folder>> {
        info!("listing memory folders");

        let folders = self
            .folders
            .read()
            .await
            .iter()
            .map(|(name, folder)| Folder::new(name).with_selectable(folder.selectable))
            .collect();

        Ok(folders)
    }

    async fn list_uids(&self, folder: &str) -> Result<Vec<u32>> {
        info!("listing memory message uids from folder {folder}");

        let folders = self.folders.read().await;

        let uids = folders
            .get(folder)
            .filter(|folder| folder.selectable)
            .ok_or_else(|| Error::FolderNotFound(folder.to_owned()))?
            .messages
            .keys()
            .copied()
            .collect();

        Ok(uids)
    }

    async fn fetch_message(&self, folder: &str, uid: u32) -> Result<Option<RawMessage>> {
        info!("fetching memory message {uid} from folder {folder}");

        let folders = self.folders.read().await;

        let message = folders
            .get(folder)
            .filter(|folder| folder.selectable)
            .ok_or_else(|| Error::FolderNotFound(folder.to_owned()))?
            .messages
            .get(&uid)
            .cloned();

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use crate::mailbox::{Folder, Mailbox, INBOX};

    use super::MemoryMailbox;

    #[test_log::test(tokio::test)]
    async fn folders() {
        let mailbox = MemoryMailbox::new();
        mailbox.add_folder("/Archive/").await;
        mailbox.add_container_folder("[Gmail]").await;

        let folders = mailbox.list_folders().await.unwrap();
        assert_eq!(
            folders,
            vec![
                Folder::new("Archive"),
                Folder::new(INBOX),
                Folder::new("[Gmail]").with_selectable(false),
            ]
        );

        mailbox.delete_folder("Archive").await.unwrap();
        assert!(mailbox.delete_folder("Archive").await.is_err());
        assert!(mailbox.list_uids("[Gmail]").await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn messages() {
        let mailbox = MemoryMailbox::new();
        mailbox.add_folder("Archive").await;

        assert_eq!(mailbox.add_message(INBOX, "a").await.unwrap(), 1);
        assert_eq!(mailbox.add_message(INBOX, "b").await.unwrap(), 2);
        assert_eq!(mailbox.list_uids(INBOX).await.unwrap(), vec![1, 2]);

        let uid = mailbox.move_message(INBOX, 1, "Archive").await.unwrap();
        assert_eq!(uid, 1);
        assert_eq!(mailbox.list_uids(INBOX).await.unwrap(), vec![2]);

        let message = mailbox.fetch_message("Archive", 1).await.unwrap().unwrap();
        assert_eq!(message.body, b"a");
        assert!(message.internal_date.is_some());

        assert_eq!(mailbox.fetch_message(INBOX, 1).await.unwrap(), None);
        assert!(mailbox.fetch_message("Unknown", 1).await.unwrap_err().is_not_found());
        assert!(mailbox.add_message("Unknown", "c").await.is_err());

        // UIDs are never reused
        assert_eq!(mailbox.add_message(INBOX, "d").await.unwrap(), 3);
    }
}
