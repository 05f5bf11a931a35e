//! # Mailbox module
//!
//! Module dedicated to the mailbox abstraction the filesystem is
//! built on. A [`Mailbox`] only knows how to list folders, list
//! message UIDs of a folder and fetch one raw message.
//!
//! Two implementations are available: [`imap::ImapMailbox`], talking
//! to a remote IMAP server, and [`memory::MemoryMailbox`], keeping
//! everything in memory.

pub mod imap;
pub mod memory;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::Result;

#[doc(inline)]
pub use self::{imap::ImapMailbox, memory::MemoryMailbox};

pub const INBOX: &str = "INBOX";

/// The folder (as known as mailbox) structure.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Folder {
    /// The folder name, using `/` as hierarchy delimiter.
    pub name: String,

    /// Whether the folder can contain messages.
    ///
    /// Folders flagged `\Noselect` only contain sub-folders.
    pub selectable: bool,
}

impl Folder {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            selectable: true,
        }
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }
}

/// The raw message structure, as fetched from a mailbox.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawMessage {
    /// The message UID, unique inside its folder.
    pub uid: u32,

    /// The date the message arrived in the mailbox.
    pub internal_date: Option<DateTime<FixedOffset>>,

    /// The full RFC 5322 message.
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Mailbox: Debug + Send + Sync {
    /// List all folders, sub-folders included.
    async fn list_folders(&self) -> Result<Vec<Folder>>;

    /// List the UIDs of all messages of the given folder, in
    /// ascending order.
    async fn list_uids(&self, folder: &str) -> Result<Vec<u32>>;

    /// Fetch the message matching the given UID from the given
    /// folder. Returns [`None`] if the message does not exist.
    async fn fetch_message(&self, folder: &str, uid: u32) -> Result<Option<RawMessage>>;
}
