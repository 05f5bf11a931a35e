//! Rust library to browse IMAP mailboxes as a read-only filesystem.
//!
//! The main purpose of this library is to expose email attachments
//! through a generic, path-based [`FileSystem`] interface, without
//! caring about how to talk to the IMAP server. The mailbox is
//! mapped onto the following tree:
//!
//! ```text
//! /                                 root, lists top-level folders
//! ├── INBOX/                        folder, lists sub-folders and messages
//! │   ├── Invoices/                 sub-folder
//! │   └── 42/                       message, named after its UID
//! │       └── invoice.pdf           attachment, as a regular file
//! └── Archive/
//! ```
//!
//! The [`ImapFileSystem`] is generic over the [`Mailbox`] it exposes:
//! an [`ImapMailbox`] talks to a remote IMAP server while a
//! [`MemoryMailbox`] keeps everything in memory. Filesystems can
//! also be built by protocol name or URL using the [`Registry`].
//!
//! ```rust,no_run
//! use imapfs::{config::{ImapConfig, Secret}, FileSystem, ImapFileSystem};
//!
//! # async fn run() -> imapfs::Result<()> {
//! let fs = ImapFileSystem::new(ImapConfig {
//!     host: "imap.example.org".into(),
//!     login: "alice@example.org".into(),
//!     password: Secret::new_command("pass show example"),
//!     ..Default::default()
//! })
//! .await?;
//!
//! for entry in fs.ls("INBOX/*/*.csv").await? {
//!     let csv = fs.read_text(&entry.name).await?;
//!     println!("{}: {} bytes", entry.name, csv.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! See examples in the /tests folder.

mod cache;
pub mod config;
mod error;
pub mod fs;
pub mod glob;
pub mod info;
pub mod mailbox;
pub mod message;
pub mod path;
pub mod registry;

#[doc(inline)]
pub use self::{
    error::{Error, Result},
    fs::{File, FileSystem, ImapFileSystem},
    info::{FileInfo, FileType},
    mailbox::{ImapMailbox, Mailbox, MemoryMailbox},
    registry::Registry,
};
