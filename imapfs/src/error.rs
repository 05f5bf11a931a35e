use std::{io, result, string::FromUtf8Error};

use thiserror::Error;
use tokio::task::JoinError;

/// The global `Result` alias of the library.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the library.
#[derive(Debug, Error)]
pub enum Error {
    // filesystem
    #[error("cannot find {0}: no such file or directory")]
    NotFound(String),
    #[error("cannot read {0}: is a directory")]
    IsADirectory(String),
    #[error("cannot get timestamp of {0}: only messages and attachments have one")]
    TimestampUnavailable(String),
    #[error("cannot read text from {1}: invalid UTF-8")]
    ReadTextError(#[source] FromUtf8Error, String),
    #[error("cannot compile glob pattern {1}")]
    CompileGlobError(#[source] regex::Error, String),

    // mailbox
    #[error("cannot find IMAP folder {0}")]
    FolderNotFound(String),
    #[error("cannot connect to IMAP server {1}:{2}")]
    ConnectImapError(#[source] imap::Error, String, u16),
    #[error("cannot login to IMAP server as {1}")]
    LoginImapError(#[source] imap::Error, String),
    #[error("cannot list IMAP folders")]
    ListFoldersImapError(#[source] imap::Error),
    #[error("cannot select IMAP folder {1}")]
    SelectFolderImapError(#[source] imap::Error, String),
    #[error("cannot search IMAP messages in folder {1}")]
    SearchUidsImapError(#[source] imap::Error, String),
    #[error("cannot fetch IMAP message {2} from folder {1}")]
    FetchMessageImapError(#[source] imap::Error, String, u32),
    #[error("cannot run IMAP task")]
    JoinTaskError(#[source] JoinError),

    // config
    #[error("cannot get IMAP password")]
    GetPasswordError(#[source] secret::Error),
    #[error("cannot get IMAP password: password is empty")]
    GetPasswordEmptyError,
    #[error("cannot build IMAP filesystem: missing storage option {0}")]
    MissingOptionError(String),
    #[error("cannot build IMAP filesystem: invalid value {1} for storage option {0}")]
    InvalidOptionError(String, String),
    #[error("cannot parse filesystem url {1}")]
    ParseUrlError(#[source] url::ParseError, String),
    #[error("cannot parse filesystem url {0}: missing host")]
    ParseUrlMissingHostError(String),
    #[error("cannot decode filesystem url {1}")]
    DecodeUrlError(#[source] std::string::FromUtf8Error, String),
    #[error("cannot find filesystem implementation for protocol {0}")]
    UnknownProtocolError(String),
}

impl Error {
    /// Return `true` if the error means that the targeted path, or
    /// the requested information about it, does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::FolderNotFound(_) | Self::TimestampUnavailable(_)
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::NotFound(_) | Error::FolderNotFound(_) | Error::TimestampUnavailable(_) => {
                io::ErrorKind::NotFound
            }
            Error::IsADirectory(_) => io::ErrorKind::Unsupported,
            Error::ReadTextError(..) => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };

        io::Error::new(kind, err)
    }
}
