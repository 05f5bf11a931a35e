//! # IMAP mailbox
//!
//! The [`Mailbox`] implementation talking to a remote IMAP server,
//! using the [`imap`] crate. The client being synchronous, every
//! action is executed on the blocking thread pool while holding the
//! session lock.

use std::sync::Arc;

use async_trait::async_trait;
use imap_proto::NameAttribute;
use imap::{Client, ImapConnection, Session, TlsKind};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn, Level};
use utf7_imap::{decode_utf7_imap as decode_utf7, encode_utf7_imap as encode_utf7};

use crate::{config::ImapConfig, path, Error, Result};

use super::{Folder, Mailbox, RawMessage};

/// The IMAP query used to fetch a whole message without marking it
/// as seen.
const FETCH_MESSAGE_QUERY: &str = "(UID INTERNALDATE BODY.PEEK[])";

/// The IMAP session alias.
pub type ImapSession = Session<Box<dyn ImapConnection>>;

/// The IMAP mailbox.
///
/// Holds one authenticated session, shared behind a mutex so the
/// mailbox can be used from multiple tasks.
#[derive(Clone, Debug)]
pub struct ImapMailbox {
    config: Arc<ImapConfig>,
    session: Arc<Mutex<SessionGuard>>,
}

/// Session wrapper logging out when dropped.
#[derive(Debug)]
struct SessionGuard {
    session: ImapSession,
    /// Mapping from server folder names to filesystem folder names,
    /// refreshed on every folder listing.
    names: Vec<(String, String)>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(err) = self.session.logout() {
            debug!("cannot logout from imap session: {err}");
            debug!("{err:?}");
        }
    }
}

impl SessionGuard {
    /// Find the server name of the given filesystem folder name.
    ///
    /// Falls back to encoding the name using the slash as delimiter
    /// when folders have not been listed yet.
    fn server_name(&self, folder: &str) -> String {
        self.names
            .iter()
            .find(|(_, name)| name == folder)
            .map(|(server, _)| server.clone())
            .unwrap_or_else(|| encode_utf7(folder.to_owned()))
    }
}

impl ImapMailbox {
    /// Connect and login to the IMAP server described by the given
    /// configuration.
    pub async fn new(config: ImapConfig) -> Result<Self> {
        info!("building new imap mailbox for {}", config.host);

        let passwd = config.build_credentials().await?;
        let config = Arc::new(config);

        let session = {
            let config = config.clone();
            tokio::task::spawn_blocking(move || build_session(&config, &passwd))
                .await
                .map_err(Error::JoinTaskError)??
        };

        let session = SessionGuard {
            session,
            names: Vec::new(),
        };

        Ok(Self {
            config,
            session: Arc::new(Mutex::new(session)),
        })
    }

    /// The configuration the mailbox was built with.
    pub fn config(&self) -> &ImapConfig {
        &self.config
    }

    /// Execute the given action on the current IMAP session, from
    /// the blocking thread pool.
    async fn execute<T, F>(&self, action: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SessionGuard) -> Result<T> + Send + 'static,
    {
        let mut session = self.session.clone().lock_owned().await;

        tokio::task::spawn_blocking(move || action(&mut *session))
            .await
            .map_err(Error::JoinTaskError)?
    }
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn list_folders(&self) -> Result<Vec<Folder>> {
        info!("listing imap folders");

        self.execute(|guard| {
            let names = guard
                .session
                .list(Some(""), Some("*"))
                .map_err(Error::ListFoldersImapError)?;

            let mut mapping = Vec::new();
            let mut folders = Vec::new();

            for name in names.iter() {
                let Some(folder) = to_folder(name.name(), name.delimiter(), name.attributes())
                else {
                    continue;
                };

                mapping.push((name.name().to_owned(), folder.name.clone()));
                folders.push(folder);
            }

            guard.names = mapping;
            debug!("imap folders: {folders:#?}");

            Ok(folders)
        })
        .await
    }

    async fn list_uids(&self, folder: &str) -> Result<Vec<u32>> {
        info!("listing imap message uids from folder {folder}");

        let folder = folder.to_owned();

        self.execute(move |guard| {
            select(guard, &folder)?;

            let mut uids: Vec<u32> = guard
                .session
                .uid_search("ALL")
                .map_err(|err| Error::SearchUidsImapError(err, folder.clone()))?
                .into_iter()
                .collect();
            uids.sort_unstable();

            debug!("found {} messages in imap folder {folder}", uids.len());
            trace!("uids: {uids:?}");

            Ok(uids)
        })
        .await
    }

    async fn fetch_message(&self, folder: &str, uid: u32) -> Result<Option<RawMessage>> {
        info!("fetching imap message {uid} from folder {folder}");

        let folder = folder.to_owned();

        self.execute(move |guard| {
            select(guard, &folder)?;

            let fetches = guard
                .session
                .uid_fetch(uid.to_string(), FETCH_MESSAGE_QUERY)
                .map_err(|err| Error::FetchMessageImapError(err, folder.clone(), uid))?;

            // servers may answer a fetch of an unknown UID with the
            // closest message, hence the UID check
            let message = fetches
                .iter()
                .find(|fetch| fetch.uid == Some(uid))
                .and_then(|fetch| {
                    let Some(body) = fetch.body() else {
                        warn!("imap message {uid} from folder {folder} has no body, skipping it");
                        return None;
                    };

                    Some(RawMessage {
                        uid,
                        internal_date: fetch.internal_date(),
                        body: body.to_vec(),
                    })
                });

            if message.is_none() {
                debug!("imap message {uid} not found in folder {folder}");
            }

            Ok(message)
        })
        .await
    }
}

/// Build a filesystem folder from an IMAP LIST response.
///
/// The name is decoded from modified UTF-7 and the server hierarchy
/// delimiter is replaced by `/`. Returns [`None`] for the empty root
/// name some servers list.
fn to_folder(name: &str, delimiter: Option<&str>, attributes: &[NameAttribute]) -> Option<Folder> {
    let decoded = decode_utf7(name.to_owned());

    let folder = match delimiter {
        Some(delim) if delim != "/" && !delim.is_empty() => {
            if decoded.contains('/') {
                warn!("imap folder {decoded} contains a slash, hierarchy may be ambiguous");
            }
            decoded.replace(delim, "/")
        }
        _ => decoded,
    };
    let folder = path::normalize(&folder);

    if folder.is_empty() {
        return None;
    }

    let selectable = !attributes.contains(&NameAttribute::NoSelect);
    Some(Folder::new(folder).with_selectable(selectable))
}

/// Select the given filesystem folder. A `NO` response from the
/// server means that the folder does not exist or cannot be
/// selected.
fn select(guard: &mut SessionGuard, folder: &str) -> Result<()> {
    let server_name = guard.server_name(folder);
    debug!("selecting imap folder {server_name}");

    match guard.session.select(&server_name) {
        Ok(mailbox) => {
            trace!("selected imap folder: {mailbox:?}");
            Ok(())
        }
        Err(imap::Error::No(no)) => {
            debug!("cannot select imap folder {server_name}: {}", no.information);
            Err(Error::FolderNotFound(folder.to_owned()))
        }
        Err(err) => Err(Error::SelectFolderImapError(err, folder.to_owned())),
    }
}

/// Create a new authenticated session from an IMAP configuration and
/// a password.
pub fn build_session(config: &ImapConfig, passwd: &str) -> Result<ImapSession> {
    debug!("creating session using login and password");

    let mut session = build_client(config)?
        .login(&config.login, passwd)
        .map_err(|(err, _client)| Error::LoginImapError(err, config.login.clone()))?;

    session.debug = tracing::enabled!(Level::TRACE);

    Ok(session)
}

/// Create a client from an IMAP configuration.
fn build_client(config: &ImapConfig) -> Result<Client<Box<dyn ImapConnection>>> {
    let host = &config.host;
    let port = config.port();
    debug!("connecting to imap server {host}:{port} using {}", config.encryption());

    let client = imap::ClientBuilder::new(host, port)
        .tls_kind(TlsKind::Rust)
        .mode(config.encryption().into())
        .connect()
        .map_err(|err| Error::ConnectImapError(err, host.clone(), port))?;

    Ok(client)
}
