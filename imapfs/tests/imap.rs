//! Live tests against a real IMAP server.
//!
//! The server is configured with the environment variables
//! `IMAP_HOST`, `IMAP_PORT` (optional), `IMAP_USERNAME` and
//! `IMAP_PASSWORD`, which can be set in a `.env` file. Run with
//! `cargo test -- --ignored`.

use std::env;

use imapfs::{
    config::{Encryption, ImapConfig, Secret},
    mailbox::imap::build_session,
    FileSystem, FileType, ImapFileSystem, Registry,
};
use mail_builder::MessageBuilder;

const TEST_FOLDER: &str = "imapfs-live-test";

fn config() -> ImapConfig {
    dotenvy::dotenv().ok();

    ImapConfig {
        host: env::var("IMAP_HOST").expect("IMAP_HOST should be set"),
        port: env::var("IMAP_PORT").ok().and_then(|port| port.parse().ok()),
        encryption: Some(Encryption::Tls),
        login: env::var("IMAP_USERNAME").expect("IMAP_USERNAME should be set"),
        password: Secret::new_raw(env::var("IMAP_PASSWORD").expect("IMAP_PASSWORD should be set")),
    }
}

fn message() -> Vec<u8> {
    MessageBuilder::new()
        .from("alice@localhost")
        .to("bob@localhost")
        .subject("imapfs live test")
        .text_body("see attachment")
        .attachment("text/csv", "test_0.csv", b"id,name\r\n0,user0\r\n".to_vec())
        .write_to_vec()
        .unwrap()
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
#[ignore = "requires a live IMAP server"]
async fn live_imap_filesystem() {
    let config = config();
    let passwd = config.build_credentials().await.unwrap();

    // setting up the test folder

    let mut session = build_session(&config, &passwd).unwrap();
    let _ = session.delete(TEST_FOLDER);
    session.create(TEST_FOLDER).unwrap();
    session.append(TEST_FOLDER, &message()).finish().unwrap();

    // browsing the mailbox

    let fs = ImapFileSystem::new(config.clone()).await.unwrap();

    let names = fs.ls_names("/").await.unwrap();
    assert!(names.contains(&TEST_FOLDER.to_owned()));

    let entries = fs.ls(TEST_FOLDER).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, TEST_FOLDER);
    assert_eq!(entries[1].kind, FileType::Directory);

    let message = entries[1].name.clone();
    let csv = format!("{message}/test_0.csv");

    let entries = fs.ls(&message).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, csv);
    assert_eq!(entries[0].size, 18);

    assert_eq!(fs.read_text(&csv).await.unwrap(), "id,name\r\n0,user0\r\n");
    assert!(fs.created(&csv).await.is_ok());
    assert!(fs.ls(&format!("{TEST_FOLDER}/{}", u32::MAX)).await.unwrap_err().is_not_found());

    // the same folder through the registry

    let url = format!(
        "imaps://{}:{}@{}:{}/{TEST_FOLDER}",
        urlencoding::encode(&config.login),
        urlencoding::encode(&passwd),
        config.host,
        config.port(),
    );
    let (fs, path) = Registry::default().url_to_fs(&url).await.unwrap();
    assert_eq!(path, TEST_FOLDER);
    assert_eq!(fs.ls_names(&format!("{path}/*/*.csv")).await.unwrap(), vec![csv]);

    // cleaning up

    session.delete(TEST_FOLDER).unwrap();
    session.logout().unwrap();
}
