//! # Message module
//!
//! Module dedicated to the parsing of raw messages into the
//! attachments exposed as files.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use mail_parser::{MessageParser, MimeHeaders};
use tracing::{debug, warn};

use crate::mailbox::RawMessage;

/// A message attachment, addressable by its file name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    pub filename: String,
    /// The decoded content of the attachment.
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A parsed message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    pub uid: u32,

    /// The internal date of the message, or its `Date` header when
    /// the mailbox does not provide one.
    pub created: Option<DateTime<FixedOffset>>,

    /// The named attachments, in order of appearance.
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Find the attachment matching the given file name.
    pub fn attachment(&self, filename: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.filename == filename)
    }
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        let uid = raw.uid;

        let Some(parsed) = MessageParser::default().parse(raw.body.as_slice()) else {
            warn!("cannot parse message {uid}, exposing it without attachments");
            return Self {
                uid,
                created: raw.internal_date,
                ..Default::default()
            };
        };

        let created = raw.internal_date.or_else(|| {
            let date = parsed.date()?;
            let date = Utc.timestamp_opt(date.to_timestamp(), 0).single()?;
            Some(date.into())
        });

        let mut attachments: Vec<Attachment> = Vec::new();

        for part in parsed.attachments() {
            let Some(filename) = part.attachment_name() else {
                debug!("skipping unnamed attachment of message {uid}");
                continue;
            };

            // slashes would break the path hierarchy
            let filename = filename.replace('/', "_");

            if attachments.iter().any(|a| a.filename == filename) {
                warn!("duplicate attachment {filename} in message {uid}, keeping the first one");
                continue;
            }

            attachments.push(Attachment {
                filename,
                content: part.contents().to_vec(),
            });
        }

        debug!("parsed {} attachments from message {uid}", attachments.len());

        Self {
            uid,
            created,
            attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset};
    use mail_builder::MessageBuilder;

    use crate::mailbox::RawMessage;

    use super::Message;

    fn raw(body: Vec<u8>, internal_date: Option<DateTime<FixedOffset>>) -> RawMessage {
        RawMessage {
            uid: 7,
            internal_date,
            body,
        }
    }

    #[test]
    fn parse_attachments() {
        let body = MessageBuilder::new()
            .from("alice@localhost")
            .to("bob@localhost")
            .subject("attachments")
            .text_body("Hello, world!")
            .attachment("text/csv", "a.csv", b"id,name\r\n0,user0\r\n".to_vec())
            .attachment("application/octet-stream", "dir/b.bin", vec![0u8, 1, 2, 255])
            .attachment("text/plain", "a.csv", b"duplicate".to_vec())
            .write_to_vec()
            .unwrap();

        let date = DateTime::parse_from_rfc3339("2024-01-02T03:04:05+01:00").unwrap();
        let message = Message::from(raw(body, Some(date)));

        assert_eq!(message.uid, 7);
        assert_eq!(message.created, Some(date));
        assert_eq!(message.attachments.len(), 2);

        let a = message.attachment("a.csv").unwrap();
        assert_eq!(a.content, b"id,name\r\n0,user0\r\n");
        assert_eq!(a.size(), 18);

        let b = message.attachment("dir_b.bin").unwrap();
        assert_eq!(b.content, vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn date_header_fallback() {
        let body = concat!(
            "From: alice@localhost\r\n",
            "To: bob@localhost\r\n",
            "Date: Tue, 02 Jan 2024 03:04:05 +0000\r\n",
            "Subject: no attachment\r\n",
            "\r\n",
            "Hello, world!\r\n",
        );

        let message = Message::from(raw(body.as_bytes().to_vec(), None));
        let expected = DateTime::parse_from_rfc3339("2024-01-02T03:04:05+00:00").unwrap();

        assert_eq!(message.created, Some(expected));
        assert!(message.attachments.is_empty());
    }
}
