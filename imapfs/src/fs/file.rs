use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom};

use crate::info::FileInfo;

/// A file opened for reading.
///
/// The content is fully fetched when the file is opened, reading and
/// seeking never hit the mailbox.
#[derive(Clone, Debug)]
pub struct File {
    info: FileInfo,
    cursor: Cursor<Vec<u8>>,
}

impl File {
    pub fn new(info: FileInfo, content: Vec<u8>) -> Self {
        Self {
            info,
            cursor: Cursor::new(content),
        }
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// The current position of the reader.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl BufRead for File {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.cursor.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.cursor.consume(amt)
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}
