//! # Path module
//!
//! Module dedicated to the mapping between filesystem paths and
//! mailbox entities. A path is made of a folder name (which can
//! contain slashes), then optionally a message UID, then optionally
//! an attachment file name:
//!
//! ```text
//! INBOX                       folder
//! Archive/2024                folder (hierarchy)
//! Archive/2024/42             message UID 42 of folder Archive/2024
//! Archive/2024/42/report.csv  attachment of that message
//! ```

use std::collections::BTreeSet;

use crate::{mailbox::Folder, Error, Result};

/// The path separator used by the filesystem.
pub const SEP: char = '/';

/// Characters turning a path into a glob pattern.
const MAGIC_CHARS: [char; 3] = ['*', '?', '['];

/// Normalize the given path.
///
/// Leading and trailing slashes are removed, as well as empty
/// components. The root is represented by the empty string.
pub fn normalize(path: &str) -> String {
    components(path).join("/")
}

/// Split the given path into its non-empty components.
pub fn components(path: &str) -> Vec<&str> {
    path.split(SEP).filter(|c| !c.is_empty()).collect()
}

/// Join a normalized parent path with a child name.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}{SEP}{child}")
    }
}

/// Return the parent of a normalized path, or [`None`] for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }

    match path.rsplit_once(SEP) {
        Some((parent, _)) => Some(parent),
        None => Some(""),
    }
}

/// Return the last component of a normalized path.
pub fn basename(path: &str) -> &str {
    match path.rsplit_once(SEP) {
        Some((_, name)) => name,
        None => path,
    }
}

/// Return `true` if the given path contains glob characters.
pub fn has_magic(path: &str) -> bool {
    path.contains(MAGIC_CHARS)
}

/// Return `true` if the given path contains `*` or `?`.
pub fn has_wildcard(path: &str) -> bool {
    path.contains(['*', '?'])
}

/// The mailbox entity a path points to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    /// The root directory, containing top-level folders.
    Root,

    /// A folder directory, containing sub-folders and messages.
    Folder(String),

    /// A message directory, containing attachments.
    Message { folder: String, uid: u32 },

    /// An attachment file.
    Attachment {
        folder: String,
        uid: u32,
        filename: String,
    },
}

impl Node {
    /// Return `true` if the node is a directory.
    pub fn is_dir(&self) -> bool {
        !matches!(self, Self::Attachment { .. })
    }
}

/// The folder tree of a mailbox, as seen by the filesystem.
///
/// Contains every folder returned by the server plus the folders
/// implied by the hierarchy: `a` exists as soon as `a/b` exists.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FolderTree {
    dirs: BTreeSet<String>,
    selectable: BTreeSet<String>,
}

impl FolderTree {
    pub fn new(folders: &[Folder]) -> Self {
        let mut tree = Self::default();

        for folder in folders {
            let name = normalize(&folder.name);

            if name.is_empty() {
                continue;
            }

            if folder.selectable {
                tree.selectable.insert(name.clone());
            }

            let mut current = Some(name.as_str());
            while let Some(dir) = current.filter(|dir| !dir.is_empty()) {
                tree.dirs.insert(dir.to_owned());
                current = parent(dir);
            }
        }

        tree
    }

    /// Return `true` if the given normalized path is a folder.
    pub fn contains(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    /// Return `true` if the given folder can contain messages.
    pub fn is_selectable(&self, name: &str) -> bool {
        self.selectable.contains(name)
    }

    /// Return the direct sub-folders of the given normalized path,
    /// sorted by name.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.dirs
            .iter()
            .map(String::as_str)
            .filter(move |dir| parent(dir) == Some(name))
    }

    /// Resolve the given path into a mailbox [`Node`].
    ///
    /// Since folder names can contain slashes, the longest leading
    /// components naming a folder win: a sub-folder called `42`
    /// shadows the message with UID 42.
    pub fn resolve(&self, path: &str) -> Result<Node> {
        let path = normalize(path);
        let parts = components(&path);

        if parts.is_empty() {
            return Ok(Node::Root);
        }

        let not_found = || Error::NotFound(path.clone());

        let depth = (1..=parts.len())
            .rev()
            .find(|depth| self.contains(&parts[..*depth].join("/")))
            .ok_or_else(not_found)?;

        let folder = parts[..depth].join("/");

        match &parts[depth..] {
            [] => Ok(Node::Folder(folder)),
            [uid] if self.is_selectable(&folder) => {
                let uid = parse_uid(uid).ok_or_else(not_found)?;
                Ok(Node::Message { folder, uid })
            }
            [uid, filename] if self.is_selectable(&folder) => {
                let uid = parse_uid(uid).ok_or_else(not_found)?;
                let filename = filename.to_string();
                Ok(Node::Attachment {
                    folder,
                    uid,
                    filename,
                })
            }
            _ => Err(not_found()),
        }
    }
}

/// Parse an IMAP UID, which is a non-zero unsigned 32-bit integer.
fn parse_uid(uid: &str) -> Option<u32> {
    if !uid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    uid.parse().ok().filter(|uid| *uid > 0)
}

#[cfg(test)]
mod tests {
    use crate::mailbox::Folder;

    use super::*;

    fn tree() -> FolderTree {
        FolderTree::new(&[
            Folder::new("INBOX"),
            Folder::new("Archive/2024"),
            Folder::new("Archive/2024/42"),
            Folder::new("[Gmail]").with_selectable(false),
            Folder::new("[Gmail]/Sent"),
        ])
    }

    #[test]
    fn normalize_slashes() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("INBOX"), "INBOX");
        assert_eq!(normalize("/INBOX"), "INBOX");
        assert_eq!(normalize("INBOX/"), "INBOX");
        assert_eq!(normalize("//INBOX//1/"), "INBOX/1");
    }

    #[test]
    fn path_helpers() {
        assert_eq!(join("", "INBOX"), "INBOX");
        assert_eq!(join("INBOX", "1"), "INBOX/1");
        assert_eq!(parent(""), None);
        assert_eq!(parent("INBOX"), Some(""));
        assert_eq!(parent("INBOX/1/a.csv"), Some("INBOX/1"));
        assert_eq!(basename("INBOX/1/a.csv"), "a.csv");
        assert_eq!(basename("INBOX"), "INBOX");
        assert!(has_magic("INBOX/*"));
        assert!(has_magic("INBOX/?"));
        assert!(has_magic("INBOX/[0-9]"));
        assert!(!has_magic("INBOX/1"));
        assert!(has_wildcard("[Gmail]/*"));
        assert!(!has_wildcard("[Gmail]/Sent Mail"));
    }

    #[test]
    fn implied_folders() {
        let tree = tree();
        assert!(tree.contains("Archive"));
        assert!(!tree.is_selectable("Archive"));
        assert!(tree.is_selectable("Archive/2024"));

        let roots: Vec<_> = tree.children("").collect();
        assert_eq!(roots, vec!["Archive", "INBOX", "[Gmail]"]);

        let children: Vec<_> = tree.children("Archive/2024").collect();
        assert_eq!(children, vec!["Archive/2024/42"]);
    }

    #[test]
    fn resolve_nodes() {
        let tree = tree();

        assert_eq!(tree.resolve("/").unwrap(), Node::Root);
        assert_eq!(
            tree.resolve("/INBOX/").unwrap(),
            Node::Folder("INBOX".into())
        );
        assert_eq!(
            tree.resolve("INBOX/7").unwrap(),
            Node::Message {
                folder: "INBOX".into(),
                uid: 7
            }
        );
        assert_eq!(
            tree.resolve("Archive/2024/7/a.csv").unwrap(),
            Node::Attachment {
                folder: "Archive/2024".into(),
                uid: 7,
                filename: "a.csv".into(),
            }
        );
    }

    #[test]
    fn resolve_prefers_longest_folder() {
        let tree = tree();

        assert_eq!(
            tree.resolve("Archive/2024/42").unwrap(),
            Node::Folder("Archive/2024/42".into())
        );
        assert_eq!(
            tree.resolve("Archive/2024/42/1").unwrap(),
            Node::Message {
                folder: "Archive/2024/42".into(),
                uid: 1
            }
        );
    }

    #[test]
    fn resolve_not_found() {
        let tree = tree();

        for path in [
            "Unknown",
            "/Unknown/",
            "Unknown/Unknown",
            "INBOX/not-a-uid",
            "INBOX/0",
            "INBOX/4294967296",
            "INBOX/+1",
            "INBOX/1/a.csv/b",
            "Archive/1",
            "[Gmail]/1",
        ] {
            let err = tree.resolve(path).unwrap_err();
            assert!(err.is_not_found(), "{path} should not be found");
        }
    }

    #[test]
    fn resolve_max_uid() {
        assert_eq!(
            tree().resolve("INBOX/4294967295").unwrap(),
            Node::Message {
                folder: "INBOX".into(),
                uid: u32::MAX
            }
        );
    }
}
