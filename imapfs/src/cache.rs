//! # Cache module
//!
//! In-memory cache of the IMAP filesystem: the folder tree, the
//! directory listings and the parsed messages. Entries optionally
//! expire after a configured duration.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::trace;

use crate::{config::CacheConfig, info::FileInfo, message::Message, path, path::FolderTree};

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn get(&self, expiry: Option<Duration>) -> Option<T> {
        match expiry {
            Some(expiry) if self.inserted_at.elapsed() >= expiry => None,
            _ => Some(self.value.clone()),
        }
    }
}

type MessageKey = (String, u32);

/// The filesystem cache.
///
/// A disabled cache never stores anything. Messages are evicted in
/// least recently used order once the configured maximum is reached.
#[derive(Debug, Default)]
pub struct Cache {
    config: CacheConfig,
    folders: Option<Entry<Arc<FolderTree>>>,
    listings: HashMap<String, Entry<Arc<Vec<FileInfo>>>>,
    messages: HashMap<MessageKey, Entry<Arc<Message>>>,
    /// Message keys, from least to most recently used.
    recent_messages: VecDeque<MessageKey>,
}

impl Cache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.disabled
    }

    pub fn folders(&self) -> Option<Arc<FolderTree>> {
        self.folders.as_ref()?.get(self.config.expiry)
    }

    pub fn set_folders(&mut self, folders: Arc<FolderTree>) {
        if self.is_enabled() {
            self.folders = Some(Entry::new(folders));
        }
    }

    pub fn listing(&self, path: &str) -> Option<Arc<Vec<FileInfo>>> {
        let listing = self.listings.get(path)?.get(self.config.expiry);
        if listing.is_some() {
            trace!("listing cache hit for {path:?}");
        }
        listing
    }

    pub fn set_listing(&mut self, path: String, listing: Arc<Vec<FileInfo>>) {
        if self.is_enabled() {
            self.listings.insert(path, Entry::new(listing));
        }
    }

    pub fn message(&mut self, folder: &str, uid: u32) -> Option<Arc<Message>> {
        let key = (folder.to_owned(), uid);
        let message = self.messages.get(&key)?.get(self.config.expiry)?;
        self.touch_message(key);
        Some(message)
    }

    pub fn set_message(&mut self, folder: String, message: Arc<Message>) {
        if !self.is_enabled() || self.config.max_messages == 0 {
            return;
        }

        let key = (folder, message.uid);
        self.messages.insert(key.clone(), Entry::new(message));
        self.touch_message(key);

        while self.recent_messages.len() > self.config.max_messages {
            if let Some(key) = self.recent_messages.pop_front() {
                trace!("evicting message {key:?} from cache");
                self.messages.remove(&key);
            }
        }
    }

    fn touch_message(&mut self, key: MessageKey) {
        self.recent_messages.retain(|recent| *recent != key);
        self.recent_messages.push_back(key);
    }

    /// Invalidate the given normalized path, its descendants and the
    /// listings of its ancestors. The folder tree is always
    /// invalidated since any path can hide a folder.
    pub fn invalidate(&mut self, target: &str) {
        let is_related = |candidate: &str| {
            candidate == target
                || target.is_empty()
                || candidate.starts_with(&format!("{target}/"))
                || target.starts_with(&format!("{candidate}/"))
                || candidate.is_empty()
        };

        self.folders = None;
        self.listings.retain(|path, _| !is_related(path));
        self.messages
            .retain(|(folder, uid), _| !is_related(&path::join(folder, &uid.to_string())));

        let messages = &self.messages;
        self.recent_messages.retain(|key| messages.contains_key(key));
    }

    pub fn clear(&mut self) {
        self.folders = None;
        self.listings.clear();
        self.messages.clear();
        self.recent_messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use crate::{config::CacheConfig, info::FileInfo, message::Message, path::FolderTree};

    use super::Cache;

    fn listing(name: &str) -> Arc<Vec<FileInfo>> {
        Arc::new(vec![FileInfo::directory(name)])
    }

    fn message(uid: u32) -> Arc<Message> {
        Arc::new(Message {
            uid,
            ..Default::default()
        })
    }

    #[test]
    fn disabled() {
        let mut cache = Cache::new(CacheConfig {
            disabled: true,
            ..Default::default()
        });

        cache.set_folders(Arc::new(FolderTree::default()));
        cache.set_listing("INBOX".into(), listing("INBOX/1"));
        cache.set_message("INBOX".into(), message(1));

        assert!(cache.folders().is_none());
        assert!(cache.listing("INBOX").is_none());
        assert!(cache.message("INBOX", 1).is_none());
    }

    #[test]
    fn expiry() {
        let mut cache = Cache::new(CacheConfig {
            expiry: Some(Duration::from_millis(20)),
            ..Default::default()
        });

        cache.set_listing("INBOX".into(), listing("INBOX/1"));
        assert!(cache.listing("INBOX").is_some());

        thread::sleep(Duration::from_millis(40));
        assert!(cache.listing("INBOX").is_none());
    }

    #[test]
    fn evict_least_recently_used_messages() {
        let mut cache = Cache::new(CacheConfig {
            max_messages: 2,
            ..Default::default()
        });

        cache.set_message("INBOX".into(), message(1));
        cache.set_message("INBOX".into(), message(2));
        assert!(cache.message("INBOX", 1).is_some());

        // 2 is now the least recently used
        cache.set_message("INBOX".into(), message(3));
        assert!(cache.message("INBOX", 2).is_none());
        assert!(cache.message("INBOX", 1).is_some());
        assert!(cache.message("INBOX", 3).is_some());

        let mut cache = Cache::new(CacheConfig {
            max_messages: 0,
            ..Default::default()
        });
        cache.set_message("INBOX".into(), message(1));
        assert!(cache.message("INBOX", 1).is_none());
    }

    #[test]
    fn invalidate() {
        let mut cache = Cache::default();

        cache.set_folders(Arc::new(FolderTree::default()));
        cache.set_listing("".into(), listing("INBOX"));
        cache.set_listing("INBOX".into(), listing("INBOX/1"));
        cache.set_listing("INBOX/1".into(), listing("INBOX/1/a.csv"));
        cache.set_listing("Archive".into(), listing("Archive/1"));
        cache.set_message("INBOX".into(), message(1));
        cache.set_message("Archive".into(), message(1));

        cache.invalidate("INBOX/1");

        assert!(cache.folders().is_none());
        assert!(cache.listing("").is_none());
        assert!(cache.listing("INBOX").is_none());
        assert!(cache.listing("INBOX/1").is_none());
        assert!(cache.message("INBOX", 1).is_none());
        assert!(cache.listing("Archive").is_some());
        assert!(cache.message("Archive", 1).is_some());

        cache.clear();
        assert!(cache.listing("Archive").is_none());
        assert!(cache.message("Archive", 1).is_none());
    }
}
