//! Key-indexed row storage for one relation.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;

use quickchat_shared::{Identity, Message, User};

/// A row type that can live in a [`Table`].
pub trait TableRow: Clone + Debug {
    type Key: Clone + Eq + Hash + Debug;

    fn primary_key(&self) -> Self::Key;
}

impl TableRow for User {
    type Key = Identity;

    fn primary_key(&self) -> Identity {
        self.identity
    }
}

/// `Message` has no primary key, so the whole row is its identity.
impl TableRow for Message {
    type Key = Message;

    fn primary_key(&self) -> Message {
        self.clone()
    }
}

/// Rows of a single relation, at most one per key.
///
/// Enumeration follows arrival order.  Overwriting a key keeps the row's
/// original position; deleting shifts later rows down.
#[derive(Debug, Clone)]
pub struct Table<R: TableRow> {
    rows: IndexMap<R::Key, R>,
}

impl<R: TableRow> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: IndexMap::new(),
        }
    }
}

impl<R: TableRow> Table<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `row`, overwriting the row with the same key.
    /// Returns the previous row, if any.
    pub fn insert(&mut self, row: R) -> Option<R> {
        self.rows.insert(row.primary_key(), row)
    }

    /// Full replace of the row stored under `old_key`.
    ///
    /// If the new row carries a different key the old entry is removed and
    /// the new one appended.  Returns the replaced row.
    pub fn update(&mut self, old_key: &R::Key, row: R) -> Option<R> {
        let new_key = row.primary_key();
        if &new_key == old_key {
            return self.rows.insert(new_key, row);
        }
        let previous = self.rows.shift_remove(old_key);
        self.rows.insert(new_key, row);
        previous
    }

    pub fn delete(&mut self, key: &R::Key) -> Option<R> {
        self.rows.shift_remove(key)
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    /// Rows matching `predicate`, in arrival order.
    pub fn filter<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = &'a R> + 'a
    where
        F: Fn(&R) -> bool + 'a,
    {
        self.rows.values().filter(move |row| predicate(*row))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickchat_shared::Timestamp;

    fn user(byte: u8, name: Option<&str>, online: bool) -> User {
        User {
            identity: Identity::from_bytes([byte; 32]),
            name: name.map(String::from),
            online,
        }
    }

    #[test]
    fn test_insert_overwrites_by_key() {
        let mut table = Table::new();
        assert!(table.insert(user(1, None, true)).is_none());
        let previous = table.insert(user(1, Some("bob"), false)).unwrap();

        assert_eq!(previous.name, None);
        assert_eq!(table.len(), 1);
        let stored = table.get(&Identity::from_bytes([1; 32])).unwrap();
        assert_eq!(stored.name.as_deref(), Some("bob"));
        assert!(!stored.online);
    }

    #[test]
    fn test_key_uniqueness_under_mixed_events() {
        let mut table = Table::new();
        let ops: Vec<(bool, User)> = vec![
            (true, user(1, None, true)),
            (true, user(2, None, true)),
            (false, user(1, Some("a"), true)),
            (true, user(2, Some("b"), false)),
            (false, user(2, Some("c"), true)),
            (true, user(1, None, false)),
        ];

        for (is_insert, row) in ops {
            if is_insert {
                table.insert(row);
            } else {
                let key = row.identity;
                table.update(&key, row);
            }
            let mut keys: Vec<_> = table.iter().map(|u| u.identity).collect();
            let before = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), before);
            assert!(table.len() <= 2);
        }
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_overwrite_keeps_arrival_position() {
        let mut table = Table::new();
        table.insert(user(1, None, true));
        table.insert(user(2, None, true));
        table.insert(user(1, Some("first"), true));

        let order: Vec<_> = table.iter().map(|u| u.identity.as_bytes()[0]).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn test_update_with_changed_key() {
        let mut table = Table::new();
        table.insert(user(1, None, true));
        let old_key = Identity::from_bytes([1; 32]);
        table.update(&old_key, user(3, None, true));

        assert!(!table.contains(&old_key));
        assert!(table.contains(&Identity::from_bytes([3; 32])));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_delete_and_filter() {
        let mut table = Table::new();
        table.insert(user(1, None, true));
        table.insert(user(2, None, false));
        table.insert(user(3, None, true));

        let online: Vec<_> = table.filter(|u| u.online).map(|u| u.identity).collect();
        assert_eq!(online.len(), 2);

        assert!(table.delete(&Identity::from_bytes([1; 32])).is_some());
        assert!(table.delete(&Identity::from_bytes([1; 32])).is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_identical_messages_share_a_key() {
        let mut table = Table::new();
        let msg = Message {
            sender: Identity::from_bytes([9; 32]),
            sent: Timestamp::from_micros(1),
            text: "hi".into(),
        };
        assert!(table.insert(msg.clone()).is_none());
        assert!(table.insert(msg).is_some());
        assert_eq!(table.len(), 1);
    }
}
