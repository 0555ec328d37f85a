//! Dense indices for user and item identifiers.
//!
//! Users become matrix rows and items become matrix columns. The target user
//! always owns row 0 ([`TARGET_ROW`]); community users follow in the order they
//! first appear in the log. Both directions of each mapping are stored, so
//! turning a row back into a user id is a plain index, never a search.

use data_loader::{ItemId, RatingLog, UserId};
use std::collections::HashMap;

/// Row reserved for the target user
pub const TARGET_ROW: usize = 0;

/// Bijective mappings user id <-> row and item id <-> column for one run.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    user_rows: HashMap<UserId, usize>,
    item_cols: HashMap<ItemId, usize>,
    /// row -> user id
    users: Vec<UserId>,
    /// column -> item id
    items: Vec<ItemId>,
}

impl IdentityIndex {
    /// Build the index from the combined log.
    ///
    /// - items: first-seen order over the whole log (community, then target)
    /// - users: target at row 0, then community users in first-seen order;
    ///   a community record carrying the target's id does not get its own row
    ///
    /// An empty log gives an empty index, target included.
    pub fn build(log: &RatingLog) -> Self {
        let mut index = Self::default();
        if log.is_empty() {
            return index;
        }

        index.push_user(log.target_user());
        for record in log.community() {
            if !index.user_rows.contains_key(record.user_id.as_str()) {
                index.push_user(&record.user_id);
            }
        }

        for record in log.combined() {
            if !index.item_cols.contains_key(&record.item_id) {
                index.item_cols.insert(record.item_id, index.items.len());
                index.items.push(record.item_id);
            }
        }

        index
    }

    fn push_user(&mut self, user_id: &str) {
        self.user_rows.insert(user_id.to_string(), self.users.len());
        self.users.push(user_id.to_string());
    }

    /// Row of a user, if the user appears in the log
    pub fn row(&self, user_id: &str) -> Option<usize> {
        self.user_rows.get(user_id).copied()
    }

    /// Column of an item, if the item appears in the log
    pub fn col(&self, item_id: ItemId) -> Option<usize> {
        self.item_cols.get(&item_id).copied()
    }

    /// Reverse lookup: row -> user id
    pub fn user_id(&self, row: usize) -> Option<&str> {
        self.users.get(row).map(String::as_str)
    }

    /// Reverse lookup: column -> item id
    pub fn item_id(&self, col: usize) -> Option<ItemId> {
        self.items.get(col).copied()
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
