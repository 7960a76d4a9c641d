//! Newest-first bookmark list reconciled from a snapshot and live changes.
//!
//! Correctness rests on id-based duplicate suppression alone: the same row
//! may arrive from the snapshot, from a local insert and from the change
//! feed, in any order, and the list still holds it once. Deletes and updates
//! for rows that are not present are no-ops.

use super::{Bookmark, BookmarkChange, BookmarkId, UserId};

/// Why a change left the list untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The inserted row belongs to another owner.
    ForeignOwner,
    /// A row with the same id is already listed.
    Duplicate,
    /// No row with the given id is listed.
    NotPresent,
}

/// Effect of applying one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange {
    /// The row was added at the head.
    Prepended(Bookmark),
    /// The listed row was replaced in place.
    Replaced(Bookmark),
    /// The listed row was removed.
    Removed(BookmarkId),
    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl ListChange {
    /// Whether the list was modified.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// Ordered bookmarks for one owner.
///
/// # Examples
/// ```
/// use bookmark_backend::domain::{BookmarkList, UserId};
///
/// let list = BookmarkList::new(UserId::random());
/// assert!(list.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkList {
    owner: UserId,
    entries: Vec<Bookmark>,
}

impl BookmarkList {
    /// Empty list for `owner`.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            entries: Vec::new(),
        }
    }

    /// Seed from a fetched snapshot. The fetch already orders rows newest
    /// first, so order is kept; foreign rows and repeated ids are dropped.
    pub fn from_snapshot(owner: UserId, snapshot: Vec<Bookmark>) -> Self {
        let mut list = Self::new(owner);
        for bookmark in snapshot {
            if bookmark.user_id == list.owner && !list.contains(&bookmark.id) {
                list.entries.push(bookmark);
            }
        }
        list
    }

    /// Owner the list is scoped to.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[Bookmark] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a row with `id` is listed.
    pub fn contains(&self, id: &BookmarkId) -> bool {
        self.position(id).is_some()
    }

    /// Apply a live notification.
    pub fn apply(&mut self, change: BookmarkChange) -> ListChange {
        match change {
            BookmarkChange::Inserted(bookmark) => self.insert(bookmark),
            BookmarkChange::Updated(bookmark) => self.replace(bookmark),
            BookmarkChange::Deleted { id } => self.remove(&id),
        }
    }

    /// Prepend a row unless it is foreign or already listed. Used for both
    /// feed inserts and optimistic local inserts.
    pub fn insert(&mut self, bookmark: Bookmark) -> ListChange {
        if bookmark.user_id != self.owner {
            return ListChange::Ignored(IgnoreReason::ForeignOwner);
        }
        if self.contains(&bookmark.id) {
            return ListChange::Ignored(IgnoreReason::Duplicate);
        }
        self.entries.insert(0, bookmark.clone());
        ListChange::Prepended(bookmark)
    }

    /// Remove the row with `id`, if listed.
    pub fn remove(&mut self, id: &BookmarkId) -> ListChange {
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                ListChange::Removed(id.clone())
            }
            None => ListChange::Ignored(IgnoreReason::NotPresent),
        }
    }

    fn replace(&mut self, bookmark: Bookmark) -> ListChange {
        let Some(slot) = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == bookmark.id)
        else {
            return ListChange::Ignored(IgnoreReason::NotPresent);
        };
        *slot = bookmark.clone();
        ListChange::Replaced(bookmark)
    }

    fn position(&self, id: &BookmarkId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }
}
