//! Ordered record storage shared by all workers.
//!
//! Despite the name of the crate this is not a bucketed hash table: records
//! live in one singly linked chain kept in ascending digest order. The chain
//! is backed by a slot vector, so links are indices instead of pointers and
//! freed slots are reused by later inserts.
//!
//! [`RecordStore`] performs no locking of its own. When shared between
//! threads it sits inside a [`crate::lock::TableLock`], and the only way to
//! reach it there is through the guards that lock hands out.

use std::fmt;

use crate::digest::digest;
use crate::error::StoreError;

/// Longest key kept in a record, in bytes.
pub const MAX_KEY_LEN: usize = 49;

/// An immutable copy of one stored record.
///
/// Lookups return these instead of references so callers never hold on to
/// storage after releasing the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub digest: u32,
    pub key: String,
    pub value: u32,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.digest, self.key, self.value)
    }
}

/// Truncates `key` to at most [`MAX_KEY_LEN`] bytes on a char boundary.
pub fn bounded_key(key: &str) -> &str {
    if key.len() <= MAX_KEY_LEN {
        return key;
    }
    let mut end = MAX_KEY_LEN;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    &key[..end]
}

type SlotId = usize;

struct Node {
    record: Record,
    next: Option<SlotId>,
}

/// Singly linked chain of records in non-decreasing digest order.
///
/// Duplicates are detected on digest *and* key, so two keys whose digests
/// collide are stored side by side and remain individually addressable.
#[derive(Default)]
pub struct RecordStore {
    slots: Vec<Option<Node>>,
    free: Vec<SlotId>,
    head: Option<SlotId>,
    len: usize,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a record, keeping the chain sorted by digest.
    ///
    /// The new node becomes the head if the chain is empty or its digest is
    /// less than the head's. Otherwise the scan starts at the second node and
    /// the new node is spliced in front of the first node whose digest is
    /// greater than or equal to its own. A digest equal to the head's
    /// therefore lands after the head, but before any other equal-digest node.
    ///
    /// # Errors
    /// [`StoreError::Duplicate`] if a record with the same digest and key
    /// exists.
    pub fn insert(&mut self, key: &str, value: u32) -> Result<Record, StoreError> {
        let digest = digest(key);
        if self.locate(digest, key).is_some() {
            return Err(StoreError::Duplicate { digest });
        }

        let (mut prev, mut cursor) = match self.head {
            Some(head) if self.node(head).record.digest <= digest => {
                (Some(head), self.node(head).next)
            }
            head => (None, head),
        };
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.record.digest >= digest {
                break;
            }
            prev = Some(id);
            cursor = node.next;
        }

        let record = Record {
            digest,
            key: key.to_string(),
            value,
        };
        let id = self.allocate(Node {
            record: record.clone(),
            next: cursor,
        });
        self.link_after(prev, Some(id));
        self.len += 1;
        Ok(record)
    }

    /// Unlinks and frees the record matching `key`, returning it.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no record matches.
    pub fn delete(&mut self, key: &str) -> Result<Record, StoreError> {
        let digest = digest(key);
        let (prev, id) = self
            .locate(digest, key)
            .ok_or_else(|| not_found(digest, key))?;

        let node = self.slots[id]
            .take()
            .ok_or_else(|| not_found(digest, key))?;
        self.link_after(prev, node.next);
        self.free.push(id);
        self.len -= 1;
        Ok(node.record)
    }

    /// Overwrites the value of the record matching `key` in place.
    ///
    /// Returns the record as it was before the update.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no record matches.
    pub fn update(&mut self, key: &str, value: u32) -> Result<Record, StoreError> {
        let digest = digest(key);
        let (_, id) = self
            .locate(digest, key)
            .ok_or_else(|| not_found(digest, key))?;
        let node = self.slots[id]
            .as_mut()
            .ok_or_else(|| not_found(digest, key))?;
        let before = node.record.clone();
        node.record.value = value;
        Ok(before)
    }

    /// Looks up the record matching `key`.
    pub fn search(&self, key: &str) -> Option<Record> {
        let digest = digest(key);
        self.locate(digest, key)
            .map(|(_, id)| self.node(id).record.clone())
    }

    /// Returns every record in chain order (ascending digest).
    pub fn dump(&self) -> Vec<Record> {
        self.iter().cloned().collect()
    }

    /// Walks the chain from the head.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
        }
    }

    /// Releases every record.
    ///
    /// Takes the store by value: a store shared through a lock can only be
    /// destroyed once the lock itself has been taken apart.
    pub fn destroy(self) -> usize {
        let released = self.len;
        drop(self);
        released
    }

    /// Finds `(predecessor, slot)` of the node matching digest and key.
    ///
    /// Every node with an equal digest is compared on its key; the walk stops
    /// early once digests exceed the target.
    fn locate(&self, digest: u32, key: &str) -> Option<(Option<SlotId>, SlotId)> {
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.record.digest > digest {
                return None;
            }
            if node.record.digest == digest && node.record.key == key {
                return Some((prev, id));
            }
            prev = Some(id);
            cursor = node.next;
        }
        None
    }

    fn node(&self, id: SlotId) -> &Node {
        match &self.slots[id] {
            Some(node) => node,
            None => unreachable!("slot {id} is linked but vacant"),
        }
    }

    fn allocate(&mut self, node: Node) -> SlotId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Points `prev.next` (or the head, when `prev` is `None`) at `next`.
    fn link_after(&mut self, prev: Option<SlotId>, next: Option<SlotId>) {
        match prev {
            None => self.head = next,
            Some(id) => {
                if let Some(node) = self.slots[id].as_mut() {
                    node.next = next;
                }
            }
        }
    }
}

fn not_found(digest: u32, key: &str) -> StoreError {
    StoreError::NotFound {
        digest,
        key: key.to_string(),
    }
}

/// Iterator over the records of a [`RecordStore`] in chain order.
pub struct Iter<'a> {
    store: &'a RecordStore,
    cursor: Option<SlotId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.store.node(self.cursor?);
        self.cursor = node.next;
        Some(&node.record)
    }
}
