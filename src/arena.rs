//! Handle-based collection for locked pieces
//!
//! Board cells never own pieces; they hold a `Handle` into an `Arena`. Handles
//! are never reused, so a stale handle can only miss, never alias a newer entry.

/// Stable, non-owning reference into an `Arena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Insertion-ordered collection addressed by `Handle`
#[derive(Debug, Clone)]
pub struct Arena<T> {
    entries: Vec<(Handle, T)>,
    next_id: u64,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Append an entry and hand out its handle
    pub fn insert(&mut self, value: T) -> Handle {
        let handle = Handle(self.next_id);
        self.next_id += 1;
        self.entries.push((handle, value));
        handle
    }

    /// Remove an entry, keeping the order of the rest
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let index = self.position(handle)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.position(handle).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.position(handle).map(move |i| &mut self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entries.iter().map(|(handle, value)| (*handle, value))
    }

    /// Remove every entry the predicate rejects, returning the removed handles
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) -> Vec<Handle> {
        let mut removed = Vec::new();
        self.entries.retain(|(handle, value)| {
            let kept = keep(value);
            if !kept {
                removed.push(*handle);
            }
            kept
        });
        removed
    }

    /// Hand every entry to the caller, leaving the arena empty
    pub fn drain(&mut self) -> impl Iterator<Item = (Handle, T)> + '_ {
        self.entries.drain(..)
    }

    fn position(&self, handle: Handle) -> Option<usize> {
        // Entries are appended with increasing ids, so they stay sorted
        self.entries
            .binary_search_by_key(&handle, |(h, _)| *h)
            .ok()
    }
}
