use crate::error::{PlaylistError, Result};
use crate::media::Item;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Ordered items plus a cursor sitting *between* them.
///
/// `cursor == 0` means nothing has been played, `cursor == len` means everything has.
/// The item just before the cursor is the previous one, the item at the cursor is
/// the next one. The sequence itself is only reachable read-only, so every change
/// goes through an operation that keeps the cursor consistent.
#[derive(Debug, Clone, Default)]
pub struct PlaylistStore {
    items: Vec<Item>,
    cursor: usize,
}

impl PlaylistStore {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, cursor: 0 }
    }

    /// Start somewhere other than the beginning, e.g. when resuming a save file
    pub fn with_cursor(items: Vec<Item>, cursor: usize) -> Result<Self> {
        if cursor > items.len() {
            return Err(PlaylistError::IndexOutOfRange {
                index: cursor,
                len: items.len(),
            });
        }
        Ok(Self { items, cursor })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Most recently played item
    pub fn previous(&self) -> Option<&Item> {
        self.cursor.checked_sub(1).and_then(|idx| self.items.get(idx))
    }

    /// Item the next `advance` hands out
    pub fn next(&self) -> Option<&Item> {
        self.items.get(self.cursor)
    }

    /// Index of the item with this canonical path
    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.items.iter().position(|item| item.fullpath() == path)
    }

    /// Hand out the next item and move past it. `None` once everything has played.
    pub fn advance(&mut self) -> Option<&Item> {
        if self.cursor >= self.items.len() {
            return None;
        }
        self.cursor += 1;
        self.items.get(self.cursor - 1)
    }

    /// The file "we're talking about right now": previous if any, else next.
    pub fn current(&self) -> Option<&Item> {
        self.previous().or_else(|| self.next())
    }

    fn current_index(&self) -> Option<usize> {
        if self.cursor > 0 {
            Some(self.cursor - 1)
        } else if !self.items.is_empty() {
            Some(0)
        } else {
            None
        }
    }

    /// Step back so the previously played item comes out of `advance` again.
    /// Returns that item, or `None` (and changes nothing) at the start.
    pub fn replay(&mut self) -> Option<&Item> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.items.get(self.cursor)
    }

    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        if index > self.items.len() {
            return Err(PlaylistError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Drop the current item. Its follower becomes next, its predecessor previous.
    pub fn remove_current(&mut self) -> Option<Item> {
        let index = self.current_index()?;
        let removed = self.items.remove(index);
        self.cursor = index;
        debug!(file = %removed.filename(), cursor = self.cursor, "removed from playlist");
        Some(removed)
    }

    /// Shuffling restarts the queue from the top
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.items.shuffle(rng);
        self.cursor = 0;
    }

    /// Sort by canonical path
    pub fn sort(&mut self) {
        self.sort_by(|a, b| a.fullpath().cmp(b.fullpath()));
    }

    /// Reorder with `compare`; like shuffling, this restarts the queue
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Item, &Item) -> Ordering,
    {
        self.items.sort_by(compare);
        self.cursor = 0;
    }
}
