use crate::router::location::Location;

/// In-memory navigation history with a cursor.
///
/// Pushing after moving back drops the forward entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    cursor: Option<usize>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: Location) {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push(location);
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn replace(&mut self, location: Location) {
        match self.cursor {
            Some(cursor) => self.entries[cursor] = location,
            None => self.push(location),
        }
    }

    /// The entry `delta` steps away from the cursor.
    pub fn peek(&self, delta: isize) -> Option<&Location> {
        let target = self.cursor?.checked_add_signed(delta)?;
        self.entries.get(target)
    }

    /// Move the cursor by `delta`, returning the new current entry.
    pub fn go(&mut self, delta: isize) -> Option<&Location> {
        let target = self.cursor?.checked_add_signed(delta)?;
        if target >= self.entries.len() {
            return None;
        }
        self.cursor = Some(target);
        self.entries.get(target)
    }

    pub fn current(&self) -> Option<&Location> {
        self.entries.get(self.cursor?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
