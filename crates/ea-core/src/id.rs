use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a placed sticker. Unique within its document for the
/// document's whole lifetime, including across save/load.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StickerId(u64);

impl StickerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sticker#{}", self.0)
    }
}

impl fmt::Display for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a palette in a catalog.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteId(u64);

impl PaletteId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PaletteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "palette#{}", self.0)
    }
}

impl fmt::Display for PaletteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counter handing out raw ids starting at 1.
///
/// Owned by the value whose ids it allocates, so two documents never share
/// a counter and nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Hand out the next id.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Make sure `used` is never handed out again.
    pub fn reserve(&mut self, used: u64) {
        if used >= self.next {
            self.next = used + 1;
        }
    }

    /// The id the next call to `allocate` will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}
