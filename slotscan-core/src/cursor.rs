use crate::events::LedgerEvent;
use std::collections::HashSet;

/// Resumable scan position: everything at or before this point has been processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Head observed at the start of the last completed scan. `0` means never scanned.
    pub last_slot: u64,
    /// Signature of the newest event delivered so far.
    pub last_signature: Option<String>,
}

impl Cursor {
    pub fn is_cold(&self) -> bool {
        self.last_slot == 0
    }

    /// Lowest slot the next scan may still return. `0` disables the slot cutoff.
    pub fn from_slot(&self) -> u64 {
        if self.last_slot > 0 {
            self.last_slot + 1
        } else {
            0
        }
    }
}

/// In-process holder of a scanner's [`Cursor`].
///
/// Besides the cursor itself it remembers which signatures the previous scan
/// delivered, so a record that landed after the head was read is not handed
/// out twice.
#[derive(Debug, Default)]
pub struct CursorStore {
    cursor: Cursor,
    delivered: HashSet<String>,
}

impl CursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a known position, e.g. one restored by the caller.
    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            cursor,
            delivered: HashSet::new(),
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn was_delivered(&self, signature: &str) -> bool {
        self.delivered.contains(signature)
    }

    /// Advances the cursor after a completed scan.
    ///
    /// `events` must be in extraction order: among events sharing the highest
    /// slot, the first one becomes the new `last_signature`.
    pub(crate) fn commit(&mut self, head: u64, events: &[LedgerEvent]) {
        self.cursor.last_slot = head;

        let newest = events.iter().fold(None::<&LedgerEvent>, |best, event| match best {
            Some(best) if best.slot >= event.slot => Some(best),
            _ => Some(event),
        });
        if let Some(event) = newest {
            self.cursor.last_signature = Some(event.signature.clone());
        }

        self.delivered = events.iter().map(|e| e.signature.clone()).collect();
    }

    pub fn reset(&mut self) {
        self.cursor = Cursor::default();
        self.delivered.clear();
    }
}
