//! Reference table
//!
//! Complex values (objects, ECMA arrays, strict arrays, typed objects) are
//! numbered from 0 in the order their decoding starts. A later Reference
//! marker carries one of those numbers instead of repeating the value.
//!
//! A slot is claimed before the value's body is read, so nested references
//! can point at an enclosing value that is not finished yet. Such a slot
//! resolves to `None` until it is completed.

use super::value::Amf0Value;
use crate::error::{Amf0Error, Result};

/// Append-only table of complex values for one decode session
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: Vec<Option<Amf0Value>>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of claimed slots, finished or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a finished value, returning its index
    pub fn register(&mut self, value: Amf0Value) -> usize {
        self.entries.push(Some(value));
        self.entries.len() - 1
    }

    /// Claim the next index for a value whose body is about to be decoded
    pub fn reserve(&mut self) -> usize {
        self.entries.push(None);
        self.entries.len() - 1
    }

    /// Fill a slot previously claimed with [`reserve`](Self::reserve)
    pub fn complete(&mut self, index: usize, value: Amf0Value) {
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Look up an index read from the wire
    ///
    /// `Ok(None)` means the slot exists but its value is still being built.
    pub fn resolve(&self, index: u16) -> Result<Option<&Amf0Value>> {
        match self.entries.get(index as usize) {
            Some(slot) => Ok(slot.as_ref()),
            None => Err(Amf0Error::ReferenceOutOfRange {
                index,
                len: self.entries.len(),
            }),
        }
    }

    /// Release every slot claimed at or after `len`
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Drop every entry (start of a new session)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
