//! Opaque document handles.
//!
//! Handles are issued by a generational arena. A raw handle packs the slot
//! generation into the upper 32 bits and `index + 1` into the lower 32 bits,
//! so `0` is never a valid handle.
//!
//! Generations are drawn from one process-wide counter rather than per slot.
//! A handle therefore stays unique across every table in the process, and a
//! handle from a gateway that was since replaced never resolves in the new
//! one.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

#[inline]
fn next_generation() -> u32 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Owned token for a document created through the gateway.
///
/// Deliberately neither `Clone` nor `Copy`: the only way to give it up is
/// [`CreationGateway::release`](crate::gateway::CreationGateway::release).
#[derive(PartialEq, Eq, Hash)]
#[must_use = "a document handle must be released"]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Raw value for crossing a language boundary.
    pub fn into_raw(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from a raw value obtained through [`into_raw`].
    ///
    /// Any `u64` is accepted; stale or forged values are rejected with
    /// `InvalidHandle` by the gateway when used.
    ///
    /// [`into_raw`]: DocumentHandle::into_raw
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value without giving up ownership.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentHandle({:#x})", self.0)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena mapping raw handles to values.
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `value` and return its raw handle.
    ///
    /// Returns `None` once the arena holds `u32::MAX` slots.
    pub fn insert(&mut self, value: T) -> Option<u64> {
        let generation = next_generation();
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = generation;
                slot.value = Some(value);
                index
            },
            None => {
                let index = u32::try_from(self.slots.len()).ok().filter(|i| *i < u32::MAX)?;
                self.slots.push(Slot {
                    generation,
                    value: Some(value),
                });
                index
            },
        };
        self.len += 1;
        Some(pack(generation, index))
    }

    pub fn get(&self, raw: u64) -> Option<&T> {
        let (generation, index) = unpack(raw)?;
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Take the value out and retire the handle.
    pub fn remove(&mut self, raw: u64) -> Option<T> {
        let (generation, index) = unpack(raw)?;
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    /// Raw handles of all live entries.
    pub fn handles(&self) -> impl Iterator<Item = u64> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|_| pack(slot.generation, index as u32))
        })
    }

    /// Remove every entry, returning them in slot order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                self.free.push(index as u32);
                values.push(value);
            }
        }
        self.len = 0;
        values
    }
}

#[inline]
fn pack(generation: u32, index: u32) -> u64 {
    ((generation as u64) << 32) | (index as u64 + 1)
}

#[inline]
fn unpack(raw: u64) -> Option<(u32, u32)> {
    let low = (raw & 0xFFFF_FFFF) as u32;
    let index = low.checked_sub(1)?;
    Some(((raw >> 32) as u32, index))
}
