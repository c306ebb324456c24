//! Free-list job-id allocator.
//!
//! Job ids tag in-flight work so completions can be correlated back to their
//! callbacks. Ids are small positive integers recycled through a singly-linked
//! free list embedded in the same array used for bookkeeping, so the id space
//! never grows past the peak number of simultaneously live jobs.

/// Marks a slot as currently allocated.
const IN_USE: isize = -1;

/// Marks the end of the free chain. Index 0 doubles as the free-list head:
/// when the chain is empty it holds the next fresh (never-used) id.
const CHAIN_END: isize = 0;

/// Allocates and recycles integer job ids.
///
/// `slots[0]` is the head of the free chain. Every other index holds either
/// [`IN_USE`] (allocated), the next free id in the chain, or [`CHAIN_END`]
/// (last link / untouched fresh region).
#[derive(Debug)]
pub struct SlotAllocator {
    slots: Vec<isize>,
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotAllocator {
    pub fn new() -> Self {
        // Fresh ids start at 1; id 0 is reserved for the head pointer.
        Self { slots: vec![1] }
    }

    /// Hand out an id that is not currently in use. Amortized O(1).
    pub fn allocate(&mut self) -> usize {
        let id = self.slots[0] as usize;
        if id >= self.slots.len() {
            self.slots.resize(id + 1, CHAIN_END);
        }

        let next = self.slots[id];
        self.slots[0] = if next == CHAIN_END {
            (id + 1) as isize
        } else {
            next
        };
        self.slots[id] = IN_USE;
        id
    }

    /// Return an id to the free chain for reuse.
    ///
    /// Deallocating an id that is not currently allocated is a no-op, so a
    /// double free can never corrupt the chain.
    pub fn deallocate(&mut self, id: usize) {
        if id > 0 && id < self.slots.len() && self.slots[id] == IN_USE {
            self.slots[id] = self.slots[0];
            self.slots[0] = id as isize;
        }
    }

    /// Whether `id` is currently allocated.
    pub fn is_allocated(&self, id: usize) -> bool {
        id < self.slots.len() && self.slots[id] == IN_USE
    }
}
