//! Allocation tracking
//!
//! [`AllocationTracker`] is the sole source of truth for how large a heap
//! block behind a pointer is. It learns sizes by intercepting the target's
//! allocator: the requested byte count is read from the first-argument
//! register at allocator entry (it is not preserved after return, so it must
//! be captured before stepping out), and the block address from the return
//! register after stepping the allocator frame out.
//!
//! Freeing a block writes a zero-size tombstone instead of removing the
//! entry. Stale pointers into freed memory are then still recognized as
//! "was heap" during provenance classification, but decompose into zero
//! elements. Entries are never garbage-collected within a run; the map is
//! bounded by the number of allocator calls in the traced window.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::engine::{Arch, ProcessState, Target};
use crate::errors::InspectError;

/// Address → allocation size map with tombstones.
#[derive(Debug, Default)]
pub struct AllocationTracker {
    sizes: FxHashMap<u64, u64>,
}

impl AllocationTracker {
    pub fn new() -> Self {
        AllocationTracker {
            sizes: FxHashMap::default(),
        }
    }

    /// Record an allocation of `size` bytes at `address`.
    pub fn record(&mut self, address: u64, size: u64) {
        self.sizes.insert(address, size);
    }

    /// Mark `address` freed. The entry stays with size 0 so the address is
    /// still classified as once-heap.
    pub fn release(&mut self, address: u64) {
        self.sizes.insert(address, 0);
    }

    /// Size of the allocation at exactly `address`, if one was ever recorded
    /// there. 0 means the block was freed.
    pub fn size_of(&self, address: u64) -> Option<u64> {
        self.sizes.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Called with the target stopped at the allocator's first instruction.
    /// Reads the requested byte count from the first-argument register.
    ///
    /// The target must actually be inside the allocator; calling this at any
    /// other stop reads a meaningless register value.
    pub fn on_allocator_entry(
        &self,
        target: &dyn Target,
        arch: Arch,
    ) -> Result<u64, InspectError> {
        target.read_register(arch.argument_register(0))
    }

    /// Steps the allocator frame out and records the returned block.
    ///
    /// The step-out loops while the current function name is still the
    /// allocator's, which skips internal allocator helper frames that share
    /// the same visible name. `size` is the count captured at entry.
    pub fn on_allocator_exit(
        &mut self,
        target: &mut dyn Target,
        arch: Arch,
        size: u64,
    ) -> Result<(), InspectError> {
        let entry_fn = target.function_name();
        while target.state() != ProcessState::Exited && target.function_name() == entry_fn {
            target.step_out()?;
        }
        let address = target.read_register(arch.return_register())?;
        debug!(address = format_args!("0x{address:x}"), size, "allocation recorded");
        self.record(address, size);
        Ok(())
    }

    /// Called with the target stopped at the deallocator's first instruction.
    /// Tombstones the pointer being freed, then steps back to the caller.
    pub fn on_deallocator_entry(
        &mut self,
        target: &mut dyn Target,
        arch: Arch,
    ) -> Result<(), InspectError> {
        let address = target.read_register(arch.argument_register(0))?;
        debug!(address = format_args!("0x{address:x}"), "allocation freed");
        self.release(address);
        target.step_out()
    }
}
