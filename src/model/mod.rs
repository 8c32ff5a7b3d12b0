//! The memory model
//!
//! This module owns the reconstructed picture of the target's memory:
//! - [`value`]: one observation ([`MemoryValue`]) — an addressable, typed
//!   snapshot fact with its TSV row rendering
//! - [`alloc`]: the [`AllocationTracker`] mapping heap block addresses to
//!   sizes, fed by allocator interception
//! - [`MemoryModel`]: the address-keyed store of all current observations
//!
//! Observations use replace-by-address semantics: within a snapshot
//! generation, the latest observation at an address wins. Section
//! partitioning (`text` / `heap` / `stack-<frame>`) is derived from the
//! stored values on demand, never stored separately, so it cannot drift out
//! of sync with the underlying map.
//!
//! The model is mutated only by the single thread driving the inspection
//! loop; consumers that render concurrently must take their own copy.

pub mod alloc;
pub mod value;

use std::io::{self, Write};

use rustc_hash::FxHashMap;

pub use alloc::AllocationTracker;
pub use value::{stack_section, MemoryValue, HEAP_SECTION, TEXT_SECTION};

/// Address-keyed store of observations plus the allocation bookkeeping for
/// one inspection run.
#[derive(Debug, Default)]
pub struct MemoryModel {
    memory: FxHashMap<u64, MemoryValue>,
    allocations: AllocationTracker,
}

impl MemoryModel {
    pub fn new() -> Self {
        MemoryModel {
            memory: FxHashMap::default(),
            allocations: AllocationTracker::new(),
        }
    }

    /// Insert an observation; a previous observation at the same address is
    /// replaced.
    pub fn insert(&mut self, value: MemoryValue) {
        self.memory.insert(value.address, value);
    }

    pub fn get(&self, address: u64) -> Option<&MemoryValue> {
        self.memory.get(&address)
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Drop all observations. Allocation bookkeeping survives; block sizes
    /// remain valid across snapshot generations.
    pub fn clear(&mut self) {
        self.memory.clear();
    }

    pub fn allocations(&self) -> &AllocationTracker {
        &self.allocations
    }

    pub fn allocations_mut(&mut self) -> &mut AllocationTracker {
        &mut self.allocations
    }

    /// All observations, ascending by address.
    pub fn values_sorted(&self) -> Vec<&MemoryValue> {
        let mut values: Vec<&MemoryValue> = self.memory.values().collect();
        values.sort_by_key(|v| v.address);
        values
    }

    /// Observations grouped by section, each group ascending by address.
    /// The heap section is always present, even when empty.
    pub fn sections(&self) -> FxHashMap<String, Vec<&MemoryValue>> {
        let mut sections: FxHashMap<String, Vec<&MemoryValue>> = FxHashMap::default();
        sections.insert(HEAP_SECTION.to_string(), Vec::new());
        for v in self.memory.values() {
            sections.entry(v.section.clone()).or_default().push(v);
        }
        for group in sections.values_mut() {
            group.sort_by_key(|v| v.address);
        }
        sections
    }

    /// Heap observations, ascending by address.
    pub fn heap_values(&self) -> Vec<&MemoryValue> {
        let mut values: Vec<&MemoryValue> = self
            .memory
            .values()
            .filter(|v| v.section == HEAP_SECTION)
            .collect();
        values.sort_by_key(|v| v.address);
        values
    }

    /// Observations from every stack frame partition, ascending by address.
    pub fn stack_values(&self) -> Vec<&MemoryValue> {
        let mut values: Vec<&MemoryValue> = self.memory.values().filter(|v| v.is_stack()).collect();
        values.sort_by_key(|v| v.address);
        values
    }

    /// Write the TSV artifact: one header row, then every observation
    /// ascending by address. The layout is reproduced exactly for
    /// compatibility with existing consumers.
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "section\taddress\tsize\tvalue\tlabel\ttype")?;
        for value in self.values_sorted() {
            writeln!(out, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(section: &str, address: u64) -> MemoryValue {
        MemoryValue::new(section, address, 4, Some("0".to_string()), None, None)
    }

    #[test]
    fn insert_is_last_write_wins() {
        let mut model = MemoryModel::new();
        model.insert(obs("stack-main", 0x10));
        model.insert(MemoryValue::new(
            "stack-main",
            0x10,
            4,
            Some("7".to_string()),
            Some("x".to_string()),
            Some("int".to_string()),
        ));
        assert_eq!(model.len(), 1);
        assert_eq!(model.get(0x10).unwrap().value_str(), "7");
    }

    #[test]
    fn export_is_sorted_by_address_with_exact_header() {
        let mut model = MemoryModel::new();
        model.insert(obs("stack-main", 0x30));
        model.insert(obs("heap", 0x10));
        model.insert(obs("text", 0x20));

        let mut out = Vec::new();
        model.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "section\taddress\tsize\tvalue\tlabel\ttype");
        assert_eq!(lines.len(), 4);
        let addrs: Vec<&str> = lines[1..]
            .iter()
            .map(|l| l.split('\t').nth(1).unwrap())
            .collect();
        assert_eq!(
            addrs,
            vec![
                "0x0000000000000010",
                "0x0000000000000020",
                "0x0000000000000030"
            ]
        );
        for line in &lines[1..] {
            assert_eq!(line.split('\t').count(), 6);
        }
    }

    #[test]
    fn sections_view_always_has_heap() {
        let mut model = MemoryModel::new();
        model.insert(obs("stack-main", 0x30));
        let sections = model.sections();
        assert!(sections.get("heap").unwrap().is_empty());
        assert_eq!(sections.get("stack-main").unwrap().len(), 1);
    }

    #[test]
    fn clear_keeps_allocation_bookkeeping() {
        let mut model = MemoryModel::new();
        model.allocations_mut().record(0x6000_0000, 16);
        model.insert(obs("heap", 0x6000_0000));
        model.clear();
        assert!(model.is_empty());
        assert_eq!(model.allocations().size_of(0x6000_0000), Some(16));
    }
}
