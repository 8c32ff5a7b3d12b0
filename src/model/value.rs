//! Memory observation representation
//!
//! A [`MemoryValue`] is one addressable, typed snapshot fact: a byte range in
//! the target, the section it logically belongs to, and an optional textual
//! value, label and type. Observations are identified by address; inserting a
//! later observation at the same address replaces the earlier one.
//!
//! [`MemoryValue`] also owns the exported row format: six tab-separated
//! fields with the address printed as a fixed 16-hex-digit lowercase value
//! prefixed `0x`, `(unknown)` for a missing value and `(none)` for a missing
//! label or type. This format is the crate's only interchange output and is
//! reproduced exactly.

use std::fmt;

/// Section name for the read-only constant-string data.
pub const TEXT_SECTION: &str = "text";

/// Section name for heap-resident observations.
pub const HEAP_SECTION: &str = "heap";

/// Compose the section name for a stack frame from its display name.
pub fn stack_section(frame_display_name: &str) -> String {
    format!("stack-{frame_display_name}")
}

/// One addressable, typed snapshot fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryValue {
    pub section: String,
    pub address: u64,
    pub size: u64,
    pub value: Option<String>,
    pub label: Option<String>,
    pub type_name: Option<String>,
}

impl MemoryValue {
    pub fn new(
        section: &str,
        address: u64,
        size: u64,
        value: Option<String>,
        label: Option<String>,
        type_name: Option<String>,
    ) -> Self {
        MemoryValue {
            section: section.to_string(),
            address,
            size,
            value,
            label,
            type_name,
        }
    }

    /// Fixed-width lowercase hex address, e.g. `0x00000000004005d0`.
    pub fn address_str(&self) -> String {
        format!("0x{:016x}", self.address)
    }

    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("(unknown)")
    }

    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("(none)")
    }

    pub fn type_str(&self) -> &str {
        self.type_name.as_deref().unwrap_or("(none)")
    }

    /// True when this observation belongs to any stack frame partition.
    pub fn is_stack(&self) -> bool {
        self.section.starts_with("stack-")
    }
}

/// Renders the exported TSV row (without trailing newline). Section names
/// never carry tabs, but frame display names may contain spaces; those are
/// normalized to dashes so the row stays six fields wide for any consumer
/// that also splits on whitespace.
impl fmt::Display for MemoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.section.replace(' ', "-"),
            self.address_str(),
            self.size,
            self.value_str(),
            self.label_str(),
            self.type_str()
        )
    }
}
