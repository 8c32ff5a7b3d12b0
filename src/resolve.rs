//! Typed value resolution
//!
//! Decomposes a located, typed program value into flat observations and
//! inserts them into the [`MemoryModel`]. The walk is a tagged-variant
//! dispatch over [`ValueKind`]:
//!
//! - scalars and pointers emit one leaf observation at their own address
//! - pointers additionally classify their target with [`classify`]; only
//!   heap-classified targets are decomposed, sized by the allocation tracker
//! - char arrays flatten into a single string observation spanning the whole
//!   array, not one observation per element
//! - composites recurse into their children under the same section, naming
//!   them `parent[index]` or `parent.field`
//!
//! Values held in registers are never modeled, and globals (read/write data
//! section residents) are filtered out here because they are visited once via
//! their own path and must not be re-attributed to whichever stack frame
//! happens to reference them.
//!
//! A known limitation carried over from the original tool: when an allocation
//! size is not a multiple of the element size, the division truncates and the
//! trailing partial element is silently dropped.

use tracing::trace;

use crate::engine::{LocatedValue, Pointee, Target, ValueKind};
use crate::errors::InspectError;
use crate::model::{MemoryModel, MemoryValue, HEAP_SECTION};

/// Byte distance beyond which a pointer target is considered heap-resident.
///
/// Chosen empirically to exceed typical stack-frame extents: a pointer whose
/// target lies within this distance of the pointer's own storage is assumed
/// to alias something in the current stack region.
pub const PROVENANCE_THRESHOLD: u64 = 100_000;

/// Outcome of pointer-target provenance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Stack,
    Heap,
}

/// Classify where a pointer's target lives, from the distance between the
/// dereferenced load address and the pointer's own load address.
///
/// Pure so it can be tested on its own; a best-effort heuristic, not a sound
/// region analysis.
pub fn classify(target_addr: u64, source_addr: u64) -> Provenance {
    if target_addr.abs_diff(source_addr) > PROVENANCE_THRESHOLD {
        Provenance::Heap
    } else {
        Provenance::Stack
    }
}

/// Recursively resolve `value` into observations under `section`.
///
/// Recoverable cases (register storage, unknown allocation size,
/// stack-resident pointer target) end the affected branch silently and leave
/// the snapshot sparser. The only errors are fatal ones: a heap element type
/// the engine cannot size.
pub fn resolve(
    model: &mut MemoryModel,
    target: &dyn Target,
    section: &str,
    value: &LocatedValue,
) -> Result<(), InspectError> {
    // Globals surface in the variable list of every frame that references
    // them; they are modeled once via their own path, so anything whose
    // symbol lives in the read/write data section is skipped here.
    if let Some(bin) = &value.binary_section {
        if bin == ".data" || bin == "__data" {
            trace!(label = ?value.label, "skipping data-section resident");
            return Ok(());
        }
    }

    let Some(address) = value.storage.address() else {
        trace!(label = ?value.label, "skipping value without a memory address");
        return Ok(());
    };

    match &value.kind {
        ValueKind::Scalar { text } => {
            model.insert(MemoryValue::new(
                section,
                address,
                value.byte_size,
                text.clone(),
                value.label.clone(),
                value.type_name.clone(),
            ));
        }
        ValueKind::Pointer { text, target: pointee } => {
            model.insert(MemoryValue::new(
                section,
                address,
                value.byte_size,
                text.clone(),
                value.label.clone(),
                value.type_name.clone(),
            ));
            let Some(pointee) = pointee else {
                return Ok(());
            };
            if classify(pointee.address, address) == Provenance::Stack {
                // A frame-local alias; decomposing it would walk memory the
                // frame iteration already covers.
                trace!(label = ?value.label, "pointer target classified as stack");
                return Ok(());
            }
            resolve_heap_target(model, target, pointee)?;
        }
        ValueKind::CharArray { text } => {
            model.insert(MemoryValue::new(
                section,
                address,
                value.byte_size,
                Some(text.clone()),
                value.label.clone(),
                value.type_name.clone(),
            ));
        }
        ValueKind::Composite { children } => {
            for child in children {
                let mut child = child.clone();
                child.label =
                    compose_child_label(value.label.as_deref(), child.label.as_deref());
                resolve(model, target, section, &child)?;
            }
        }
    }

    Ok(())
}

/// Decompose a heap-classified pointer target into element observations.
fn resolve_heap_target(
    model: &mut MemoryModel,
    target: &dyn Target,
    pointee: &Pointee,
) -> Result<(), InspectError> {
    let Some(alloc_size) = model.allocations().size_of(pointee.address) else {
        // Without a recorded size the element count cannot be determined
        // safely; stop rather than guess.
        trace!(
            address = format_args!("0x{:x}", pointee.address),
            "no allocation record for pointer target"
        );
        return Ok(());
    };

    if pointee.elem.is_char {
        // Heap strings are reconstructed as one contiguous observation over
        // the whole allocation instead of one observation per byte. A freed
        // block (size 0) still yields the observation, with an empty value.
        let text = target
            .read_memory(pointee.address, alloc_size as usize)
            .map(|bytes| printable(&bytes));
        model.insert(MemoryValue::new(
            HEAP_SECTION,
            pointee.address,
            alloc_size,
            text,
            None,
            Some(pointee.elem.name.clone()),
        ));
        return Ok(());
    }

    if pointee.elem.byte_size == 0 {
        return Err(InspectError::UnsupportedHeapType {
            type_name: pointee.elem.name.clone(),
            address: pointee.address,
        });
    }

    // Truncating division: a trailing partial element is dropped.
    let count = alloc_size / pointee.elem.byte_size;
    for i in 0..count {
        let elem_addr = pointee.address + i * pointee.elem.byte_size;
        if let Some(elem) = target.value_at(elem_addr, &pointee.elem) {
            resolve(model, target, HEAP_SECTION, &elem)?;
        }
    }
    Ok(())
}

/// Display name for a composite child: `parent[index]` for array elements,
/// `parent.field` for struct fields.
fn compose_child_label(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    match (parent, child) {
        (Some(p), Some(c)) if c.starts_with('[') => Some(format!("{p}{c}")),
        (Some(p), Some(c)) => Some(format!("{p}.{c}")),
        (None, Some(c)) => Some(c.to_string()),
        (Some(p), None) => Some(p.to_string()),
        (None, None) => None,
    }
}

/// Printable rendering of raw heap string bytes. Embedded NULs become the
/// two-character escape `\0`, newlines `\n`, other non-printable bytes a hex
/// escape.
fn printable(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            0 => out.push_str("\\0"),
            b'\n' => out.push_str("\\n"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out
}
