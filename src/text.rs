//! Constant-string section extraction
//!
//! One-shot read of the main module's constant-string subsection into the
//! model, run once at startup. The text section never changes during a run,
//! so a single observation spanning the whole subsection is enough. Embedded
//! NUL bytes become the literal two-character escape `\0` and newlines `\n`,
//! keeping the exported row on one line.

use crate::engine::Target;
use crate::model::{MemoryModel, MemoryValue, TEXT_SECTION};

/// Insert one observation covering the module's constant-string subsection.
/// Does nothing when the module has no such subsection.
pub fn read_text_section(model: &mut MemoryModel, target: &dyn Target) {
    let Some((address, bytes)) = target.string_section() else {
        return;
    };
    let size = bytes.len() as u64;
    let mut text = String::with_capacity(bytes.len());
    for b in bytes {
        match b {
            0 => text.push_str("\\0"),
            b'\n' => text.push_str("\\n"),
            _ => text.push(b as char),
        }
    }
    model.insert(MemoryValue::new(
        TEXT_SECTION,
        address,
        size,
        Some(text),
        None,
        None,
    ));
}
