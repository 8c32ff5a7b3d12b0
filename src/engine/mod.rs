//! Program-control capability interface
//!
//! The inspector does not implement process control itself. Everything it
//! needs from the underlying debugger engine — launching, stepping, reading
//! registers and memory, enumerating typed frame variables — is expressed as
//! the [`Target`] trait, so the stepping and resolution logic stays
//! independent of any particular backend.
//!
//! [`script::ScriptedTarget`] is the bundled deterministic implementation,
//! used by the demo session and by the test suite.

pub mod arch;
pub mod script;

pub use arch::Arch;

use crate::errors::InspectError;

/// Observable state of the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Stopped,
    Exited,
}

/// Source position of the selected frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Source file name (not path) of the current line, when known.
    pub file: Option<String>,
    /// 1-based line number; 0 when there is no line entry.
    pub line: u32,
}

/// Where a value's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Resident in addressable memory at this load address.
    Address(u64),
    /// Held in a register; such values are never modeled.
    Register(String),
    /// No storage reported (e.g. optimized out).
    Unknown,
}

impl Storage {
    /// The load address, if the value is memory-resident.
    pub fn address(&self) -> Option<u64> {
        match self {
            Storage::Address(a) => Some(*a),
            _ => None,
        }
    }
}

/// Static type description, enough to lay out array elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    /// Byte size of one value of this type; 0 when the engine cannot size it.
    pub byte_size: u64,
    /// True for single-byte character types, which get flattened into strings.
    pub is_char: bool,
}

/// Dereference result for a pointer value.
#[derive(Debug, Clone)]
pub struct Pointee {
    /// Load address the pointer refers to.
    pub address: u64,
    /// Type of one pointed-to element.
    pub elem: TypeInfo,
}

/// Shape of a located value, as a tagged variant.
///
/// Every case of the recursive decomposition has its own arm, so each
/// contract can be exercised in isolation.
#[derive(Debug, Clone)]
pub enum ValueKind {
    /// A plain scalar with an optional textual rendering.
    Scalar { text: Option<String> },
    /// A pointer; `target` is the dereference result, when the engine could
    /// produce one (null or garbage pointers yield `None`).
    Pointer {
        text: Option<String>,
        target: Option<Pointee>,
    },
    /// A fixed-size character array, already flattened to its text.
    CharArray { text: String },
    /// A struct or non-char array with indexed children.
    Composite { children: Vec<LocatedValue> },
}

/// A typed value with a storage location, as reported by the engine.
///
/// This is the uniform abstraction the resolver walks: frame variables,
/// struct fields, array elements and synthesized heap elements all take this
/// shape.
#[derive(Debug, Clone)]
pub struct LocatedValue {
    /// Variable or field name; `None` for synthesized heap elements.
    pub label: Option<String>,
    /// Declared type name as the engine prints it.
    pub type_name: Option<String>,
    /// Byte extent of the whole value.
    pub byte_size: u64,
    pub storage: Storage,
    /// Binary section the variable's symbol lives in, when statically known.
    /// Used to filter globals (read/write data residents) out of stack walks.
    pub binary_section: Option<String>,
    pub kind: ValueKind,
}

impl LocatedValue {
    /// A memory-resident scalar leaf.
    pub fn scalar(label: &str, type_name: &str, byte_size: u64, address: u64, text: &str) -> Self {
        LocatedValue {
            label: Some(label.to_string()),
            type_name: Some(type_name.to_string()),
            byte_size,
            storage: Storage::Address(address),
            binary_section: None,
            kind: ValueKind::Scalar {
                text: Some(text.to_string()),
            },
        }
    }

    /// A memory-resident pointer leaf. Pointer values are 8 bytes.
    pub fn pointer(label: &str, type_name: &str, address: u64, target: Option<Pointee>) -> Self {
        let text = target.as_ref().map(|t| format!("0x{:016x}", t.address));
        LocatedValue {
            label: Some(label.to_string()),
            type_name: Some(type_name.to_string()),
            byte_size: 8,
            storage: Storage::Address(address),
            binary_section: None,
            kind: ValueKind::Pointer { text, target },
        }
    }

    /// A fixed-size character array, flattened to its text.
    pub fn char_array(label: &str, byte_size: u64, address: u64, text: &str) -> Self {
        LocatedValue {
            label: Some(label.to_string()),
            type_name: Some(format!("char[{byte_size}]")),
            byte_size,
            storage: Storage::Address(address),
            binary_section: None,
            kind: ValueKind::CharArray {
                text: text.to_string(),
            },
        }
    }

    /// A struct or array with children.
    pub fn composite(
        label: &str,
        type_name: &str,
        byte_size: u64,
        address: u64,
        children: Vec<LocatedValue>,
    ) -> Self {
        LocatedValue {
            label: Some(label.to_string()),
            type_name: Some(type_name.to_string()),
            byte_size,
            storage: Storage::Address(address),
            binary_section: None,
            kind: ValueKind::Composite { children },
        }
    }

    /// Relocate this value into a register (not modeled by the resolver).
    pub fn in_register(mut self, name: &str) -> Self {
        self.storage = Storage::Register(name.to_string());
        self
    }

    /// Tag the binary section the value's symbol lives in.
    pub fn in_section(mut self, section: &str) -> Self {
        self.binary_section = Some(section.to_string());
        self
    }

    /// Drop the label, the shape synthesized heap elements arrive in.
    pub fn unlabeled(mut self) -> Self {
        self.label = None;
        self
    }
}

/// Capability interface to the external program-control engine.
///
/// One blocking command at a time; implementations are synchronous. Stepping
/// advances the whole target process (which may have several threads), but
/// all bookkeeping — function name, location, frames — follows the engine's
/// selected thread only. Other threads are advanced, not modeled.
pub trait Target {
    /// Current process state.
    fn state(&self) -> ProcessState;

    /// Step the selected thread into the next source line.
    fn step_into(&mut self) -> Result<(), InspectError>;

    /// Step out of the current call on the selected thread.
    fn step_out(&mut self) -> Result<(), InspectError>;

    /// Function name of the selected frame, when the process is stopped.
    fn function_name(&self) -> Option<String>;

    /// Source file and line of the selected frame.
    fn location(&self) -> Location;

    /// Number of frames on the selected thread's call stack.
    fn frame_count(&self) -> usize;

    /// Display name of the given frame (0 = innermost).
    fn frame_display_name(&self, frame: usize) -> Option<String>;

    /// In-scope variables of the given frame.
    fn frame_variables(&self, frame: usize) -> Vec<LocatedValue>;

    /// Read an integer register of the selected frame by name.
    fn read_register(&self, name: &str) -> Result<u64, InspectError>;

    /// Synthesize a located value of type `elem` at `address`, the way a
    /// debugger materializes `*(T*)addr`. `None` when the bytes there cannot
    /// be interpreted.
    fn value_at(&self, address: u64, elem: &TypeInfo) -> Option<LocatedValue>;

    /// Read raw bytes at an address. `None` when unmapped.
    fn read_memory(&self, address: u64, size: usize) -> Option<Vec<u8>>;

    /// Drain up to `max_bytes` of captured standard output.
    fn read_stdout(&mut self, max_bytes: usize) -> String;

    /// The constant-string subsection of the main module: its load address
    /// and raw bytes. `None` when the module has no such subsection.
    fn string_section(&self) -> Option<(u64, Vec<u8>)>;
}
