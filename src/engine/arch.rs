//! Per-architecture calling-convention tables
//!
//! The allocator interceptor needs exactly two facts about the target ABI:
//! which register carries the first integer argument at a call boundary, and
//! which register carries the return value. Two conventions are recognized:
//! AArch64 (`x0`..`x3`) and x86-64 System V (`rdi`/`rsi`/`rdx`/`rcx`, return
//! in `rax`). Anything else is a fatal configuration error, never a silent
//! fallback.

use crate::errors::InspectError;

const X86_64_ARG_REGISTERS: [&str; 4] = ["rdi", "rsi", "rdx", "rcx"];
const AARCH64_ARG_REGISTERS: [&str; 4] = ["x0", "x1", "x2", "x3"];

/// Target architecture, as taken from the leading component of the triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Aarch64,
    X86_64,
}

impl Arch {
    /// Parse an architecture name (e.g. the first dash-separated component of
    /// a target triple such as `arm64-apple-macosx`).
    pub fn from_name(name: &str) -> Result<Self, InspectError> {
        match name {
            "arm64" | "aarch64" => Ok(Arch::Aarch64),
            "x86_64" => Ok(Arch::X86_64),
            _ => Err(InspectError::UnsupportedArch {
                name: name.to_string(),
            }),
        }
    }

    /// Register holding the nth integer argument at function entry.
    ///
    /// Only the first four argument slots are tabulated; the allocator
    /// interceptor never needs more than the first.
    pub fn argument_register(self, index: usize) -> &'static str {
        match self {
            Arch::Aarch64 => AARCH64_ARG_REGISTERS[index],
            Arch::X86_64 => X86_64_ARG_REGISTERS[index],
        }
    }

    /// Register holding the integer return value after a call.
    pub fn return_register(self) -> &'static str {
        match self {
            Arch::Aarch64 => "x0",
            Arch::X86_64 => "rax",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Arch::Aarch64 => "aarch64",
            Arch::X86_64 => "x86_64",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_both_conventions() {
        assert_eq!(Arch::from_name("arm64").unwrap(), Arch::Aarch64);
        assert_eq!(Arch::from_name("aarch64").unwrap(), Arch::Aarch64);
        assert_eq!(Arch::from_name("x86_64").unwrap(), Arch::X86_64);
    }

    #[test]
    fn unknown_arch_is_fatal() {
        let err = Arch::from_name("riscv64").unwrap_err();
        assert!(matches!(err, InspectError::UnsupportedArch { name } if name == "riscv64"));
    }

    #[test]
    fn register_tables() {
        assert_eq!(Arch::Aarch64.argument_register(0), "x0");
        assert_eq!(Arch::Aarch64.return_register(), "x0");
        assert_eq!(Arch::X86_64.argument_register(0), "rdi");
        assert_eq!(Arch::X86_64.argument_register(1), "rsi");
        assert_eq!(Arch::X86_64.return_register(), "rax");
    }
}
