//! Error types for the memory inspector
//!
//! This module defines [`InspectError`], covering the two classes of failure
//! that halt an inspection run:
//!
//! - **Unsupported input**: an unrecognized target architecture, or a heap
//!   element type whose size cannot be determined. The run aborts rather than
//!   recording sizes that might be wrong.
//! - **Environment failure**: the target could not be launched, or the
//!   program-control engine reported a failed step or register read. These are
//!   not expected to be transient, so there is no retry path.
//!
//! Recoverable conditions (a variable held in a register, a pointer whose
//! allocation size is unknown, a stack-resident pointer target) are not errors
//! at all; the resolver skips them and the snapshot is simply sparser.

use thiserror::Error;

/// Errors that halt an inspection run.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The target's architecture has no calling-convention table.
    #[error("unsupported target architecture '{name}'")]
    UnsupportedArch { name: String },

    /// A heap element type whose byte size the engine could not determine.
    #[error("cannot size heap element type '{type_name}' at 0x{address:x}")]
    UnsupportedHeapType { type_name: String, address: u64 },

    /// The target process could not be created or launched.
    #[error("failed to launch target: {reason}")]
    Launch { reason: String },

    /// The engine reported a failed step command, or a step never advanced
    /// the source line within the repair bound.
    #[error("step failed: {reason}")]
    StepFailed { reason: String },

    /// A register read failed or the register name is unknown to the engine.
    #[error("cannot read register '{name}'")]
    RegisterRead { name: String },
}
