//! # Introduction
//!
//! meminspect reconstructs a typed snapshot of a single-stepped native
//! program's memory: every named variable in every active frame, every live
//! heap block learned by intercepting the allocator, and the module's
//! constant-string section.  The snapshot is rendered live in a terminal UI
//! built with [ratatui](https://docs.rs/ratatui) or exported as TSV.
//!
//! ## Inspection pipeline
//!
//! ```text
//! Target → StepDriver → resolve → MemoryModel → TSV / TUI
//! ```
//!
//! 1. [`engine`] — the backend seam: the [`engine::Target`] trait abstracts a
//!    stopped process (stepping, frames, registers, raw memory), with a
//!    scripted replay implementation in [`engine::script`].
//! 2. [`step`] — drives the target one source line at a time, stepping out of
//!    non-user code and routing allocator calls to the tracker.
//! 3. [`resolve`] — walks each [`engine::LocatedValue`] into flat
//!    observations: scalars and pointers as leaves, char arrays as strings,
//!    composites recursively, and heap pointees decomposed by recorded
//!    allocation size.
//! 4. [`model`] — the address-keyed observation store plus the
//!    [`model::AllocationTracker`]; owns TSV export.
//! 5. [`ui`] — ratatui-based TUI; not part of the stable library API.
//!
//! The [`demo`] module holds a recorded session that exercises the whole
//! pipeline without a live process.

pub mod demo;
pub mod engine;
pub mod errors;
pub mod model;
pub mod resolve;
pub mod step;
pub mod text;
pub mod ui;
