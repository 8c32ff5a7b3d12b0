//! Step driving
//!
//! [`StepDriver`] advances the target by one logical source line at a time
//! and keeps the memory model in sync after every step. `advance` hides three
//! engine realities from the rest of the crate:
//!
//! - stepping into the allocator or deallocator is detected by function-name
//!   suffix and routed through the allocation tracker, which also moves the
//!   thread back past the call
//! - any stop whose source file is not the recognized main source file is
//!   library or runtime code and gets stepped out of (single-file user
//!   programs only; multi-file programs are out of scope)
//! - a requested line-step sometimes performs only an instruction-level step
//!   with no visible line change; such steps are repaired by stepping again,
//!   under a bounded retry so a pathological engine cannot loop forever
//!
//! The driver never forces termination. Once the process-exited state is
//! observed, further `advance` calls are no-ops.

use tracing::{debug, trace};

use crate::engine::{Arch, Location, ProcessState, Target};
use crate::errors::InspectError;
use crate::model::{stack_section, MemoryModel};
use crate::resolve::resolve;

/// Function-name suffix that identifies the allocator (matches mangled glibc
/// names as well as the plain symbol).
const ALLOCATOR_NAME: &str = "malloc";

/// Function-name suffix that identifies the deallocator.
const DEALLOCATOR_NAME: &str = "free";

/// Outermost runtime-startup frame, excluded from stack walks.
const RUNTIME_STARTUP_FRAME: &str = "__libc_start";

/// Upper bound on line-step repair attempts within one `advance`.
const MAX_STEP_REPAIR: usize = 64;

/// Bytes of captured standard output read per logical step.
const STDOUT_READ_LIMIT: usize = 120;

/// Bookkeeping mutated once per logical step and read by consumers between
/// steps.
#[derive(Debug)]
pub struct ExecutionState {
    /// Source file of the selected frame's current line.
    pub file: Option<String>,
    /// Current line number.
    pub line: u32,
    /// Current function name.
    pub function: Option<String>,
    /// Captured standard-output text, one chunk per step that produced any.
    pub stdout: Vec<String>,
    /// Architecture whose register-name table is in effect.
    pub arch: Arch,
}

/// Advances target execution one logical source line at a time.
pub struct StepDriver<T: Target> {
    target: T,
    /// Source file of the initial stop; everything else is non-user code.
    main_file: String,
    state: ExecutionState,
}

impl<T: Target> StepDriver<T> {
    /// Wrap a target that is stopped at its initial breakpoint (on the main
    /// function). The file of that stop becomes the recognized user source
    /// file.
    pub fn new(target: T, arch: Arch) -> Self {
        let location = target.location();
        let function = target.function_name();
        StepDriver {
            main_file: location.file.clone().unwrap_or_default(),
            state: ExecutionState {
                file: location.file,
                line: location.line,
                function,
                stdout: Vec::new(),
                arch,
            },
            target,
        }
    }

    pub fn execution_state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn location(&self) -> Location {
        Location {
            file: self.state.file.clone(),
            line: self.state.line,
        }
    }

    pub fn has_exited(&self) -> bool {
        self.target.state() == ProcessState::Exited
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Advance the target exactly one source line, handling allocator entry,
    /// non-user code and mis-sized steps. No-op once the process has exited.
    pub fn advance(&mut self, model: &mut MemoryModel) -> Result<(), InspectError> {
        if self.target.state() == ProcessState::Exited {
            return Ok(());
        }

        for _ in 0..MAX_STEP_REPAIR {
            let begin = self.target.location();
            self.target.step_into()?;

            if let Some(name) = self.target.function_name() {
                if name.ends_with(ALLOCATOR_NAME) {
                    // The size argument register is clobbered by the return,
                    // so capture it before stepping out.
                    let size = model
                        .allocations()
                        .on_allocator_entry(&self.target, self.state.arch)?;
                    model.allocations_mut().on_allocator_exit(
                        &mut self.target,
                        self.state.arch,
                        size,
                    )?;
                } else if name.ends_with(DEALLOCATOR_NAME) {
                    model
                        .allocations_mut()
                        .on_deallocator_entry(&mut self.target, self.state.arch)?;
                }
            }

            // Any other file is library or runtime code; treat it as opaque.
            while self.target.state() != ProcessState::Exited
                && self.target.location().file.as_deref() != Some(self.main_file.as_str())
            {
                self.target.step_out()?;
            }

            if self.target.state() == ProcessState::Exited {
                return Ok(());
            }
            let now = self.target.location();
            if now != begin {
                return Ok(());
            }
            // Line-step degraded to an instruction-level step; go again.
            trace!(line = begin.line, "step produced no line change, repairing");
        }

        Err(InspectError::StepFailed {
            reason: format!("no source-line progress after {MAX_STEP_REPAIR} steps"),
        })
    }

    /// Advance `n` logical steps, walking every variable of every active
    /// frame of the selected thread into the model after each one and
    /// appending newly captured standard output.
    pub fn step(&mut self, n: usize, model: &mut MemoryModel) -> Result<(), InspectError> {
        for _ in 0..n {
            self.advance(model)?;

            self.state.function = self.target.function_name();
            let location = self.target.location();
            self.state.file = location.file;
            self.state.line = location.line;

            if self.target.state() != ProcessState::Exited {
                for frame in 0..self.target.frame_count() {
                    let name = self
                        .target
                        .frame_display_name(frame)
                        .unwrap_or_else(|| "(none)".to_string());
                    // The startup frame precedes main and holds no user state.
                    if name.contains(RUNTIME_STARTUP_FRAME) {
                        continue;
                    }
                    let section = stack_section(&name);
                    for var in self.target.frame_variables(frame) {
                        resolve(model, &self.target, &section, &var)?;
                    }
                }
            } else {
                debug!("target exited");
            }

            let out = self.target.read_stdout(STDOUT_READ_LIMIT);
            if !out.is_empty() {
                self.state.stdout.push(out.trim_end().to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::script::{ScriptedTarget, StopState};
    use crate::engine::LocatedValue;

    #[test]
    fn advance_moves_one_line() {
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main"),
            StopState::at("demo.c", 4, "main"),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        driver.step(1, &mut model).unwrap();
        assert_eq!(driver.location().line, 4);
    }

    #[test]
    fn advance_repairs_steps_without_line_change() {
        // State 1 reports the same file and line as state 0; a real line
        // change only appears at state 2.
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main"),
            StopState::at("demo.c", 3, "main"),
            StopState::at("demo.c", 4, "main"),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        driver.step(1, &mut model).unwrap();
        assert_eq!(driver.location().line, 4);
    }

    #[test]
    fn repair_loop_is_bounded() {
        // A step that never changes the line must not loop forever.
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main").into_state(0),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        let err = driver.advance(&mut model).unwrap_err();
        assert!(matches!(err, InspectError::StepFailed { .. }));
    }

    #[test]
    fn repair_terminates_on_exit() {
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main"),
            StopState::exited(),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        driver.step(1, &mut model).unwrap();
        assert!(driver.has_exited());
        // Further advances are no-ops.
        driver.advance(&mut model).unwrap();
        driver.step(3, &mut model).unwrap();
        assert!(driver.has_exited());
    }

    #[test]
    fn non_user_files_are_stepped_out_of() {
        // Step lands inside library code (different file); the driver steps
        // out until the main file is current again.
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 7, "main"),
            StopState::at("strstr.c", 120, "strstr").out_state(2),
            StopState::at("demo.c", 8, "main"),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        driver.step(1, &mut model).unwrap();
        assert_eq!(driver.location().line, 8);
        assert_eq!(driver.execution_state().function.as_deref(), Some("main"));
    }

    #[test]
    fn allocator_call_is_intercepted_during_advance() {
        // Stepping into line 9 lands in malloc; the driver captures the size
        // argument, steps the allocator out and records the returned block.
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 9, "main"),
            StopState::at("malloc.c", 1, "malloc")
                .with_register("x0", 24)
                .out_state(2),
            StopState::at("demo.c", 10, "main").with_register("x0", 0x6000_0000),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        driver.step(1, &mut model).unwrap();
        assert_eq!(model.allocations().size_of(0x6000_0000), Some(24));
        assert_eq!(driver.location().line, 10);
    }

    #[test]
    fn deallocator_call_tombstones_the_block() {
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 12, "main"),
            StopState::at("free.c", 1, "free")
                .with_register("x0", 0x6000_0000)
                .out_state(2),
            StopState::at("demo.c", 13, "main"),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        model.allocations_mut().record(0x6000_0000, 24);
        driver.step(1, &mut model).unwrap();
        assert_eq!(model.allocations().size_of(0x6000_0000), Some(0));
    }

    #[test]
    fn frames_are_walked_and_startup_frame_skipped() {
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main"),
            StopState::at("demo.c", 4, "main")
                .with_frame(
                    "main",
                    vec![LocatedValue::scalar("x", "int", 4, 0x16fd0_0010, "5")],
                )
                .with_frame(
                    "__libc_start_main",
                    vec![LocatedValue::scalar("argc", "int", 4, 0x16fd0_0100, "1")],
                ),
        ]);
        let mut driver = StepDriver::new(target, Arch::X86_64);
        let mut model = MemoryModel::new();
        driver.step(1, &mut model).unwrap();
        assert_eq!(model.get(0x16fd0_0010).unwrap().section, "stack-main");
        assert!(model.get(0x16fd0_0100).is_none());
    }

    #[test]
    fn stdout_is_captured_per_step() {
        let target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main"),
            StopState::at("demo.c", 4, "main").emits("example\n"),
            StopState::at("demo.c", 5, "main").emits("literal?\n"),
        ]);
        let mut driver = StepDriver::new(target, Arch::Aarch64);
        let mut model = MemoryModel::new();
        driver.step(2, &mut model).unwrap();
        assert_eq!(
            driver.execution_state().stdout,
            vec!["example".to_string(), "literal?".to_string()]
        );
    }
}
