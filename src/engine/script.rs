//! Scripted target backend
//!
//! [`ScriptedTarget`] replays a recorded sequence of stop states through the
//! [`Target`] interface. Each [`StopState`] describes one stop of the target:
//! where it is, what frames and variables exist, what the registers hold, and
//! what it printed since the previous stop. Steps move a cursor through the
//! sequence, with optional per-state overrides so a script can model the
//! difference between stepping into an allocator and stepping out of it.
//!
//! This is the reference backend for the bundled demo session and the test
//! suite; real backends implement [`Target`] over an actual debugger engine.

use rustc_hash::FxHashMap;

use super::{Location, LocatedValue, ProcessState, Target, TypeInfo};
use crate::errors::InspectError;

/// One frame of a scripted call stack.
#[derive(Debug, Clone)]
pub struct ScriptFrame {
    pub display_name: String,
    pub variables: Vec<LocatedValue>,
}

/// One recorded stop of the target.
#[derive(Debug, Clone)]
pub struct StopState {
    pub state: ProcessState,
    pub function: Option<String>,
    pub location: Location,
    pub frames: Vec<ScriptFrame>,
    pub registers: FxHashMap<String, u64>,
    /// Standard output emitted on entering this state.
    pub stdout: String,
    /// Cursor target for a step-into from this state; default is the next
    /// state in sequence.
    pub next_into: Option<usize>,
    /// Cursor target for a step-out from this state; default is the next
    /// state in sequence.
    pub next_out: Option<usize>,
}

impl StopState {
    /// A stopped state at `file:line` inside `function`.
    pub fn at(file: &str, line: u32, function: &str) -> Self {
        StopState {
            state: ProcessState::Stopped,
            function: Some(function.to_string()),
            location: Location {
                file: Some(file.to_string()),
                line,
            },
            frames: Vec::new(),
            registers: FxHashMap::default(),
            stdout: String::new(),
            next_into: None,
            next_out: None,
        }
    }

    /// The terminal state after the process has exited.
    pub fn exited() -> Self {
        StopState {
            state: ProcessState::Exited,
            function: None,
            location: Location::default(),
            frames: Vec::new(),
            registers: FxHashMap::default(),
            stdout: String::new(),
            next_into: None,
            next_out: None,
        }
    }

    pub fn with_frame(mut self, display_name: &str, variables: Vec<LocatedValue>) -> Self {
        self.frames.push(ScriptFrame {
            display_name: display_name.to_string(),
            variables,
        });
        self
    }

    pub fn with_register(mut self, name: &str, value: u64) -> Self {
        self.registers.insert(name.to_string(), value);
        self
    }

    pub fn emits(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    /// Override where a step-into from this state lands.
    pub fn into_state(mut self, index: usize) -> Self {
        self.next_into = Some(index);
        self
    }

    /// Override where a step-out from this state lands.
    pub fn out_state(mut self, index: usize) -> Self {
        self.next_out = Some(index);
        self
    }
}

/// Deterministic [`Target`] implementation over a stop-state script.
pub struct ScriptedTarget {
    states: Vec<StopState>,
    cursor: usize,
    heap_values: FxHashMap<u64, LocatedValue>,
    raw_memory: Vec<(u64, Vec<u8>)>,
    strings: Option<(u64, Vec<u8>)>,
    pending_stdout: String,
}

impl ScriptedTarget {
    /// Build a target positioned at the first state of `states`.
    ///
    /// Scripts must contain at least one state; the first one models the
    /// initial stop (the breakpoint on the main function).
    pub fn new(states: Vec<StopState>) -> Self {
        assert!(!states.is_empty(), "script needs at least one stop state");
        let pending_stdout = states[0].stdout.clone();
        ScriptedTarget {
            states,
            cursor: 0,
            heap_values: FxHashMap::default(),
            raw_memory: Vec::new(),
            strings: None,
            pending_stdout,
        }
    }

    /// Register a value that [`Target::value_at`] will synthesize at `address`.
    pub fn with_value_at(mut self, address: u64, value: LocatedValue) -> Self {
        self.heap_values.insert(address, value);
        self
    }

    /// Back a raw memory range for [`Target::read_memory`].
    pub fn with_memory(mut self, address: u64, bytes: Vec<u8>) -> Self {
        self.raw_memory.push((address, bytes));
        self
    }

    /// Provide the constant-string subsection.
    pub fn with_string_section(mut self, address: u64, bytes: Vec<u8>) -> Self {
        self.strings = Some((address, bytes));
        self
    }

    /// Replace the value synthesized at `address` mid-run (used by scripts
    /// that model mutation between steps).
    pub fn set_value_at(&mut self, address: u64, value: LocatedValue) {
        self.heap_values.insert(address, value);
    }

    fn current(&self) -> &StopState {
        &self.states[self.cursor]
    }

    fn goto(&mut self, index: usize) {
        // Past-the-end means the script ran out; hold at the last state.
        let index = index.min(self.states.len() - 1);
        self.cursor = index;
        let chunk = &self.states[index].stdout;
        if !chunk.is_empty() {
            self.pending_stdout.push_str(chunk);
        }
    }
}

impl Target for ScriptedTarget {
    fn state(&self) -> ProcessState {
        self.current().state
    }

    fn step_into(&mut self) -> Result<(), InspectError> {
        if self.current().state == ProcessState::Exited {
            return Ok(());
        }
        let next = self.current().next_into.unwrap_or(self.cursor + 1);
        self.goto(next);
        Ok(())
    }

    fn step_out(&mut self) -> Result<(), InspectError> {
        if self.current().state == ProcessState::Exited {
            return Ok(());
        }
        let next = self.current().next_out.unwrap_or(self.cursor + 1);
        self.goto(next);
        Ok(())
    }

    fn function_name(&self) -> Option<String> {
        self.current().function.clone()
    }

    fn location(&self) -> Location {
        self.current().location.clone()
    }

    fn frame_count(&self) -> usize {
        self.current().frames.len()
    }

    fn frame_display_name(&self, frame: usize) -> Option<String> {
        self.current().frames.get(frame).map(|f| f.display_name.clone())
    }

    fn frame_variables(&self, frame: usize) -> Vec<LocatedValue> {
        self.current()
            .frames
            .get(frame)
            .map(|f| f.variables.clone())
            .unwrap_or_default()
    }

    fn read_register(&self, name: &str) -> Result<u64, InspectError> {
        self.current()
            .registers
            .get(name)
            .copied()
            .ok_or_else(|| InspectError::RegisterRead {
                name: name.to_string(),
            })
    }

    fn value_at(&self, address: u64, _elem: &TypeInfo) -> Option<LocatedValue> {
        self.heap_values.get(&address).cloned()
    }

    fn read_memory(&self, address: u64, size: usize) -> Option<Vec<u8>> {
        for (base, bytes) in &self.raw_memory {
            let end = base + bytes.len() as u64;
            if address >= *base && address + size as u64 <= end {
                let offset = (address - base) as usize;
                return Some(bytes[offset..offset + size].to_vec());
            }
        }
        None
    }

    fn read_stdout(&mut self, max_bytes: usize) -> String {
        let mut n = max_bytes.min(self.pending_stdout.len());
        while n > 0 && !self.pending_stdout.is_char_boundary(n) {
            n -= 1;
        }
        self.pending_stdout.drain(..n).collect()
    }

    fn string_section(&self) -> Option<(u64, Vec<u8>)> {
        self.strings.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_script_advances_and_holds_at_end() {
        let mut target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main"),
            StopState::at("demo.c", 4, "main"),
            StopState::exited(),
        ]);
        assert_eq!(target.location().line, 3);
        target.step_into().unwrap();
        assert_eq!(target.location().line, 4);
        target.step_into().unwrap();
        assert_eq!(target.state(), ProcessState::Exited);
        // Further steps are no-ops.
        target.step_into().unwrap();
        assert_eq!(target.state(), ProcessState::Exited);
    }

    #[test]
    fn stdout_accumulates_and_drains_bounded() {
        let mut target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main").emits("hello "),
            StopState::at("demo.c", 4, "main").emits("world"),
        ]);
        target.step_into().unwrap();
        assert_eq!(target.read_stdout(5), "hello");
        assert_eq!(target.read_stdout(120), " world");
        assert_eq!(target.read_stdout(120), "");
    }

    #[test]
    fn step_overrides_route_the_cursor() {
        let mut target = ScriptedTarget::new(vec![
            StopState::at("demo.c", 3, "main").into_state(2),
            StopState::at("demo.c", 4, "main"),
            StopState::at("lib.c", 9, "helper").out_state(1),
        ]);
        target.step_into().unwrap();
        assert_eq!(target.function_name().as_deref(), Some("helper"));
        target.step_out().unwrap();
        assert_eq!(target.location().line, 4);
    }

    #[test]
    fn raw_memory_window() {
        let target = ScriptedTarget::new(vec![StopState::at("demo.c", 1, "main")])
            .with_memory(0x1000, b"abcdef".to_vec());
        assert_eq!(target.read_memory(0x1002, 3).unwrap(), b"cde");
        assert!(target.read_memory(0x1004, 4).is_none());
    }
}
