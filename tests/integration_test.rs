//! End-to-end tests over the bundled demo session: the full pipeline from
//! scripted stepping through resolution to the exported TSV.

use meminspect::demo::{demo_target, DEMO_ARCH};
use meminspect::engine::script::ScriptedTarget;
use meminspect::model::MemoryModel;
use meminspect::step::StepDriver;
use meminspect::text::read_text_section;

// Addresses recorded in the demo session.
const STACK_BASE: u64 = 0x0001_6fdf_fb40;
const HEAP_OUT: u64 = 0x6000_0000_4010;
const HEAP_NUMS: u64 = 0x6000_0000_4020;
const CSTRING_ADDR: u64 = 0x0001_0000_05d0;

/// Step the demo session to completion and return the final model and driver.
fn run_to_exit() -> (MemoryModel, StepDriver<ScriptedTarget>) {
    let target = demo_target();
    let mut model = MemoryModel::new();
    read_text_section(&mut model, &target);
    let mut driver = StepDriver::new(target, DEMO_ARCH);
    while !driver.has_exited() {
        driver.step(1, &mut model).unwrap();
    }
    (model, driver)
}

#[test]
fn demo_session_runs_to_exit() {
    let (model, driver) = run_to_exit();
    assert!(driver.has_exited());
    assert_eq!(model.len(), 10);
}

#[test]
fn text_section_is_read_once_at_startup() {
    let (model, _) = run_to_exit();
    let obs = model.get(CSTRING_ADDR).unwrap();
    assert_eq!(obs.section, "text");
    assert_eq!(obs.size, 21);
    assert_eq!(obs.value_str(), "example.txt\\0literal?\\0");
    assert_eq!(obs.label_str(), "(none)");
    assert_eq!(obs.type_str(), "(none)");
}

#[test]
fn stack_frame_variables_are_modeled() {
    let (model, _) = run_to_exit();

    let input = model.get(STACK_BASE + 0x08).unwrap();
    assert_eq!(input.section, "stack-main");
    assert_eq!(input.label_str(), "input");
    assert_eq!(input.type_str(), "char *");
    assert_eq!(input.value_str(), "0x00000001000005d0");

    let test = model.get(STACK_BASE + 0x10).unwrap();
    assert_eq!(test.label_str(), "test");
    assert_eq!(test.type_str(), "char[9]");
    assert_eq!(test.value_str(), "literal?\\0");
    assert_eq!(test.size, 9);

    // Struct fields flatten to dotted labels.
    let x = model.get(STACK_BASE + 0x20).unwrap();
    assert_eq!(x.label_str(), "p.x");
    assert_eq!(x.value_str(), "-13");
    let y = model.get(STACK_BASE + 0x24).unwrap();
    assert_eq!(y.label_str(), "p.y");
    assert_eq!(y.value_str(), "25");

    let out = model.get(STACK_BASE + 0x28).unwrap();
    assert_eq!(out.label_str(), "out");
    assert_eq!(out.value_str(), "0x0000600000004010");

    let nums = model.get(STACK_BASE + 0x30).unwrap();
    assert_eq!(nums.label_str(), "nums");
    assert_eq!(nums.type_str(), "int *");
}

#[test]
fn heap_blocks_are_learned_by_allocator_interception() {
    let (model, _) = run_to_exit();

    // char buffer: one observation over the whole allocation.
    let out = model.get(HEAP_OUT).unwrap();
    assert_eq!(out.section, "heap");
    assert_eq!(out.size, 8);
    assert_eq!(out.value_str(), "example\\0");
    assert_eq!(out.label_str(), "(none)");
    assert_eq!(out.type_str(), "char");

    // int array: one observation per element.
    let n0 = model.get(HEAP_NUMS).unwrap();
    assert_eq!(n0.section, "heap");
    assert_eq!(n0.value_str(), "323");
    let n1 = model.get(HEAP_NUMS + 4).unwrap();
    assert_eq!(n1.value_str(), "810");
}

#[test]
fn string_literal_pointer_is_not_decomposed() {
    // `input` points into the text section; there is no allocation record
    // for its target, so only the pointer leaf is modeled. The text-section
    // observation at that address came from the startup read, not the walk.
    let (model, _) = run_to_exit();
    assert_eq!(model.get(CSTRING_ADDR).unwrap().section, "text");
    assert_eq!(model.allocations().size_of(CSTRING_ADDR), None);
}

#[test]
fn free_tombstones_the_block_but_keeps_observations() {
    let (model, _) = run_to_exit();
    // The tracker remembers the freed block with size zero.
    assert_eq!(model.allocations().size_of(HEAP_NUMS), Some(0));
    assert_eq!(model.allocations().size_of(HEAP_OUT), Some(8));
    // Element observations made while the block was live are not retracted.
    assert!(model.get(HEAP_NUMS).is_some());
    assert!(model.get(HEAP_NUMS + 4).is_some());
}

#[test]
fn stdout_is_captured() {
    let (_, driver) = run_to_exit();
    assert_eq!(driver.execution_state().stdout, vec!["example".to_string()]);
}

#[test]
fn startup_frame_holds_no_observations() {
    // The __libc_start_main frame carries an argc variable in the recording;
    // it must not appear in the model.
    let (model, _) = run_to_exit();
    assert!(model.get(STACK_BASE + 0x200).is_none());
    assert!(model
        .values_sorted()
        .iter()
        .all(|v| !v.section.contains("libc")));
}

#[test]
fn tsv_export_has_exact_layout() {
    let (model, _) = run_to_exit();
    let mut out = Vec::new();
    model.write_tsv(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "section\taddress\tsize\tvalue\tlabel\ttype");
    assert_eq!(lines.len(), 11);
    for line in &lines[1..] {
        assert_eq!(line.split('\t').count(), 6);
    }

    // Rows ascend by address: text section, then the stack frame, then heap.
    let addrs: Vec<u64> = lines[1..]
        .iter()
        .map(|l| {
            let field = l.split('\t').nth(1).unwrap();
            u64::from_str_radix(field.trim_start_matches("0x"), 16).unwrap()
        })
        .collect();
    assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(addrs[0], CSTRING_ADDR);
    assert_eq!(*addrs.last().unwrap(), HEAP_NUMS + 4);

    assert_eq!(
        lines[1],
        "text\t0x00000001000005d0\t21\texample.txt\\0literal?\\0\t(none)\t(none)"
    );
}

#[test]
fn stepping_past_exit_is_a_no_op() {
    let (mut model, mut driver) = run_to_exit();
    let before: Vec<String> = model.values_sorted().iter().map(|v| v.to_string()).collect();
    driver.step(5, &mut model).unwrap();
    let after: Vec<String> = model.values_sorted().iter().map(|v| v.to_string()).collect();
    assert_eq!(before, after);
    assert!(driver.has_exited());
}

#[test]
fn partial_run_sees_only_the_first_allocation() {
    let target = demo_target();
    let mut model = MemoryModel::new();
    let mut driver = StepDriver::new(target, DEMO_ARCH);

    // Four steps: past the declarations and the first malloc.
    driver.step(4, &mut model).unwrap();
    assert_eq!(model.allocations().len(), 1);
    assert_eq!(model.allocations().size_of(HEAP_OUT), Some(8));
    assert!(model.get(HEAP_OUT).is_some());
    assert!(model.get(HEAP_NUMS).is_none());
    assert_eq!(driver.location().line, 16);
}
