//! Bundled demo session
//!
//! A recorded inspection of a small C program, replayed through
//! [`ScriptedTarget`]. It exercises every part of the pipeline: string
//! literals in the text section, a char array and a struct on the stack, two
//! heap allocations learned by allocator interception (one char buffer, one
//! int array), captured stdout, and a free near the end of the run.
//!
//! The binary runs this session when no real backend is wired up, and the
//! integration tests drive it end to end.

use crate::engine::script::{ScriptedTarget, StopState};
use crate::engine::{Arch, LocatedValue, Pointee, TypeInfo};

/// Source of the recorded program, for the TUI source pane.
pub const DEMO_SOURCE: &str = r#"#include <stdio.h>
#include <stdlib.h>
#include <string.h>

struct point {
    int x;
    int y;
};

int main(void)
{
    char *input = "example.txt";
    char test[] = "literal?";
    struct point p = { -13, 25 };
    char *out = malloc(8);
    strncpy(out, input, 7);
    out[7] = '\0';
    int *nums = malloc(8);
    nums[0] = 323;
    nums[1] = 810;
    puts(out);
    free(nums);
    return 0;
}
"#;

/// File name the recorded stops report.
pub const DEMO_FILE: &str = "demo.c";

/// Architecture of the recording.
pub const DEMO_ARCH: Arch = Arch::Aarch64;

// Recorded addresses: aarch64-style stack high addresses, tagged heap
// addresses, and the text section in the main module.
const STACK_BASE: u64 = 0x0001_6fdf_fb40;
const HEAP_OUT: u64 = 0x6000_0000_4010;
const HEAP_NUMS: u64 = 0x6000_0000_4020;
const CSTRING_ADDR: u64 = 0x0001_0000_05d0;

fn char_type() -> TypeInfo {
    TypeInfo {
        name: "char".to_string(),
        byte_size: 1,
        is_char: true,
    }
}

fn int_type() -> TypeInfo {
    TypeInfo {
        name: "int".to_string(),
        byte_size: 4,
        is_char: false,
    }
}

fn input_var() -> LocatedValue {
    // Points at a string literal; no allocation record exists for it, so the
    // resolver stops after the pointer leaf.
    LocatedValue::pointer(
        "input",
        "char *",
        STACK_BASE + 0x08,
        Some(Pointee {
            address: CSTRING_ADDR,
            elem: char_type(),
        }),
    )
}

fn test_var() -> LocatedValue {
    LocatedValue::char_array("test", 9, STACK_BASE + 0x10, "literal?\\0")
}

fn point_var() -> LocatedValue {
    LocatedValue::composite(
        "p",
        "struct point",
        8,
        STACK_BASE + 0x20,
        vec![
            LocatedValue::scalar("x", "int", 4, STACK_BASE + 0x20, "-13"),
            LocatedValue::scalar("y", "int", 4, STACK_BASE + 0x24, "25"),
        ],
    )
}

fn out_var() -> LocatedValue {
    LocatedValue::pointer(
        "out",
        "char *",
        STACK_BASE + 0x28,
        Some(Pointee {
            address: HEAP_OUT,
            elem: char_type(),
        }),
    )
}

fn nums_var() -> LocatedValue {
    LocatedValue::pointer(
        "nums",
        "int *",
        STACK_BASE + 0x30,
        Some(Pointee {
            address: HEAP_NUMS,
            elem: int_type(),
        }),
    )
}

/// Build the recorded demo target, stopped at the breakpoint on `main`.
pub fn demo_target() -> ScriptedTarget {
    let startup_frame = |s: StopState| {
        s.with_frame(
            "__libc_start_main",
            vec![LocatedValue::scalar(
                "argc",
                "int",
                4,
                STACK_BASE + 0x200,
                "1",
            )],
        )
    };

    let states = vec![
        // 0: initial stop on main
        StopState::at(DEMO_FILE, 12, "main").with_frame("main", vec![]),
        // 1
        startup_frame(StopState::at(DEMO_FILE, 13, "main").with_frame("main", vec![input_var()])),
        // 2
        StopState::at(DEMO_FILE, 14, "main").with_frame("main", vec![input_var(), test_var()]),
        // 3
        StopState::at(DEMO_FILE, 15, "main")
            .with_frame("main", vec![input_var(), test_var(), point_var()]),
        // 4: inside the first malloc call
        StopState::at("malloc.c", 1, "malloc")
            .with_register("x0", 8)
            .out_state(5),
        // 5: back in main with the block address in the return register
        StopState::at(DEMO_FILE, 16, "main")
            .with_register("x0", HEAP_OUT)
            .with_frame("main", vec![input_var(), test_var(), point_var(), out_var()]),
        // 6
        StopState::at(DEMO_FILE, 17, "main")
            .with_frame("main", vec![input_var(), test_var(), point_var(), out_var()]),
        // 7
        StopState::at(DEMO_FILE, 18, "main")
            .with_frame("main", vec![input_var(), test_var(), point_var(), out_var()]),
        // 8: inside the second malloc call
        StopState::at("malloc.c", 1, "malloc")
            .with_register("x0", 8)
            .out_state(9),
        // 9
        StopState::at(DEMO_FILE, 19, "main")
            .with_register("x0", HEAP_NUMS)
            .with_frame(
                "main",
                vec![input_var(), test_var(), point_var(), out_var(), nums_var()],
            ),
        // 10
        StopState::at(DEMO_FILE, 20, "main").with_frame(
            "main",
            vec![input_var(), test_var(), point_var(), out_var(), nums_var()],
        ),
        // 11
        StopState::at(DEMO_FILE, 21, "main").with_frame(
            "main",
            vec![input_var(), test_var(), point_var(), out_var(), nums_var()],
        ),
        // 12: after puts
        StopState::at(DEMO_FILE, 22, "main").emits("example\n").with_frame(
            "main",
            vec![input_var(), test_var(), point_var(), out_var(), nums_var()],
        ),
        // 13: inside free
        StopState::at("free.c", 1, "free")
            .with_register("x0", HEAP_NUMS)
            .out_state(14),
        // 14
        StopState::at(DEMO_FILE, 23, "main").with_frame(
            "main",
            vec![input_var(), test_var(), point_var(), out_var(), nums_var()],
        ),
        // 15
        StopState::exited(),
    ];

    ScriptedTarget::new(states)
        .with_memory(HEAP_OUT, b"example\0".to_vec())
        .with_value_at(
            HEAP_NUMS,
            LocatedValue::scalar("", "int", 4, HEAP_NUMS, "323").unlabeled(),
        )
        .with_value_at(
            HEAP_NUMS + 4,
            LocatedValue::scalar("", "int", 4, HEAP_NUMS + 4, "810").unlabeled(),
        )
        .with_string_section(CSTRING_ADDR, b"example.txt\0literal?\0".to_vec())
}
