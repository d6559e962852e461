//! # Software Core Tests
//!
//! Mapping rules, memory access across mappings, instruction fetch and the
//! run loop's interaction with callbacks and stop requests.

use armemu_core::common::CoreError;
use armemu_core::cpu::{Core, Executor, Machine, Register, RunExit, SoftCore};
use armemu_core::mem::Permissions;
use armemu_core::sim::{HookAction, StopHandle};

const BASE: u64 = 0x1_0000;

fn core_with_code() -> SoftCore {
    let mut core = SoftCore::nop();
    core.map(BASE, 0x1000, Permissions::ALL).unwrap();
    core
}

#[test]
fn test_overlapping_map_is_rejected() {
    let mut core = core_with_code();
    let err = core.map(BASE + 0x800, 0x1000, Permissions::ALL).unwrap_err();
    assert!(matches!(err, CoreError::Overlap { start, .. } if start == BASE + 0x800));

    // Adjacent is fine.
    core.map(BASE + 0x1000, 0x1000, Permissions::READ_WRITE).unwrap();
}

#[test]
fn test_access_spans_adjacent_mappings() {
    let mut core = core_with_code();
    core.map(BASE + 0x1000, 0x1000, Permissions::READ_WRITE).unwrap();

    core.write(BASE + 0xFFE, &[1, 2, 3, 4]).unwrap();
    let mut out = [0u8; 4];
    core.read(BASE + 0xFFE, &mut out).unwrap();
    assert_eq!(out, [1, 2, 3, 4]);
}

#[test]
fn test_unmapped_access_is_atomic() {
    let mut core = core_with_code();
    let err = core.write(BASE + 0xFFE, &[9, 9, 9, 9]).unwrap_err();
    assert!(matches!(err, CoreError::Unmapped { len: 4, .. }));

    let mut out = [0xFFu8; 2];
    core.read(BASE + 0xFFE, &mut out).unwrap();
    assert_eq!(out, [0, 0]);
}

#[test]
fn test_runs_until_end_address() {
    let mut core = core_with_code();
    let stop = StopHandle::new();
    let mut seen = Vec::new();

    let exit = core
        .run(BASE, BASE + 0x10, &stop, &mut |_: &mut dyn Machine, address: u64| {
            seen.push(address);
            HookAction::Continue
        })
        .unwrap();

    assert_eq!(exit, RunExit::ReachedEnd);
    assert_eq!(seen, [BASE, BASE + 4, BASE + 8, BASE + 12]);
    assert_eq!(core.reg_read(Register::Pc), (BASE + 0x10) as u32);
    assert_eq!(core.executed(), 4);
}

#[test]
fn test_begin_equal_to_end_executes_nothing() {
    let mut core = core_with_code();
    let exit = core
        .run(BASE, BASE, &StopHandle::new(), &mut |_: &mut dyn Machine, _: u64| {
            HookAction::Continue
        })
        .unwrap();
    assert_eq!(exit, RunExit::ReachedEnd);
    assert_eq!(core.executed(), 0);
}

#[test]
fn test_callback_stop_prevents_execution() {
    let mut core = core_with_code();
    let exit = core
        .run(BASE, BASE + 0x100, &StopHandle::new(), &mut |_: &mut dyn Machine, address: u64| {
            if address == BASE + 8 {
                HookAction::Stop
            } else {
                HookAction::Continue
            }
        })
        .unwrap();

    assert_eq!(exit, RunExit::Stopped);
    assert_eq!(core.reg_read(Register::Pc), (BASE + 8) as u32);
    assert_eq!(core.executed(), 2);
}

#[test]
fn test_callback_pc_write_skips_instruction() {
    let mut core = core_with_code();
    let mut seen = Vec::new();
    let exit = core
        .run(BASE, BASE + 0x10, &StopHandle::new(), &mut |m: &mut dyn Machine, address: u64| {
            seen.push(address);
            if address == BASE + 4 {
                m.reg_write(Register::Pc, (BASE + 12) as u32);
            }
            HookAction::Continue
        })
        .unwrap();

    assert_eq!(exit, RunExit::ReachedEnd);
    assert_eq!(seen, [BASE, BASE + 4, BASE + 12]);
    assert_eq!(core.executed(), 2);
}

#[test]
fn test_fetch_from_non_executable_memory_faults() {
    let mut core = SoftCore::nop();
    core.map(BASE, 0x1000, Permissions::READ_WRITE).unwrap();
    let err = core
        .run(BASE, BASE + 4, &StopHandle::new(), &mut |_: &mut dyn Machine, _: u64| {
            HookAction::Continue
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::FetchFault(pc) if pc == BASE));
}

#[test]
fn test_running_off_the_mapping_faults() {
    let mut core = core_with_code();
    let err = core
        .run(BASE + 0xFFC, BASE + 0x2000, &StopHandle::new(), &mut |_: &mut dyn Machine, _: u64| {
            HookAction::Continue
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::FetchFault(pc) if pc == BASE + 0x1000));
}

#[test]
fn test_misaligned_pc_faults() {
    let mut core = core_with_code();
    let err = core
        .run(BASE + 2, BASE + 0x10, &StopHandle::new(), &mut |_: &mut dyn Machine, _: u64| {
            HookAction::Continue
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::FetchFault(_)));
}

/// Adds the low byte of each instruction word to `r0`.
#[derive(Debug, Default)]
struct Accumulate;

impl Executor for Accumulate {
    fn execute(&mut self, machine: &mut dyn Machine, pc: u64, word: u32) -> Result<u64, CoreError> {
        if word == 0xFFFF_FFFF {
            return Err(CoreError::Execute {
                pc,
                word,
                reason: "undefined".to_string(),
            });
        }
        let r0 = machine.reg_read(Register::R0);
        machine.reg_write(Register::R0, r0 + (word & 0xFF));
        Ok(pc + 4)
    }
}

#[test]
fn test_executor_sees_fetched_words() {
    let mut core = SoftCore::new(Accumulate);
    core.map(BASE, 0x1000, Permissions::ALL).unwrap();
    for (i, word) in [1u32, 2, 3].iter().enumerate() {
        core.write(BASE + i as u64 * 4, &word.to_le_bytes()).unwrap();
    }

    let exit = core
        .run(BASE, BASE + 12, &StopHandle::new(), &mut |_: &mut dyn Machine, _: u64| {
            HookAction::Continue
        })
        .unwrap();
    assert_eq!(exit, RunExit::ReachedEnd);
    assert_eq!(core.reg_read(Register::R0), 6);
}

#[test]
fn test_executor_error_propagates() {
    let mut core = SoftCore::new(Accumulate);
    core.map(BASE, 0x1000, Permissions::ALL).unwrap();
    core.write(BASE, &0xFFFF_FFFF_u32.to_le_bytes()).unwrap();

    let err = core
        .run(BASE, BASE + 4, &StopHandle::new(), &mut |_: &mut dyn Machine, _: u64| {
            HookAction::Continue
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::Execute { word: 0xFFFF_FFFF, .. }));
}
