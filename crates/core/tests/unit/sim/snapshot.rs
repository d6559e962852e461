//! # Snapshot Tests
//!
//! Directory naming, per-region file contents and collision behaviour.

use std::fs;
use std::path::PathBuf;

use armemu_core::common::{EmulatorError, SnapshotError};
use armemu_core::cpu::{Machine, SoftCore};
use armemu_core::mem::{AddressSpace, MemoryView};
use armemu_core::sim::SnapshotWriter;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::common::harness::{BASE, BIN_SIZE, STACK_SIZE, TestContext};

fn sorted_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_one_file_per_region() {
    let mut ctx = TestContext::new();
    let dir = ctx.emu.debug_dump_at(1_700_000_000).unwrap();

    assert_eq!(dir, ctx.dump_dir().join("1700000000"));
    assert_eq!(
        sorted_entries(&dir),
        vec![
            "0x00400000-0x00410000.bin".to_string(),
            "0x00410000-0x00418000.bin".to_string(),
        ]
    );
    let bin = fs::metadata(dir.join("0x00400000-0x00410000.bin")).unwrap();
    let stack = fs::metadata(dir.join("0x00410000-0x00418000.bin")).unwrap();
    assert_eq!(bin.len(), BIN_SIZE);
    assert_eq!(stack.len(), STACK_SIZE);
}

#[test]
fn test_file_contents_match_memory() {
    let mut ctx = TestContext::new();
    let stack = ctx.emu.stack_region();
    ctx.emu.memory().write_bytes(BASE + 0x10, b"code").unwrap();
    ctx.emu.memory().write_u32(stack.end() - 4, 0x1122_3344).unwrap();

    let dir = ctx.emu.debug_dump_at(42).unwrap();

    let bin = fs::read(dir.join(ctx.emu.bin_region().file_name())).unwrap();
    assert_eq!(&bin[0x10..0x14], b"code");
    assert!(bin[..0x10].iter().all(|&b| b == 0));

    let stack_bytes = fs::read(dir.join(stack.file_name())).unwrap();
    assert_eq!(&stack_bytes[stack_bytes.len() - 4..], &[0x44, 0x33, 0x22, 0x11]);
}

#[test]
fn test_regions_larger_than_a_chunk() {
    let root = TempDir::new().unwrap();
    let mut space = AddressSpace::new(0x10_0000);
    let mut core = SoftCore::nop();
    let region = space.alloc(3 * 1024 * 1024 + 12).unwrap();
    core.map(region.start(), region.size(), region.permissions())
        .unwrap();
    core.write(region.end() - 1, &[0x5A]).unwrap();

    let view = MemoryView::new(&space, &mut core);
    let dir = SnapshotWriter::new().dump_at(&view, root.path(), 7).unwrap();

    let bytes = fs::read(dir.join(region.file_name())).unwrap();
    assert_eq!(bytes.len() as u64, region.size());
    assert_eq!(bytes.last(), Some(&0x5A));
}

#[test]
fn test_same_second_collision_fails() {
    let mut ctx = TestContext::new();
    let _ = ctx.emu.debug_dump_at(99).unwrap();

    let err = ctx.emu.debug_dump_at(99).unwrap_err();
    match err {
        EmulatorError::Snapshot(SnapshotError::Io { path, source }) => {
            assert_eq!(path, ctx.dump_dir().join("99"));
            assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
        }
        other => panic!("expected snapshot I/O error, got {other:?}"),
    }
}

#[test]
fn test_missing_root_is_created() {
    let mut ctx = TestContext::new();
    let nested = ctx.dump_root.path().join("a").join("b");
    ctx.emu.dump_config_mut().root.clone_from(&nested);

    let dir = ctx.emu.debug_dump_at(5).unwrap();
    assert_eq!(dir, nested.join("5"));
    assert_eq!(sorted_entries(&dir).len(), 2);
}

#[test]
fn test_unwritable_root_reports_path() {
    let mut ctx = TestContext::new();
    let blocker = ctx.dump_root.path().join("file");
    fs::write(&blocker, b"not a directory").unwrap();
    ctx.emu.dump_config_mut().root = blocker.clone();

    let err = ctx.emu.debug_dump_at(1).unwrap_err();
    match err {
        EmulatorError::Snapshot(SnapshotError::Io { path, .. }) => {
            assert!(path == blocker || path == PathBuf::from(&blocker).join("1"));
        }
        other => panic!("expected snapshot I/O error, got {other:?}"),
    }
}

#[test]
fn test_current_time_dump() {
    let mut ctx = TestContext::new();
    let dir = ctx.emu.debug_dump().unwrap();
    let name = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.parse::<u64>().unwrap() > 1_600_000_000);
}
