//! # Region Tests
//!
//! Containment checks, dump file names and permission formatting.

use armemu_core::mem::{AddressSpace, Permissions, Region};
use rstest::rstest;

fn region(start: u64, size: u64) -> Region {
    let mut space = AddressSpace::new(start);
    space.alloc(size).unwrap()
}

#[test]
fn test_geometry() {
    let r = region(0x40_0000, 0x800_0000);
    assert_eq!(r.start(), 0x40_0000);
    assert_eq!(r.size(), 0x800_0000);
    assert_eq!(r.end(), 0x840_0000);
    assert_eq!(r.permissions(), Permissions::ALL);
}

#[rstest]
#[case(0x1000, true)]
#[case(0x1fff, true)]
#[case(0x0fff, false)]
#[case(0x2000, false)]
fn test_contains_is_half_open(#[case] address: u64, #[case] expected: bool) {
    assert_eq!(region(0x1000, 0x1000).contains(address), expected);
}

#[rstest]
#[case(0x1000, 0x1000, true)]
#[case(0x1ffc, 4, true)]
#[case(0x1ffd, 4, false)]
#[case(0x1000, 0, true)]
#[case(0x2000, 0, false)]
#[case(0x1000, u64::MAX, false)]
fn test_contains_range(#[case] address: u64, #[case] len: u64, #[case] expected: bool) {
    assert_eq!(region(0x1000, 0x1000).contains_range(address, len), expected);
}

#[test]
fn test_file_name_is_zero_padded_hex() {
    assert_eq!(
        region(0x40_0000, 0x800_0000).file_name(),
        "0x00400000-0x08400000.bin"
    );
    assert_eq!(
        region(0x840_0000, 0x400_0000).file_name(),
        "0x08400000-0x0c400000.bin"
    );
}

#[test]
fn test_file_name_at_top_of_address_space() {
    assert_eq!(
        region(0xFFFF_F000, 0x1000).file_name(),
        "0xfffff000-0x100000000.bin"
    );
}

#[rstest]
#[case(Permissions::ALL, "rwx")]
#[case(Permissions::READ_WRITE, "rw-")]
#[case(Permissions::READ | Permissions::EXECUTE, "r-x")]
#[case(Permissions::empty(), "---")]
fn test_permissions_display(#[case] perms: Permissions, #[case] expected: &str) {
    assert_eq!(perms.to_string(), expected);
}

#[test]
fn test_region_display() {
    assert_eq!(
        region(0x1000, 0x1000).to_string(),
        "[0x00001000, 0x00002000) rwx"
    );
}
