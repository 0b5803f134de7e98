//! # Wire Protocol Module
//!
//! Every exchange with the controller is headed by a 64-bit command block.
//! This module packs and unpacks those blocks and owns the constants the
//! controller defines: opcodes, geometry, and the default peer address.
//!
//! Field layout, counting bit 0 from the most significant end:
//!
//! | bits  | field         | width |
//! |-------|---------------|-------|
//! | 0-3   | opcode        | 4     |
//! | 4-19  | sector        | 16    |
//! | 20-51 | track         | 32    |
//! | 52    | return status | 1     |
//! | 53-63 | reserved      | 11    |
//!
//! Blocks travel in network byte order; `u64::to_be_bytes` and
//! `u64::from_be_bytes` give the transmission form at either end.
//! The reply to any request echoes the request fields with the return
//! status bit set on refusal.

/// bytes moved by one sector transfer, fixed by the controller
pub const SECTOR_SIZE: usize = 1024;
/// sectors per track
pub const TRACK_SIZE: usize = 1024;
/// tracks on the device
pub const MAX_TRACKS: usize = 64;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 22887;

/// buffer holding exactly one sector
pub type SectorBuf = [u8;SECTOR_SIZE];

// opcodes, values fixed by the controller
pub const OP_MOUNT: u8 = 0;
pub const OP_TRACK_SEEK: u8 = 1;
pub const OP_READ_SECTOR: u8 = 2;
pub const OP_WRITE_SECTOR: u8 = 3;
pub const OP_UNMOUNT: u8 = 4;

/// Pack command block fields into a 64-bit word.  Fields are masked to their
/// slot widths; supplying an out of range opcode is the caller's error.
pub fn pack(op: u8,sector: u16,track: u32,ret: u8) -> u64 {
    let mut word = (op as u64 & 0xf) << 60;
    word |= (sector as u64) << 44;
    word |= (track as u64) << 12;
    word |= (ret as u64 & 0x1) << 11;
    return word;
}

/// Unpack a command block into (opcode,sector,track,return status).
pub fn unpack(word: u64) -> (u8,u16,u32,u8) {
    let op = ((word >> 60) & 0xf) as u8;
    let sector = ((word >> 44) & 0xffff) as u16;
    let track = ((word >> 12) & 0xffffffff) as u32;
    let ret = ((word >> 11) & 0x1) as u8;
    return (op,sector,track,ret);
}

/// opcode field without unpacking the whole block
pub fn opcode_of(word: u64) -> u8 {
    ((word >> 60) & 0xf) as u8
}

/// return status bit without unpacking the whole block
pub fn return_of(word: u64) -> u8 {
    ((word >> 11) & 0x1) as u8
}

#[test]
fn test_round_trip() {
    let cases: Vec<(u8,u16,u32,u8)> = vec![
        (OP_MOUNT,0,0,0),
        (OP_TRACK_SEEK,0,63,0),
        (OP_READ_SECTOR,1023,0,0),
        (OP_WRITE_SECTOR,0xffff,0xffffffff,1),
        (OP_UNMOUNT,0,0,1)
    ];
    for (op,sec,trk,ret) in cases {
        assert_eq!(unpack(pack(op,sec,trk,ret)),(op,sec,trk,ret));
    }
}

#[test]
fn test_wire_form() {
    let word = pack(3,0x1234,0xdeadbeef,1);
    assert_eq!(word,0x31234deadbeef800);
    // big-endian transmission leads with the opcode nibble
    let bytes = u64::to_be_bytes(word);
    assert_eq!(bytes[0],0x31);
    assert_eq!(unpack(u64::from_be_bytes(bytes)),(3,0x1234,0xdeadbeef,1));
}

#[test]
fn test_readers() {
    let word = pack(OP_WRITE_SECTOR,55,7,1);
    assert_eq!(opcode_of(word),OP_WRITE_SECTOR);
    assert_eq!(return_of(word),1);
    assert_eq!(return_of(pack(OP_MOUNT,0,0,0)),0);
}

#[test]
fn test_reserved_bits_clear() {
    let word = pack(0xf,0xffff,0xffffffff,0xff);
    assert_eq!(word & 0x7ff,0);
}
