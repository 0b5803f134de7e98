//! # `remdisk` main library
//!
//! This library drives a remote track/sector storage controller and layers a
//! small POSIX-like file interface on top of it.  The controller exposes a
//! two-dimensional address space of fixed-size sectors grouped into tracks;
//! this crate maps a per-file linear byte space onto it.
//!
//! ## Architecture
//!
//! The driver is built from four components, leaves first:
//! * `proto` packs and unpacks the 64-bit command blocks exchanged on the wire
//! * `net::Session` owns the controller connection and the current-track shadow
//! * `cache::SectorCache` holds recently moved sectors, evicting by use stamp
//! * `driver::Driver` holds the file table and allocation map, and orchestrates
//!   reads and writes as sector transfers
//!
//! A `Driver` is constructed from a `Session` and a `SectorCache` and takes
//! ownership of both.  All state lives in these values; nothing is process-global
//! except the log configuration.  Failures are reported through typed errors;
//! the `posix` module preserves the classic success-code-or-`-1` surface for
//! callers that want it.
//!
//! ## Mount Sessions
//!
//! A mount session is the interval bounded by a successful mount and the next
//! unmount, and spans a single TCP connection.  The file table and allocation
//! map live only in memory: a new mount starts from a clean slate even though
//! sector contents remain on the controller.
//!
//! ## Testing
//!
//! The `controller` module is a wire-compatible in-memory controller.  It backs
//! the integration tests and the `serve` subcommand, and counts the operations
//! it serves so tests can assert what actually crossed the wire.

pub mod proto;
pub mod net;
pub mod cache;
pub mod driver;
pub mod posix;
pub mod controller;
pub mod commands;

use std::fmt::Write;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Render bytes as ascii, hex-escaping anything unprintable, e.g., `\x0D`.
/// The backslash itself is escaped so the result parses back unambiguously.
pub fn escaped_ascii_from_bytes(bytes: &[u8]) -> String {
    let mut result = String::new();
    for byte in bytes {
        if *byte>=0x20 && *byte<=0x7e && *byte!=0x5c {
            result.push(*byte as char);
        } else {
            let mut temp = String::new();
            write!(&mut temp,"\\x{:02X}",byte).expect("unreachable");
            result += &temp;
        }
    }
    return result;
}

/// Interpret a UTF8 string as pure ascii and put into bytes.
/// Arbitrary bytes can be introduced using escapes, e.g., `\xFF`.
/// Non-ascii characters and malformed escapes are omitted from the result.
pub fn escaped_ascii_to_bytes(s: &str) -> Vec<u8> {
    let mut ans: Vec<u8> = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut curs = 0;
    while curs < chars.len() {
        if chars[curs]=='\\' && curs+3 < chars.len() && (chars[curs+1]=='x' || chars[curs+1]=='X') {
            let pair: String = chars[curs+2..curs+4].iter().collect();
            if let Ok(mut byte) = hex::decode(&pair) {
                ans.append(&mut byte);
            }
            curs += 4;
            continue;
        }
        if chars[curs].is_ascii() {
            ans.push(chars[curs] as u8);
        }
        curs += 1;
    }
    return ans;
}

#[test]
fn test_escapes() {
    let bytes = escaped_ascii_to_bytes("HELLO\\x0d\\x00");
    assert_eq!(bytes,vec![0x48,0x45,0x4c,0x4c,0x4f,0x0d,0x00]);
    assert_eq!(escaped_ascii_from_bytes(&bytes),"HELLO\\x0D\\x00");
    // backslash survives a round trip
    assert_eq!(escaped_ascii_from_bytes(&escaped_ascii_to_bytes("a\\x5Cb")),"a\\x5Cb");
    // malformed escape is dropped rather than kept literally
    assert_eq!(escaped_ascii_to_bytes("ok\\xZZ"),vec![0x6f,0x6b]);
}
