//! Fuzz target for pkt-line parsing.
//!
//! Tests that the pkt-line reader handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let mut reader = knot_git::PktLineReader::new(Cursor::new(data));

    // Every packet consumes at least four bytes, so this terminates.
    let mut consumed = 0;
    while let Ok(Some(pkt)) = reader.read() {
        consumed += pkt.encode().len();
        assert!(consumed <= data.len());
    }

    let _ = knot_git::parse_pkt_lines(data);
});
