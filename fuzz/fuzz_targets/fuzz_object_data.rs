//! Fuzz target for object decoding.
//!
//! Tests that encoded object bytes and compressed records are rejected
//! without panicking.

#![no_main]

use knot_storage::{Commit, CompressionLevel, Compressor, GitObject};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(object) = GitObject::decode(data) {
        let again = GitObject::decode(&object.encode()).expect("re-encoded object must decode");
        assert_eq!(again, object);
        let _ = Commit::from_object(&object);
    }

    let _ = Commit::parse(data);
    let _ = Compressor::new(CompressionLevel::Default).decompress("fuzz", data);
});
