//! Fuzz target for upload-pack response handling.
//!
//! Covers side-band demultiplexing and bundle header validation.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = match knot_git::demultiplex(data) {
        Ok(Some(banded)) => banded,
        Ok(None) => data.to_vec(),
        Err(_) => return,
    };

    if let Ok(bundle) = knot_git::Bundle::locate(&body) {
        assert_eq!(bundle.version(), knot_git::BUNDLE_VERSION);
        assert!(bundle.len() >= 12);
    }
});
