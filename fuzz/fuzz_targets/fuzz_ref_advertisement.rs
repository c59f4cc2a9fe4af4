//! Fuzz target for ref advertisement parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(adv) = knot_git::RefAdvertisement::from_bytes(data) {
        for name in adv.refs.keys() {
            assert!(name.starts_with(knot_git::BRANCH_PREFIX));
        }
    }
});
