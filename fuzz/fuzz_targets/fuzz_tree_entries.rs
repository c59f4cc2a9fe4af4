//! Fuzz target for tree payload decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(tree) = knot_storage::Tree::decode(data) {
        // Re-encoding preserves the entry count.
        let encoded = tree.encode();
        let again = knot_storage::Tree::decode(&encoded).expect("re-encoded tree must decode");
        assert_eq!(again.entries().len(), tree.entries().len());
    }
});
