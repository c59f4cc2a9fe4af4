//! Fuzz target for the object codec round trip.

#![no_main]

use arbitrary::Arbitrary;
use knot_storage::{GitObject, ObjectType};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Kind {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Arbitrary)]
struct Input {
    kind: Kind,
    payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let object_type = match input.kind {
        Kind::Blob => ObjectType::Blob,
        Kind::Tree => ObjectType::Tree,
        Kind::Commit => ObjectType::Commit,
    };
    let object = GitObject::new(object_type, input.payload);
    let decoded = GitObject::decode(&object.encode()).expect("encoded object must decode");
    assert_eq!(decoded, object);
});
