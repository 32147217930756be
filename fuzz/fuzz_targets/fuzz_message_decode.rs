#![no_main]

use libfuzzer_sys::fuzz_target;

use rebase_messages::{decode, encode, message_digest};

// Decoding arbitrary frames must never panic, and anything that decodes
// must re-encode to a frame with the same digest.
fuzz_target!(|data: &[u8]| {
    let Ok(message) = decode(data) else {
        return;
    };
    let frame = encode(&message).expect("decoded message re-encodes");
    let again = decode(&frame).expect("re-encoded frame decodes");
    assert_eq!(again, message);
    assert_eq!(
        message_digest(&again).expect("digest"),
        message_digest(&message).expect("digest"),
    );
});
