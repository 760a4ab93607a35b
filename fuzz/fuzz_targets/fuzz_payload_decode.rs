#![no_main]

use libfuzzer_sys::fuzz_target;
use wot_payload::{Decoded, PayloadCodec, MAGIC};
use wot_types::TrustParams;

// Decoding arbitrary carrier bytes must never panic, and anything the codec
// accepts must re-encode to exactly the same bytes.
fuzz_target!(|data: &[u8]| {
    let codec = PayloadCodec::new(&TrustParams::default());

    if let Ok(Decoded::Payload(payload)) = codec.decode(data) {
        let encoded = codec.encode(&payload).expect("decoded payload must re-encode");
        assert_eq!(encoded.as_slice(), data);
    }

    // Force the magic so the fuzzer spends its time past the first check.
    let mut framed = MAGIC.to_vec();
    framed.extend_from_slice(data);
    if let Ok(Decoded::Payload(payload)) = codec.decode(&framed) {
        let encoded = codec.encode(&payload).expect("decoded payload must re-encode");
        assert_eq!(encoded, framed);
    }
});
