#![no_main]
use libfuzzer_sys::fuzz_target;
use weetags_gate::{GateError, TokenSigner};

fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };
    let signer = match TokenSigner::new("fuzz-secret") {
        Ok(s) => s,
        Err(_) => return,
    };

    match signer.decode(token) {
        Ok(claims) => {
            // Only a correctly signed token may decode
            let reencoded = signer.encode(&claims).expect("decoded claims must encode");
            assert!(signer.decode(&reencoded).is_ok());
        }
        Err(err) => assert!(matches!(err, GateError::TokenInvalid), "{err:?}"),
    }
});
