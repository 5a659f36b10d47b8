#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    // Classification alone must never panic.
    let _ = kerfuffle_client::protocol::TurnReply::parse(body);

    // Neither may folding the body into a live state, twice in a row so that
    // reconciliation against a populated registry is covered too.
    let mut turn = kerfuffle_client::TurnProtocol::new("fuzz");
    let _ = turn.apply_response(body);
    let _ = turn.apply_response(body);
});
