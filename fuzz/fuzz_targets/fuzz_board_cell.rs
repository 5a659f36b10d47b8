#![no_main]

use kerfuffle_client::board::{decode_board, decode_cell};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok((owner, trail)) = decode_cell(text) {
        assert!(owner >= -1 && trail >= -1);
    }

    // Lines are rows, `|` separates cells.
    let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split('|').collect()).collect();
    if let Ok(board) = decode_board(&rows) {
        assert_eq!(board.owner_ids.len(), board.width * board.height);
        assert_eq!(board.trail_ids.len(), board.width * board.height);
    }
});
