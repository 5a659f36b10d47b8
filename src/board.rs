//! Decoder for the server's compact board encoding.
//!
//! The board arrives as rows of cell strings shaped `"<owner>,<trail>"`. Each
//! side is a run of decimal digits; an empty run means [`NO_PLAYER`].
//!
//! ```
//! use kerfuffle_client::board::decode_cell;
//!
//! assert_eq!(decode_cell("3,7"), Ok((3, 7)));
//! assert_eq!(decode_cell(",5"), Ok((-1, 5)));
//! ```

use thiserror::Error;

use crate::model::{Board, NO_PLAYER};

/// A board cell the decoder could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The cell has no `,` between owner and trail.
    #[error("cell {cell:?} has no owner/trail separator")]
    MissingSeparator { cell: String },

    /// The cell contains something other than digits and the single separator.
    #[error("cell {cell:?} contains invalid character {found:?}")]
    InvalidDigit { cell: String, found: char },

    /// An id does not fit in an `i32`.
    #[error("cell {cell:?} holds an id that does not fit in 32 bits")]
    Overflow { cell: String },

    /// A row is not as wide as the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Decode one cell into `(owner, trail)`.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the separator is missing, a non-digit appears
/// (signs and a second comma included), or an id overflows.
pub fn decode_cell(cell: &str) -> Result<(i32, i32), DecodeError> {
    let (owner, trail) = cell
        .split_once(',')
        .ok_or_else(|| DecodeError::MissingSeparator {
            cell: cell.to_owned(),
        })?;
    Ok((decode_id(cell, owner)?, decode_id(cell, trail)?))
}

fn decode_id(cell: &str, digits: &str) -> Result<i32, DecodeError> {
    if digits.is_empty() {
        return Ok(NO_PLAYER);
    }
    digits.chars().try_fold(0i32, |acc, c| {
        let digit = c.to_digit(10).ok_or_else(|| DecodeError::InvalidDigit {
            cell: cell.to_owned(),
            found: c,
        })?;
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(digit as i32))
            .ok_or_else(|| DecodeError::Overflow {
                cell: cell.to_owned(),
            })
    })
}

/// Decode a full grid of cells.
///
/// `height` is the number of rows and `width` the length of the first row;
/// the result is filled row by row, left to right.
///
/// # Errors
///
/// Fails on the first undecodable cell or on a row whose length differs from
/// the first row's.
pub fn decode_board<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Board, DecodeError> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);

    let mut board = Board {
        width,
        height,
        owner_ids: Vec::with_capacity(width * height),
        trail_ids: Vec::with_capacity(width * height),
    };

    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(DecodeError::RaggedRow {
                row: row_index,
                expected: width,
                found: row.len(),
            });
        }
        for cell in row {
            let (owner, trail) = decode_cell(cell.as_ref())?;
            board.owner_ids.push(owner);
            board.trail_ids.push(trail);
        }
    }

    Ok(board)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_cell_shapes() {
        assert_eq!(decode_cell("3,7"), Ok((3, 7)));
        assert_eq!(decode_cell(",5"), Ok((NO_PLAYER, 5)));
        assert_eq!(decode_cell("2,"), Ok((2, NO_PLAYER)));
        assert_eq!(decode_cell(","), Ok((NO_PLAYER, NO_PLAYER)));
        assert_eq!(decode_cell("120,0"), Ok((120, 0)));
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(matches!(
            decode_cell("12"),
            Err(DecodeError::MissingSeparator { .. })
        ));
        assert!(matches!(
            decode_cell(""),
            Err(DecodeError::MissingSeparator { .. })
        ));
    }

    #[test]
    fn rejects_signs_letters_and_extra_commas() {
        assert_eq!(
            decode_cell("-1,2"),
            Err(DecodeError::InvalidDigit {
                cell: "-1,2".into(),
                found: '-'
            })
        );
        assert!(matches!(
            decode_cell("a,"),
            Err(DecodeError::InvalidDigit { found: 'a', .. })
        ));
        assert!(matches!(
            decode_cell("1,2,3"),
            Err(DecodeError::InvalidDigit { found: ',', .. })
        ));
        assert!(matches!(
            decode_cell(" 1,2"),
            Err(DecodeError::InvalidDigit { found: ' ', .. })
        ));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            decode_cell("99999999999,1"),
            Err(DecodeError::Overflow { .. })
        ));
        assert_eq!(decode_cell("2147483647,"), Ok((i32::MAX, NO_PLAYER)));
    }

    #[test]
    fn decodes_board_row_major() {
        let rows = vec![vec!["0,", ",1", "2,2"], vec![",", "4,", ",5"]];
        let board = decode_board(&rows).unwrap();
        assert_eq!(board.width, 3);
        assert_eq!(board.height, 2);
        assert_eq!(board.owner_ids, vec![0, -1, 2, -1, 4, -1]);
        assert_eq!(board.trail_ids, vec![-1, 1, 2, -1, -1, 5]);
        assert_eq!(board.owner_id(1, 1), Some(4));
        assert_eq!(board.trail_id(2, 1), Some(5));
    }

    #[test]
    fn grid_lengths_match_dimensions() {
        for (w, h) in [(0usize, 0usize), (1, 1), (5, 3), (3, 5)] {
            let rows: Vec<Vec<String>> = (0..h)
                .map(|y| (0..w).map(|x| format!("{x},{y}")).collect())
                .collect();
            let board = decode_board(&rows).unwrap();
            assert_eq!(board.owner_ids.len(), board.width * board.height);
            assert_eq!(board.trail_ids.len(), board.width * board.height);
            assert_eq!(board.height, h);
            assert_eq!(board.width, if h == 0 { 0 } else { w });
        }
    }

    #[test]
    fn empty_rows_give_empty_board() {
        let rows: Vec<Vec<String>> = Vec::new();
        let board = decode_board(&rows).unwrap();
        assert_eq!(board, Board::default());

        let rows: Vec<Vec<String>> = vec![vec![], vec![]];
        let board = decode_board(&rows).unwrap();
        assert_eq!((board.width, board.height), (0, 2));
        assert!(board.owner_ids.is_empty());
    }

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![vec![",", ","], vec![","]];
        assert_eq!(
            decode_board(&rows),
            Err(DecodeError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn reports_first_bad_cell() {
        let rows = vec![vec!["1,1", "x,1"]];
        let err = decode_board(&rows).unwrap_err();
        assert_eq!(err.to_string(), "cell \"x,1\" contains invalid character 'x'");
    }
}
