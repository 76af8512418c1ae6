use game_types::LetterPlacement;

use crate::{Board, BoardLayout, LetterSet};

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score a play against the board it produced.
    ///
    /// Each placed letter contributes its weight times the letter bonus of its
    /// cell. Word bonuses under any placement multiply together and scale the
    /// summed letter score once at the end.
    pub fn score(
        placements: &[LetterPlacement],
        board: &Board,
        layout: &BoardLayout,
        letters: &LetterSet,
    ) -> i32 {
        let mut letter_total = 0;
        let mut word_multiplier = 1;

        for placement in placements {
            let (row, col) = (placement.row(), placement.col());
            let Some(letter) = board.cell(row, col) else {
                continue;
            };
            let bonus = layout.bonus(row, col);
            letter_total += letters.weight(letter) * bonus.letter_multiplier();
            word_multiplier *= bonus.word_multiplier();
        }

        letter_total * word_multiplier
    }
}
