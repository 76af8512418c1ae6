use game_types::{Direction, GameError, LetterPlacement};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const EMPTY_CELL: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no letters placed")]
    NoLetters,
    #[error("no game board")]
    NoBoard,
    #[error("cell [{row}, {col}] is off the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("tile index {index} is not on the rack")]
    InvalidTileIndex { index: usize },
    #[error("tile index {index} used twice")]
    DuplicateTile { index: usize },
    #[error("cell [{row}, {col}] used twice")]
    DuplicateCell { row: usize, col: usize },
    #[error("letters are not on a single line")]
    NotInLine,
    #[error("letters leave a gap")]
    NotContiguous,
    #[error("cell [{row}, {col}] already holds a different letter")]
    CellConflict { row: usize, col: usize },
    #[error("every letter lands on an existing tile")]
    NothingNew,
}

impl From<PlacementError> for GameError {
    fn from(error: PlacementError) -> Self {
        match error {
            PlacementError::InvalidTileIndex { index } => GameError::InvalidTileIndex { index },
            PlacementError::CellConflict { row, col } => GameError::CellConflict { row, col },
            other => GameError::InvalidPlacement {
                reason: other.to_string(),
            },
        }
    }
}

/// Row-major `size * size` grid. An empty string (size 0) means no game is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Board {
    size: usize,
    cells: Vec<char>,
}

impl Board {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![EMPTY_CELL; size * size],
        }
    }

    pub fn parse(flat: &str) -> Result<Self, String> {
        let cells: Vec<char> = flat.chars().collect();
        let size = (cells.len() as f64).sqrt() as usize;
        if size * size != cells.len() {
            return Err(format!("board of {} cells is not square", cells.len()));
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_blank(&self) -> bool {
        self.size == 0
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// The letter at a cell, `None` when empty or off the board.
    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        if !self.in_bounds(row, col) {
            return None;
        }
        match self.cells[row * self.size + col] {
            EMPTY_CELL => None,
            letter => Some(letter),
        }
    }

    fn set(&mut self, row: usize, col: usize, letter: char) {
        if self.in_bounds(row, col) {
            self.cells[row * self.size + col] = letter;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell != EMPTY_CELL).count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            write!(f, "{}", cell)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Board {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Board::parse(&value)
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

/// Outcome of a legal placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedWord {
    pub board: Board,
    /// Placements that landed on a cell already holding the same letter.
    pub cross_letters: usize,
    /// Placements that filled an empty cell; their rack slots are used up.
    pub new_tiles: Vec<LetterPlacement>,
}

pub struct BoardEngine;

impl BoardEngine {
    /// Validate and apply a play. The input board is left untouched.
    pub fn place_word(
        board: &Board,
        placements: &[LetterPlacement],
        rack: &[char],
        direction: Direction,
    ) -> Result<PlacedWord, PlacementError> {
        if board.is_blank() {
            return Err(PlacementError::NoBoard);
        }
        Self::check_shape(board, placements, rack, direction)?;

        let mut next = board.clone();
        let mut cross_letters = 0;
        let mut new_tiles = Vec::new();

        for placement in placements {
            let (row, col) = (placement.row(), placement.col());
            let letter = rack[placement.tile_index];
            match board.cell(row, col) {
                Some(existing) if existing == letter => cross_letters += 1,
                Some(_) => return Err(PlacementError::CellConflict { row, col }),
                None => {
                    next.set(row, col, letter);
                    new_tiles.push(*placement);
                }
            }
        }

        if new_tiles.is_empty() {
            return Err(PlacementError::NothingNew);
        }

        Ok(PlacedWord {
            board: next,
            cross_letters,
            new_tiles,
        })
    }

    fn check_shape(
        board: &Board,
        placements: &[LetterPlacement],
        rack: &[char],
        direction: Direction,
    ) -> Result<(), PlacementError> {
        if placements.is_empty() {
            return Err(PlacementError::NoLetters);
        }

        let mut tiles = HashSet::new();
        let mut cells = HashSet::new();
        for placement in placements {
            let (row, col) = (placement.row(), placement.col());
            if !board.in_bounds(row, col) {
                return Err(PlacementError::OutOfBounds { row, col });
            }
            if placement.tile_index >= rack.len() {
                return Err(PlacementError::InvalidTileIndex {
                    index: placement.tile_index,
                });
            }
            if !tiles.insert(placement.tile_index) {
                return Err(PlacementError::DuplicateTile {
                    index: placement.tile_index,
                });
            }
            if !cells.insert((row, col)) {
                return Err(PlacementError::DuplicateCell { row, col });
            }
        }

        let first = placements[0];
        let in_line = placements.iter().all(|placement| match direction {
            Direction::Horizontal => placement.row() == first.row(),
            Direction::Vertical => placement.col() == first.col(),
        });
        if !in_line {
            return Err(PlacementError::NotInLine);
        }

        let mut along: Vec<usize> = placements
            .iter()
            .map(|placement| axis_position(placement, direction))
            .collect();
        along.sort_unstable();
        if along.windows(2).any(|pair| pair[1] != pair[0] + 1) {
            return Err(PlacementError::NotContiguous);
        }
        Ok(())
    }

    /// Rack letters in board order along the play axis.
    pub fn build_word(
        placements: &[LetterPlacement],
        rack: &[char],
        direction: Direction,
    ) -> Result<String, PlacementError> {
        let mut ordered = placements.to_vec();
        ordered.sort_by_key(|placement| axis_position(placement, direction));
        ordered
            .iter()
            .map(|placement| {
                rack.get(placement.tile_index)
                    .copied()
                    .ok_or(PlacementError::InvalidTileIndex {
                        index: placement.tile_index,
                    })
            })
            .collect()
    }

    /// Perpendicular runs longer than one cell through each placement.
    pub fn discover_cross_words(
        board: &Board,
        placements: &[LetterPlacement],
        direction: Direction,
    ) -> Vec<String> {
        let (dr, dc) = match direction {
            Direction::Horizontal => (1isize, 0isize),
            Direction::Vertical => (0, 1),
        };
        let step = |row: usize, col: usize, sign: isize| -> Option<(usize, usize)> {
            let next_row = row.checked_add_signed(dr * sign)?;
            let next_col = col.checked_add_signed(dc * sign)?;
            board.cell(next_row, next_col).map(|_| (next_row, next_col))
        };

        let mut words = Vec::new();
        for placement in placements {
            let (mut row, mut col) = (placement.row(), placement.col());
            if board.cell(row, col).is_none() {
                continue;
            }
            while let Some((prev_row, prev_col)) = step(row, col, -1) {
                row = prev_row;
                col = prev_col;
            }
            let mut word = String::new();
            loop {
                if let Some(letter) = board.cell(row, col) {
                    word.push(letter);
                }
                match step(row, col, 1) {
                    Some((next_row, next_col)) => {
                        row = next_row;
                        col = next_col;
                    }
                    None => break,
                }
            }
            if word.chars().count() > 1 {
                words.push(word);
            }
        }
        words
    }
}

fn axis_position(placement: &LetterPlacement, direction: Direction) -> usize {
    match direction {
        Direction::Horizontal => placement.col(),
        Direction::Vertical => placement.row(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(size: usize, letters: &[(usize, usize, char)]) -> Board {
        let mut board = Board::empty(size);
        for (row, col, letter) in letters {
            board.set(*row, *col, *letter);
        }
        board
    }

    #[test]
    fn test_board_string_form() {
        let board = board_with(3, &[(1, 1, 'A')]);
        assert_eq!(board.to_string(), "....A....");
        assert_eq!(Board::parse("....A....").unwrap(), board);
        assert!(Board::parse("....").is_ok());
        assert!(Board::parse("...").is_err());
        assert!(Board::parse("").unwrap().is_blank());

        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, "\"....A....\"");
    }

    #[test]
    fn test_place_word_on_empty_board() {
        let board = Board::empty(5);
        let rack = vec!['C', 'A', 'T'];
        let placements = vec![
            LetterPlacement::new(0, 2, 1),
            LetterPlacement::new(1, 2, 2),
            LetterPlacement::new(2, 2, 3),
        ];

        let placed =
            BoardEngine::place_word(&board, &placements, &rack, Direction::Horizontal).unwrap();

        assert_eq!(placed.cross_letters, 0);
        assert_eq!(placed.new_tiles.len(), 3);
        assert_eq!(placed.board.cell(2, 2), Some('A'));
        assert_eq!(placed.board.occupied_count(), 3);
        assert_eq!(board.occupied_count(), 0);
    }

    #[test]
    fn test_cross_letter_reuses_existing_tile() {
        let board = board_with(5, &[(2, 1, 'C'), (2, 2, 'A'), (2, 3, 'T')]);
        let rack = vec!['A', 'X', 'E'];
        let placements = vec![
            LetterPlacement::new(0, 2, 2),
            LetterPlacement::new(1, 3, 2),
            LetterPlacement::new(2, 4, 2),
        ];

        let placed =
            BoardEngine::place_word(&board, &placements, &rack, Direction::Vertical).unwrap();

        assert_eq!(placed.cross_letters, 1);
        assert_eq!(
            placed.new_tiles,
            vec![LetterPlacement::new(1, 3, 2), LetterPlacement::new(2, 4, 2)]
        );
        assert_eq!(placed.board.occupied_count(), 5);
    }

    #[test]
    fn test_cell_conflict_is_rejected() {
        let board = board_with(5, &[(2, 2, 'A')]);
        let rack = vec!['B', 'E'];
        let placements = vec![LetterPlacement::new(0, 2, 2), LetterPlacement::new(1, 2, 3)];

        assert_eq!(
            BoardEngine::place_word(&board, &placements, &rack, Direction::Horizontal),
            Err(PlacementError::CellConflict { row: 2, col: 2 })
        );
    }

    #[test]
    fn test_shape_rules() {
        let board = Board::empty(5);
        let rack = vec!['A', 'B', 'C'];

        let diagonal = vec![LetterPlacement::new(0, 0, 0), LetterPlacement::new(1, 1, 1)];
        assert_eq!(
            BoardEngine::place_word(&board, &diagonal, &rack, Direction::Horizontal),
            Err(PlacementError::NotInLine)
        );

        let gap = vec![LetterPlacement::new(0, 0, 0), LetterPlacement::new(1, 0, 2)];
        assert_eq!(
            BoardEngine::place_word(&board, &gap, &rack, Direction::Horizontal),
            Err(PlacementError::NotContiguous)
        );

        let off_board = vec![LetterPlacement::new(0, 0, 5)];
        assert_eq!(
            BoardEngine::place_word(&board, &off_board, &rack, Direction::Horizontal),
            Err(PlacementError::OutOfBounds { row: 0, col: 5 })
        );

        let bad_tile = vec![LetterPlacement::new(3, 0, 0)];
        assert_eq!(
            BoardEngine::place_word(&board, &bad_tile, &rack, Direction::Horizontal),
            Err(PlacementError::InvalidTileIndex { index: 3 })
        );

        let same_tile = vec![LetterPlacement::new(0, 0, 0), LetterPlacement::new(0, 0, 1)];
        assert_eq!(
            BoardEngine::place_word(&board, &same_tile, &rack, Direction::Horizontal),
            Err(PlacementError::DuplicateTile { index: 0 })
        );

        assert_eq!(
            BoardEngine::place_word(&board, &[], &rack, Direction::Horizontal),
            Err(PlacementError::NoLetters)
        );
        assert_eq!(
            BoardEngine::place_word(&Board::default(), &same_tile, &rack, Direction::Horizontal),
            Err(PlacementError::NoBoard)
        );
    }

    #[test]
    fn test_build_word_orders_along_axis() {
        let rack = vec!['T', 'A', 'C'];
        let placements = vec![
            LetterPlacement::new(0, 4, 7),
            LetterPlacement::new(2, 2, 7),
            LetterPlacement::new(1, 3, 7),
        ];
        assert_eq!(
            BoardEngine::build_word(&placements, &rack, Direction::Vertical).unwrap(),
            "CAT"
        );
    }

    #[test]
    fn test_discover_cross_words() {
        // O sits above row 2; placing "AT" horizontally at row 2 cols 1-2 makes "OA"
        // down column 1.
        let board = board_with(5, &[(1, 1, 'O'), (2, 1, 'A'), (2, 2, 'T')]);
        let placements = vec![LetterPlacement::new(0, 2, 1), LetterPlacement::new(1, 2, 2)];

        let words = BoardEngine::discover_cross_words(&board, &placements, Direction::Horizontal);

        assert_eq!(words, vec!["OA".to_string()]);
    }

    #[test]
    fn test_placement_error_maps_to_game_error() {
        assert_eq!(
            GameError::from(PlacementError::CellConflict { row: 1, col: 2 }),
            GameError::CellConflict { row: 1, col: 2 }
        );
        assert!(matches!(
            GameError::from(PlacementError::NotContiguous),
            GameError::InvalidPlacement { .. }
        ));
    }
}
