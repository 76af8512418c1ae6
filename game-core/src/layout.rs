use game_types::Bonus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("unknown bonus marker '{0}'")]
    UnknownMarker(char),
}

const STANDARD_TOP: [&str; 8] = [
    "T..d...T...d..T",
    ".D...t...t...D.",
    "..D...d.d...D..",
    "d..D...d...D..d",
    "....D.....D....",
    ".t...t...t...t.",
    "..d...d.d...d..",
    "T..d...D...d..T",
];

/// Square grid of bonus cells. Built once at startup and shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    size: usize,
    cells: Vec<Bonus>,
}

impl BoardLayout {
    /// The classic 15x15 layout.
    pub fn standard() -> Self {
        let rows: Vec<&str> = STANDARD_TOP
            .iter()
            .chain(STANDARD_TOP.iter().rev().skip(1))
            .copied()
            .collect();
        // the table above is known-good
        Self::from_rows(&rows).unwrap_or_else(|_| Self::blank(15))
    }

    pub fn blank(size: usize) -> Self {
        Self {
            size,
            cells: vec![Bonus::None; size * size],
        }
    }

    /// Rows of markers: `T` triple word, `D` double word, `t` triple letter,
    /// `d` double letter, `.` plain.
    pub fn from_rows(rows: &[&str]) -> Result<Self, LayoutError> {
        let size = rows.len();
        if size == 0 {
            return Err(LayoutError::Empty);
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, line) in rows.iter().enumerate() {
            let len = line.chars().count();
            if len != size {
                return Err(LayoutError::NotSquare {
                    row,
                    len,
                    expected: size,
                });
            }
            for marker in line.chars() {
                cells.push(match marker {
                    'T' => Bonus::TripleWord,
                    'D' => Bonus::DoubleWord,
                    't' => Bonus::TripleLetter,
                    'd' => Bonus::DoubleLetter,
                    '.' => Bonus::None,
                    other => return Err(LayoutError::UnknownMarker(other)),
                });
            }
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn center(&self) -> (usize, usize) {
        (self.size / 2, self.size / 2)
    }

    pub fn bonus(&self, row: usize, col: usize) -> Bonus {
        if row >= self.size || col >= self.size {
            return Bonus::None;
        }
        self.cells[row * self.size + col]
    }

    /// Wire form sent with `game_started`.
    pub fn rows(&self) -> Vec<Vec<Bonus>> {
        self.cells
            .chunks(self.size.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}
