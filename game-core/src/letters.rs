use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::TileBag;

#[derive(Debug, Error)]
pub enum LetterSetError {
    #[error("letter set is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("letter key '{0}' must be exactly one alphabetic character")]
    InvalidKey(String),
    #[error("letter set is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterInfo {
    pub initial_quantity: u32,
    pub weight: i32,
}

/// Tile distribution and letter weights, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterSet {
    letters: BTreeMap<char, LetterInfo>,
}

const ENGLISH: [(char, u32, i32); 26] = [
    ('A', 9, 1),
    ('B', 2, 3),
    ('C', 2, 3),
    ('D', 4, 2),
    ('E', 12, 1),
    ('F', 2, 4),
    ('G', 3, 2),
    ('H', 2, 4),
    ('I', 9, 1),
    ('J', 1, 8),
    ('K', 1, 5),
    ('L', 4, 1),
    ('M', 2, 3),
    ('N', 6, 1),
    ('O', 8, 1),
    ('P', 2, 3),
    ('Q', 1, 10),
    ('R', 6, 1),
    ('S', 4, 1),
    ('T', 6, 1),
    ('U', 4, 1),
    ('V', 2, 4),
    ('W', 2, 4),
    ('X', 1, 8),
    ('Y', 2, 4),
    ('Z', 1, 10),
];

impl LetterSet {
    /// The 98-tile English distribution (no blanks).
    pub fn english() -> Self {
        let letters = ENGLISH
            .iter()
            .map(|&(letter, initial_quantity, weight)| {
                (
                    letter,
                    LetterInfo {
                        initial_quantity,
                        weight,
                    },
                )
            })
            .collect();
        Self { letters }
    }

    /// Parse `{"A": {"initialQuantity": 9, "weight": 1}, ...}`. Keys are upper-cased.
    pub fn from_json(json: &str) -> Result<Self, LetterSetError> {
        let raw: BTreeMap<String, LetterInfo> = serde_json::from_str(json)?;
        let mut letters = BTreeMap::new();
        for (key, info) in raw {
            let mut chars = key.chars();
            let letter = match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_alphabetic() => letter.to_ascii_uppercase(),
                _ => return Err(LetterSetError::InvalidKey(key)),
            };
            letters.insert(letter, info);
        }
        if letters.is_empty() {
            return Err(LetterSetError::Empty);
        }
        Ok(Self { letters })
    }

    pub fn initial_bag(&self) -> TileBag {
        TileBag::from_counts(
            self.letters
                .iter()
                .map(|(letter, info)| (*letter, info.initial_quantity)),
        )
    }

    /// Score weight of a letter; letters outside the set weigh nothing.
    pub fn weight(&self, letter: char) -> i32 {
        self.letters.get(&letter).map(|info| info.weight).unwrap_or(0)
    }

    pub fn total_initial_quantity(&self) -> usize {
        self.letters
            .values()
            .map(|info| info.initial_quantity as usize)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

impl Default for LetterSet {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_distribution() {
        let letters = LetterSet::english();
        assert_eq!(letters.len(), 26);
        assert_eq!(letters.total_initial_quantity(), 98);
        assert_eq!(letters.weight('Q'), 10);
        assert_eq!(letters.weight('E'), 1);
        assert_eq!(letters.weight('?'), 0);
        assert_eq!(letters.initial_bag().total(), 98);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"a": {"initialQuantity": 3, "weight": 1}, "Z": {"initialQuantity": 1, "weight": 10}}"#;
        let letters = LetterSet::from_json(json).unwrap();
        assert_eq!(letters.total_initial_quantity(), 4);
        assert_eq!(letters.weight('A'), 1);
        assert_eq!(letters.weight('Z'), 10);
    }

    #[test]
    fn test_from_json_rejects_bad_keys() {
        let json = r#"{"AB": {"initialQuantity": 3, "weight": 1}}"#;
        assert!(matches!(
            LetterSet::from_json(json),
            Err(LetterSetError::InvalidKey(_))
        ));
        assert!(matches!(LetterSet::from_json("{}"), Err(LetterSetError::Empty)));
        assert!(matches!(
            LetterSet::from_json("not json"),
            Err(LetterSetError::Parse(_))
        ));
    }
}
