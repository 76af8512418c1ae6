use anyhow::{Context, Result, anyhow};
use std::collections::HashSet;
use std::path::Path;

/// Dictionary lookup consumed by the session handlers.
pub trait WordValidator: Send + Sync {
    fn is_valid(&self, word: &str) -> bool;
}

/// In-memory dictionary loaded from plain word lists.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    valid_words: HashSet<String>,
}

impl WordList {
    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_word_list(word_list: &str) -> Self {
        let mut list = Self::default();
        list.extend_from(word_list);
        list
    }

    /// Load a single file, or every `.txt` file in a directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut list = Self::default();

        if path.is_dir() {
            let mut files: Vec<_> = std::fs::read_dir(path)
                .with_context(|| format!("reading word directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|file| file.extension().is_some_and(|ext| ext == "txt"))
                .collect();
            files.sort();
            if files.is_empty() {
                return Err(anyhow!("no .txt word lists in {}", path.display()));
            }
            for file in files {
                let contents = std::fs::read_to_string(&file)
                    .with_context(|| format!("reading word list {}", file.display()))?;
                list.extend_from(&contents);
            }
        } else {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading word list {}", path.display()))?;
            list.extend_from(&contents);
        }

        tracing::info!(path = %path.display(), words = list.len(), "loaded word list");
        Ok(list)
    }

    fn extend_from(&mut self, word_list: &str) {
        self.valid_words.extend(
            word_list
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .filter(|word| word.chars().all(char::is_alphabetic))
                .map(str::to_lowercase),
        );
    }

    pub fn len(&self) -> usize {
        self.valid_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_words.is_empty()
    }
}

impl WordValidator for WordList {
    fn is_valid(&self, word: &str) -> bool {
        self.valid_words.contains(&word.trim().to_lowercase())
    }
}
