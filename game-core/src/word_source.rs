use anyhow::{Context, Result};
use game_types::WORD_LENGTH;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::Path;

use crate::GameError;

const BUNDLED_ITALIAN: &str = include_str!("../words/words_it.txt");

/// Supplies secret words and decides which guesses are real words.
pub trait WordSource: Send + Sync {
    fn random_word(&self) -> Result<String, GameError>;
    fn contains(&self, word: &str) -> bool;
}

/// A fixed dictionary of five-letter words. Read-only once built, so one
/// instance is shared by every room.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
    lookup: HashSet<String>,
}

impl WordList {
    /// Parse a newline separated list. Blank lines and `#` comments are
    /// skipped; anything that is not five ASCII letters is dropped.
    pub fn from_word_list(word_list: &str) -> Result<Self, GameError> {
        let mut words = Vec::new();
        let mut lookup = HashSet::new();

        for line in word_list.lines() {
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            let word = word.to_lowercase();
            if word.len() != WORD_LENGTH || !word.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            if lookup.insert(word.clone()) {
                words.push(word);
            }
        }

        if words.is_empty() {
            return Err(GameError::EmptyWordList);
        }
        Ok(Self { words, lookup })
    }

    /// The Italian list shipped with the crate.
    pub fn italian() -> Self {
        Self::from_word_list(BUNDLED_ITALIAN).expect("bundled word list is not empty")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list {}", path.display()))?;
        let list = Self::from_word_list(&contents)
            .with_context(|| format!("No usable words in {}", path.display()))?;
        tracing::info!("Loaded {} words from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordSource for WordList {
    fn random_word(&self) -> Result<String, GameError> {
        self.words
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(GameError::EmptyWordList)
    }

    fn contains(&self, word: &str) -> bool {
        self.lookup.contains(&word.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_parsing() {
        let list = WordList::from_word_list("gatto\nCASA\n# commento\n\n  fiore  \nperché\nmare\ncittà\n")
            .unwrap();

        assert!(list.contains("gatto"));
        assert!(list.contains("GATTO")); // case insensitive
        assert!(list.contains("fiore"));
        assert!(!list.contains("casa")); // four letters
        assert!(!list.contains("mare"));
        assert!(!list.contains("città")); // non-ASCII letter
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let list = WordList::from_word_list("gatto\ngatto\nGATTO").unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_word_list() {
        assert_eq!(
            WordList::from_word_list("# solo commenti\n\nab\n").unwrap_err(),
            GameError::EmptyWordList
        );
    }

    #[test]
    fn test_random_word_comes_from_list() {
        let list = WordList::from_word_list("gatto\nfiore\nmonte").unwrap();
        for _ in 0..20 {
            let word = list.random_word().unwrap();
            assert_eq!(word.len(), 5);
            assert!(list.contains(&word));
        }
    }

    #[test]
    fn test_bundled_italian_list() {
        let list = WordList::italian();
        assert!(list.len() > 300);
        assert!(list.contains("gatto"));
        assert!(list.contains("mondo"));
        assert!(!list.contains("xyzzy"));
    }

    #[test]
    fn test_missing_file() {
        let err = WordList::from_file("/definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("Failed to read word list"));
    }
}
