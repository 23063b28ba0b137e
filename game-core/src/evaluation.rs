use game_types::{LetterStatus, WORD_LENGTH};

use crate::GameError;

/// Classify every letter of `guess` against `secret`.
///
/// Exact matches are resolved first and consume their secret letter, then
/// the remaining positions consume at most one unmatched occurrence each.
pub fn evaluate_guess(secret: &str, guess: &str) -> Result<Vec<LetterStatus>, GameError> {
    let guess: Vec<char> = guess.to_lowercase().chars().collect();
    if guess.len() != WORD_LENGTH {
        return Err(GameError::InvalidLength {
            expected: WORD_LENGTH,
            actual: guess.len(),
        });
    }

    let mut remaining: Vec<Option<char>> = secret.to_lowercase().chars().map(Some).collect();
    let mut result = vec![LetterStatus::Absent; WORD_LENGTH];
    let mut resolved = [false; WORD_LENGTH];

    // First pass: exact positions
    for (i, &ch) in guess.iter().enumerate() {
        if remaining.get(i).copied().flatten() == Some(ch) {
            result[i] = LetterStatus::Correct;
            remaining[i] = None;
            resolved[i] = true;
        }
    }

    // Second pass: misplaced letters against what is left
    for (i, &ch) in guess.iter().enumerate() {
        if resolved[i] {
            continue;
        }
        if let Some(slot) = remaining.iter_mut().find(|slot| **slot == Some(ch)) {
            result[i] = LetterStatus::Present;
            *slot = None;
        }
    }

    Ok(result)
}

pub fn is_solved(result: &[LetterStatus]) -> bool {
    result.len() == WORD_LENGTH && result.iter().all(|s| *s == LetterStatus::Correct)
}
