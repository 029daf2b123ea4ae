//! Token vocabulary for the text recognizer.

use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::OcrError;

/// First id that maps to real text; lower ids are control tokens.
pub const FIRST_REAL_TOKEN: i64 = 5;

/// Ordered token list where a token's index is its id.
///
/// Loaded once and shared read-only between recognition calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Create a vocabulary from tokens in id order.
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Load a vocabulary file with one token per line.
    pub fn from_file(path: &Path) -> Result<Self, OcrError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OcrError::MissingAsset(path.to_path_buf()),
            _ => OcrError::ModelLoad(format!("Failed to load vocabulary: {}", e)),
        })?;

        let vocab: Self = content.parse()?;
        debug!("Loaded vocabulary with {} tokens", vocab.len());
        Ok(vocab)
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the vocabulary has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token text for `id`, or `""` when the id has no entry.
    pub fn token(&self, id: i64) -> &str {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.tokens.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Detokenize: drop control ids, map the rest, join with no separator.
    pub fn decode(&self, tokens: &[i64]) -> String {
        tokens
            .iter()
            .filter(|&&id| id >= FIRST_REAL_TOKEN)
            .map(|&id| self.token(id))
            .collect()
    }
}

impl FromStr for Vocabulary {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.lines().map(str::to_string).collect()))
    }
}
