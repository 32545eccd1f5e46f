use std::fmt;

use crate::config::ConfigError;

const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Number of distinct single-letter agent identifiers.
pub const MAX_AGENTS: usize = ALPHABET.len();

/// Short, stable identifier of the agent working on the task at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId {
    index: usize,
    letter: char,
}

impl AgentId {
    pub fn assign(index: usize) -> Result<Self, ConfigError> {
        let letter = ALPHABET
            .get(index)
            .map(|b| *b as char)
            .ok_or(ConfigError::CapacityExceeded {
                requested: index + 1,
                max: MAX_AGENTS,
            })?;
        Ok(Self { index, letter })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn letter(&self) -> char {
        self.letter
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter)
    }
}
