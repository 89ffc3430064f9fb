use thiserror::Error;

/// Errors returned when building a [`Codec`](crate::Codec) from settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("alphabet must contain at least {min} unique characters, got {actual}")]
    AlphabetTooShort { min: usize, actual: usize },
    #[error("alphabet must be ASCII")]
    NonAsciiAlphabet,
    #[error("alphabet must not contain whitespace")]
    WhitespaceInAlphabet,
}

/// Errors returned when a string is not a valid encoding under a codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("public id is empty")]
    Empty,
    #[error("character {0:?} is not part of the alphabet")]
    InvalidCharacter(char),
    #[error("public id is malformed")]
    Malformed,
    #[error("decoded value does not fit in 63 bits")]
    Overflow,
    #[error("public id is not the canonical encoding of its value")]
    NotCanonical,
}
