//! Error type for configuration loading and decoding failures.
//!
//! Hand-rolled rather than built on `thiserror`, matching `vidyut-cheda`'s
//! style of a plain enum with a manual `Display` impl.

use std::fmt;

#[derive(Debug)]
pub enum DecoderError {
    Config(String),
    Io(std::io::Error),
    InvalidPhraseTable(String),
    EmptySentence,
    FeatureRejected { feature: String, reason: String },
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderError::Config(msg) => write!(f, "configuration error: {msg}"),
            DecoderError::Io(e) => write!(f, "I/O error: {e}"),
            DecoderError::InvalidPhraseTable(msg) => write!(f, "invalid phrase table: {msg}"),
            DecoderError::EmptySentence => write!(f, "cannot decode an empty sentence"),
            DecoderError::FeatureRejected { feature, reason } => {
                write!(f, "feature '{feature}' rejected the hypothesis: {reason}")
            }
        }
    }
}

impl std::error::Error for DecoderError {}

impl From<std::io::Error> for DecoderError {
    fn from(e: std::io::Error) -> Self {
        DecoderError::Io(e)
    }
}

impl From<toml::de::Error> for DecoderError {
    fn from(e: toml::de::Error) -> Self {
        DecoderError::Config(e.to_string())
    }
}

pub type DecoderResult<T> = Result<T, DecoderError>;
