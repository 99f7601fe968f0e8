//! Errors produced when converting between [`NbtTag`](crate::NbtTag) and concrete
//! Rust types, and when navigating into a compound or list by name or index.

use std::{fmt, error::Error};

/// An error produced when a tag or a tag's contents don't structurally match what
/// a caller expected: a wrong tag kind was found where a specific one was required,
/// a name was missing from a compound, or an index was out of bounds in a list.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NbtStructureError {
    /// A tag of the wrong kind was encountered.
    TypeMismatch {
        /// The name of the kind of tag that was expected.
        expected: &'static str,
        /// The name of the kind of tag that was actually found.
        found: &'static str,
    },
    /// A named tag could not be found in a compound.
    MissingTag {
        /// The name that was looked up.
        name: String,
    },
    /// An index was out of bounds for a list.
    InvalidIndex {
        /// The index that was requested.
        index: usize,
        /// The length of the list that was indexed into.
        len: usize,
    },
}

impl NbtStructureError {
    /// Builds a [`NbtStructureError::TypeMismatch`].
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        NbtStructureError::TypeMismatch { expected, found }
    }

    /// Builds a [`NbtStructureError::MissingTag`].
    pub fn missing_tag(name: impl Into<String>) -> Self {
        NbtStructureError::MissingTag { name: name.into() }
    }

    /// Builds a [`NbtStructureError::InvalidIndex`].
    pub fn invalid_index(index: usize, len: usize) -> Self {
        NbtStructureError::InvalidIndex { index, len }
    }
}

impl fmt::Display for NbtStructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtStructureError::TypeMismatch { expected, found } => write!(
                f,
                "tag type mismatch: expected {expected}, found {found}"
            ),
            NbtStructureError::MissingTag { name } => {
                write!(f, "no tag found with name \"{name}\"")
            },
            NbtStructureError::InvalidIndex { index, len } => {
                write!(f, "index {index} is out of bounds for a list of length {len}")
            },
        }
    }
}

impl Error for NbtStructureError {}

/// An error produced when converting an [`NbtTag`](crate::NbtTag) (or a reference to
/// one) to a concrete Rust representation fails.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NbtReprError {
    /// The tag's structure didn't match what the target representation required.
    Structure(NbtStructureError),
    /// A custom error raised by a downstream representation's conversion logic.
    Custom(String),
}

impl NbtReprError {
    /// Wraps any error implementing [`Error`] as a [`NbtReprError::Custom`].
    pub fn from_any<E: Error>(error: E) -> Self {
        NbtReprError::Custom(error.to_string())
    }
}

impl From<NbtStructureError> for NbtReprError {
    fn from(error: NbtStructureError) -> Self {
        NbtReprError::Structure(error)
    }
}

impl fmt::Display for NbtReprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtReprError::Structure(error) => write!(f, "{error}"),
            NbtReprError::Custom(message) => write!(f, "{message}"),
        }
    }
}

impl Error for NbtReprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NbtReprError::Structure(error) => Some(error),
            NbtReprError::Custom(_) => None,
        }
    }
}
