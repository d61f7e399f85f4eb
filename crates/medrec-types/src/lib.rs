//! Validated text types shared across the medrec crates.
//!
//! Patient records are mostly free text. The few places that must not be blank (the required
//! demographic fields, the persistence key) go through [`NonEmptyText`] so the check happens
//! once, at the boundary.

/// Errors raised when building validated text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// Nothing but whitespace was supplied.
    #[error("text cannot be empty")]
    Empty,
}

/// A string with at least one non-whitespace character.
///
/// Leading and trailing whitespace is trimmed on construction, so `"  Ana "` is stored as
/// `"Ana"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, or returns [`TextError::Empty`] if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns `true` if `input` would be rejected by [`NonEmptyText::new`].
    pub fn is_blank(input: &str) -> bool {
        input.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
