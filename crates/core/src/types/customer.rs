//! Customer display name.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CustomerName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The input is empty or whitespace only.
    #[error("name cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The name an order is placed under.
///
/// The counter staff call this name when the prints are ready, so it is the
/// only piece of customer data the kiosk collects.
///
/// ## Constraints
///
/// - Leading and trailing whitespace is trimmed
/// - Must not be empty after trimming
/// - At most 120 characters
///
/// ## Examples
///
/// ```
/// use print_counter_core::CustomerName;
///
/// assert_eq!(CustomerName::parse("  Ana ").unwrap().as_str(), "Ana");
/// assert!(CustomerName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CustomerName(String);

impl CustomerName {
    /// Maximum length of a name, in characters.
    pub const MAX_LENGTH: usize = 120;

    /// Parse a `CustomerName` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CustomerName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for CustomerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
