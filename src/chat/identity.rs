use crate::error::{MinichatError, Result};
use std::fmt;

/// Name shown next to the user's messages
///
/// There is no verification behind it; it only has to be non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Parse a display name, trimming surrounding whitespace
    ///
    /// # Examples
    ///
    /// ```
    /// use minichat::chat::DisplayName;
    ///
    /// assert_eq!(DisplayName::parse("  Ada ").unwrap().as_str(), "Ada");
    /// assert!(DisplayName::parse("   ").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MinichatError::Config("Display name cannot be empty".to_string()).into());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The name as entered
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
