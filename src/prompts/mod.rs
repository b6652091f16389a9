//! Persona presets
//!
//! A persona is an optional system prompt sent ahead of the conversation. It
//! shapes the tone of the replies and is never stored with the session.

use std::fmt;

/// Tone preset for the assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Friendly and conversational
    Casual,
    /// Formal and business-like
    Professional,
    /// Focused on learning and explanation
    Educational,
}

impl Persona {
    /// All presets, in display order
    pub const ALL: [Persona; 3] = [Self::Casual, Self::Professional, Self::Educational];

    /// Parse a persona from its id
    ///
    /// # Examples
    ///
    /// ```
    /// use minichat::prompts::Persona;
    ///
    /// assert_eq!(Persona::parse_str("Casual").unwrap(), Persona::Casual);
    /// assert!(Persona::parse_str("pirate").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "casual" => Ok(Self::Casual),
            "professional" => Ok(Self::Professional),
            "educational" => Ok(Self::Educational),
            other => Err(format!(
                "Unknown personality: {}. Must be one of: casual, professional, educational",
                other
            )),
        }
    }

    /// Stable identifier used in config files and commands
    pub fn id(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Professional => "professional",
            Self::Educational => "educational",
        }
    }

    /// One-line description for help output
    pub fn description(&self) -> &'static str {
        match self {
            Self::Casual => "Friendly and conversational",
            Self::Professional => "Formal and business-like",
            Self::Educational => "Focused on learning and explanation",
        }
    }

    /// System prompt sent ahead of the conversation
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Casual => {
                "You are a friendly and casual assistant. Keep your responses light and conversational."
            }
            Self::Professional => {
                "You are a professional assistant. Maintain a formal and business-appropriate tone."
            }
            Self::Educational => {
                "You are an educational assistant. Focus on clear explanations and helping users learn."
            }
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_ids() {
        for persona in Persona::ALL {
            assert_eq!(Persona::parse_str(persona.id()).unwrap(), persona);
        }
    }

    #[test]
    fn test_parse_unknown_lists_choices() {
        let err = Persona::parse_str("grumpy").unwrap_err();
        assert!(err.contains("grumpy"));
        assert!(err.contains("educational"));
    }

    #[test]
    fn test_system_prompts_are_distinct() {
        assert_ne!(
            Persona::Casual.system_prompt(),
            Persona::Professional.system_prompt()
        );
        assert!(Persona::Educational
            .system_prompt()
            .to_lowercase()
            .contains("learn"));
    }
}
