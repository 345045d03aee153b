//! Postcodes

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::fulfilment::InputError;

/// Normalised postcodes shorter than this have not been fully entered yet.
pub const MIN_POSTCODE_LEN: usize = 4;

#[expect(clippy::expect_used, reason = "the pattern is a literal")]
fn outward_code_pattern() -> &'static Regex {
    static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Z]{1,2}\d[A-Z\d]?").expect("outward code pattern should compile")
    });

    &PATTERN
}

/// Strip every non-alphanumeric character and uppercase the rest.
pub fn normalise(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// A normalised UK postcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Postcode {
    normalised: String,
}

impl Postcode {
    /// Normalise and check a raw postcode.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::IncompletePostcode`] when fewer than [`MIN_POSTCODE_LEN`]
    /// characters remain after normalisation.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let normalised = normalise(raw);

        if normalised.len() < MIN_POSTCODE_LEN {
            return Err(InputError::IncompletePostcode {
                length: normalised.len(),
            });
        }

        Ok(Self { normalised })
    }

    /// The normalised form, e.g. `TA65LT`.
    pub fn as_str(&self) -> &str {
        &self.normalised
    }

    /// The area part of the postcode, e.g. `TA6`.
    pub fn outward_code(&self) -> Option<&str> {
        outward_code_pattern()
            .find(&self.normalised)
            .map(|m| m.as_str())
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalised)
    }
}
