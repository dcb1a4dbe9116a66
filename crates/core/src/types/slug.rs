//! URL slugs for blog posts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing usable remained.
    #[error("slug cannot be empty")]
    Empty,
    /// The slug is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains a character outside `a-z`, `0-9`, `-`, `_`.
    #[error("slug may only contain lowercase letters, digits, '-' and '_' (found '{0}')")]
    InvalidCharacter(char),
}

/// The URL-safe identifier of a blog post (`/blog/{slug}`).
///
/// ```
/// use folio_core::Slug;
///
/// let slug = Slug::from_title("Hello, World!  Rust & Axum").unwrap();
/// assert_eq!(slug.as_str(), "hello-world-rust-axum");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 200;

    /// Parse an explicit slug typed into the editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or contains
    /// anything other than lowercase ASCII letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(SlugError::InvalidCharacter(bad));
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a post title.
    ///
    /// Lowercases, drops every character that is not an ASCII word character
    /// or whitespace, and joins the remaining words with `-`.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` when the title has no word characters and
    /// `SlugError::TooLong` when the result exceeds the maximum length.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let kept: String = title
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
            .collect();
        let joined = kept.split_whitespace().collect::<Vec<_>>().join("-");
        Self::parse(&joined)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
