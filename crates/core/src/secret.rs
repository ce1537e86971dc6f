//! Secret Values
//!
//! Credentials (chat bot tokens, passwords) travel through config structs that
//! get logged and debug-printed. `Secret` keeps the value out of every `Debug`
//! and `Display` rendering; reading it requires an explicit `reveal()`.

use std::fmt;

use serde::Deserialize;

/// Text that renders as `<hidden>` everywhere except through [`Secret::reveal`].
///
/// Deliberately implements `Deserialize` but not `Serialize`, so a secret can
/// be read from a config file but never written back out by accident.
#[derive(Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Placeholder shown instead of the value.
    pub const REDACTED: &'static str = "<hidden>";

    /// Wrap a value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value.
    pub fn reveal(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::REDACTED)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for Secret {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Secret {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
