//! Bounded Text Newtypes
//!
//! `Verb`, `ObjectType`, `ObjectId`: small validated wrappers around `String`
//! that enforce the length limits from spec.md §3 at construction time,
//! the same way the teacher's `Amount` validates decimal places before a
//! value can exist at all.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn validate(field: &'static str, raw: &str, max: usize) -> Result<(), DomainError> {
    if raw.is_empty() {
        return Err(DomainError::Empty { field });
    }
    if raw.len() > max {
        return Err(DomainError::TooLong {
            field,
            max,
            actual: raw.len(),
        });
    }
    Ok(())
}

macro_rules! bounded_text {
    ($name:ident, $field:literal, $max:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub const MAX_LEN: usize = $max;

            pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                validate($field, &raw, $max)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

bounded_text!(Verb, "verb", 64);
bounded_text!(ObjectType, "object_type", 64);
bounded_text!(ObjectId, "object_id", 128);
