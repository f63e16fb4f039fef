use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Store ids are opaque strings assigned by the document store. They are
/// never empty and never contain a path separator.
macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(DomainError::validation(concat!($label, " cannot be empty")));
                }
                if value.contains('/') {
                    return Err(DomainError::validation(concat!(
                        $label,
                        " cannot contain '/'"
                    )));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Documents in any collection
define_id!(DocumentId, "Document id");

// Signed-in members
define_id!(UserId, "User id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_path_like_ids() {
        assert!(DocumentId::new("").is_err());
        assert!(DocumentId::new("threads/abc").is_err());
        assert_eq!(DocumentId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn serde_goes_through_validation() {
        let ok: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(ok.to_string(), "u1");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
