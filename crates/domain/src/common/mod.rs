//! Small pure helpers shared by the domain types.

pub mod datetime;

pub use datetime::{from_millis, to_millis};

/// Trimmed `Some(&str)` unless the input is blank.
pub fn none_if_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_if_blank_trims() {
        assert_eq!(none_if_blank("  hi "), Some("hi"));
        assert_eq!(none_if_blank(" \t"), None);
    }
}
