//! Story reactions.
//!
//! A member holds at most one reaction per story. Pressing the reaction
//! they already hold removes it; pressing a different one replaces it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Heart,
    Laugh,
    Wow,
    Sad,
    Fire,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Heart => "heart",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Wow => "wow",
            ReactionKind::Sad => "sad",
            ReactionKind::Fire => "fire",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(ReactionKind::Like),
            "heart" | "love" => Ok(ReactionKind::Heart),
            "laugh" | "haha" => Ok(ReactionKind::Laugh),
            "wow" => Ok(ReactionKind::Wow),
            "sad" => Ok(ReactionKind::Sad),
            "fire" => Ok(ReactionKind::Fire),
            other => Err(DomainError::parse(format!("Unknown reaction: {}", other))),
        }
    }
}

/// Outcome of pressing a reaction, computed before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTransition {
    pub previous: Option<ReactionKind>,
    pub next: Option<ReactionKind>,
}

impl ReactionTransition {
    pub fn press(previous: Option<ReactionKind>, pressed: ReactionKind) -> Self {
        let next = if previous == Some(pressed) {
            None
        } else {
            Some(pressed)
        };
        Self { previous, next }
    }

    /// Counter changes implied by the transition, at most one -1 and one +1.
    pub fn counter_deltas(&self) -> Vec<(ReactionKind, i64)> {
        let mut deltas = Vec::with_capacity(2);
        if let Some(prev) = self.previous {
            deltas.push((prev, -1));
        }
        if let Some(next) = self.next {
            deltas.push((next, 1));
        }
        deltas
    }

    /// The inverse transition, used to roll back an optimistic update.
    pub fn inverse(&self) -> Self {
        Self {
            previous: self.next,
            next: self.previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressing_new_reaction_adds_it() {
        let t = ReactionTransition::press(None, ReactionKind::Heart);
        assert_eq!(t.next, Some(ReactionKind::Heart));
        assert_eq!(t.counter_deltas(), vec![(ReactionKind::Heart, 1)]);
    }

    #[test]
    fn pressing_same_reaction_removes_it() {
        let t = ReactionTransition::press(Some(ReactionKind::Heart), ReactionKind::Heart);
        assert_eq!(t.next, None);
        assert_eq!(t.counter_deltas(), vec![(ReactionKind::Heart, -1)]);
    }

    #[test]
    fn switching_moves_the_count() {
        let t = ReactionTransition::press(Some(ReactionKind::Heart), ReactionKind::Like);
        assert_eq!(t.next, Some(ReactionKind::Like));
        assert_eq!(
            t.counter_deltas(),
            vec![(ReactionKind::Heart, -1), (ReactionKind::Like, 1)]
        );
        assert_eq!(t.inverse().next, Some(ReactionKind::Heart));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("LOVE".parse::<ReactionKind>().unwrap(), ReactionKind::Heart);
        assert!("meh".parse::<ReactionKind>().is_err());
    }
}
