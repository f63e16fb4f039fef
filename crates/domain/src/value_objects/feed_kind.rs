//! The community feeds and their per-feed policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::PageSize;

/// Every feed shares the same live-window + paging shape; only the
/// collection, page size and posting rules differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Forum threads. Bumped by replies, never hard-deleted.
    Forum,
    Stories,
    Marketplace,
    /// The chat shoutbox.
    Shoutbox,
    /// Anonymous confessions wall.
    Confessions,
}

/// Who may remove an item from a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    Never,
    OwnerOrAdmin,
    AdminOnly,
}

impl FeedKind {
    pub const ALL: [FeedKind; 5] = [
        FeedKind::Forum,
        FeedKind::Stories,
        FeedKind::Marketplace,
        FeedKind::Shoutbox,
        FeedKind::Confessions,
    ];

    /// Root collection holding this feed's documents.
    pub fn collection(self) -> &'static str {
        match self {
            FeedKind::Forum => "threads",
            FeedKind::Stories => "stories",
            FeedKind::Marketplace => "products",
            FeedKind::Shoutbox => "messages",
            FeedKind::Confessions => "confessions",
        }
    }

    pub fn default_page_size(self) -> PageSize {
        let size = match self {
            FeedKind::Forum => 20,
            FeedKind::Stories => 12,
            FeedKind::Marketplace => 24,
            FeedKind::Shoutbox => 25,
            FeedKind::Confessions => 15,
        };
        PageSize::clamped(size)
    }

    pub fn delete_policy(self) -> DeletePolicy {
        match self {
            FeedKind::Forum => DeletePolicy::Never,
            FeedKind::Confessions => DeletePolicy::AdminOnly,
            FeedKind::Stories | FeedKind::Marketplace | FeedKind::Shoutbox => {
                DeletePolicy::OwnerOrAdmin
            }
        }
    }

    pub fn allows_anonymous(self) -> bool {
        matches!(self, FeedKind::Confessions)
    }

    /// Feeds whose items carry a comment sub-collection.
    pub fn has_comments(self) -> bool {
        matches!(self, FeedKind::Forum | FeedKind::Stories)
    }

    /// Env-var friendly name, e.g. `FEED_PAGE_SIZE_MARKETPLACE`.
    pub fn env_key(self) -> &'static str {
        match self {
            FeedKind::Forum => "FORUM",
            FeedKind::Stories => "STORIES",
            FeedKind::Marketplace => "MARKETPLACE",
            FeedKind::Shoutbox => "SHOUTBOX",
            FeedKind::Confessions => "CONFESSIONS",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedKind::Forum => "forum",
            FeedKind::Stories => "stories",
            FeedKind::Marketplace => "marketplace",
            FeedKind::Shoutbox => "shoutbox",
            FeedKind::Confessions => "confessions",
        };
        f.write_str(name)
    }
}

impl FromStr for FeedKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forum" | "forums" | "threads" => Ok(FeedKind::Forum),
            "stories" | "story" => Ok(FeedKind::Stories),
            "marketplace" | "products" => Ok(FeedKind::Marketplace),
            "shoutbox" | "messages" | "chat" => Ok(FeedKind::Shoutbox),
            "confessions" => Ok(FeedKind::Confessions),
            other => Err(DomainError::parse(format!("Unknown feed: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_sizes_stay_within_observed_range() {
        for kind in FeedKind::ALL {
            let size = kind.default_page_size().value();
            assert!((12..=25).contains(&size), "{kind} has {size}");
        }
    }

    #[test]
    fn parses_collection_aliases() {
        assert_eq!("threads".parse::<FeedKind>().unwrap(), FeedKind::Forum);
        assert_eq!("Products".parse::<FeedKind>().unwrap(), FeedKind::Marketplace);
        assert!("weather".parse::<FeedKind>().is_err());
    }

    #[test]
    fn forum_threads_are_never_deleted() {
        assert_eq!(FeedKind::Forum.delete_policy(), DeletePolicy::Never);
        assert_eq!(
            FeedKind::Marketplace.delete_policy(),
            DeletePolicy::OwnerOrAdmin
        );
    }
}
