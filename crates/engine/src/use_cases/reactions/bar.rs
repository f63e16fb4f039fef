//! Optimistic reaction state for one story as shown to one member.

use std::collections::BTreeMap;

use townsquare_domain::{FeedItem, ReactionKind, ReactionTransition};

/// Applied locally as soon as a reaction is pressed; rolled back only when
/// the write is confirmed to have failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionBar {
    pub mine: Option<ReactionKind>,
    pub counts: BTreeMap<ReactionKind, i64>,
}

impl ReactionBar {
    pub fn new(mine: Option<ReactionKind>, counts: BTreeMap<ReactionKind, i64>) -> Self {
        Self { mine, counts }
    }

    pub fn for_item(item: &FeedItem, mine: Option<ReactionKind>) -> Self {
        Self::new(mine, item.reaction_counts.clone())
    }

    pub fn count(&self, kind: ReactionKind) -> i64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    fn shift(&mut self, transition: &ReactionTransition) {
        for (kind, delta) in transition.counter_deltas() {
            let count = self.counts.entry(kind).or_insert(0);
            *count = (*count + delta).max(0);
        }
        self.mine = transition.next;
    }

    /// Press `kind` locally and return the transition to send.
    pub fn apply(&mut self, kind: ReactionKind) -> ReactionTransition {
        let transition = ReactionTransition::press(self.mine, kind);
        self.shift(&transition);
        transition
    }

    /// Undo a transition previously returned by [`ReactionBar::apply`].
    pub fn rollback(&mut self, transition: &ReactionTransition) {
        self.shift(&transition.inverse());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_moves_one_count() {
        let mut bar = ReactionBar::new(
            Some(ReactionKind::Heart),
            BTreeMap::from([(ReactionKind::Heart, 4)]),
        );
        bar.apply(ReactionKind::Fire);
        assert_eq!(bar.mine, Some(ReactionKind::Fire));
        assert_eq!(bar.count(ReactionKind::Heart), 3);
        assert_eq!(bar.count(ReactionKind::Fire), 1);
    }

    #[test]
    fn rollback_restores_previous_state() {
        let original = ReactionBar::new(None, BTreeMap::from([(ReactionKind::Like, 2)]));
        let mut bar = original.clone();
        let sent = bar.apply(ReactionKind::Like);
        assert_eq!(bar.count(ReactionKind::Like), 3);

        bar.rollback(&sent);
        assert_eq!(bar, original);
    }

    #[test]
    fn pressing_twice_removes() {
        let mut bar = ReactionBar::default();
        bar.apply(ReactionKind::Wow);
        bar.apply(ReactionKind::Wow);
        assert_eq!(bar.mine, None);
        assert_eq!(bar.count(ReactionKind::Wow), 0);
    }
}
