//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::AppConfig,
    ports::{ClockPort, DocumentStore, RandomPort},
    resilient_writes::{ResilientWriter, WriteHealth},
};
use crate::use_cases::{
    self,
    content::{
        AddComment, ContentUseCases, DeleteComment, DeletePost, ListComments, PublishPost,
        RecordView,
    },
    feed::{FeaturedItems, FeedUseCases, ListFeedPage},
    presence::{ActiveViewers, Heartbeat, LeavePage, PresenceUseCases},
    reactions::ToggleReaction,
    usernames::ClaimUsername,
};

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub store: Arc<dyn DocumentStore>,
    pub config: AppConfig,
    pub use_cases: use_cases::UseCases,
    pub write_health: Arc<WriteHealth>,
}

impl App {
    /// Wire every use case against `store` with the system clock and RNG.
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        Self::with_ports(
            store,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
            config,
        )
    }

    pub fn with_ports(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        config: AppConfig,
    ) -> Self {
        let write_health = Arc::new(WriteHealth::new());
        let writer = Arc::new(ResilientWriter::new(
            store.clone(),
            random.clone(),
            config.write_retry.clone(),
            write_health.clone(),
        ));

        let feed = FeedUseCases::new(
            Arc::new(ListFeedPage::new(store.clone())),
            Arc::new(FeaturedItems::new(store.clone(), config.featured_limit)),
        );

        let content = ContentUseCases::new(
            Arc::new(PublishPost::new(store.clone(), clock.clone())),
            Arc::new(DeletePost::new(store.clone())),
            Arc::new(AddComment::new(store.clone(), clock.clone(), random)),
            Arc::new(ListComments::new(store.clone())),
            Arc::new(DeleteComment::new(store.clone())),
            Arc::new(RecordView::new(writer.clone())),
        );

        let presence = PresenceUseCases::new(
            Arc::new(Heartbeat::new(writer.clone(), clock.clone())),
            Arc::new(LeavePage::new(writer)),
            Arc::new(ActiveViewers::new(
                store.clone(),
                clock.clone(),
                config.presence_ttl,
            )),
        );

        let use_cases = use_cases::UseCases {
            feed,
            content,
            toggle_reaction: Arc::new(ToggleReaction::new(store.clone(), clock.clone())),
            claim_username: Arc::new(ClaimUsername::new(store.clone(), clock)),
            presence,
        };

        Self {
            store,
            config,
            use_cases,
            write_health,
        }
    }
}
