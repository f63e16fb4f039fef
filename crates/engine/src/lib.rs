//! Townsquare engine library.
//!
//! Server-side core of the community portal: live paginated feeds over a
//! document store plus the content, reaction, handle and presence
//! operations around them.
//!
//! ## Structure
//!
//! - `infrastructure/` - store port, in-memory adapter, config, retries
//! - `use_cases/` - feed core and user-facing operations
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
