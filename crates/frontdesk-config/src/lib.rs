#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Frontdesk Config - layered runtime configuration with caching.
//!
//! This crate provides a single read path for per-task, bot, and LLM
//! configuration. An administrator edits configuration through an
//! external admin surface; the runtime observes edits through this
//! cache without restarting.
//!
//! # Read path
//!
//! 1. Process-local map (per-entry TTL, default 5 minutes)
//! 2. Shared cache (`config:<key>` JSON snapshots)
//! 3. Authoritative admin endpoint (`GET /api/admin/config/...`, 5 s)
//! 4. Built-in defaults
//!
//! # Design
//!
//! This crate holds HTTP coordinates only - it never references a runtime
//! component, which keeps the config/LLM/admin dependency chain acyclic.
//! Consumers receive immutable `Arc` snapshots; anything derived is
//! copied first.
//!
//! # Example
//!
//! ```
//! use frontdesk_config::{ConfigCache, TaskKind};
//!
//! # async fn example() {
//! let cache = ConfigCache::in_memory();
//! let booking = cache.get_task_config(TaskKind::Booking).await;
//! assert!(booking.enabled());
//! # }
//! ```

mod admin;
mod cache;
mod error;
mod shared;
mod types;

pub use admin::AdminApi;
pub use cache::{CacheOptions, ConfigCache};
pub use error::{ConfigError, ConfigResult};
pub use shared::{MemorySharedCache, SharedCache};
pub use types::{
    BookingTaskConfig, BotConfig, BusinessHours, CancelTaskConfig, LlmConfig, LlmConfigView,
    LlmProviderKind, MeetingTaskConfig, ServiceEntry, TaskConfig, TaskKind, mask_api_key,
};
