//! Notifications for cache observers.
//!
//! Editors and adaptors learn about the cache through two events:
//! - registration changes ([`CacheEvent::Registry`])
//! - completed dumps and restores ([`CacheEvent::Residency`])
//!
//! The manager enqueues events and moves on; delivery happens whenever the
//! subscriber drains its [`Receiver`](crossbeam_channel::Receiver).

mod channel;
mod event;

pub use channel::NotificationChannel;
pub use event::{CacheEvent, RegistryChange};
