//! Telegram adapter: dispatcher, callback command parsing, handlers,
//! keyboards and notifications.

pub mod callbacks;
pub mod format;
mod handlers;
pub mod keyboards;
pub mod notify;
pub mod pending;
pub mod router;
