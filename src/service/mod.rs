//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the mention-bot:
//! - Chat services (e.g., Yammer)
//! - Realtime feed transports (e.g., CometD long-polling)
//! - Dialogue services (e.g., docomo)
//! - Persistence of the store document (e.g., a JSON file)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod dialogue;
pub mod feed;
pub mod store;
