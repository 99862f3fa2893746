//! Core components, types, and utilities for the mention-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Reply texts and command trigger keywords.
//! - Common types and result handling.

pub mod config;
pub mod replies;
pub mod types;
