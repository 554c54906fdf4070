//! Core of the chat relay bot.
//!
//! Framework-agnostic: chat updates arrive as [`messaging::types::InboundEvent`],
//! run through the [`pipeline`] and reach the [`handlers`], which talk to the
//! backend API and reply through [`messaging::port::MessagingPort`]. Telegram
//! lives in an adapter crate.

pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod pipeline;
pub mod rate_limit;
pub mod services;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
