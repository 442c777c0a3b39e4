//! # Introlink Telegram Bridge
//!
//! A Telegram bot that signs in to a user account through a phone-number
//! login dialogue and then uses that account to create group chats and
//! invite links on behalf of the user.

pub mod api;
pub mod bot;
pub mod code_relay;
pub mod config;
pub mod dialogue;
pub mod localization;
pub mod rpc;
pub mod session_store;
pub mod transport;
