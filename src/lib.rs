// GroupGuard: strike-based moderation for WhatsApp groups
//
// This is the library root. Each module corresponds to a major subsystem
// of the moderation bot.

pub mod classifier;
pub mod config;
pub mod db;
pub mod filter;
pub mod knowledge;
pub mod moderation;
pub mod output;
pub mod search;
pub mod status;
pub mod transport;
pub mod web;
