// Moderation — the per-message decision engine and the group command layer.

pub mod commands;
pub mod engine;

pub use commands::{Command, CommandContext};
pub use engine::{Moderator, Verdict};
