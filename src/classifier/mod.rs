// Content classification — a remote text model used both as the safety
// screen for inbound messages and as the `!bot` / `!info` answer engine.
//
// The TextGenerator trait is the remote seam; GeminiGenerator implements it.
// ClassificationClient wraps any generator with the per-user cooldown and
// the bounded retry loop, and reduces every call to an Outcome.

pub mod client;
pub mod cooldown;
pub mod gemini;
pub mod traits;

pub use client::{ClassificationClient, Outcome};
pub use cooldown::CooldownTracker;
pub use traits::TextGenerator;
