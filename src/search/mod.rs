// Web and video search collaborators for the `!google` and `!yt` commands.
//
// Both are plain request/response REST clients behind one trait so the
// command layer can be tested with canned results.

pub mod google;
pub mod traits;
pub mod youtube;

pub use traits::{SearchHit, SearchProvider};
