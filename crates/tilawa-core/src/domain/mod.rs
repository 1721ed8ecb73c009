//! Domain types shared by every tilawa crate.

mod session;
mod source;

pub use session::{ControllerId, SessionId, SessionSequence, SessionState, SynthesisState};
pub use source::{ReciterId, SURAH_COUNT, SourceKey, Track, TrackId, VerseKey, VerseKeyError};
