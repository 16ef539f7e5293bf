mod quality;
mod track;

pub use quality::SoundQuality;
pub use track::{Track, TrackId};
