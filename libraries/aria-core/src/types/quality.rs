/// Sound quality preference
use serde::{Deserialize, Serialize};

/// Sound quality preference passed to the URI resolver and cache check.
///
/// Which qualities are actually available for a track is a resolver concern;
/// the session only carries the preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundQuality {
    /// Standard quality (default)
    #[default]
    Standard,

    /// Reduced quality for constrained networks
    Low,

    /// High quality
    High,

    /// Highest available lossy quality
    Super,
}
