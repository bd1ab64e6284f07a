//! Player configuration.
//!
//! All tunables live in one typed struct that is passed explicitly to the
//! session and the render drivers; there is no process-wide config.
//!
//! ## Architecture
//!
//! - `PlayerConfig`: camera tuning, overlap policy, export settings
//! - `ExportSettings`: enumerated fps/bitrate choices and the resolution cap
//!
//! Every struct has a `validate()` that clamps into legal ranges instead of
//! rejecting, so a hand-edited or stale stored config never breaks playback.

pub mod export;
pub mod player;

pub use export::{ExportBitrate, ExportFps, ExportSettings};
pub use player::{CameraTuning, OverlapPolicy, PlayerConfig};
