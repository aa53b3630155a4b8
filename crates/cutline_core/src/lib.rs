pub mod audio;
pub mod editing;
pub mod error;
pub mod history;
pub mod interval;
pub mod lane;
pub mod library;
pub mod overlays;
pub mod playback;
pub mod settings;
pub mod snapping;
pub mod store;
pub mod subtitles;
pub mod types;

pub use error::{CoreError, Result};
pub use playback::PlaybackFrame;
pub use settings::EditorSettings;
pub use store::TimelineStore;
pub use types::*;
