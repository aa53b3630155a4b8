pub mod error;
pub mod mpv;
pub mod surface;
pub mod ticker;

pub use error::{PreviewError, Result};
pub use surface::{RenderSurface, TracingSurface};
pub use ticker::{spawn_ticker, SharedStore, TickerExit, TickerHandle};
