//! Interactive waveform viewer.
//!
//! `state` holds what one display shows, `session` drives it from loads,
//! playback and user commands, and `ui` paints it in the terminal.

pub mod session;
pub mod state;
pub mod ui;

pub use session::ViewerSession;
pub use state::{Delivery, WaveformView};
pub use ui::{ViewerCommand, ViewerTui};
