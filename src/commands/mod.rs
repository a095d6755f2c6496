//! Application command handlers for wavescope.
//!
//! # Commands
//! - `view`: Interactive waveform viewer with playback cursor (default)
//! - `peaks`: Print the min/max envelope of a file
//! - `info`: Print format, length and peak level of a file
//! - `config`: Open configuration file in user's preferred editor
//! - `logs`: Display recent log entries

pub mod config;
pub mod info;
pub mod logs;
pub mod peaks;
pub mod view;

pub use config::handle_config;
pub use info::handle_info;
pub use logs::handle_logs;
pub use peaks::handle_peaks;
pub use view::handle_view;
