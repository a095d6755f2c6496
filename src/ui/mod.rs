//! Shared terminal screens.

pub mod error;

pub use error::ErrorScreen;
