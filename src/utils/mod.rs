//! Utilities
//!
//! Common utilities used throughout the application.

pub mod error;
pub mod isolate;
pub mod logging;

pub use error::*;
pub use isolate::isolated;
pub use logging::init_tracing;
