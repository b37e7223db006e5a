//! API Lambda handler and request processing

pub mod content_handler;
pub mod handler;
pub mod helpers;
pub mod lead_handler;
pub mod parsing;
pub mod property_handler;
pub mod site_handler;

// Re-export the main handler for convenience
pub use handler::{AppState, handler, route};
