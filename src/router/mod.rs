//! Trade Router
//!
//! Entry point for trades and for the owner-gated operator surface.
//!
//! Created: 2026-10-15

mod engine;
mod settings;
mod validation;


pub use engine::Router;
pub use settings::RouterSettings;
