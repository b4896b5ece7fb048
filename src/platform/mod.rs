//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - The drawing surface (canvas 2D on web, recorder on native)
//! - Voice event producers (DOM events on web, stdin on native)
//! - Refresh pacing and time

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;
