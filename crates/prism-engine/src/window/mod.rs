//! Window and event loop.
//!
//! Owns the `winit` event loop and the single viewer window, and drives the
//! renderer once per redraw.

mod runtime;

pub use runtime::Runtime;
