//! Prism engine crate.
//!
//! Loads a static scene, packs it into shared GPU buffers, and renders it with
//! a multi-pass shader through a device lifecycle that survives lost and reset
//! devices.

pub mod asset;
pub mod batch;
pub mod config;
pub mod device;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;
