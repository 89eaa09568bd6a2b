//! Material-ordered packing of meshes into shared buffers.

mod packer;

pub use packer::{pack, Batch, PackedGeometry};
