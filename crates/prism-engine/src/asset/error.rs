use std::path::PathBuf;

use thiserror::Error;

/// Failure while turning a scene file into a [`Model`](super::Model).
///
/// Every variant aborts the load; no partially extracted model is published.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to import scene {}: {reason}", .path.display())]
    Import { path: PathBuf, reason: String },

    #[error("mesh `{mesh}` face {face} has {arity} indices; scenes must be triangulated on import")]
    NonTriangleFace {
        mesh: String,
        face: usize,
        arity: usize,
    },

    #[error("mesh `{mesh}` references vertex {index} but only has {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh `{mesh}` references material {index} but the scene has {material_count}")]
    MaterialOutOfRange {
        mesh: String,
        index: usize,
        material_count: usize,
    },

    #[error("mesh `{mesh}` has {found} {attribute} entries for {expected} vertices")]
    AttributeLength {
        mesh: String,
        attribute: &'static str,
        found: usize,
        expected: usize,
    },

    #[error("packed geometry needs {vertices} vertices and {indices} indices; 32-bit indexing caps both")]
    GeometryTooLarge { vertices: usize, indices: usize },
}
