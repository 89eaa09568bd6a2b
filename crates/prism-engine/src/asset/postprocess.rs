//! Import post-process steps applied to a freshly read scene.
//!
//! Order matters: shapes are validated first so later steps can index attribute
//! arrays freely, and tangents are computed after the handedness and UV flips so
//! they live in the renderer's space.

use glam::{Vec2, Vec3};

use super::IngestError;
use super::source::{SourceMaterial, SourceMesh, SourceScene};

/// Runs the whole pipeline on `scene`.
pub fn apply(scene: &mut SourceScene) -> Result<(), IngestError> {
    for mesh in &scene.meshes {
        validate(mesh)?;
    }

    for mesh in &mut scene.meshes {
        make_left_handed(mesh);
        flip_uvs(mesh);
        compute_tangent_space(mesh);
    }

    remove_redundant_materials(scene);
    Ok(())
}

/// Rejects meshes whose attribute arrays or indices disagree with the
/// position count.
pub fn validate(mesh: &SourceMesh) -> Result<(), IngestError> {
    let count = mesh.positions.len();
    let length_error = |attribute, found| IngestError::AttributeLength {
        mesh: mesh.name.clone(),
        attribute,
        found,
        expected: count,
    };

    if !mesh.normals.is_empty() && mesh.normals.len() != count {
        return Err(length_error("normal", mesh.normals.len()));
    }
    if let Some(uvs) = mesh.tex_coords.as_ref().filter(|uvs| uvs.len() != count) {
        return Err(length_error("tex_coord", uvs.len()));
    }
    if let Some(index) = mesh.indices.iter().copied().find(|&i| i as usize >= count) {
        return Err(IngestError::IndexOutOfRange {
            mesh: mesh.name.clone(),
            index,
            vertex_count: count,
        });
    }
    Ok(())
}

/// Mirrors Z and reverses every face so front faces keep facing the camera.
pub fn make_left_handed(mesh: &mut SourceMesh) {
    let mirror = |v: &mut [f32; 3]| v[2] = -v[2];

    mesh.positions.iter_mut().for_each(mirror);
    mesh.normals.iter_mut().for_each(mirror);
    for tangents in [&mut mesh.tangents, &mut mesh.bitangents].into_iter().flatten() {
        tangents.iter_mut().for_each(mirror);
    }

    if mesh.face_arities.is_empty() {
        mesh.indices.chunks_mut(3).for_each(<[u32]>::reverse);
    } else {
        let mut rest = mesh.indices.as_mut_slice();
        for &arity in &mesh.face_arities {
            let split = (arity as usize).min(rest.len());
            let (face, tail) = std::mem::take(&mut rest).split_at_mut(split);
            face.reverse();
            rest = tail;
        }
    }
}

/// Moves the UV origin from bottom-left to top-left.
pub fn flip_uvs(mesh: &mut SourceMesh) {
    if let Some(uvs) = &mut mesh.tex_coords {
        for uv in uvs {
            uv[1] = 1.0 - uv[1];
        }
    }
}

/// Derives per-vertex tangents and bitangents from positions and UVs.
///
/// Needs normals, UVs and triangle faces; meshes lacking any of them, or
/// already carrying a tangent frame, are left untouched.
pub fn compute_tangent_space(mesh: &mut SourceMesh) {
    if mesh.has_tangents_and_bitangents() || mesh.normals.is_empty() || !mesh.is_triangulated() {
        return;
    }
    let Some(uvs) = mesh.tex_coords.as_deref() else {
        return;
    };

    let count = mesh.positions.len();
    let mut tangents = vec![Vec3::ZERO; count];
    let mut bitangents = vec![Vec3::ZERO; count];

    for tri in mesh.indices.chunks_exact(3) {
        let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let [i0, i1, i2] = corners;
        let p0 = Vec3::from(mesh.positions[i0]);
        let e1 = Vec3::from(mesh.positions[i1]) - p0;
        let e2 = Vec3::from(mesh.positions[i2]) - p0;

        let uv0 = Vec2::from(uvs[i0]);
        let d1 = Vec2::from(uvs[i1]) - uv0;
        let d2 = Vec2::from(uvs[i2]) - uv0;

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = det.recip();
        let t = (e1 * d2.y - e2 * d1.y) * r;
        let b = (e2 * d1.x - e1 * d2.x) * r;

        for v in corners {
            tangents[v] += t;
            bitangents[v] += b;
        }
    }

    let (tangents, bitangents): (Vec<_>, Vec<_>) = (0..count)
        .map(|i| {
            let n = Vec3::from(mesh.normals[i]).normalize_or_zero();
            let t = (tangents[i] - n * n.dot(tangents[i]))
                .try_normalize()
                .unwrap_or_else(|| n.any_orthonormal_vector());
            let b = (bitangents[i] - n * n.dot(bitangents[i]) - t * t.dot(bitangents[i]))
                .try_normalize()
                .unwrap_or_else(|| n.cross(t));
            (t.to_array(), b.to_array())
        })
        .unzip();

    mesh.tangents = Some(tangents);
    mesh.bitangents = Some(bitangents);
}

/// Drops unreferenced materials and merges materials with identical texture
/// bindings, remapping every mesh's material index.
pub fn remove_redundant_materials(scene: &mut SourceScene) {
    let mut referenced = vec![false; scene.materials.len()];
    for mesh in &scene.meshes {
        if let Some(flag) = referenced.get_mut(mesh.material_index) {
            *flag = true;
        }
    }

    let before = scene.materials.len();
    let mut kept = Vec::new();
    let mut remap = vec![None; before];

    for (old, material) in std::mem::take(&mut scene.materials).into_iter().enumerate() {
        if !referenced[old] {
            continue;
        }
        let index = match kept.iter().position(|k: &SourceMaterial| k.textures == material.textures) {
            Some(existing) => existing,
            None => {
                kept.push(material);
                kept.len() - 1
            }
        };
        remap[old] = Some(index);
    }

    for mesh in &mut scene.meshes {
        if let Some(Some(index)) = remap.get(mesh.material_index) {
            mesh.material_index = *index;
        }
    }

    if kept.len() != before {
        log::debug!("removed {} redundant materials", before - kept.len());
    }
    scene.materials = kept;
}
