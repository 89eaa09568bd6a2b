/// Acquired back buffer plus the encoder recording into it.
///
/// Holding the surface texture blocks acquisition of the next one, so a frame
/// lives from the status query to present and no longer.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
