use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame shader constants (group 0, binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameConstants {
    pub world: [[f32; 4]; 4],
    pub world_view_proj: [[f32; 4]; 4],
    /// xyz eye position, w = 1.
    pub camera_position: [f32; 4],
    /// xyz normalized view direction, w = 0.
    pub view_direction: [f32; 4],
}

impl FrameConstants {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(world: Mat4, view: &dyn ViewSource, projection: &Projection) -> Self {
        let world_view_proj = projection.matrix() * view.view_matrix() * world;
        Self {
            world: world.to_cols_array_2d(),
            world_view_proj: world_view_proj.to_cols_array_2d(),
            camera_position: view.eye().extend(1.0).to_array(),
            view_direction: view.forward().normalize_or_zero().extend(0.0).to_array(),
        }
    }
}

/// Camera/input collaborator: anything that yields a view transform.
pub trait ViewSource {
    fn eye(&self) -> Vec3;
    fn forward(&self) -> Vec3;
    fn view_matrix(&self) -> Mat4;
}

/// Left-handed perspective projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            aspect: 1280.0 / 720.0,
            near: 1.0,
            far: 100_000.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_lh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }
}

/// Camera orbiting a target point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Radians around +Y; zero looks down +Z.
    pub yaw: f32,
    /// Radians above the horizon.
    pub pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 10.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl OrbitCamera {
    const PITCH_LIMIT: f32 = 1.5;
    const MIN_DISTANCE: f32 = 0.1;

    /// Frames an axis-aligned box; the default camera when there is nothing.
    pub fn framing(bounds: Option<(Vec3, Vec3)>) -> Self {
        let Some((min, max)) = bounds else {
            return Self::default();
        };
        let radius = ((max - min).length() * 0.5).max(1.0);
        Self {
            target: (min + max) * 0.5,
            distance: radius * 2.5,
            yaw: 0.0,
            pitch: 0.3,
        }
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Scales the distance; factors below one move closer.
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).max(Self::MIN_DISTANCE);
    }

    fn offset(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(cos_pitch * sin_yaw, sin_pitch, -cos_pitch * cos_yaw) * self.distance
    }
}

impl ViewSource for OrbitCamera {
    fn eye(&self) -> Vec3 {
        self.target + self.offset()
    }

    fn forward(&self) -> Vec3 {
        -self.offset().normalize_or_zero()
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye(), self.target, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection {
            fov_y_degrees: 45.0,
            aspect: 1280.0 / 720.0,
            near: 1.0,
            far: 100_000.0,
        }
    }

    #[test]
    fn constants_are_two_matrices_and_two_vectors() {
        assert_eq!(FrameConstants::SIZE, 160);
    }

    #[test]
    fn default_camera_looks_down_positive_z() {
        let camera = OrbitCamera::default();
        assert_eq!(camera.eye(), Vec3::new(0.0, 0.0, -10.0));
        assert!((camera.forward() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = OrbitCamera {
            target: Vec3::new(3.0, 1.0, 2.0),
            distance: 50.0,
            yaw: 0.7,
            pitch: 0.2,
        };
        let constants = FrameConstants::new(Mat4::IDENTITY, &camera, &projection());
        let wvp = Mat4::from_cols_array_2d(&constants.world_view_proj);

        let clip = wvp * camera.target.extend(1.0);
        assert!(clip.w > 0.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
        assert!((0.0..=1.0).contains(&(clip.z / clip.w)));

        assert_eq!(constants.camera_position[3], 1.0);
        assert_eq!(constants.view_direction[3], 0.0);
        assert_eq!(constants.world, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn world_matrix_is_applied_first() {
        let camera = OrbitCamera::default();
        let world = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let constants = FrameConstants::new(world, &camera, &projection());
        let expected = projection().matrix() * camera.view_matrix() * world;
        assert_eq!(constants.world_view_proj, expected.to_cols_array_2d());
    }

    #[test]
    fn orbit_clamps_pitch_and_zoom_keeps_distance_positive() {
        let mut camera = OrbitCamera::default();
        camera.orbit(0.0, 10.0);
        assert_eq!(camera.pitch, 1.5);
        camera.zoom(0.0);
        assert!(camera.distance > 0.0);
    }

    #[test]
    fn framing_centers_on_bounds() {
        let camera = OrbitCamera::framing(Some((Vec3::splat(-2.0), Vec3::splat(4.0))));
        assert_eq!(camera.target, Vec3::splat(1.0));
        assert!(camera.distance > 5.0);
        assert_eq!(OrbitCamera::framing(None), OrbitCamera::default());
    }
}
