//! Math utilities and types
//!
//! Provides fundamental math types for 3D rendering and scene management.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Convert degrees to radians
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * (std::f32::consts::PI / 180.0)
}

/// Create a perspective projection matrix
///
/// Maps depth to the [0, 1] range expected by modern graphics APIs.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let tan_half_fovy = (fov_y * 0.5).tan();

    let mut result = Mat4::zeros();
    result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
    result[(1, 1)] = 1.0 / tan_half_fovy;
    result[(2, 2)] = far / (far - near);
    result[(2, 3)] = -(near * far) / (far - near);
    result[(3, 2)] = 1.0;

    result
}

/// Create an orthographic projection matrix from a view height and aspect ratio
///
/// The view volume is centred on the camera axis; depth maps to [0, 1].
pub fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let half_h = height * 0.5;
    let half_w = half_h * aspect;

    let mut result = Mat4::identity();
    result[(0, 0)] = 1.0 / half_w;
    result[(1, 1)] = 1.0 / half_h;
    result[(2, 2)] = 1.0 / (far - near);
    result[(2, 3)] = -near / (far - near);

    result
}

/// Bridge from right-handed Y-up view space into Y-down, Z-forward clip
/// conventions
///
/// [`look_at`] leaves the camera looking down -Z with +Y up, while
/// [`perspective`] and [`orthographic`] map +Z in front of the camera to
/// depth [0, 1]. This flips Y and Z between the two, so the full chain is
/// `projection * view_to_clip() * view`. Composing projection and view
/// directly puts everything in front of the camera at negative w, outside
/// the clip volume.
pub fn view_to_clip() -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0, 0.0, -1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Create a right-handed look-at view matrix
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = (target - eye).normalize();
    let right = forward.cross(&up).normalize();
    let camera_up = right.cross(&forward);

    let translation = Mat4::new_translation(&(-eye));
    let rotation = Mat4::new(
        right.x, right.y, right.z, 0.0,
        camera_up.x, camera_up.y, camera_up.z, 0.0,
        -forward.x, -forward.y, -forward.z, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );

    rotation * translation
}
