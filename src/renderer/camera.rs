use glam::{Mat4, Vec3};

/// Spherical orbit camera around a fixed look-at offset. Radius, polar and
/// azimuth angles are driven directly by the UI sliders each frame.
pub struct OrbitCamera {
    pub radius: f32,
    pub polar: f32,
    pub azimuth: f32,

    pub target: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            radius: 2.0,
            polar: 1.5,
            azimuth: 0.0,

            target: Vec3::new(0.0, 0.5, 0.0),

            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl OrbitCamera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            -self.polar.sin() * self.azimuth.cos(),
            -self.polar.cos(),
            -self.polar.sin() * self.azimuth.sin(),
        )
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    /// Eye sits `radius` behind the target along the forward direction, so a
    /// zero radius places it exactly at the look-at offset.
    pub fn eye(&self) -> Vec3 {
        self.target - self.radius * self.forward()
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.eye();
        Mat4::look_at_rh(eye, eye + self.forward(), self.up())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn camera(radius: f32, polar: f32, azimuth: f32) -> OrbitCamera {
        OrbitCamera {
            radius,
            polar,
            azimuth,
            ..OrbitCamera::default()
        }
    }

    #[test]
    fn basis_is_orthonormal() {
        for polar in [0.05_f32, 0.7, 1.5708, 2.3, 3.1] {
            for azimuth in [0.0_f32, 1.0, 3.14, 5.9] {
                let cam = camera(2.0, polar, azimuth);
                let (f, r, u) = (cam.forward(), cam.right(), cam.up());

                assert!((f.length() - 1.0).abs() < EPS, "polar {polar} az {azimuth}");
                assert!((r.length() - 1.0).abs() < EPS);
                assert!((u.length() - 1.0).abs() < EPS);
                assert!(f.dot(r).abs() < EPS);
                assert!(f.dot(u).abs() < EPS);
                assert!(r.dot(u).abs() < EPS);
            }
        }
    }

    #[test]
    fn zero_radius_puts_eye_at_target() {
        let cam = camera(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        assert!((cam.eye() - Vec3::new(0.0, 0.5, 0.0)).length() < EPS);
    }

    #[test]
    fn eye_sits_radius_away_from_target() {
        let cam = camera(3.0, 1.0, 2.0);
        assert!((cam.eye().distance(cam.target) - 3.0).abs() < EPS);
    }

    #[test]
    fn forward_at_equator_looks_along_negative_x() {
        // polar = pi/2, azimuth = 0 -> forward = (-1, 0, 0)
        let cam = camera(2.0, std::f32::consts::FRAC_PI_2, 0.0);
        assert!((cam.forward() - Vec3::new(-1.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn view_projection_maps_target_to_clip_center() {
        let cam = camera(2.0, 1.5, 0.7);
        let clip = cam.view_projection_matrix() * cam.target.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < EPS);
        assert!(ndc.y.abs() < EPS);
    }
}
