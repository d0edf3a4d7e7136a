use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Distortion, DistortionModel, FxFyCxCySkew, TargetBody};
use crate::{iso_from_arrays, Iso3, Pt3, Real, Vec2, Vec3};

/// World-space ray leaving the camera center.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Pt3,
    /// Unit direction.
    pub dir: Vec3,
}

/// Reasons a camera description cannot be turned into a usable model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("intrinsics are singular (fx={fx}, fy={fy})")]
    SingularIntrinsics { fx: Real, fy: Real },
    #[error("target body radii must be finite and positive")]
    InvalidBody,
    #[error("camera pose contains non-finite values")]
    InvalidPose,
}

/// Framing camera observing a target body.
///
/// `pixel = K(distort(project(R_cw * (X - C))))`, inverted by
/// [`FrameCamera::backproject_pixel`] and intersected with the body by
/// [`FrameCamera::ground_point`].
#[derive(Clone, Debug)]
pub struct FrameCamera {
    pub k: FxFyCxCySkew<Real>,
    pub dist: Distortion,
    /// Camera-to-world transform.
    pub world_from_camera: Iso3,
    pub body: TargetBody,
}

impl FrameCamera {
    pub fn backproject_pixel(&self, px: &Vec2) -> Ray {
        let n_d = self.k.from_pixel(px);
        let n_u = self.dist.undistort(&n_d);
        let dir_c = Vec3::new(n_u.x, n_u.y, 1.0).normalize();
        Ray {
            origin: self.world_from_camera * Pt3::origin(),
            dir: self.world_from_camera.rotation * dir_c,
        }
    }

    /// Surface point seen at pixel `(sample, line)`, or `None` off the body.
    pub fn ground_point(&self, sample: Real, line: Real) -> Option<Pt3> {
        if !sample.is_finite() || !line.is_finite() {
            return None;
        }
        let ray = self.backproject_pixel(&Vec2::new(sample, line));
        self.body.intersect(&ray.origin, &ray.dir)
    }

    /// Pixel at which a world point is imaged, or `None` behind the camera.
    pub fn project_point(&self, p_w: &Pt3) -> Option<Vec2> {
        let p_c = self.world_from_camera.inverse_transform_point(p_w);
        if p_c.z <= 0.0 {
            return None;
        }
        let n = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        Some(self.k.to_pixel(&self.dist.distort(&n)))
    }
}

/// Camera pose as a center position plus a scaled rotation axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseParams {
    /// Camera center in world coordinates.
    pub position: [Real; 3],
    /// Camera-to-world rotation as axis * angle (radians).
    pub axis_angle: [Real; 3],
}

/// Serializable description of a [`FrameCamera`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameCameraParams {
    pub intrinsics: FxFyCxCySkew<Real>,
    #[serde(default)]
    pub distortion: Distortion,
    pub pose: PoseParams,
    pub body: TargetBody,
}

impl FrameCameraParams {
    /// Build a runtime camera model.
    ///
    /// # Errors
    ///
    /// Fails when the intrinsics are singular, the body radii are invalid, or
    /// the pose holds non-finite numbers.
    pub fn build(&self) -> Result<FrameCamera, ModelError> {
        let k = self.intrinsics;
        if !k.is_invertible() || !k.fx.is_finite() || !k.fy.is_finite() {
            return Err(ModelError::SingularIntrinsics { fx: k.fx, fy: k.fy });
        }
        if !self.body.is_valid() {
            return Err(ModelError::InvalidBody);
        }
        let finite = self
            .pose
            .position
            .iter()
            .chain(self.pose.axis_angle.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(ModelError::InvalidPose);
        }

        Ok(FrameCamera {
            k,
            dist: self.distortion,
            world_from_camera: iso_from_arrays(self.pose.position, self.pose.axis_angle),
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::nadir_camera_params;

    #[test]
    fn center_pixel_hits_sub_camera_point() {
        let cam = nadir_camera_params().build().unwrap();
        let hit = cam.ground_point(512.0, 512.0).unwrap();
        assert!((hit - Pt3::new(0.0, 0.0, 1000.0)).norm() < 1e-6, "hit={hit}");
    }

    #[test]
    fn corner_pixel_misses_limb() {
        let cam = nadir_camera_params().build().unwrap();
        assert!(cam.ground_point(10.0, 10.0).is_none());
    }

    #[test]
    fn ground_point_projects_back_to_pixel() {
        let cam = nadir_camera_params().build().unwrap();
        let hit = cam.ground_point(600.0, 450.0).unwrap();
        let px = cam.project_point(&hit).unwrap();
        assert!((px - Vec2::new(600.0, 450.0)).norm() < 1e-6, "px={px}");
    }

    #[test]
    fn singular_intrinsics_are_rejected() {
        let mut params = nadir_camera_params();
        params.intrinsics.fx = 0.0;
        assert!(matches!(
            params.build(),
            Err(ModelError::SingularIntrinsics { .. })
        ));
    }

    #[test]
    fn params_deserialize_without_distortion() {
        let json = r#"{
            "intrinsics": {"fx": 1000.0, "fy": 1000.0, "cx": 512.0, "cy": 512.0},
            "pose": {"position": [0.0, 0.0, 3000.0], "axis_angle": [3.141592653589793, 0.0, 0.0]},
            "body": {"type": "sphere", "radius": 1000.0}
        }"#;
        let params: FrameCameraParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.distortion, Distortion::None);
        assert_eq!(params.intrinsics.skew, 0.0);
        assert!(params.build().is_ok());
    }
}
