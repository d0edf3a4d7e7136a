//! Frame camera models used to decide whether a pixel sees the target body.
//!
//! The pixel → ground mapping is:
//! `ground = body ∩ ray(pose, undistort(K⁻¹ · pixel))`
//!
//! Parameter structs are serializable and live in image label files; the
//! runtime [`FrameCamera`] is built from them with validation.

mod body;
mod camera;
mod distortion;
mod intrinsics;

pub use body::*;
pub use camera::*;
pub use distortion::*;
pub use intrinsics::*;
