use nalgebra::{RealField, Vector2};
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics mapping normalized image-plane coordinates to pixels.
///
/// Pixel coordinates are `(sample, line)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FxFyCxCySkew<S: RealField + Copy> {
    /// Focal length in pixels along the sample axis.
    pub fx: S,
    /// Focal length in pixels along the line axis.
    pub fy: S,
    /// Principal point sample coordinate.
    pub cx: S,
    /// Principal point line coordinate.
    pub cy: S,
    #[serde(default = "zero_skew")]
    pub skew: S,
}

fn zero_skew<S: RealField + Copy>() -> S {
    S::zero()
}

impl<S: RealField + Copy> FxFyCxCySkew<S> {
    /// Whether the implied K matrix is invertible.
    pub fn is_invertible(&self) -> bool {
        self.fx != S::zero() && self.fy != S::zero()
    }

    pub fn to_pixel(&self, n: &Vector2<S>) -> Vector2<S> {
        let u = self.fx * n.x + self.skew * n.y + self.cx;
        let v = self.fy * n.y + self.cy;
        Vector2::new(u, v)
    }

    pub fn from_pixel(&self, px: &Vector2<S>) -> Vector2<S> {
        let y = (px.y - self.cy) / self.fy;
        let x = (px.x - self.cx - self.skew * y) / self.fx;
        Vector2::new(x, y)
    }
}
