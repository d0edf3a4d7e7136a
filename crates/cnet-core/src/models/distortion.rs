use nalgebra::{RealField, Vector2};
use serde::{Deserialize, Serialize};

pub trait DistortionModel<S: RealField + Copy> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S>;
    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S>;
}

/// Brown–Conrady radial-tangential distortion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrownConrady5<S: RealField> {
    pub k1: S,
    pub k2: S,
    pub k3: S,
    pub p1: S,
    pub p2: S,
    /// Fixed-point iterations used by `undistort` (0 selects the default of 8).
    #[serde(default)]
    pub iters: u32,
}

impl<S: RealField + Copy> BrownConrady5<S> {
    fn distort_xy(&self, x: S, y: S) -> (S, S) {
        let two = S::one() + S::one();
        let r2 = x * x + y * y;
        let radial = S::one() + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        let x_t = two * self.p1 * x * y + self.p2 * (r2 + two * x * x);
        let y_t = self.p1 * (r2 + two * y * y) + two * self.p2 * x * y;
        (x * radial + x_t, y * radial + y_t)
    }
}

impl<S: RealField + Copy> DistortionModel<S> for BrownConrady5<S> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        let (x, y) = self.distort_xy(n_undist.x, n_undist.y);
        Vector2::new(x, y)
    }

    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S> {
        let iters = if self.iters == 0 { 8 } else { self.iters };
        let mut x = n_dist.x;
        let mut y = n_dist.y;
        for _ in 0..iters {
            let (xd, yd) = self.distort_xy(x, y);
            x = x - (xd - n_dist.x);
            y = y - (yd - n_dist.y);
        }
        Vector2::new(x, y)
    }
}

/// Distortion choice carried by a frame camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distortion {
    #[default]
    None,
    BrownConrady5(BrownConrady5<f64>),
}

impl DistortionModel<f64> for Distortion {
    fn distort(&self, n_undist: &Vector2<f64>) -> Vector2<f64> {
        match self {
            Distortion::None => *n_undist,
            Distortion::BrownConrady5(params) => params.distort(n_undist),
        }
    }

    fn undistort(&self, n_dist: &Vector2<f64>) -> Vector2<f64> {
        match self {
            Distortion::None => *n_dist,
            Distortion::BrownConrady5(params) => params.undistort(n_dist),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undistort_recovers_mild_distortion() {
        let d = BrownConrady5 {
            k1: -0.12,
            k2: 0.03,
            k3: 0.0,
            p1: 0.001,
            p2: -0.0005,
            iters: 20,
        };
        let n = Vector2::new(0.21, -0.14);
        let back = d.undistort(&d.distort(&n));
        assert!((back - n).norm() < 1e-9, "back={back:?}");
    }

    #[test]
    fn none_is_identity() {
        let n = Vector2::new(0.3, 0.4);
        assert_eq!(Distortion::None.distort(&n), n);
        assert_eq!(Distortion::None.undistort(&n), n);
    }
}
