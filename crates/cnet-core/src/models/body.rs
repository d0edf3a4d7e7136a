use serde::{Deserialize, Serialize};

use crate::{Pt3, Real, Vec3};

/// Target body surface, centered at the world origin with axis-aligned radii.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetBody {
    Sphere { radius: Real },
    Ellipsoid { a: Real, b: Real, c: Real },
}

impl TargetBody {
    pub fn radii(&self) -> Vec3 {
        match *self {
            TargetBody::Sphere { radius } => Vec3::new(radius, radius, radius),
            TargetBody::Ellipsoid { a, b, c } => Vec3::new(a, b, c),
        }
    }

    /// All radii finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.radii().iter().all(|r| r.is_finite() && *r > 0.0)
    }

    /// First intersection of the ray `origin + t * dir`, `t > 0`, with the surface.
    ///
    /// The ray is solved in coordinates scaled by the radii, where the body is
    /// the unit sphere. Returns `None` when the ray misses the body.
    pub fn intersect(&self, origin: &Pt3, dir: &Vec3) -> Option<Pt3> {
        let r = self.radii();
        let o = origin.coords.component_div(&r);
        let d = dir.component_div(&r);

        let a = d.dot(&d);
        if a <= 0.0 {
            return None;
        }
        let b = 2.0 * o.dot(&d);
        let c = o.dot(&o) - 1.0;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }

        let sq = disc.sqrt();
        let near = (-b - sq) / (2.0 * a);
        let far = (-b + sq) / (2.0 * a);
        let t = if near > 0.0 {
            near
        } else if far > 0.0 {
            far
        } else {
            return None;
        };
        Some(origin + dir * t)
    }
}
