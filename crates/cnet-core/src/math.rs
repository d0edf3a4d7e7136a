use nalgebra::{Isometry3, Point2, Point3, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;
pub type Iso3 = Isometry3<Real>;

/// Z component of the cross product of `(a - o)` and `(b - o)`.
///
/// Positive when `o -> a -> b` turns counter-clockwise.
pub fn cross2(o: &Pt2, a: &Pt2, b: &Pt2) -> Real {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Build an isometry from a position and a scaled rotation axis (axis * angle).
pub fn iso_from_arrays(position: [Real; 3], axis_angle: [Real; 3]) -> Iso3 {
    Iso3::new(Vec3::from(position), Vec3::from(axis_angle))
}
