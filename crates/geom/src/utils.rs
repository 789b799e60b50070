//! Various orientation and angle utilities.

use crate::{vector, Point, Vector};

/// Rotate `v` by 90 degrees counter-clockwise.
///
/// For an edge tangent this yields the left-hand normal, which points into
/// the interior of a counter-clockwise boundary loop.
#[inline]
pub fn rotated_ccw(v: Vector) -> Vector {
    vector(-v.y, v.x)
}

/// Whether `p` is strictly on the left side of the directed line from `a` to `b`.
#[inline]
pub fn is_left(a: Point, b: Point, p: Point) -> bool {
    (b - a).cross(p - a) > 0.0
}

/// Whether `p` is on the left side of, or exactly on, the directed line
/// from `a` to `b`.
#[inline]
pub fn is_left_on(a: Point, b: Point, p: Point) -> bool {
    (b - a).cross(p - a) >= 0.0
}

/// The unsigned angle between two vectors, in `[0, pi]`.
///
/// Returns zero if either vector has zero length.
pub fn angle(v1: Vector, v2: Vector) -> f64 {
    let denom = v1.length() * v2.length();
    if denom == 0.0 {
        return 0.0;
    }

    let cos = (v1.dot(v2) / denom).clamp(-1.0, 1.0);
    cos.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point;
    use core::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn left_of_segment() {
        let a = point(0.0, 0.0);
        let b = point(2.0, 0.0);

        assert!(is_left(a, b, point(1.0, 1.0)));
        assert!(!is_left(a, b, point(1.0, -1.0)));
        assert!(!is_left(a, b, point(1.0, 0.0)));
        assert!(is_left_on(a, b, point(1.0, 0.0)));
    }

    #[test]
    fn angle_between_vectors() {
        assert!((angle(vector(1.0, 0.0), vector(0.0, 1.0)) - FRAC_PI_2).abs() < 1e-12);
        assert!((angle(vector(1.0, 0.0), vector(-1.0, 0.0)) - PI).abs() < 1e-12);
        assert!(angle(vector(1.0, 0.0), vector(2.0, 0.0)).abs() < 1e-12);
        assert_eq!(angle(vector(0.0, 0.0), vector(1.0, 0.0)), 0.0);
    }

    #[test]
    fn normal_points_left() {
        let t = vector(1.0, 0.0);
        assert_eq!(rotated_ccw(t), vector(0.0, 1.0));
        assert_eq!(rotated_ccw(rotated_ccw(t)), -t);
    }
}
