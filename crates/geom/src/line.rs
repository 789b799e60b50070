use crate::{Box2D, Point, Vector};

/// A linear segment.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    /// Sample the segment at t (expecting t between 0 and 1).
    #[inline]
    pub fn sample(&self, t: f64) -> Point {
        self.from.lerp(self.to, t)
    }

    /// Returns an inverted version of this segment where the beginning and the end
    /// points are swapped.
    #[inline]
    pub fn flip(&self) -> Self {
        LineSegment {
            from: self.to,
            to: self.from,
        }
    }

    /// Split this segment into two sub-segments.
    #[inline]
    pub fn split(&self, t: f64) -> (Self, Self) {
        let split_point = self.sample(t);

        (
            LineSegment {
                from: self.from,
                to: split_point,
            },
            LineSegment {
                from: split_point,
                to: self.to,
            },
        )
    }

    #[inline]
    pub fn to_vector(&self) -> Vector {
        self.to - self.from
    }

    /// Computes the length of this segment.
    #[inline]
    pub fn length(&self) -> f64 {
        self.to_vector().length()
    }

    #[inline]
    pub fn square_length(&self) -> f64 {
        self.to_vector().square_length()
    }

    #[inline]
    pub fn mid_point(&self) -> Point {
        self.sample(0.5)
    }

    /// Returns the smallest rectangle that contains this segment.
    #[inline]
    pub fn bounding_box(&self) -> Box2D {
        Box2D {
            min: self.from.min(self.to),
            max: self.from.max(self.to),
        }
    }

    /// Computes the intersection (if any) between this segment and another one.
    ///
    /// Returns the parameters along both segments at which they cross;
    /// sample either segment at its parameter to get the intersection point.
    ///
    /// Segments that merely share an endpoint do not count as intersecting,
    /// and neither do parallel or collinear segments.
    pub fn intersection_t(&self, other: &Self) -> Option<(f64, f64)> {
        if self.from == other.from
            || self.from == other.to
            || self.to == other.from
            || self.to == other.to
        {
            return None;
        }

        // Solve self.from + t * d1 == other.from + u * d2 with two cross
        // products.
        let d1 = self.to_vector();
        let d2 = other.to_vector();

        let denom = d1.cross(d2);
        if denom == 0.0 {
            return None;
        }

        let offset = other.from - self.from;
        let t = offset.cross(d2) / denom;
        let u = offset.cross(d1) / denom;

        if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
            return None;
        }

        Some((t, u))
    }

    #[inline]
    pub fn intersection(&self, other: &Self) -> Option<Point> {
        self.intersection_t(other).map(|(t, _)| self.sample(t))
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersection_t(other).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> LineSegment {
        LineSegment {
            from: point(x0, y0),
            to: point(x1, y1),
        }
    }

    #[test]
    fn intersection_rotated() {
        use core::f64::consts::PI;
        let epsilon = 0.0001;
        let count: u32 = 100;

        for i in 0..count {
            for j in 0..count {
                if i % (count / 2) == j % (count / 2) {
                    // Avoid the colinear case.
                    continue;
                }

                let angle1 = i as f64 / (count as f64) * 2.0 * PI;
                let angle2 = j as f64 / (count as f64) * 2.0 * PI;

                let l1 = LineSegment {
                    from: point(10.0 * angle1.cos(), 10.0 * angle1.sin()),
                    to: point(-10.0 * angle1.cos(), -10.0 * angle1.sin()),
                };

                let l2 = LineSegment {
                    from: point(10.0 * angle2.cos(), 10.0 * angle2.sin()),
                    to: point(-10.0 * angle2.cos(), -10.0 * angle2.sin()),
                };

                assert!(l1.intersects(&l2));

                assert!(l1
                    .intersection(&l2)
                    .unwrap()
                    .distance_to(point(0.0, 0.0))
                    .abs()
                    < epsilon);
            }
        }
    }

    #[test]
    fn intersection_touching() {
        let l1 = seg(0.0, 0.0, 10.0, 10.0);
        let l2 = seg(10.0, 10.0, 10.0, 0.0);

        assert!(!l1.intersects(&l2));
        assert!(l1.intersection(&l2).is_none());
    }

    #[test]
    fn intersection_overlap() {
        // Collinear overlapping segments meet in a whole region, not a
        // point. None of the meshing code needs that case reported, so it
        // falls under the parallel early-out.
        let l1 = seg(0.0, 0.0, 10.0, 0.0);
        let l2 = seg(5.0, 0.0, 15.0, 0.0);

        assert!(!l1.intersects(&l2));
        assert!(l1.intersection(&l2).is_none());
    }

    #[test]
    fn split_at_mid_point() {
        let l = seg(0.0, 0.0, 2.0, 0.0);
        let (a, b) = l.split(0.5);

        assert_eq!(a.to, point(1.0, 0.0));
        assert_eq!(b.from, point(1.0, 0.0));
        assert_eq!(a.length() + b.length(), l.length());
    }
}
