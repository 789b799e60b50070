//! Committing candidate triangles into the mesh and advancing the front.
//!
//! [FrontUpdate] is the only place where elements enter the mesh during
//! layering. A candidate triangle is validated against the front and the
//! boundary before anything is mutated; on success the front advances
//! across the base edge, on failure everything is left unchanged.

use crate::edge_list::EdgeId;
use crate::entity::VertexId;
use crate::front::Front;
use crate::geom::LineSegment;
use crate::math::Point;
use crate::mesh::{Mesh, TriangleId};

/// Marker stamped on edges that do not stem from an input boundary.
pub(crate) const INTERIOR_EDGE_MARKER: i32 = -1;

// Reject triangles flatter than this (smallest internal angle, radians).
const MIN_TRIANGLE_ANGLE: f64 = 0.01;

pub struct FrontUpdate;

impl Default for FrontUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontUpdate {
    pub fn new() -> Self {
        FrontUpdate
    }

    /// Try to grow a triangle over `base`.
    ///
    /// The apex is an existing front vertex within `radius` of
    /// `preferred_xy` when one passes validation, otherwise a new vertex
    /// created at `fallback_xy`. On success the triangle is committed, the
    /// front advances across `base` and the triangle id is returned. On
    /// failure the mesh and the front are unchanged.
    pub fn update_front(
        &self,
        mesh: &mut Mesh,
        front: &mut Front,
        base: EdgeId,
        preferred_xy: Point,
        fallback_xy: Point,
        radius: f64,
    ) -> Option<TriangleId> {
        let b1 = front[base].v1();
        let b2 = front[base].v2();

        // Existing front vertices near the preferred position, closest
        // first.
        let mut candidates: Vec<VertexId> = Vec::new();
        for e in front.iter() {
            for v in [front[e].v1(), front[e].v2()] {
                if v != b1 && v != b2 && !candidates.contains(&v) {
                    let d = mesh.vertices()[v].position() - preferred_xy;
                    if d.length() <= radius {
                        candidates.push(v);
                    }
                }
            }
        }
        candidates.sort_by(|&a, &b| {
            let da = (mesh.vertices()[a].position() - preferred_xy).square_length();
            let db = (mesh.vertices()[b].position() - preferred_xy).square_length();
            da.total_cmp(&db)
        });

        for apex in candidates {
            if self.triangle_is_valid(mesh, front, b1, b2, apex) {
                return Some(self.commit(mesh, front, base, apex));
            }
        }

        // No acceptable vertex in the vicinity: place a new one.
        let apex = mesh.add_vertex(fallback_xy);
        if self.triangle_is_valid(mesh, front, b1, b2, apex) {
            return Some(self.commit(mesh, front, base, apex));
        }

        mesh.vertices_mut().remove(apex);

        None
    }

    fn commit(
        &self,
        mesh: &mut Mesh,
        front: &mut Front,
        base: EdgeId,
        apex: VertexId,
    ) -> TriangleId {
        let b1 = front[base].v1();
        let b2 = front[base].v2();

        let tri = mesh.add_triangle(b1, b2, apex);
        mesh.triangle_mut(tri).set_active(true);

        self.advance_front(mesh, front, base, apex, tri);

        tri
    }

    /// Advance the front across `base` with the given apex: the base edge
    /// leaves the front, and each of the triangle's two other sides either
    /// closes over an existing front edge (which becomes an interior mesh
    /// edge) or is appended as a new front edge.
    pub fn advance_front(
        &self,
        mesh: &mut Mesh,
        front: &mut Front,
        base: EdgeId,
        apex: VertexId,
        _tri: TriangleId,
    ) {
        let b1 = front[base].v1();
        let b2 = front[base].v2();

        // A twin link into the boundary list must be nulled on both sides
        // before the edge is destroyed.
        if front[base].twin().is_some() {
            front.unbind_twin(base, &mut mesh.boundary_edges);
        }
        front.remove(&mut mesh.vertices, base);

        // The covered base becomes an interior edge, unless it mirrors an
        // input boundary edge.
        let on_boundary = mesh.boundary_edges.get_edge(b1, b2).is_some()
            || mesh.boundary_edges.get_edge(b2, b1).is_some();
        if !on_boundary {
            mesh.interior_edges
                .add_edge(&mesh.vertices, b1, b2, INTERIOR_EDGE_MARKER);
        }

        for (x, y) in [(b1, apex), (apex, b2)] {
            // The side may close over an edge that is already part of the
            // front; that edge then lies between two elements.
            if let Some(e) = front.get_edge(y, x).or_else(|| front.get_edge(x, y)) {
                let (v1, v2) = (front[e].v1(), front[e].v2());
                front.remove(&mut mesh.vertices, e);
                mesh.interior_edges
                    .add_edge(&mesh.vertices, v1, v2, INTERIOR_EDGE_MARKER);
            } else {
                front.add_edge(&mut mesh.vertices, x, y, INTERIOR_EDGE_MARKER);
            }
        }
    }

    /// Remove the given triangles (and the vertex that was created for
    /// them, if any) when one of them fails validation. Returns true when
    /// something was removed.
    pub fn remove_from_mesh_if_invalid(
        &self,
        mesh: &mut Mesh,
        front: &Front,
        new_vertex: Option<VertexId>,
        tris: &[TriangleId],
    ) -> bool {
        let all_valid = tris.iter().all(|&t| {
            let [a, b, c] = mesh.triangle(t).vertices();
            self.triangle_is_valid(mesh, front, a, b, c)
        });

        if all_valid {
            return false;
        }

        for &t in tris {
            mesh.remove_triangle(t);
        }
        if let Some(v) = new_vertex {
            mesh.vertices_mut().remove(v);
        }

        true
    }

    /// A candidate triangle (a, b, c) is acceptable when it is counter-
    /// clockwise, not degenerate, and its two non-base sides do not
    /// intersect any front or boundary edge.
    fn triangle_is_valid(
        &self,
        mesh: &Mesh,
        front: &Front,
        a: VertexId,
        b: VertexId,
        c: VertexId,
    ) -> bool {
        let pa = mesh.vertices()[a].position();
        let pb = mesh.vertices()[b].position();
        let pc = mesh.vertices()[c].position();

        let double_area = (pb - pa).cross(pc - pa);
        if double_area <= 0.0 {
            return false;
        }

        let l_ab = (pb - pa).length();
        let l_bc = (pc - pb).length();
        let l_ca = (pa - pc).length();

        // sin of the angle at each corner; the smallest one has the largest
        // product of adjacent side lengths in the denominator.
        let max_product = (l_ab * l_ca).max(l_ab * l_bc).max(l_bc * l_ca);
        if double_area / max_product.max(f64::MIN_POSITIVE) < MIN_TRIANGLE_ANGLE {
            return false;
        }

        let sides = [
            LineSegment { from: pa, to: pc },
            LineSegment { from: pc, to: pb },
        ];

        for seg in &sides {
            for e in front.iter() {
                if self.segment_hits_edge(mesh, front[e].v1(), front[e].v2(), seg) {
                    return false;
                }
            }
            for e in mesh.boundary_edges().iter() {
                let edge = &mesh.boundary_edges()[e];
                if self.segment_hits_edge(mesh, edge.v1(), edge.v2(), seg) {
                    return false;
                }
            }
        }

        true
    }

    fn segment_hits_edge(
        &self,
        mesh: &Mesh,
        v1: VertexId,
        v2: VertexId,
        seg: &LineSegment,
    ) -> bool {
        let other = LineSegment {
            from: mesh.vertices()[v1].position(),
            to: mesh.vertices()[v2].position(),
        };
        seg.intersects(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::tests::{init_front, square_domain};
    use crate::math::point;

    #[test]
    fn grow_triangle_with_new_vertex() {
        let domain = square_domain(1.0);
        let (mut mesh, mut front) = init_front(&domain);

        let base = front.first();
        let update = FrontUpdate::new();

        let n_front = front.len();
        let tri = update
            .update_front(
                &mut mesh,
                &mut front,
                base,
                point(0.5, 0.5),
                point(0.5, 0.5),
                0.1,
            )
            .expect("triangle commit failed");

        let apex = mesh.triangle(tri).v3();
        assert_eq!(mesh.vertices()[apex].position(), point(0.5, 0.5));
        assert!(mesh.vertices()[apex].on_front());

        // The base left the front and two new edges joined it.
        assert_eq!(front.len(), n_front + 1);
        assert!(!front.contains(base));
        assert!(front.get_edge(mesh.triangle(tri).v1(), apex).is_some());
        assert!(front.get_edge(apex, mesh.triangle(tri).v2()).is_some());
    }

    #[test]
    fn reject_apex_behind_base() {
        let domain = square_domain(1.0);
        let (mut mesh, mut front) = init_front(&domain);

        let base = front.first();
        let update = FrontUpdate::new();

        // A fallback position on the outside of the domain produces a
        // clockwise triangle, which must be rejected without mutating
        // anything.
        let n_verts = mesh.vertices().len();
        let result = update.update_front(
            &mut mesh,
            &mut front,
            base,
            point(0.5, -0.5),
            point(0.5, -0.5),
            0.1,
        );

        assert!(result.is_none());
        assert!(front.contains(base));
        assert_eq!(mesh.vertices().len(), n_verts);
        assert_eq!(front.len(), 4);
    }

    #[test]
    fn merge_with_existing_front_vertex() {
        let domain = square_domain(1.0);
        let (mut mesh, mut front) = init_front(&domain);

        let update = FrontUpdate::new();

        let base = front.first();
        let tri = update
            .update_front(
                &mut mesh,
                &mut front,
                base,
                point(0.5, 0.5),
                point(0.5, 0.5),
                0.1,
            )
            .unwrap();
        let apex = mesh.triangle(tri).v3();

        // Growing over the next edge with the same preferred position must
        // now reuse the apex instead of creating a second vertex.
        let b2 = mesh.triangle(tri).v2();
        let next_base = front.edge_from(b2).unwrap();
        let n_verts = mesh.vertices().len();

        let tri2 = update
            .update_front(
                &mut mesh,
                &mut front,
                next_base,
                point(0.5, 0.5),
                point(0.5, 0.5),
                0.2,
            )
            .expect("second triangle commit failed");

        assert_eq!(mesh.triangle(tri2).v3(), apex);
        assert_eq!(mesh.vertices().len(), n_verts);

        // The shared side moved from the front into the interior edges.
        assert!(front.get_edge(apex, b2).is_none());
        let interior = mesh
            .interior_edges()
            .get_edge(apex, b2)
            .or_else(|| mesh.interior_edges().get_edge(b2, apex));
        assert!(interior.is_some());
    }
}
