//! The quad layer structure: a contiguous span of front edges together with
//! the projected target coordinates of the quads to be grown over them.
//!
//! ```text
//!  proj_v1[0]       proj_v1[1]       proj_v1[2]
//!  |  proj_v2[0]       proj_v2[1]       proj_v2[2]
//!  ^----------------^----------------^--------------...
//!  |                |                |
//!  | base_edges[0]  | base_edges[1]  | base_edges[2]
//!  o----------------o----------------o--------------...
//!  base_v1[0]       base_v1[1]       base_v1[2]
//!                   base_v2[0]       base_v2[1]
//! ```
//!
//! The layer owns no mesh entities: it records ids and plain coordinates.

use crate::domain::Domain;
use crate::edge_list::EdgeId;
use crate::entity::{VertexId, VertexStore};
use crate::error::StructuralError;
use crate::front::Front;
use crate::geom::utils::{angle, is_left};
use crate::math::Point;
use crate::mesh::Mesh;

pub struct QuadLayer {
    e_start: EdgeId,
    e_end: EdgeId,
    is_closed: bool,
    height: f64,
    // Wedge threshold, taken from the layering options.
    angle_limit: f64,

    pub(crate) base_edges: Vec<EdgeId>,
    pub(crate) base_v1: Vec<VertexId>,
    pub(crate) base_v2: Vec<VertexId>,

    pub(crate) proj_v1: Vec<Option<VertexId>>,
    pub(crate) proj_v2: Vec<Option<VertexId>>,

    pub(crate) proj_v1_xy: Vec<Point>,
    pub(crate) proj_v2_xy: Vec<Point>,

    pub(crate) heights: Vec<f64>,
}

impl QuadLayer {
    /// Collect the span of front edges from `e_start` to `e_end` inclusive.
    ///
    /// Fails with a structural error when the walk runs around the whole
    /// ring without encountering `e_end`.
    pub fn new(
        front: &Front,
        verts: &VertexStore,
        e_start: EdgeId,
        e_end: EdgeId,
        is_closed: bool,
        height: f64,
        angle_limit: f64,
    ) -> Result<Self, StructuralError> {
        let mut layer = QuadLayer {
            e_start,
            e_end,
            is_closed,
            height,
            angle_limit,
            base_edges: Vec::new(),
            base_v1: Vec::new(),
            base_v2: Vec::new(),
            proj_v1: Vec::new(),
            proj_v2: Vec::new(),
            proj_v1_xy: Vec::new(),
            proj_v2_xy: Vec::new(),
            heights: Vec::new(),
        };

        let mut cur = e_start;
        let mut steps = 0;
        loop {
            layer.add_base(front, verts, cur);
            if cur == e_end {
                break;
            }

            cur = front.next_cyclic(cur);
            steps += 1;
            if steps > front.len() {
                return Err(StructuralError::SpanOutsideFront);
            }
        }

        Ok(layer)
    }

    fn add_base(&mut self, front: &Front, verts: &VertexStore, e: EdgeId) {
        let edge = &front[e];

        self.base_edges.push(e);
        self.base_v1.push(edge.v1());
        self.base_v2.push(edge.v2());

        // Clamp the height to the base length to keep aspect ratios sane.
        let h = self.height.min(edge.length());
        self.heights.push(h);

        let n = edge.normal() * h;
        self.proj_v1_xy.push(verts[edge.v1()].position() + n);
        self.proj_v2_xy.push(verts[edge.v2()].position() + n);

        self.proj_v1.push(None);
        self.proj_v2.push(None);
    }

    #[inline]
    pub fn e_start(&self) -> EdgeId {
        self.e_start
    }

    #[inline]
    pub fn e_end(&self) -> EdgeId {
        self.e_end
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn n_bases(&self) -> usize {
        self.base_edges.len()
    }

    /// Smooth the per-base heights against the local size function. The
    /// two span endpoints keep their clamped heights.
    pub fn smooth_heights(&mut self, domain: &Domain, front: &Front, verts: &VertexStore) {
        for i in 1..self.heights.len().saturating_sub(1) {
            let h1 = self.heights[i - 1];
            let h2 = self.heights[i];
            let h3 = self.heights[i + 1];

            let e = &front[self.base_edges[i]];
            let c = verts[e.v1()].position().lerp(verts[e.v2()].position(), 0.5);
            let rho = domain.size_function(c);

            self.heights[i] = rho.min((h1 + h2 + h3) / 3.0);
        }
    }

    /// Reconcile the projected coordinates at every joint. For open layers
    /// the two ends are merged into, or split off, the adjacent front
    /// edges.
    pub fn setup_vertex_projection(
        &mut self,
        mesh: &mut Mesh,
        front: &mut Front,
    ) -> Result<(), StructuralError> {
        for j in 1..self.base_edges.len() {
            self.adjust_projected_vertex_coordinates(&mesh.vertices, front, j - 1, j);
        }

        if self.is_closed {
            let last = self.base_edges.len() - 1;
            self.adjust_projected_vertex_coordinates(&mesh.vertices, front, last, 0);
        } else {
            self.place_start_vertex(mesh, front)?;
            self.place_end_vertex(mesh, front)?;
        }

        Ok(())
    }

    /// Try to give bases `i` and `j` a common projected vertex coordinate.
    ///
    /// When the joint turns left sharply enough, merging would squash the
    /// two quads; the joint is then kept as a wedge (the default projections
    /// stay distinct) and a gap triangle is inserted later.
    ///
    /// ```text
    ///                q                   r
    ///                 o------------------o
    ///                /    base_edges[j]
    ///               /
    ///              /  base_edges[i]
    ///             o p
    /// ```
    fn adjust_projected_vertex_coordinates(
        &mut self,
        verts: &VertexStore,
        front: &Front,
        i: usize,
        j: usize,
    ) {
        let p = verts[self.base_v1[i]].position();
        let q = verts[self.base_v1[j]].position();
        let r = verts[self.base_v2[j]].position();

        let alpha = angle(p - q, r - q);

        if is_left(p, r, q) && alpha <= self.angle_limit {
            return;
        }

        let n1 = front[self.base_edges[i]].normal();
        let l1 = self.heights[i];

        let n2 = front[self.base_edges[j]].normal();
        let l2 = self.heights[j];

        let normal = (n1 + n2) * 0.5;
        let l = 0.5 * (l1 + l2);
        let nn = normal / normal.length();

        let xy_proj = q + nn * (l / (0.5 * alpha).sin());

        self.proj_v1_xy[j] = xy_proj;
        self.proj_v2_xy[i] = xy_proj;
    }

    /// Reconcile the projection of the first base vertex with the front
    /// edge preceding the span.
    fn place_start_vertex(
        &mut self,
        mesh: &mut Mesh,
        front: &mut Front,
    ) -> Result<(), StructuralError> {
        let e_prv = front.prev_cyclic(self.e_start);
        let v_start = self.base_v1[0];

        if front[e_prv].v2() != v_start {
            return Err(StructuralError::DisconnectedFront);
        }

        let v_prev = front[e_prv].v1();

        let xy_start = mesh.vertices[v_start].position();
        let xy_prev = mesh.vertices[v_prev].position();

        // A previous vertex on the right of the starting base keeps the
        // default projection.
        if !is_left(xy_start, mesh.vertices[self.base_v2[0]].position(), xy_prev) {
            return Ok(());
        }

        // The previous vertex is close enough to take the role of the
        // projected vertex directly.
        let h = self.heights[0];
        let d_fac = (xy_prev - self.proj_v1_xy[0]).length() / h;

        if d_fac < 1.0 {
            self.proj_v1[0] = Some(v_prev);
            return Ok(());
        }

        if h < front[e_prv].length() {
            // The projected coordinate falls within the previous edge:
            // split it and project onto the split vertex.
            let d1 = xy_prev - xy_start;
            let d2 = self.proj_v1_xy[0] - xy_start;
            let ang_fac = angle(d1, d2).cos();

            // The split vertex sits at distance h * cos(alpha) from
            // v_start, which is the v2 end of the previous edge.
            let sf = 1.0 - (h * ang_fac) / front[e_prv].length();
            let v_new = self.split_adjacent_edge(mesh, front, e_prv, sf);

            self.proj_v1[0] = Some(v_new);
            self.proj_v1_xy[0] = mesh.vertices[v_new].position();
        } else {
            // Out of range of the previous edge: fall back to its far
            // vertex.
            self.proj_v1[0] = Some(v_prev);
            self.proj_v1_xy[0] = xy_prev;
        }

        Ok(())
    }

    /// Mirror image of `place_start_vertex` over the edge following the
    /// span.
    fn place_end_vertex(
        &mut self,
        mesh: &mut Mesh,
        front: &mut Front,
    ) -> Result<(), StructuralError> {
        let last = self.base_edges.len() - 1;
        let e_nxt = front.next_cyclic(self.e_end);
        let v_end = self.base_v2[last];

        if front[e_nxt].v1() != v_end {
            return Err(StructuralError::DisconnectedFront);
        }

        let v_next = front[e_nxt].v2();

        let xy_end = mesh.vertices[v_end].position();
        let xy_next = mesh.vertices[v_next].position();

        if !is_left(mesh.vertices[self.base_v1[last]].position(), xy_end, xy_next) {
            return Ok(());
        }

        let h = self.heights[last];
        let d_fac = (xy_next - self.proj_v2_xy[last]).length() / h;

        if d_fac < 1.0 {
            self.proj_v2[last] = Some(v_next);
            return Ok(());
        }

        if h < front[e_nxt].length() {
            let d1 = xy_next - xy_end;
            let d2 = self.proj_v2_xy[last] - xy_end;
            let ang_fac = angle(d1, d2).cos();

            // Mirrored: the split vertex sits at distance h * cos(alpha)
            // from v_end, the v1 end of the following edge.
            let sf = (h * ang_fac) / front[e_nxt].length();
            let v_new = self.split_adjacent_edge(mesh, front, e_nxt, sf);

            self.proj_v2[last] = Some(v_new);
            self.proj_v2_xy[last] = mesh.vertices[v_new].position();
        } else {
            self.proj_v2[last] = Some(v_next);
            self.proj_v2_xy[last] = xy_next;
        }

        Ok(())
    }

    /// Split a front edge adjacent to the span at parameter `sf`, keeping a
    /// mirroring boundary edge (if there is one) consistent: the mirror is
    /// replaced by the two halves at its original list position, with the
    /// original marker. Returns the split vertex.
    fn split_adjacent_edge(
        &mut self,
        mesh: &mut Mesh,
        front: &mut Front,
        e: EdgeId,
        sf: f64,
    ) -> VertexId {
        let v1 = front[e].v1();
        let v2 = front[e].v2();

        let mirror = mesh.boundary_edges.get_edge(v1, v2);
        let mirror_pos = mirror.map(|m| (mesh.boundary_edges.next(m), m));
        if let Some((_, m)) = mirror_pos {
            mesh.boundary_edges.remove(m);
        }

        let (e1, e2) = front.split_edge(&mut mesh.vertices, e, sf, false);
        let v_new = front[e1].v2();

        if let Some((next, _)) = mirror_pos {
            for &half in &[e1, e2] {
                let (a, b, marker) = (front[half].v1(), front[half].v2(), front[half].marker());
                match next {
                    Some(pos) => {
                        mesh.boundary_edges.insert_edge(&mesh.vertices, pos, a, b, marker)
                    }
                    None => mesh.boundary_edges.add_edge(&mesh.vertices, a, b, marker),
                };
            }
            mesh.vertices[v_new].set_on_boundary(true);
        }

        v_new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Boundary;
    use crate::front::tests::{init_front, square_domain};
    use crate::math::point;
    use core::f64::consts::FRAC_PI_2;

    fn closed_layer(mesh: &mut Mesh, front: &mut Front, height: f64) -> QuadLayer {
        let e_start = front.first();
        let e_end = front.prev_cyclic(e_start);
        QuadLayer::new(
            front,
            mesh.vertices(),
            e_start,
            e_end,
            true,
            height,
            FRAC_PI_2,
        )
        .unwrap()
    }

    #[test]
    fn closed_square_layer_projections() {
        let domain = square_domain(1.0);
        let (mut mesh, mut front) = init_front(&domain);

        let mut layer = closed_layer(&mut mesh, &mut front, 0.2);
        assert_eq!(layer.n_bases(), 4);

        layer.smooth_heights(&domain, &front, mesh.vertices());
        layer.setup_vertex_projection(&mut mesh, &mut front).unwrap();

        // All four corners are convex right angles: every joint is merged
        // and the projections form the inner square of side 0.6.
        let expected = [
            (point(0.2, 0.2), point(0.8, 0.2)),
            (point(0.8, 0.2), point(0.8, 0.8)),
            (point(0.8, 0.8), point(0.2, 0.8)),
            (point(0.2, 0.8), point(0.2, 0.2)),
        ];
        for (i, &(p1, p2)) in expected.iter().enumerate() {
            assert!((layer.proj_v1_xy[i] - p1).length() < 1e-9, "base {i}");
            assert!((layer.proj_v2_xy[i] - p2).length() < 1e-9, "base {i}");
            assert!(layer.proj_v1[i].is_none());
        }
    }

    #[test]
    fn reflex_corner_becomes_wedge() {
        // L-shaped domain; the corner at (1,1) is reflex seen from inside.
        let mut domain = Domain::uniform(10.0);
        domain.add_boundary(Boundary::new(
            vec![
                point(0.0, 0.0),
                point(2.0, 0.0),
                point(2.0, 1.0),
                point(1.0, 1.0),
                point(1.0, 2.0),
                point(0.0, 2.0),
            ],
            1,
        ));

        let (mut mesh, mut front) = init_front(&domain);
        assert_eq!(front.len(), 6);

        let mut layer = closed_layer(&mut mesh, &mut front, 0.2);
        layer.setup_vertex_projection(&mut mesh, &mut front).unwrap();

        // Find the joint between the bases (2,1)->(1,1) and (1,1)->(1,2).
        let i = layer
            .base_v2
            .iter()
            .position(|&v| mesh.vertices()[v].position() == point(1.0, 1.0))
            .unwrap();
        let j = (i + 1) % layer.n_bases();

        // Wedge: the two projections stay distinct.
        assert!((layer.proj_v2_xy[i] - layer.proj_v1_xy[j]).length() > 0.1);

        // A convex corner, for comparison, got merged.
        let k = layer
            .base_v2
            .iter()
            .position(|&v| mesh.vertices()[v].position() == point(2.0, 1.0))
            .unwrap();
        let l = (k + 1) % layer.n_bases();
        assert!((layer.proj_v2_xy[k] - layer.proj_v1_xy[l]).length() < 1e-12);
    }

    #[test]
    fn malformed_span_is_rejected() {
        let domain = square_domain(1.0);
        let (mesh, front) = init_front(&domain);

        let e_start = front.first();
        // An edge id that is not in the ring.
        let bogus = crate::edge_list::EdgeId(99);

        assert!(matches!(
            QuadLayer::new(
                &front,
                mesh.vertices(),
                e_start,
                bogus,
                false,
                0.2,
                FRAC_PI_2,
            ),
            Err(StructuralError::SpanOutsideFront)
        ));
    }

    #[test]
    fn heights_are_clamped_and_smoothed() {
        let domain = square_domain(1.0);
        let (mut mesh, mut front) = init_front(&domain);

        // Taller than the base edges: clamp to the edge length.
        let mut layer = closed_layer(&mut mesh, &mut front, 2.5);
        for &h in &layer.heights {
            assert_eq!(h, 1.0);
        }

        // Smoothing caps the interior heights with the size function.
        let small = Domain::uniform(0.15);
        layer.smooth_heights(&small, &front, mesh.vertices());
        for &h in &layer.heights[1..layer.heights.len() - 1] {
            assert!((h - 0.15).abs() < 1e-12);
        }
    }
}
