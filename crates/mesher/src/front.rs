//! The advancing front.
//!
//! The front is an edge list with a base cursor and the size-function-driven
//! refinement of its seed edges. It must form a counter-clockwise ring,
//! except transiently while refinement replaces an edge by its sub-edges.

use crate::domain::{Domain, FrontInitializer};
use crate::edge_list::{EdgeId, EdgeList, Orientation, INVALID_EDGE_ID};
use crate::entity::{VertexId, VertexStore};
use crate::error::StructuralError;
use crate::math::{Point, Vector};
use crate::mesh::Mesh;

pub struct Front {
    edges: EdgeList,
    base: EdgeId,
}

impl Default for Front {
    fn default() -> Self {
        Self::new()
    }
}

impl Front {
    pub fn new() -> Self {
        Front {
            edges: EdgeList::new(Orientation::None),
            base: INVALID_EDGE_ID,
        }
    }

    /// The current base edge, or the invalid id when the front is empty.
    #[inline]
    pub fn base(&self) -> EdgeId {
        self.base
    }

    #[inline]
    pub fn set_base(&mut self, e: EdgeId) {
        debug_assert!(self.edges.contains(e));
        self.base = e;
    }

    /// Let the base cursor point to the first edge.
    pub fn set_base_first(&mut self) {
        self.base = self.edges.first();
    }

    /// Let the base cursor point to the next edge, wrapping at the end.
    pub fn set_base_next(&mut self) {
        if self.edges.is_empty() {
            return;
        }
        self.base = self.edges.next_cyclic(self.base);
    }

    /// Sort all edges by length and reset the base cursor to the first one.
    pub fn sort_edges(&mut self, ascending: bool) {
        self.edges.sort_by_length(ascending);
        self.set_base_first();
    }

    /// The front edge starting at `v`, if any.
    pub fn edge_from(&self, v: VertexId) -> Option<EdgeId> {
        self.edges.iter().find(|&id| self.edges[id].v1() == v)
    }

    /// The front edge ending at `v`, if any.
    pub fn edge_to(&self, v: VertexId) -> Option<EdgeId> {
        self.edges.iter().find(|&id| self.edges[id].v2() == v)
    }

    /// Whether `b` can be reached from `a` by following next links, without
    /// passing through the closing wrap of the ring and without crossing a
    /// twin-marked edge strictly inside the span.
    pub fn is_traversable(&self, a: EdgeId, b: EdgeId) -> bool {
        let mut cur = a;
        loop {
            if cur == b {
                return true;
            }
            if cur != a && self.edges[cur].twin().is_some() {
                return false;
            }
            match self.edges.next(cur) {
                Some(next) => cur = next,
                None => return false,
            }
        }
    }

    /// Append a front edge; both endpoints become front vertices.
    pub fn add_edge(
        &mut self,
        verts: &mut VertexStore,
        v1: VertexId,
        v2: VertexId,
        marker: i32,
    ) -> EdgeId {
        let id = self.edges.add_edge(verts, v1, v2, marker);
        self.mark_objects(verts, v1, v2);
        id
    }

    /// Insert a front edge before `pos`; both endpoints become front
    /// vertices.
    pub fn insert_edge(
        &mut self,
        verts: &mut VertexStore,
        pos: EdgeId,
        v1: VertexId,
        v2: VertexId,
        marker: i32,
    ) -> EdgeId {
        let id = self.edges.insert_edge(verts, pos, v1, v2, marker);
        self.mark_objects(verts, v1, v2);
        id
    }

    fn mark_objects(&self, verts: &mut VertexStore, v1: VertexId, v2: VertexId) {
        verts[v1].set_on_front(true);
        verts[v2].set_on_front(true);
    }

    /// Remove a front edge. Endpoints that no longer touch any front edge
    /// lose their `on_front` flag.
    pub fn remove(&mut self, verts: &mut VertexStore, id: EdgeId) {
        let v1 = self.edges[id].v1();
        let v2 = self.edges[id].v2();

        if self.base == id {
            self.base = self.edges.next_cyclic(id);
            if self.base == id {
                self.base = INVALID_EDGE_ID;
            }
        }

        self.edges.remove(id);

        for v in [v1, v2] {
            if self.edge_from(v).is_none() && self.edge_to(v).is_none() {
                verts[v].set_on_front(false);
            }
        }
    }

    /// Split a front edge, marking the new vertex as part of the front.
    pub fn split_edge(
        &mut self,
        verts: &mut VertexStore,
        e: EdgeId,
        s: f64,
        recursive: bool,
    ) -> (EdgeId, EdgeId) {
        let (e1, e2) = self.edges.split_edge(verts, e, s, recursive);
        let v_new = self.edges[e1].v2();
        verts[v_new].set_on_front(true);
        (e1, e2)
    }

    /// Symmetrically link a front edge with its coinciding edge in another
    /// list.
    pub fn bind_twin(&mut self, a: EdgeId, other: &mut EdgeList, b: EdgeId) {
        self.edges.bind_twin(a, other, b);
    }

    /// Clear the twin link of a front edge on both sides.
    pub fn unbind_twin(&mut self, a: EdgeId, other: &mut EdgeList) {
        self.edges.unbind_twin(a, other);
    }

    /// Remove every front edge and reset the cursor.
    pub fn clear_edges(&mut self, verts: &mut VertexStore) {
        let ids: Vec<EdgeId> = self.edges.iter().collect();
        for id in ids {
            self.remove(verts, id);
        }
        self.base = INVALID_EDGE_ID;
    }

    pub fn clear_waste(&mut self) {
        self.edges.clear_waste();
    }

    pub fn compute_area(&mut self, verts: &VertexStore) -> f64 {
        self.edges.compute_area(verts)
    }

    /// Initialize the front from the domain boundaries.
    ///
    /// For every seed edge the initializer provides, a new mesh vertex is
    /// pushed at the seed's starting coordinate (its ending coordinate for
    /// twin seeds, whose direction is reversed relative to this front), and
    /// the new vertices are connected into one closed sub-ring per boundary.
    /// Twin seeds are cross-linked with the generated front edge. The front
    /// is refined against the size function afterwards.
    pub fn init(
        &mut self,
        domain: &Domain,
        initializer: &dyn FrontInitializer,
        mesh: &mut Mesh,
    ) -> Result<(), StructuralError> {
        for i in 0..initializer.n_boundaries() {
            let seeds = initializer.edges(i);
            let is_twin = initializer.is_twin_edge(i);
            let markers = initializer.markers(i);

            if seeds.is_empty() {
                return Err(StructuralError::EmptyBoundary);
            }
            if seeds.len() != is_twin.len() || seeds.len() != markers.len() {
                return Err(StructuralError::TwinMismatch);
            }

            let new_vertices = self.init_mesh_vertices(seeds, is_twin, mesh);
            let new_edges = self.init_front_edges(&new_vertices, markers, mesh);
            self.mark_twin_edges(seeds, is_twin, &new_edges, mesh)?;
        }

        // Refine the front edges, but do not refine sub-edges.
        self.refine(domain, &mut mesh.vertices);

        self.mirror_into_boundary(mesh);

        Ok(())
    }

    /// Replace the mesh's seed boundary edges with a mirror of the refined
    /// front, so that the boundary edge list shares vertices and resolution
    /// with the front. Endpoint splits and front advancement resolve their
    /// boundary lookups against this mirror. Twin-bound seed edges stay:
    /// their coinciding front edge carries the cross-link instead.
    fn mirror_into_boundary(&self, mesh: &mut Mesh) {
        let stale: Vec<EdgeId> = mesh
            .boundary_edges
            .iter()
            .filter(|&id| mesh.boundary_edges[id].twin().is_none())
            .collect();
        for id in stale {
            mesh.boundary_edges.remove(id);
        }

        let front_edges: Vec<EdgeId> = self.edges.iter().collect();
        for id in front_edges {
            if self.edges[id].twin().is_none() {
                let (v1, v2, marker) = {
                    let e = &self.edges[id];
                    (e.v1(), e.v2(), e.marker())
                };
                mesh.boundary_edges.add_edge(&mesh.vertices, v1, v2, marker);
            }
        }

        mesh.boundary_edges.compute_area(&mesh.vertices);
    }

    fn init_mesh_vertices(
        &self,
        seeds: &[EdgeId],
        is_twin: &[bool],
        mesh: &mut Mesh,
    ) -> Vec<VertexId> {
        let mut new_vertices = Vec::with_capacity(seeds.len());

        for (k, &seed) in seeds.iter().enumerate() {
            let v = if !is_twin[k] {
                mesh.boundary_edges[seed].v1()
            } else {
                mesh.boundary_edges[seed].v2()
            };
            let xy = mesh.vertices[v].position();

            let v_new = mesh.vertices.push_back(xy);
            mesh.vertices[v_new].set_on_front(true);
            mesh.vertices[v_new].set_on_boundary(true);
            mesh.vertices[v_new].set_fixed(true);

            new_vertices.push(v_new);
        }

        new_vertices
    }

    fn init_front_edges(
        &mut self,
        new_vertices: &[VertexId],
        markers: &[i32],
        mesh: &mut Mesh,
    ) -> Vec<EdgeId> {
        let n = new_vertices.len();
        let mut new_edges = Vec::with_capacity(n);

        for k in 0..n {
            let v1 = new_vertices[k];
            let v2 = new_vertices[(k + 1) % n];
            new_edges.push(self.add_edge(&mut mesh.vertices, v1, v2, markers[k]));
        }

        new_edges
    }

    fn mark_twin_edges(
        &mut self,
        seeds: &[EdgeId],
        is_twin: &[bool],
        new_edges: &[EdgeId],
        mesh: &mut Mesh,
    ) -> Result<(), StructuralError> {
        for (k, &seed) in seeds.iter().enumerate() {
            if is_twin[k] {
                self.edges.bind_twin(new_edges[k], &mut mesh.boundary_edges, seed);
            } else if mesh.boundary_edges[seed].twin().is_some() {
                // A seed that is not flagged as a twin must not carry a
                // stray twin link.
                return Err(StructuralError::TwinMismatch);
            }
        }
        Ok(())
    }

    /// Refine front edges so that their lengths follow the size function.
    /// Returns the number of edges gained.
    pub fn refine(&mut self, domain: &Domain, verts: &mut VertexStore) -> isize {
        let n_before = self.edges.len() as isize;

        // Twin edges are not refined.
        let to_refine: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|&id| self.edges[id].twin().is_none())
            .collect();

        let mut to_remove = Vec::new();
        for e in to_refine {
            if self.refine_edge(domain, verts, e) {
                to_remove.push(e);
            }
        }

        for e in to_remove {
            self.remove(verts, e);
        }

        self.edges.compute_area(verts);

        self.edges.len() as isize - n_before
    }

    fn refine_edge(&mut self, domain: &Domain, verts: &mut VertexStore, e: EdgeId) -> bool {
        let rho_1 = domain.size_function(verts[self.edges[e].v1()].position());
        let rho_2 = domain.size_function(verts[self.edges[e].v2()].position());

        // Walk the edge from the endpoint with the smaller target length.
        let dir = rho_1 < rho_2;

        let xy_new = self.create_sub_vertex_coords(domain, verts, e, dir, rho_1, rho_2);

        // Fewer than three points means the edge is already short enough;
        // leave it unrefined.
        if xy_new.len() < 3 {
            return false;
        }

        self.create_sub_edges(verts, e, &xy_new);

        true
    }

    /// Coordinates of the sub-vertices along `e`, distributed according to
    /// the size function with a predictor-corrector step. The first entry is
    /// the edge's v1 coordinate and the last its v2 coordinate.
    fn create_sub_vertex_coords(
        &self,
        domain: &Domain,
        verts: &VertexStore,
        e: EdgeId,
        dir: bool,
        rho_1: f64,
        rho_2: f64,
    ) -> Vec<Point> {
        let edge = &self.edges[e];
        let (v_a, v_b) = if dir {
            (edge.v1(), edge.v2())
        } else {
            (edge.v2(), edge.v1())
        };
        let xy_a = verts[v_a].position();
        let xy_b = verts[v_b].position();
        let tang: Vector = if dir { edge.tangent() } else { -edge.tangent() };
        let length = edge.length();

        let mut xy_new = vec![xy_a];
        let mut s_last = 0.0;

        // No new points are generated beyond this abscissa.
        let rho_b = if dir { rho_2 } else { rho_1 };
        let s_end = 1.0 - 0.5 * rho_b / length;

        let mut xy = xy_a;
        loop {
            // Predictor
            let rho = domain.size_function(xy);
            let xy_p = xy + tang * rho;

            // Corrector
            let rho_p = domain.size_function(xy_p);
            let xy_c = xy + tang * (0.5 * (rho + rho_p));

            let s = (xy_c - xy_a).length() / length;

            xy_new.push(xy_c);
            s_last = s;
            xy = xy_c;

            if s > s_end {
                break;
            }
        }

        // Snap the last point onto the far endpoint and distribute the
        // cropped distance among the interior points, weighted by their
        // local size function values.
        let n = xy_new.len();
        xy_new[n - 1] = xy_b;

        let d_cr = tang * ((1.0 - s_last) * length);

        let mut weights = vec![0.0];
        for p in &xy_new[1..n - 1] {
            weights.push(domain.size_function(*p));
        }
        weights.push(0.0);

        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for (i, w) in weights.iter().enumerate().take(n - 1).skip(1) {
                xy_new[i] += d_cr * (w / total);
            }
        }

        #[cfg(debug_assertions)]
        {
            let mut s_prev = 0.0;
            for p in &xy_new[1..] {
                let s = (*p - xy_new[0]).length();
                debug_assert!(s > s_prev, "refinement produced non-monotone sub-vertices");
                s_prev = s;
            }
        }

        if !dir {
            xy_new.reverse();
        }

        xy_new
    }

    /// Replace `e` by a chain of sub-edges over the interior points of
    /// `xy_new`, inheriting its marker. The new vertices are spliced into
    /// the store right before the edge's end vertex and fixed in place.
    fn create_sub_edges(&mut self, verts: &mut VertexStore, e: EdgeId, xy_new: &[Point]) {
        let v2 = self.edges[e].v2();
        let marker = self.edges[e].marker();

        let mut v_cur = self.edges[e].v1();

        for &xy in &xy_new[1..xy_new.len() - 1] {
            let v_n = verts.insert_before(v2, xy);
            verts[v_n].set_fixed(true);

            let e_new = self.insert_edge(verts, e, v_cur, v_n, marker);
            let (a, b) = (self.edges[e_new].v1(), self.edges[e_new].v2());
            verts[a].set_on_boundary(true);
            verts[b].set_on_boundary(true);

            v_cur = v_n;
        }

        let e_new = self.insert_edge(verts, e, v_cur, v2, marker);
        let (a, b) = (self.edges[e_new].v1(), self.edges[e_new].v2());
        verts[a].set_on_boundary(true);
        verts[b].set_on_boundary(true);
    }
}

impl core::ops::Deref for Front {
    type Target = EdgeList;

    fn deref(&self) -> &EdgeList {
        &self.edges
    }
}
