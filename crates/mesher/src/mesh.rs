//! The mesh container: vertices, interior and boundary edges, and the
//! triangle / quad element arenas.
//!
//! Elements are tombstoned on removal and swept by [Mesh::clear_waste], so
//! ids handed out during a layer step stay unambiguous until the step's
//! cleanup boundary.

use crate::domain::Domain;
use crate::edge_list::{EdgeId, EdgeList, Orientation};
use crate::entity::{VertexId, VertexStore};
use crate::math::Point;

/// A triangle id, an index into the mesh's triangle arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TriangleId(pub u32);

/// A quad id, an index into the mesh's quad arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuadId(pub u32);

/// A triangular element, counter-clockwise.
#[derive(Clone, Debug)]
pub struct Triangle {
    v1: VertexId,
    v2: VertexId,
    v3: VertexId,
    active: bool,
    deleted: bool,
}

impl Triangle {
    #[inline]
    pub fn v1(&self) -> VertexId {
        self.v1
    }

    #[inline]
    pub fn v2(&self) -> VertexId {
        self.v2
    }

    /// The apex vertex when the triangle was grown over a base edge
    /// (v1, v2).
    #[inline]
    pub fn v3(&self) -> VertexId {
        self.v3
    }

    #[inline]
    pub fn vertices(&self) -> [VertexId; 3] {
        [self.v1, self.v2, self.v3]
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// A quadrilateral element, counter-clockwise.
#[derive(Clone, Debug)]
pub struct Quad {
    v1: VertexId,
    v2: VertexId,
    v3: VertexId,
    v4: VertexId,
    active: bool,
    deleted: bool,
}

impl Quad {
    #[inline]
    pub fn vertices(&self) -> [VertexId; 4] {
        [self.v1, self.v2, self.v3, self.v4]
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// The mesh under construction.
pub struct Mesh {
    pub(crate) vertices: VertexStore,
    pub(crate) interior_edges: EdgeList,
    pub(crate) boundary_edges: EdgeList,
    triangles: Vec<Triangle>,
    tri_waste: Vec<TriangleId>,
    tri_free: Vec<TriangleId>,
    quads: Vec<Quad>,
    quad_waste: Vec<QuadId>,
    quad_free: Vec<QuadId>,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh {
            vertices: VertexStore::new(),
            interior_edges: EdgeList::new(Orientation::None),
            boundary_edges: EdgeList::new(Orientation::Ccw),
            triangles: Vec::new(),
            tri_waste: Vec::new(),
            tri_free: Vec::new(),
            quads: Vec::new(),
            quad_waste: Vec::new(),
            quad_free: Vec::new(),
        }
    }

    /// Create a mesh seeded with the domain's boundary vertices and edges.
    ///
    /// Boundary vertices are fixed and flagged `on_boundary`; boundary edges
    /// carry the markers of the domain's boundary segments.
    pub fn from_domain(domain: &Domain) -> Self {
        let mut mesh = Mesh::new();

        for i in 0..domain.size() {
            let boundary = domain.boundary(i);
            let n = boundary.len();

            let ids: Vec<VertexId> = boundary
                .vertices()
                .iter()
                .map(|&xy| {
                    let v = mesh.vertices.push_back(xy);
                    mesh.vertices[v].set_on_boundary(true);
                    mesh.vertices[v].set_fixed(true);
                    v
                })
                .collect();

            for k in 0..n {
                mesh.boundary_edges.add_edge(
                    &mesh.vertices,
                    ids[k],
                    ids[(k + 1) % n],
                    boundary.marker(k),
                );
            }
        }

        mesh.boundary_edges.compute_area(&mesh.vertices);

        mesh
    }

    #[inline]
    pub fn vertices(&self) -> &VertexStore {
        &self.vertices
    }

    #[inline]
    pub fn vertices_mut(&mut self) -> &mut VertexStore {
        &mut self.vertices
    }

    #[inline]
    pub fn interior_edges(&self) -> &EdgeList {
        &self.interior_edges
    }

    #[inline]
    pub fn boundary_edges(&self) -> &EdgeList {
        &self.boundary_edges
    }

    #[inline]
    pub fn n_boundary_edges(&self) -> usize {
        self.boundary_edges.len()
    }

    pub fn add_vertex(&mut self, position: Point) -> VertexId {
        self.vertices.push_back(position)
    }

    pub fn add_triangle(&mut self, v1: VertexId, v2: VertexId, v3: VertexId) -> TriangleId {
        let tri = Triangle {
            v1,
            v2,
            v3,
            active: false,
            deleted: false,
        };

        if let Some(id) = self.tri_free.pop() {
            self.triangles[id.0 as usize] = tri;
            id
        } else {
            self.triangles.push(tri);
            TriangleId((self.triangles.len() - 1) as u32)
        }
    }

    pub fn add_quad(
        &mut self,
        v1: VertexId,
        v2: VertexId,
        v3: VertexId,
        v4: VertexId,
    ) -> QuadId {
        let quad = Quad {
            v1,
            v2,
            v3,
            v4,
            active: false,
            deleted: false,
        };

        if let Some(id) = self.quad_free.pop() {
            self.quads[id.0 as usize] = quad;
            id
        } else {
            self.quads.push(quad);
            QuadId((self.quads.len() - 1) as u32)
        }
    }

    pub fn remove_triangle(&mut self, id: TriangleId) {
        debug_assert!(!self.triangles[id.0 as usize].deleted);
        self.triangles[id.0 as usize].deleted = true;
        self.tri_waste.push(id);
    }

    pub fn remove_quad(&mut self, id: QuadId) {
        debug_assert!(!self.quads[id.0 as usize].deleted);
        self.quads[id.0 as usize].deleted = true;
        self.quad_waste.push(id);
    }

    pub fn remove_interior_edge(&mut self, id: EdgeId) {
        self.interior_edges.remove(id);
    }

    #[inline]
    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        debug_assert!(!self.triangles[id.0 as usize].deleted);
        &self.triangles[id.0 as usize]
    }

    #[inline]
    pub fn triangle_mut(&mut self, id: TriangleId) -> &mut Triangle {
        debug_assert!(!self.triangles[id.0 as usize].deleted);
        &mut self.triangles[id.0 as usize]
    }

    #[inline]
    pub fn quad(&self, id: QuadId) -> &Quad {
        debug_assert!(!self.quads[id.0 as usize].deleted);
        &self.quads[id.0 as usize]
    }

    #[inline]
    pub fn quad_mut(&mut self, id: QuadId) -> &mut Quad {
        debug_assert!(!self.quads[id.0 as usize].deleted);
        &mut self.quads[id.0 as usize]
    }

    pub fn contains_triangle(&self, id: TriangleId) -> bool {
        (id.0 as usize) < self.triangles.len() && !self.triangles[id.0 as usize].deleted
    }

    /// Ids of the live triangles.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.deleted)
            .map(|(i, _)| TriangleId(i as u32))
    }

    /// Ids of the live quads.
    pub fn quads(&self) -> impl Iterator<Item = QuadId> + '_ {
        self.quads
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.deleted)
            .map(|(i, _)| QuadId(i as u32))
    }

    pub fn n_triangles(&self) -> usize {
        self.triangles().count()
    }

    pub fn n_quads(&self) -> usize {
        self.quads().count()
    }

    /// Whether the element contains the directed edge (a, b) on its
    /// counter-clockwise contour.
    fn facet_has_edge(vs: &[VertexId], a: VertexId, b: VertexId) -> bool {
        let n = vs.len();
        (0..n).any(|i| {
            let (p, q) = (vs[i], vs[(i + 1) % n]);
            (p == a && q == b) || (p == b && q == a)
        })
    }

    /// Recompute the per-edge facet counts of the interior and boundary
    /// edge lists from the live elements.
    pub fn setup_facet_connectivity(&mut self) {
        let tris: Vec<[VertexId; 3]> = self
            .triangles
            .iter()
            .filter(|t| !t.deleted)
            .map(|t| t.vertices())
            .collect();
        let quads: Vec<[VertexId; 4]> = self
            .quads
            .iter()
            .filter(|q| !q.deleted)
            .map(|q| q.vertices())
            .collect();

        let count = |a: VertexId, b: VertexId| -> u8 {
            let n = tris
                .iter()
                .filter(|vs| Self::facet_has_edge(&vs[..], a, b))
                .count()
                + quads
                    .iter()
                    .filter(|vs| Self::facet_has_edge(&vs[..], a, b))
                    .count();
            n.min(u8::MAX as usize) as u8
        };

        let interior: Vec<EdgeId> = self.interior_edges.iter().collect();
        for id in interior {
            let (a, b) = (self.interior_edges[id].v1(), self.interior_edges[id].v2());
            let facets = count(a, b);
            self.interior_edges.edge_mut(id).set_facet_count(facets);
        }

        let boundary: Vec<EdgeId> = self.boundary_edges.iter().collect();
        for id in boundary {
            let (a, b) = (self.boundary_edges[id].v1(), self.boundary_edges[id].v2());
            let facets = count(a, b);
            self.boundary_edges.edge_mut(id).set_facet_count(facets);
        }
    }

    /// Drop interior edges that no longer bound any element and do not
    /// connect front vertices. Run after connectivity setup.
    pub fn remove_invalid_interior_edges(&mut self) {
        let stale: Vec<EdgeId> = self
            .interior_edges
            .iter()
            .filter(|&id| {
                let e = &self.interior_edges[id];
                e.facet_count() == 0
                    || !self.vertices.contains(e.v1())
                    || !self.vertices.contains(e.v2())
            })
            .collect();

        for id in stale {
            self.interior_edges.remove(id);
        }
    }

    /// Sweep all tombstoned entities.
    pub fn clear_waste(&mut self) {
        self.vertices.clear_waste();
        self.interior_edges.clear_waste();
        self.boundary_edges.clear_waste();
        self.tri_free.append(&mut self.tri_waste);
        self.quad_free.append(&mut self.quad_waste);
    }

    /// Final bookkeeping before the mesh is handed back: remaining elements
    /// are activated, waste is swept and the cached boundary area refreshed.
    pub fn finish_for_output(&mut self) {
        for t in self.triangles.iter_mut().filter(|t| !t.deleted) {
            t.active = true;
        }
        for q in self.quads.iter_mut().filter(|q| !q.deleted) {
            q.active = true;
        }

        self.clear_waste();
        self.boundary_edges.compute_area(&self.vertices);
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
