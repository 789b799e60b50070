//! The meshing domain and the front initializer contract.
//!
//! A [Domain] is a set of counter-clockwise polygon boundaries together with
//! a size function `rho(x)` giving the desired local edge length. The domain
//! is input only; the core never mutates it.

use crate::edge_list::EdgeId;
use crate::math::Point;
use crate::mesh::Mesh;

/// One closed polygon boundary, counter-clockwise, with one marker per edge.
///
/// Edge `k` runs from vertex `k` to vertex `(k + 1) % len`.
pub struct Boundary {
    vertices: Vec<Point>,
    markers: Vec<i32>,
}

impl Boundary {
    /// A boundary whose edges all carry the same marker.
    pub fn new(vertices: Vec<Point>, marker: i32) -> Self {
        let markers = vec![marker; vertices.len()];
        Boundary { vertices, markers }
    }

    /// A boundary with one marker per edge.
    pub fn with_markers(vertices: Vec<Point>, markers: Vec<i32>) -> Self {
        debug_assert_eq!(vertices.len(), markers.len());
        Boundary { vertices, markers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    #[inline]
    pub fn marker(&self, k: usize) -> i32 {
        self.markers[k]
    }
}

/// The planar domain to be meshed.
pub struct Domain {
    boundaries: Vec<Boundary>,
    size_fn: Box<dyn Fn(Point) -> f64>,
}

impl Domain {
    /// A domain with the given size function and no boundaries yet.
    pub fn new(size_fn: impl Fn(Point) -> f64 + 'static) -> Self {
        Domain {
            boundaries: Vec::new(),
            size_fn: Box::new(size_fn),
        }
    }

    /// A domain with a constant size function.
    pub fn uniform(rho: f64) -> Self {
        Self::new(move |_| rho)
    }

    pub fn add_boundary(&mut self, boundary: Boundary) -> &mut Self {
        self.boundaries.push(boundary);
        self
    }

    /// Number of boundaries.
    #[inline]
    pub fn size(&self) -> usize {
        self.boundaries.len()
    }

    /// The desired local edge length at `xy`. Always positive.
    #[inline]
    pub fn size_function(&self, xy: Point) -> f64 {
        (self.size_fn)(xy)
    }

    #[inline]
    pub fn boundary(&self, i: usize) -> &Boundary {
        &self.boundaries[i]
    }
}

/// Produces, per boundary, the seed edges the advancing front starts from.
///
/// The three arrays of one boundary are parallel and describe a closed ring:
/// seed edge ids into the mesh's boundary edge list, a flag telling whether
/// the seed is a twin edge shared with a neighboring mesh (its direction is
/// then reversed relative to this front), and the opaque marker to stamp on
/// the generated front edges.
pub trait FrontInitializer {
    fn n_boundaries(&self) -> usize;
    fn edges(&self, i: usize) -> &[EdgeId];
    fn is_twin_edge(&self, i: usize) -> &[bool];
    fn markers(&self, i: usize) -> &[i32];
}

/// The default initializer: seeds the front from the mesh's own boundary
/// edges, one ring per domain boundary, no twin edges.
pub struct BoundaryInitializer {
    per_boundary: Vec<(Vec<EdgeId>, Vec<bool>, Vec<i32>)>,
}

impl BoundaryInitializer {
    pub fn from_mesh(mesh: &Mesh, domain: &Domain) -> Self {
        let mut all: Vec<EdgeId> = mesh.boundary_edges().iter().collect();
        let mut per_boundary = Vec::with_capacity(domain.size());

        for i in 0..domain.size() {
            let n = domain.boundary(i).len();
            let rest = all.split_off(n.min(all.len()));
            let edges = core::mem::replace(&mut all, rest);

            let markers = edges
                .iter()
                .map(|&e| mesh.boundary_edges()[e].marker())
                .collect();
            let is_twin = vec![false; edges.len()];

            per_boundary.push((edges, is_twin, markers));
        }

        BoundaryInitializer { per_boundary }
    }

    /// Flag one seed edge as a twin edge (shared with a neighbor mesh).
    pub fn set_twin_edge(&mut self, boundary: usize, k: usize, is_twin: bool) {
        self.per_boundary[boundary].1[k] = is_twin;
    }
}

impl FrontInitializer for BoundaryInitializer {
    fn n_boundaries(&self) -> usize {
        self.per_boundary.len()
    }

    fn edges(&self, i: usize) -> &[EdgeId] {
        &self.per_boundary[i].0
    }

    fn is_twin_edge(&self, i: usize) -> &[bool] {
        &self.per_boundary[i].1
    }

    fn markers(&self, i: usize) -> &[i32] {
        &self.per_boundary[i].2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    pub(crate) fn unit_square(rho: f64) -> Domain {
        let mut domain = Domain::uniform(rho);
        domain.add_boundary(Boundary::new(
            vec![
                point(0.0, 0.0),
                point(1.0, 0.0),
                point(1.0, 1.0),
                point(0.0, 1.0),
            ],
            1,
        ));
        domain
    }

    #[test]
    fn initializer_covers_all_boundary_edges() {
        let domain = unit_square(0.25);
        let mesh = Mesh::from_domain(&domain);
        let init = BoundaryInitializer::from_mesh(&mesh, &domain);

        assert_eq!(init.n_boundaries(), 1);
        assert_eq!(init.edges(0).len(), 4);
        assert_eq!(init.is_twin_edge(0), &[false; 4]);
        assert_eq!(init.markers(0), &[1; 4]);
    }

    #[test]
    fn size_function_evaluation() {
        let domain = Domain::new(|xy| 0.1 + 0.4 * xy.x);
        assert!((domain.size_function(point(0.0, 0.0)) - 0.1).abs() < 1e-12);
        assert!((domain.size_function(point(1.0, 0.0)) - 0.5).abs() < 1e-12);
    }
}
