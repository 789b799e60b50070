//! The quad layering driver.
//!
//! Grows one or several structured quad layers from a span of front edges,
//! merging the per-base triangle pairs into quads and closing wedge gaps
//! with triangles.

use core::f64::consts::FRAC_PI_2;
use core::marker::PhantomData;

use crate::domain::{BoundaryInitializer, Domain};
use crate::entity::VertexId;
use crate::error::{MeshingError, StructuralError};
use crate::front::Front;
use crate::front_update::FrontUpdate;
use crate::geom::utils::angle;
use crate::math::Point;
use crate::mesh::Mesh;
use crate::mesh_log;
use crate::quad_layer::QuadLayer;

/// Parameters for the quad layering driver.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct QuadLayeringOptions {
    /// How many layers to grow.
    ///
    /// Default value: `1`.
    pub n_layers: usize,

    /// Thickness of the first layer.
    ///
    /// Default value: `QuadLayeringOptions::DEFAULT_FIRST_HEIGHT`.
    pub first_height: f64,

    /// Growth factor applied to the height after each layer.
    ///
    /// Default value: `1.0`.
    pub growth_rate: f64,

    /// The layer span starts at the front vertex closest to this position.
    pub starting_position: Point,

    /// The layer span ends at the front vertex closest to this position.
    /// Equal starting and ending positions select a closed layer over the
    /// whole ring.
    pub ending_position: Point,

    /// Joints whose inner angle is at most this value are kept as wedges.
    ///
    /// Default value: `pi / 2`.
    pub quad_layer_angle: f64,

    /// Factor on the local layer height giving the search radius for
    /// reusable vertices near a projected position.
    ///
    /// Default value: `0.75`.
    pub quad_layer_range: f64,
}

impl Default for QuadLayeringOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl QuadLayeringOptions {
    pub const DEFAULT_FIRST_HEIGHT: f64 = 1.0;
    pub const DEFAULT_GROWTH_RATE: f64 = 1.0;
    pub const DEFAULT_QUAD_LAYER_ANGLE: f64 = FRAC_PI_2;
    pub const DEFAULT_QUAD_LAYER_RANGE: f64 = 0.75;

    pub const DEFAULT: Self = QuadLayeringOptions {
        n_layers: 1,
        first_height: Self::DEFAULT_FIRST_HEIGHT,
        growth_rate: Self::DEFAULT_GROWTH_RATE,
        starting_position: Point {
            x: 0.0,
            y: 0.0,
            _unit: PhantomData,
        },
        ending_position: Point {
            x: 0.0,
            y: 0.0,
            _unit: PhantomData,
        },
        quad_layer_angle: Self::DEFAULT_QUAD_LAYER_ANGLE,
        quad_layer_range: Self::DEFAULT_QUAD_LAYER_RANGE,
    };

    #[inline]
    pub fn n_layers(n: usize) -> Self {
        Self::DEFAULT.with_n_layers(n)
    }

    #[inline]
    pub fn with_n_layers(mut self, n: usize) -> Self {
        self.n_layers = n;
        self
    }

    #[inline]
    pub fn with_first_height(mut self, height: f64) -> Self {
        self.first_height = height;
        self
    }

    #[inline]
    pub fn with_growth_rate(mut self, rate: f64) -> Self {
        self.growth_rate = rate;
        self
    }

    #[inline]
    pub fn with_starting_position(mut self, xy: Point) -> Self {
        self.starting_position = xy;
        self
    }

    #[inline]
    pub fn with_ending_position(mut self, xy: Point) -> Self {
        self.ending_position = xy;
        self
    }

    #[inline]
    pub fn with_quad_layer_angle(mut self, angle: f64) -> Self {
        self.quad_layer_angle = angle;
        self
    }

    #[inline]
    pub fn with_quad_layer_range(mut self, range: f64) -> Self {
        self.quad_layer_range = range;
        self
    }
}

/// Grows quad layers on a mesh seeded from a domain's boundaries.
pub struct FrontQuadLayering {
    options: QuadLayeringOptions,
    front: Front,
    front_update: FrontUpdate,
    xy_start: Point,
    xy_end: Point,
    log: bool,
}

impl FrontQuadLayering {
    pub fn new(options: QuadLayeringOptions) -> Self {
        FrontQuadLayering {
            options,
            front: Front::new(),
            front_update: FrontUpdate::new(),
            xy_start: options.starting_position,
            xy_end: options.ending_position,
            log: false,
        }
    }

    #[inline]
    pub fn options(&self) -> &QuadLayeringOptions {
        &self.options
    }

    /// Enable verbose output (debug builds only).
    pub fn set_logging(&mut self, log: bool) {
        self.log = log;
    }

    #[inline]
    pub fn front(&self) -> &Front {
        &self.front
    }

    /// Run the layer generation.
    ///
    /// Returns `Ok(true)` when all requested layers were grown, `Ok(false)`
    /// when layering stopped early; either way the mesh is left in a
    /// consistent state with all successfully placed elements committed.
    /// Broken invariants in the caller-supplied structures - during front
    /// initialization or while a layer span is assembled - are reported as
    /// `MeshingError::Structural`.
    pub fn generate_elements(
        &mut self,
        mesh: &mut Mesh,
        domain: &Domain,
    ) -> Result<bool, MeshingError> {
        if mesh.n_boundary_edges() < 1 {
            return Err(MeshingError::NoBoundaryEdges);
        }

        // Prepare the mesh.
        mesh.setup_facet_connectivity();

        // Initialize the advancing front and its base edge. Unlike the
        // triangulation pass, layering keeps the boundary edge order, so
        // the edges are not sorted by length here.
        self.init_advancing_front(mesh, domain)?;

        // Remove mesh edges that no longer bound anything.
        mesh.remove_invalid_interior_edges();

        self.xy_start = self.options.starting_position;
        self.xy_end = self.options.ending_position;

        let mut height = self.options.first_height;
        let mut success = true;

        for i_layer in 0..self.options.n_layers {
            mesh_log!(self, "generate quad layer {i_layer}, height {height}");

            success = self.generate_quad_layer(mesh, domain, height)?;
            if !success {
                break;
            }

            height *= self.options.growth_rate;
        }

        mesh.finish_for_output();

        // Remove remaining edges from the front. Twin links into the
        // boundary edge list must be nulled on both sides first.
        let twin_edges: Vec<_> = self
            .front
            .iter()
            .filter(|&id| self.front[id].twin().is_some())
            .collect();
        for id in twin_edges {
            self.front.unbind_twin(id, &mut mesh.boundary_edges);
        }
        self.front.clear_edges(&mut mesh.vertices);
        self.front.clear_waste();

        Ok(success)
    }

    fn init_advancing_front(
        &mut self,
        mesh: &mut Mesh,
        domain: &Domain,
    ) -> Result<(), StructuralError> {
        let initializer = BoundaryInitializer::from_mesh(mesh, domain);

        self.front = Front::new();
        self.front.init(domain, &initializer, mesh)?;
        self.front.set_base_first();

        Ok(())
    }

    fn generate_quad_layer(
        &mut self,
        mesh: &mut Mesh,
        domain: &Domain,
        height: f64,
    ) -> Result<bool, StructuralError> {
        // Find the front vertices closest to the current start and end
        // positions.
        let mut v_start: Option<VertexId> = None;
        let mut v_end: Option<VertexId> = None;
        let mut d_start_sqr_min = f64::MAX;
        let mut d_end_sqr_min = f64::MAX;

        for e in self.front.iter() {
            let v1 = self.front[e].v1();
            let xy = mesh.vertices()[v1].position();

            let d_start_sqr = (self.xy_start - xy).square_length();
            let d_end_sqr = (self.xy_end - xy).square_length();

            if d_start_sqr < d_start_sqr_min {
                v_start = Some(v1);
                d_start_sqr_min = d_start_sqr;
            }
            if d_end_sqr < d_end_sqr_min {
                v_end = Some(v1);
                d_end_sqr_min = d_end_sqr;
            }
        }

        let (Some(v_start), Some(v_end)) = (v_start, v_end) else {
            return Ok(false);
        };

        // The span runs from the edge leaving v_start to the edge arriving
        // at v_end.
        let (Some(mut e_start), Some(mut e_end)) =
            (self.front.edge_from(v_start), self.front.edge_to(v_end))
        else {
            return Ok(false);
        };
        debug_assert_eq!(self.front[e_start].v1(), v_start);
        debug_assert_eq!(self.front[e_end].v2(), v_end);

        if !self.front.is_traversable(e_start, e_end) {
            mesh_log!(self, "quad layer span is not traversable");
            return Ok(false);
        }

        let is_closed = v_start == v_end;

        // For closed layers, avoid starting at a sharply bent corner.
        if is_closed && self.front.len() > 1 {
            let v1 = mesh.vertices()[self.front[e_end].v1()].position();
            let v2 = mesh.vertices()[self.front[e_end].v2()].position();
            let v3 = mesh.vertices()[self.front[e_start].v2()].position();

            let ang = angle(v1 - v2, v3 - v2);

            if ang <= self.options.quad_layer_angle {
                let e_next = self.front.next_cyclic(e_start);
                e_end = e_start;
                e_start = e_next;
            }
        }

        // Set up the projected vertex coordinates for the whole span. A
        // walk that exits the ring or a disconnected front is a broken
        // invariant, not an ordinary layer rejection.
        let mut quad_layer = QuadLayer::new(
            &self.front,
            mesh.vertices(),
            e_start,
            e_end,
            is_closed,
            height,
            self.options.quad_layer_angle,
        )?;

        quad_layer.smooth_heights(domain, &self.front, mesh.vertices());

        quad_layer.setup_vertex_projection(mesh, &mut self.front)?;

        // Grow a quad over every base edge where possible, then close the
        // wedge gaps with triangles.
        self.create_quad_layer_elements(mesh, &mut quad_layer);
        self.finish_quad_layer(mesh, &mut quad_layer);

        mesh.clear_waste();
        self.front.clear_waste();

        // The next layer starts from the projection of this one.
        let n = quad_layer.n_bases();
        let mut anchors: Option<(VertexId, VertexId)> = None;

        for i in 0..n {
            let Some(v_start_in) = quad_layer.proj_v1[i] else {
                continue;
            };
            let v_end_in = if is_closed {
                v_start_in
            } else {
                match quad_layer.proj_v2[(i + n - 1) % n] {
                    Some(v) => v,
                    None => continue,
                }
            };

            if mesh.vertices().contains(v_start_in)
                && mesh.vertices().contains(v_end_in)
                && mesh.vertices()[v_start_in].on_front()
                && mesh.vertices()[v_end_in].on_front()
            {
                anchors = Some((v_start_in, v_end_in));
                break;
            }
        }

        let Some((v_start_in, v_end_in)) = anchors else {
            mesh_log!(self, "no on-front anchor for the next layer");
            return Ok(false);
        };

        self.xy_start = mesh.vertices()[v_start_in].position();
        self.xy_end = mesh.vertices()[v_end_in].position();

        Ok(true)
    }

    /// For each base edge, grow the triangle pair (b1, b2, p1) and
    /// (p1, b2, p2) and merge it into the quad (b1, b2, p2, p1).
    ///
    /// ```text
    ///        p1            p2
    ///       x-------------x-------------
    ///       | \           | \          |
    ///       |   \    t2   |   \        |
    ///       |     \       |     \      |
    ///       |  t1   \     |       \    |
    ///       |         \   |         \  |
    ///       |   base    \ |           \|
    ///  -----x-------------x------------x----
    ///        b1            b2
    /// ```
    fn create_quad_layer_elements(&mut self, mesh: &mut Mesh, layer: &mut QuadLayer) {
        let n_bases = layer.n_bases();

        for i in 0..n_bases {
            mesh_log!(self, "quad layer base {i}");

            // Search radius for vertices near the projected coordinates.
            let r = self.options.quad_layer_range * layer.heights[i];

            // First triangle (b1, b2, p1).
            let base = layer.base_edges[i];
            if !self.front.contains(base) {
                continue;
            }

            let Some(t1) = self.front_update.update_front(
                mesh,
                &mut self.front,
                base,
                layer.proj_v1_xy[i],
                layer.proj_v1_xy[i],
                r,
            ) else {
                continue;
            };

            let p1 = mesh.triangle(t1).v3();
            layer.proj_v1[i] = Some(p1);

            // Second triangle (p1, b2, p2).
            let Some(base) = self.front.get_edge(p1, layer.base_v2[i]) else {
                continue;
            };

            let Some(t2) = self.front_update.update_front(
                mesh,
                &mut self.front,
                base,
                layer.proj_v2_xy[i],
                layer.proj_v2_xy[i],
                r,
            ) else {
                continue;
            };

            let p2 = mesh.triangle(t2).v3();
            layer.proj_v2[i] = Some(p2);

            // Merge both triangles into a quad: first drop the interior
            // edge between them.
            let b2 = layer.base_v2[i];
            let Some(e_rem) = mesh
                .interior_edges()
                .get_edge(b2, p1)
                .or_else(|| mesh.interior_edges().get_edge(p1, b2))
            else {
                continue;
            };

            mesh.remove_interior_edge(e_rem);
            mesh.remove_triangle(t1);
            mesh.remove_triangle(t2);

            let q_new = mesh.add_quad(layer.base_v1[i], b2, p2, p1);
            mesh.quad_mut(q_new).set_active(true);
        }
    }

    /// Close the gaps left between wedge joints with triangles.
    ///
    /// ```text
    ///             p1[i]
    ///     v      x
    ///    x       :
    ///            :
    /// p2[i-1]    :
    ///  x.........x-------------x
    ///            | b1[i]        b2[i]
    ///            |
    /// ```
    fn finish_quad_layer(&mut self, mesh: &mut Mesh, layer: &mut QuadLayer) {
        let n_bases = layer.n_bases();

        for i in 1..n_bases {
            let (Some(a), Some(c)) = (layer.proj_v2[i - 1], layer.proj_v1[i]) else {
                continue;
            };
            if a == c || !mesh.vertices().contains(a) || !mesh.vertices().contains(c) {
                continue;
            }

            let b = layer.base_v1[i];

            let l1 = mesh.vertices()[a].position() - mesh.vertices()[b].position();
            let l2 = mesh.vertices()[c].position() - mesh.vertices()[b].position();
            let alpha = angle(l1, l2);

            if alpha <= self.options.quad_layer_angle {
                // Close the gap with the single triangle (a, b, c).
                let t_new = mesh.add_triangle(a, b, c);

                if !self.front_update.remove_from_mesh_if_invalid(
                    mesh,
                    &self.front,
                    None,
                    &[t_new],
                ) {
                    match self.front.get_edge(b, c) {
                        Some(base) => {
                            self.front_update.advance_front(mesh, &mut self.front, base, a, t_new);
                            mesh.triangle_mut(t_new).set_active(true);
                        }
                        None => mesh.remove_triangle(t_new),
                    }
                }
            } else {
                // The gap is too wide for one triangle: put a new vertex
                // into it and close with two.
                let v_xy = mesh.vertices()[b].position() + l1 + l2;
                let v_new = mesh.add_vertex(v_xy);

                let t1_new = mesh.add_triangle(a, b, v_new);
                let t2_new = mesh.add_triangle(b, c, v_new);

                if !self.front_update.remove_from_mesh_if_invalid(
                    mesh,
                    &self.front,
                    Some(v_new),
                    &[t1_new, t2_new],
                ) {
                    let base_ab = self.front.get_edge(a, b);
                    let base_bc = self.front.get_edge(b, c);

                    match (base_ab, base_bc) {
                        (Some(e_ab), Some(e_bc)) => {
                            self.front_update
                                .advance_front(mesh, &mut self.front, e_ab, v_new, t1_new);
                            self.front_update
                                .advance_front(mesh, &mut self.front, e_bc, v_new, t2_new);

                            mesh.triangle_mut(t1_new).set_active(true);
                            mesh.triangle_mut(t2_new).set_active(true);
                            mesh.vertices_mut()[v_new].set_fixed(true);
                        }
                        _ => {
                            mesh.remove_triangle(t1_new);
                            mesh.remove_triangle(t2_new);
                            mesh.vertices_mut().remove(v_new);
                        }
                    }
                }
            }
        }
    }
}
