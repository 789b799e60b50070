use core::f64::consts::FRAC_PI_2;

use crate::domain::{Boundary, BoundaryInitializer, Domain};
use crate::front::Front;
use crate::layering::{FrontQuadLayering, QuadLayeringOptions};
use crate::math::{point, Point};
use crate::mesh::{Mesh, QuadId};
use crate::quad_layer::QuadLayer;
use crate::MeshingError;

fn square_domain(rho: f64) -> Domain {
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

fn l_shape_domain(rho: f64) -> Domain {
    let mut domain = Domain::uniform(rho);
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
    domain
}

fn quad_signed_area(mesh: &Mesh, q: QuadId) -> f64 {
    let [a, b, c, d] = mesh.quad(q).vertices();
    let pts: Vec<Point> = [a, b, c, d]
        .iter()
        .map(|&v| mesh.vertices()[v].position())
        .collect();

    let mut double_area = 0.0;
    for i in 0..4 {
        let p = pts[i];
        let q = pts[(i + 1) % 4];
        double_area += p.x * q.y - q.x * p.y;
    }
    0.5 * double_area
}

fn has_vertex_near(mesh: &Mesh, p: Point) -> bool {
    mesh.vertices()
        .iter()
        .any(|v| (mesh.vertices()[v].position() - p).length() < 1e-9)
}

#[test]
fn fails_fast_without_boundary_edges() {
    let domain = Domain::uniform(1.0);
    let mut mesh = Mesh::new();

    let mut layering = FrontQuadLayering::new(QuadLayeringOptions::DEFAULT);
    assert_eq!(
        layering.generate_elements(&mut mesh, &domain),
        Err(MeshingError::NoBoundaryEdges)
    );
}

#[test]
fn zero_layers_only_refines_the_boundary() {
    let domain = square_domain(0.25);
    let mut mesh = Mesh::from_domain(&domain);

    let options = QuadLayeringOptions::n_layers(0);
    let mut layering = FrontQuadLayering::new(options);

    assert_eq!(layering.generate_elements(&mut mesh, &domain), Ok(true));

    // The boundary mirror carries the refined resolution: 4 edges per side
    // of length 0.25, enclosing the unit area.
    assert_eq!(mesh.n_boundary_edges(), 16);
    for e in mesh.boundary_edges().iter() {
        assert!((mesh.boundary_edges()[e].length() - 0.25).abs() < 1e-9);
    }
    assert!((mesh.boundary_edges().area() - 1.0).abs() < 1e-9);

    assert_eq!(mesh.n_quads(), 0);
    assert_eq!(mesh.n_triangles(), 0);
    assert!(layering.front().is_empty());
}

#[test]
fn single_closed_layer_on_unit_square() {
    let domain = square_domain(1.0);
    let mut mesh = Mesh::from_domain(&domain);

    let options = QuadLayeringOptions::n_layers(1)
        .with_first_height(0.2)
        .with_growth_rate(1.0)
        .with_starting_position(point(0.0, 0.0))
        .with_ending_position(point(0.0, 0.0));
    let mut layering = FrontQuadLayering::new(options);

    assert_eq!(layering.generate_elements(&mut mesh, &domain), Ok(true));

    // One quad per side, no wedge triangles.
    assert_eq!(mesh.n_quads(), 4);
    assert_eq!(mesh.n_triangles(), 0);

    for q in mesh.quads() {
        assert!(quad_signed_area(&mesh, q) > 0.0);
        assert!(mesh.quad(q).is_active());
    }

    // The layer projects onto the inner square of side 0.6.
    for p in [
        point(0.2, 0.2),
        point(0.8, 0.2),
        point(0.8, 0.8),
        point(0.2, 0.8),
    ] {
        assert!(has_vertex_near(&mesh, p), "missing projection at {p:?}");
    }

    assert!(layering.front().is_empty());
}

#[test]
fn degenerate_shrinkage_stops_cleanly() {
    let domain = square_domain(1.0);
    let mut mesh = Mesh::from_domain(&domain);

    let options = QuadLayeringOptions::n_layers(2)
        .with_first_height(0.2)
        .with_growth_rate(1.5)
        .with_starting_position(point(0.0, 0.0))
        .with_ending_position(point(0.0, 0.0));
    let mut layering = FrontQuadLayering::new(options);

    // The second layer of height 0.3 shrinks the inner square of side 0.6
    // to nothing. The driver is allowed to stop early; it must not crash
    // and must leave consistent elements behind. Here the second layer
    // collapses onto the centre vertex: its bases each keep a triangle
    // instead of a quad.
    let _ = layering
        .generate_elements(&mut mesh, &domain)
        .expect("structural failure");

    assert_eq!(mesh.n_quads(), 4);
    assert_eq!(mesh.n_triangles(), 4);

    for q in mesh.quads() {
        assert!(quad_signed_area(&mesh, q) > 0.0);
    }
    // The shrinkage point is the centre of the square.
    assert!(has_vertex_near(&mesh, point(0.5, 0.5)));
    assert!(layering.front().is_empty());
}

#[test]
fn l_shape_grows_wedge_gap_triangle() {
    // rho large enough that refinement leaves the 6 input edges untouched.
    let domain = l_shape_domain(10.0);
    let mut mesh = Mesh::from_domain(&domain);

    let options = QuadLayeringOptions::n_layers(1)
        .with_first_height(0.2)
        .with_starting_position(point(0.0, 0.0))
        .with_ending_position(point(0.0, 0.0));
    let mut layering = FrontQuadLayering::new(options);

    assert_eq!(layering.generate_elements(&mut mesh, &domain), Ok(true));

    // One quad per base edge, plus the gap triangle that closes the wedge
    // at the reflex corner (1, 1).
    assert_eq!(mesh.n_quads(), 6);
    assert_eq!(mesh.n_triangles(), 1);

    let tri = mesh.triangles().next().unwrap();
    let corner: Vec<Point> = mesh
        .triangle(tri)
        .vertices()
        .iter()
        .map(|&v| mesh.vertices()[v].position())
        .collect();
    assert!(corner.contains(&point(1.0, 1.0)));

    for q in mesh.quads() {
        assert!(quad_signed_area(&mesh, q) > 0.0);
    }
}

#[test]
fn twin_edge_blocks_traversal() {
    let domain = square_domain(10.0);
    let mut mesh = Mesh::from_domain(&domain);
    let mut initializer = BoundaryInitializer::from_mesh(&mesh, &domain);
    initializer.set_twin_edge(0, 2, true);

    let mut front = Front::new();
    front.init(&domain, &initializer, &mut mesh).unwrap();

    let edges: Vec<_> = front.iter().collect();
    assert_eq!(edges.len(), 4);

    // The twin edge sits strictly inside the span from the first to the
    // last edge, so that span cannot be layered.
    assert!(!front.is_traversable(edges[0], edges[3]));
    assert!(front.is_traversable(edges[0], edges[1]));
    assert!(front.is_traversable(edges[2], edges[3]));
}

#[test]
fn open_layer_splits_the_adjacent_edge() {
    // A square with its closing corner pulled out to (-0.2, 0.9); the edge
    // into (0, 0) leans over the first base, so the start endpoint handling
    // must split it.
    let mut domain = Domain::uniform(10.0);
    domain.add_boundary(Boundary::new(
        vec![
            point(-0.2, 0.9),
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(1.0, 1.0),
            point(0.0, 1.0),
        ],
        1,
    ));

    let mut mesh = Mesh::from_domain(&domain);
    let initializer = BoundaryInitializer::from_mesh(&mesh, &domain);
    let mut front = Front::new();
    front.init(&domain, &initializer, &mut mesh).unwrap();
    assert_eq!(front.len(), 5);
    assert_eq!(mesh.n_boundary_edges(), 5);

    // Span over the two bases (0,0)->(1,0) and (1,0)->(1,1).
    let v_origin = front
        .iter()
        .map(|e| front[e].v1())
        .find(|&v| mesh.vertices()[v].position() == point(0.0, 0.0))
        .unwrap();
    let e_start = front.edge_from(v_origin).unwrap();
    let e_end = front.next_cyclic(e_start);

    let mut layer = QuadLayer::new(
        &front,
        mesh.vertices(),
        e_start,
        e_end,
        false,
        0.3,
        FRAC_PI_2,
    )
    .unwrap();
    assert_eq!(layer.n_bases(), 2);

    layer.setup_vertex_projection(&mut mesh, &mut front).unwrap();

    // Start side: the leaning edge was split; the split vertex became the
    // projection of the first base vertex.
    let v_new = layer.proj_v1[0].expect("start projection not resolved");
    let xy_new = mesh.vertices()[v_new].position();
    assert!((xy_new - layer.proj_v1_xy[0]).length() < 1e-12);
    // The split vertex sits on the original edge, close to h from (0,0).
    assert!((xy_new.to_vector().length() - 0.2928).abs() < 1e-3);
    assert!(mesh.vertices()[v_new].on_front());
    assert!(mesh.vertices()[v_new].on_boundary());

    // The front and the boundary mirror both carry the two halves, with
    // the original marker.
    assert_eq!(front.len(), 7);
    assert_eq!(mesh.n_boundary_edges(), 7);

    let v_prev = front
        .iter()
        .map(|e| front[e].v1())
        .find(|&v| mesh.vertices()[v].position() == point(-0.2, 0.9))
        .unwrap();

    let half1 = mesh.boundary_edges().get_edge(v_prev, v_new).unwrap();
    let half2 = mesh.boundary_edges().get_edge(v_new, v_origin).unwrap();
    assert_eq!(mesh.boundary_edges()[half1].marker(), 1);
    assert_eq!(mesh.boundary_edges()[half2].marker(), 1);
    assert!(front.get_edge(v_prev, v_new).is_some());
    assert!(front.get_edge(v_new, v_origin).is_some());

    // End side: the following edge is longer than the height, so it was
    // split as well, at distance h from (1, 1).
    let v_end_proj = layer.proj_v2[1].expect("end projection not resolved");
    let xy_end = mesh.vertices()[v_end_proj].position();
    assert!((xy_end - point(0.7, 1.0)).length() < 1e-9);
}
