#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]

//! Advancing-front generation of quad-dominant meshes in planar domains.
//!
//! ## Overview
//!
//! The most interesting types of this crate are:
//!
//! * [Front] - The advancing front: the moving boundary between meshed and
//!   unmeshed territory, kept as a counter-clockwise ring of directed edges
//!   and refined against the domain's size function.
//! * [QuadLayer] - A ribbon of quadrilaterals grown inward from a contiguous
//!   span of front edges, with projected-vertex reconciliation at the joints.
//! * [FrontQuadLayering] - The driver that grows one or several layers,
//!   merges the intermediate triangle pairs into quads and closes the gaps
//!   that wedge joints leave behind.
//!
//! ## The layering pipeline
//!
//! The driver initialises the front from the domain boundaries through a
//! [FrontInitializer], refines it so that edge lengths follow the size
//! function, and then, per layer, projects every base edge inward by the
//! layer height. Each base yields two triangles that are immediately merged
//! into one quad; joints that would produce badly shaped quads are kept as
//! wedges and closed with triangles afterwards. A layer that cannot be
//! placed leaves the mesh in a consistent, partially-layered state.
//!
//! All entities live in arenas addressed by small integer ids, so every
//! cross-reference in the structures below is a handle rather than a
//! pointer; removal writes a tombstone which is swept by the mesh's
//! `clear_waste`.

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub use quadfront_geom as geom;

/// f64 2D point and vector types used across the crate.
pub mod math {
    pub use quadfront_geom::{point, vector, Box2D, Point, Vector};
}

// Printed only in debug builds, and only when logging was requested on the
// object at hand (`$obj` must have a boolean `log` field).
#[cfg(debug_assertions)]
macro_rules! mesh_log {
    ($obj:ident, $fmt:expr) => (
        if $obj.log {
            println!($fmt);
        }
    );
    ($obj:ident, $fmt:expr, $($arg:tt)*) => (
        if $obj.log {
            println!($fmt, $($arg)*);
        }
    );
}

#[cfg(not(debug_assertions))]
macro_rules! mesh_log {
    ($obj:ident, $fmt:expr) => {};
    ($obj:ident, $fmt:expr, $($arg:tt)*) => {};
}

pub(crate) use mesh_log;

mod domain;
mod edge_list;
mod entity;
mod error;
mod front;
mod front_update;
mod layering;
mod mesh;
mod quad_layer;

#[cfg(test)]
mod layering_tests;

#[doc(inline)]
pub use crate::domain::{Boundary, BoundaryInitializer, Domain, FrontInitializer};

#[doc(inline)]
pub use crate::edge_list::{Edge, EdgeId, EdgeList, Orientation, INVALID_EDGE_ID};

#[doc(inline)]
pub use crate::entity::{Vertex, VertexId, VertexStore, INVALID_VERTEX_ID};

#[doc(inline)]
pub use crate::error::{MeshingError, MeshingResult, StructuralError};

#[doc(inline)]
pub use crate::front::Front;

#[doc(inline)]
pub use crate::front_update::FrontUpdate;

#[doc(inline)]
pub use crate::layering::{FrontQuadLayering, QuadLayeringOptions};

#[doc(inline)]
pub use crate::mesh::{Mesh, Quad, QuadId, Triangle, TriangleId};

#[doc(inline)]
pub use crate::quad_layer::QuadLayer;
