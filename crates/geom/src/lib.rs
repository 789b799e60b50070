#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![allow(clippy::many_single_char_names)]

//! Simple 2D geometric primitives on top of euclid, used by the quadfront
//! mesh generator.
//!
//! Everything here is `f64`: mesh generation accumulates positions through
//! long chains of projections and size-function integrations, and single
//! precision degrades the front geometry noticeably on fine size functions.
//!
//! # Overview
//!
//! This crate implements the maths to work with:
//!
//! - points and vectors,
//! - line segments and their intersections,
//! - orientation predicates and angles between directions.

// Reexport dependencies.
pub use euclid;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod line;
pub mod utils;

#[doc(inline)]
pub use crate::line::LineSegment;

/// Alias for `euclid::default::Point2D<f64>`.
pub type Point = euclid::default::Point2D<f64>;

/// Alias for `euclid::default::Vector2D<f64>`.
pub type Vector = euclid::default::Vector2D<f64>;

/// Alias for `euclid::default::Box2D<f64>`.
pub type Box2D = euclid::default::Box2D<f64>;

/// Shorthand for `Point::new`.
#[inline]
pub fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Shorthand for `Vector::new`.
#[inline]
pub fn vector(x: f64, y: f64) -> Vector {
    Vector::new(x, y)
}
