//! Data model and geometry primitives for control network audits.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Pt2`, `Iso3`, ...),
//! - the control network model ([`ControlNet`], [`ControlPoint`],
//!   [`ControlMeasure`]) and the ignore policy,
//! - the immutable image registry ([`ImageCatalog`]),
//! - image label files and frame camera models used for pixel → ground
//!   projection.
//!
//! Nothing here mutates a network; audits borrow it for their whole run.

/// Image id → backing file registry.
mod catalog;
/// Image label files and frame extents.
mod label;
/// Linear algebra type aliases and helpers.
mod math;
/// Frame camera models and target bodies.
mod models;
/// Points, measures and the ignore policy.
mod network;
/// Synthetic fixtures shared by workspace tests.
pub mod test_utils;

pub use catalog::*;
pub use label::*;
pub use math::*;
pub use models::*;
pub use network::*;
