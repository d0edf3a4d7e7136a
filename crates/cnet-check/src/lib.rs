//! Structural and geometric audits of control networks.
//!
//! Pipeline of one audit run (see [`run_audit`]):
//!
//! 1. validate the network and configuration,
//! 2. cross-check the network against the [`ImageCatalog`](cnet_core::ImageCatalog),
//! 3. build the [`CorrespondenceGraph`] and partition it into [`Island`]s,
//! 4. validate pixel → ground reprojection of every measure,
//! 5. score per-image measurement coverage with a convex hull.
//!
//! Steps 4 and 5 open backing images through a bounded [`ImageCache`].
//! Per-image failures are recorded in the [`NetworkAudit`]; only malformed
//! input aborts a run.
//!
//! ```no_run
//! use cnet_check::{run_audit, AuditConfig, LabelOpener, NullProgress};
//! use cnet_core::{ControlNet, ImageCatalog};
//!
//! # fn main() -> anyhow::Result<()> {
//! let net: ControlNet = serde_json::from_str(&std::fs::read_to_string("net.json")?)?;
//! let catalog = ImageCatalog::from_list_file(std::path::Path::new("images.lis"))?;
//! let audit = run_audit(&net, &catalog, LabelOpener, &AuditConfig::default(), &mut NullProgress)?;
//! println!("{} islands", audit.islands.len());
//! # Ok(())
//! # }
//! ```

mod audit;
mod cache;
mod catalog_checks;
mod config;
mod coverage;
mod error;
mod graph;
mod image;
mod islands;
mod progress;
mod reprojection;

pub use audit::*;
pub use cache::*;
pub use catalog_checks::*;
pub use config::*;
pub use coverage::*;
pub use error::*;
pub use graph::*;
pub use image::*;
pub use islands::*;
pub use progress::*;
pub use reprojection::*;
