//! # PolyNest 2D
//!
//! Mesh clustering, no-fit polygons and greedy nesting of 2D polygon islands.
//!
//! A triangulated mesh is split into connected islands, each island becomes
//! one polygon set in a library, and queued commands transform and pack those
//! sets on a worker thread.
//!
//! ## Features
//!
//! - Connected-component clustering of triangle meshes with optional miter offset
//! - Seven NFP quality tiers, from bounding boxes to exact Minkowski sums
//! - Greedy bottom-left placement over NFP fit regions
//! - Refit, optimal rotation and origin alignment commands
//! - Cooperative cancellation with progress events
//!
//! ## Quick Start
//!
//! ```rust
//! use polynest_d2::{Nester, NestQuality, Rect};
//!
//! let mut nester = Nester::new();
//!
//! // Two disjoint unit squares in UV space.
//! let points = vec![
//!     (0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0),
//!     (3.0, 0.0), (4.0, 0.0), (4.0, 1.0), (3.0, 1.0),
//! ];
//! let triangles = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
//! let handles = nester.add_uv_polygons(&points, &triangles, 0.0).unwrap();
//! assert_eq!(nester.len().unwrap(), 2);
//!
//! // Pack, then shrink the layout back into the unit square.
//! let unit = nester.config().unit_scale;
//! nester
//!     .nest(None, NestQuality::Full)
//!     .refit(Rect::new(0.0, 0.0, unit, unit), false, None);
//!
//! let report = nester
//!     .execute()
//!     .unwrap()
//!     .wait_with_progress(|p| println!("{:.0}% {}", p.percent, p.phase))
//!     .unwrap();
//! assert!(report.status.is_completed());
//! assert!(report.nests[0].all_placed());
//!
//! let uv = nester
//!     .apply_transform_lib_uv_space(&[(0.0, 0.0)], &handles[..1])
//!     .unwrap();
//! println!("first vertex now at {:?}", uv[0]);
//! ```
//!
//! ## Cancellation
//!
//! [`Nester::cancel`] raises a flag checked between commands, between NFP
//! chunks and every few placements. A cancelled or failed run resets every
//! transform to identity and drops the rest of the buffer.

pub mod boolean;
pub mod cluster;
pub mod command;
pub mod geometry;
pub mod library;
pub mod minkowski;
pub mod nest;
pub mod nester;
pub mod nfp;
pub mod uv;

// Re-exports
pub use cluster::{ClusterBuilder, MeshClusters};
pub use command::{Command, ExecContext, ProgressSink};
pub use library::{PolyEntry, PolyLibrary};
pub use nester::{Execution, Nester};
pub use nfp::{compute_nfp, select_quality};
pub use polynest_core::{
    Affine2, Config, Error, Handle, IntPoint, IntRect, NestEvent, NestQuality, NestReport, Ngon,
    Ngons, ProgressInfo, Rect, Result, RunReport, RunStatus,
};
