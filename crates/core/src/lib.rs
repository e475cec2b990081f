//! # PolyNest Core
//!
//! Shared types for the PolyNest 2D nesting engine.
//!
//! ## Core Components
//!
//! - **Fixed-point geometry**: [`IntPoint`], [`Ngon`], [`Ngons`]
//! - **Transforms and bounds**: [`Affine2`], [`IntRect`], [`Rect`]
//! - **NFP tiers**: [`NestQuality`]
//! - **Progress and outcomes**: [`ProgressInfo`], [`NestEvent`], [`RunReport`], [`NestReport`]
//!
//! ## Configuration
//!
//! Use [`Config`] to configure the engine:
//!
//! ```rust
//! use polynest_core::Config;
//!
//! let config = Config::new()
//!     .with_threads(4)
//!     .with_update_breaks(20)
//!     .with_canvas_margin(500);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod geometry;
pub mod progress;
pub mod quality;
pub mod result;
pub mod transform;

// Re-exports
pub use config::{Config, DEFAULT_UNIT_SCALE};
pub use error::{Error, Result};
pub use geometry::{IntPoint, Ngon, Ngons};
pub use progress::{NestEvent, ProgressInfo};
pub use quality::NestQuality;
pub use result::{NestReport, RunReport, RunStatus};
pub use transform::{Affine2, IntRect, Rect};

/// Index of an entry in the polygon library.
pub type Handle = usize;
