//! Culvert sizing engine for forestry stream crossings.
//!
//! Field measurements of a stream channel and its catchment go in; a
//! recommended culvert size with the flow, capacity and control regime that
//! justify it comes out. Every function here is pure and synchronous.
//!
//! ```text
//! FieldForm --parse--> CulvertSizingInput --Sizer::compute--> CulvertSizingResult
//!                                                     \
//!                                                      +--> FieldCard --> FieldCardStore
//! ```

pub mod config;
pub mod error;
pub mod field_card;
pub mod flow;
pub mod geometry;
pub mod input;
pub mod material;
pub mod math;
pub mod region;
pub mod sizing;
pub mod solver;
pub mod store;
pub mod transportability;

pub use config::SizingConfig;
pub use error::{FieldError, InputField, InvalidReason, ValidationErrors};
pub use field_card::{FieldCard, Location};
pub use flow::{FlowEstimator, LookupTableEstimator, PowerLawEstimator};
pub use geometry::StreamGeometry;
pub use input::{CulvertSizingInput, FieldForm};
pub use material::CulvertMaterial;
pub use region::Region;
pub use sizing::{compute_culvert_sizing, ControllingFactor, CulvertSizingResult, Sizer};
pub use solver::{CaliforniaEstimate, Capacity, CulvertSize, SizingMethod};
pub use store::FieldCardStore;
