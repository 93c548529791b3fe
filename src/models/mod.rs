//! Core data models for district resolution and burn status.

pub mod district;
pub mod point;
pub mod status;

pub use district::{ContactInfo, DistrictPolygon, GeometryKind};
pub use point::{Coordinate, CoordinateError};
pub use status::{
    BurnAdvisory, BurnWindow, DistrictStatus, ResolutionPhase, ResolutionResult,
    RestrictionKind, RestrictionLevel, UrgencyTier,
};
