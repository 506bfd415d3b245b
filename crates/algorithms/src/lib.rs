//! # forestwatch algorithms
//!
//! Raster algorithms for vegetation loss estimation.
//!
//! ## Available Algorithm Categories
//!
//! - **imagery**: Brightness rescaling, vegetation masks, change estimation

pub mod imagery;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        adjust_brightness, change_map, estimate_loss, vegetation_mask, ChangeMetrics,
        ChangeParams, MaskParams, VegetationMask,
    };
    pub use forestwatch_core::prelude::*;
}
