//! Imagery analysis algorithms
//!
//! Post-processing of Process API rasters and vegetation change detection:
//! - Brightness: scalar rescaling with clamping
//! - Vegetation: thresholded masks of NDVI visualizations
//! - Change detection: loss area, percentage and categorical change map

mod brightness;
mod change_detection;
mod vegetation;

pub use brightness::adjust_brightness;
pub use change_detection::{
    change_map, estimate_loss, estimate_loss_from_masks, ChangeMetrics, ChangeParams,
    CHANGE_GAIN, CHANGE_LOSS, CHANGE_NO_CHANGE, DEFAULT_PIXEL_AREA_M2, LEGACY_TOTAL_PIXELS,
};
pub use vegetation::{vegetation_mask, MaskParams, VegetationMask, DEFAULT_THRESHOLD, GREEN_CHANNEL};
