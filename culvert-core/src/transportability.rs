//! Transportability sizing: a minimum culvert size set by the channel's
//! shape and steepness rather than by hydraulics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidthDepthCategory {
    /// ratio < 3
    Low,
    /// 3 <= ratio <= 6
    Medium,
    /// ratio > 6
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GradientCategory {
    /// < 1 %
    Low,
    /// 1 % to < 3 %
    Moderate,
    /// 3 % to 8 %
    High,
    /// > 8 %
    VeryHigh,
}

/// Minimum diameter (mm) by gradient row and width/depth column.
/// Very steep streams move enough bed load to need a large opening regardless of shape.
pub const TRANSPORTABILITY_MATRIX_MM: [[u32; 3]; 4] = [
    [400, 500, 600],
    [500, 600, 800],
    [600, 800, 1000],
    [1200, 1200, 1200],
];

pub fn classify_width_depth(ratio: f64) -> WidthDepthCategory {
    if ratio < 3.0 {
        WidthDepthCategory::Low
    } else if ratio <= 6.0 {
        WidthDepthCategory::Medium
    } else {
        WidthDepthCategory::High
    }
}

pub fn classify_gradient(stream_gradient: f64) -> GradientCategory {
    if stream_gradient < 1.0 {
        GradientCategory::Low
    } else if stream_gradient < 3.0 {
        GradientCategory::Moderate
    } else if stream_gradient <= 8.0 {
        GradientCategory::High
    } else {
        GradientCategory::VeryHigh
    }
}

/// Transportability floor in mm for a width/depth ratio and gradient (%).
pub fn transportability_size(width_to_depth_ratio: f64, stream_gradient: f64) -> u32 {
    let row = match classify_gradient(stream_gradient) {
        GradientCategory::Low => 0,
        GradientCategory::Moderate => 1,
        GradientCategory::High => 2,
        GradientCategory::VeryHigh => 3,
    };
    let column = match classify_width_depth(width_to_depth_ratio) {
        WidthDepthCategory::Low => 0,
        WidthDepthCategory::Medium => 1,
        WidthDepthCategory::High => 2,
    };
    TRANSPORTABILITY_MATRIX_MM[row][column]
}
