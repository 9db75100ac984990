use crate::math::{average, trapezoidal_area, width_to_depth_ratio};
use serde::{Deserialize, Serialize};

/// Summary of the stream channel measured at the crossing.
///
/// Built once from the raw field measurements and never changed afterwards.
/// All lengths are metres, the area is m².
///
/// Deserializing reads only the raw measurements and derives the rest, so
/// stored or hand-edited JSON cannot carry stale averages into the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StreamMeasurements")]
pub struct StreamGeometry {
    pub top_widths: Vec<f64>,
    pub bottom_width: f64,
    pub depths: Vec<f64>,
    pub average_top_width: f64,
    pub average_depth: f64,
    /// Trapezoidal section area from the averaged measurements.
    pub cross_sectional_area: f64,
    /// Average top width over average depth; 0 when the depth is 0.
    pub width_to_depth_ratio: f64,
}

/// The readings taken in the field, before anything is derived from them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamMeasurements {
    top_widths: Vec<f64>,
    bottom_width: f64,
    depths: Vec<f64>,
}

impl From<StreamMeasurements> for StreamGeometry {
    fn from(raw: StreamMeasurements) -> Self {
        StreamGeometry::from_measurements(raw.top_widths, raw.bottom_width, raw.depths)
    }
}

impl StreamGeometry {
    pub fn from_measurements(top_widths: Vec<f64>, bottom_width: f64, depths: Vec<f64>) -> Self {
        let average_top_width = average(&top_widths);
        let average_depth = average(&depths);
        Self {
            cross_sectional_area: trapezoidal_area(average_top_width, bottom_width, average_depth),
            width_to_depth_ratio: width_to_depth_ratio(average_top_width, average_depth),
            top_widths,
            bottom_width,
            depths,
            average_top_width,
            average_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_measurement_section() {
        let g = StreamGeometry::from_measurements(vec![2.0], 1.0, vec![0.5]);
        assert_eq!(g.average_top_width, 2.0);
        assert_eq!(g.average_depth, 0.5);
        assert_eq!(g.cross_sectional_area, 0.75);
        assert_eq!(g.width_to_depth_ratio, 4.0);
    }

    #[test]
    fn averages_multiple_measurements() {
        let g = StreamGeometry::from_measurements(vec![3.0, 4.0, 5.0], 2.0, vec![0.4, 0.6]);
        assert_eq!(g.average_top_width, 4.0);
        assert_eq!(g.average_depth, 0.5);
        assert_eq!(g.cross_sectional_area, 1.5);
        assert_eq!(g.width_to_depth_ratio, 8.0);
    }

    #[test]
    fn deserializing_recomputes_derived_values() {
        let json = r#"{
            "topWidths": [2.0],
            "bottomWidth": 1.0,
            "depths": [0.5],
            "averageTopWidth": 40.0,
            "averageDepth": 0.01,
            "crossSectionalArea": 99.0,
            "widthToDepthRatio": 4000.0
        }"#;
        let g: StreamGeometry = serde_json::from_str(json).unwrap();
        assert_eq!(g, StreamGeometry::from_measurements(vec![2.0], 1.0, vec![0.5]));
    }

    #[test]
    fn raw_measurements_alone_deserialize() {
        let g: StreamGeometry =
            serde_json::from_str(r#"{"topWidths":[3.0,5.0],"bottomWidth":2.0,"depths":[0.5]}"#)
                .unwrap();
        assert_eq!(g.average_top_width, 4.0);
        assert_eq!(g.cross_sectional_area, 1.5);
    }

    #[test]
    fn dry_channel_has_zero_ratio() {
        let g = StreamGeometry::from_measurements(vec![1.5], 1.0, vec![0.0]);
        assert_eq!(g.cross_sectional_area, 0.0);
        assert_eq!(g.width_to_depth_ratio, 0.0);
    }
}
