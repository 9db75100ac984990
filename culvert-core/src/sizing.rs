//! Sizing orchestrator.
//!
//! One request moves through a fixed sequence of stages:
//!
//! ```text
//! Idle -> FlowEstimated -> SizeComputed -> TransportabilityChecked -> ControlDetermined -> Complete
//! ```
//!
//! There is no branching back and no retry. Input is validated before the
//! first transition, so a request that leaves `Idle` always completes.
//! Identical input and configuration always give an identical result.

use crate::config::SizingConfig;
use crate::error::ValidationErrors;
use crate::flow::{climate_factor, safety_factor, FlowEstimator, PowerLawEstimator};
use crate::input::CulvertSizingInput;
use crate::material::CulvertMaterial;
use crate::solver::{
    effective_slope, size_hydraulic, CaliforniaEstimate, Capacity, CulvertSize, HydraulicSizing,
    SizingMethod,
};
use crate::transportability::transportability_size;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which end of the barrel governs capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllingFactor {
    Inlet,
    Outlet,
}

impl fmt::Display for ControllingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllingFactor::Inlet => f.write_str("inlet"),
            ControllingFactor::Outlet => f.write_str("outlet"),
        }
    }
}

/// The size each method arrived at, for reports and review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodComparison {
    pub end_area_mm: u32,
    pub california: CaliforniaEstimate,
    /// Governing dimension of the Manning solution.
    pub manning_mm: u32,
    pub transportability_mm: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulvertSizingResult {
    /// Diameter, or the larger of span and rise for a box (mm).
    pub recommended_size: u32,
    pub culvert: CulvertSize,
    pub method: SizingMethod,
    pub transportability_size: Option<u32>,
    /// Regional flow before climate and safety adjustment (m³/s).
    pub base_flow: f64,
    pub climate_factor: f64,
    pub safety_factor: f64,
    /// Flow after climate and safety adjustment (m³/s).
    pub design_flow: f64,
    /// Design flow times the solver's capacity margin (m³/s).
    pub required_capacity: f64,
    pub controlling_factor: ControllingFactor,
    pub capacity: Capacity,
    /// False when the largest available section still falls short of `required_capacity`.
    pub capacity_sufficient: bool,
    pub transportable: bool,
    pub comparison: MethodComparison,
}

/// Stages of a sizing run, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingStage {
    Idle,
    FlowEstimated,
    SizeComputed,
    TransportabilityChecked,
    ControlDetermined,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FlowAdjustment {
    base_flow: f64,
    climate_factor: f64,
    safety_factor: f64,
    design_flow: f64,
    required_capacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Selection {
    culvert: CulvertSize,
    method: SizingMethod,
    transportability_mm: Option<u32>,
}

enum SizingState<'i> {
    Idle {
        input: &'i CulvertSizingInput,
    },
    FlowEstimated {
        input: &'i CulvertSizingInput,
        flow: FlowAdjustment,
    },
    SizeComputed {
        input: &'i CulvertSizingInput,
        flow: FlowAdjustment,
        hydraulic: HydraulicSizing,
    },
    TransportabilityChecked {
        input: &'i CulvertSizingInput,
        flow: FlowAdjustment,
        hydraulic: HydraulicSizing,
        selection: Selection,
    },
    ControlDetermined {
        input: &'i CulvertSizingInput,
        flow: FlowAdjustment,
        hydraulic: HydraulicSizing,
        selection: Selection,
        controlling_factor: ControllingFactor,
    },
    Complete(CulvertSizingResult),
}

impl SizingState<'_> {
    fn stage(&self) -> SizingStage {
        match self {
            SizingState::Idle { .. } => SizingStage::Idle,
            SizingState::FlowEstimated { .. } => SizingStage::FlowEstimated,
            SizingState::SizeComputed { .. } => SizingStage::SizeComputed,
            SizingState::TransportabilityChecked { .. } => SizingStage::TransportabilityChecked,
            SizingState::ControlDetermined { .. } => SizingStage::ControlDetermined,
            SizingState::Complete(_) => SizingStage::Complete,
        }
    }
}

/// Inlet control on steep, smooth barrels; outlet control otherwise.
pub fn controlling_factor(
    config: &SizingConfig,
    stream_gradient: f64,
    material: CulvertMaterial,
) -> ControllingFactor {
    let n = material.mannings_n();
    if stream_gradient < config.outlet_max_gradient_percent || n > config.outlet_min_roughness {
        ControllingFactor::Outlet
    } else if stream_gradient > config.inlet_min_gradient_percent && n < config.inlet_max_roughness
    {
        ControllingFactor::Inlet
    } else {
        ControllingFactor::Outlet
    }
}

/// Runs sizing requests against one configuration and flow estimator.
pub struct Sizer<'a> {
    config: &'a SizingConfig,
    estimator: &'a dyn FlowEstimator,
}

impl<'a> Sizer<'a> {
    pub fn new(config: &'a SizingConfig, estimator: &'a dyn FlowEstimator) -> Self {
        Self { config, estimator }
    }

    /// Validate `input` and size a culvert for it.
    pub fn compute(&self, input: &CulvertSizingInput) -> Result<CulvertSizingResult, ValidationErrors> {
        input.validate()?;
        log::debug!(
            "[Culvert] sizing: {} ha {} catchment at {}% using {}",
            input.drainage_area,
            input.region,
            input.stream_gradient,
            self.estimator.name()
        );

        let mut state = SizingState::Idle { input };
        loop {
            state = match state {
                SizingState::Complete(result) => return Ok(result),
                other => {
                    let from = other.stage();
                    let next = self.advance(other);
                    log::debug!("[Culvert] sizing: {:?} -> {:?}", from, next.stage());
                    next
                }
            };
        }
    }

    fn advance<'i>(&self, state: SizingState<'i>) -> SizingState<'i> {
        match state {
            SizingState::Idle { input } => SizingState::FlowEstimated {
                input,
                flow: self.estimate_flow(input),
            },
            SizingState::FlowEstimated { input, flow } => SizingState::SizeComputed {
                input,
                flow,
                hydraulic: size_hydraulic(
                    flow.required_capacity,
                    input.stream_gradient,
                    input.culvert_material,
                    &input.stream_geometry,
                    self.config,
                ),
            },
            SizingState::SizeComputed {
                input,
                flow,
                hydraulic,
            } => SizingState::TransportabilityChecked {
                input,
                flow,
                hydraulic,
                selection: self.check_transportability(input, &hydraulic),
            },
            SizingState::TransportabilityChecked {
                input,
                flow,
                hydraulic,
                selection,
            } => SizingState::ControlDetermined {
                input,
                flow,
                hydraulic,
                selection,
                controlling_factor: controlling_factor(
                    self.config,
                    input.stream_gradient,
                    input.culvert_material,
                ),
            },
            SizingState::ControlDetermined {
                input,
                flow,
                hydraulic,
                selection,
                controlling_factor,
            } => SizingState::Complete(self.assemble(
                input,
                flow,
                &hydraulic,
                selection,
                controlling_factor,
            )),
            complete @ SizingState::Complete(_) => complete,
        }
    }

    fn estimate_flow(&self, input: &CulvertSizingInput) -> FlowAdjustment {
        let base_flow = self.estimator.estimate(input.drainage_area, input.region);
        let climate = if input.use_climate_factors {
            climate_factor(self.config, input.region, input.projected_rainfall)
        } else {
            1.0
        };
        let safety = safety_factor(self.config, input.stream_gradient);
        let design_flow = base_flow * climate * safety;
        FlowAdjustment {
            base_flow,
            climate_factor: climate,
            safety_factor: safety,
            design_flow,
            required_capacity: design_flow * self.config.capacity_margin,
        }
    }

    fn check_transportability(
        &self,
        input: &CulvertSizingInput,
        hydraulic: &HydraulicSizing,
    ) -> Selection {
        let mut selection = Selection {
            culvert: hydraulic.culvert,
            method: hydraulic.method,
            transportability_mm: None,
        };
        if !input.use_transportability {
            return selection;
        }
        let floor_mm = transportability_size(
            input.stream_geometry.width_to_depth_ratio,
            input.stream_gradient,
        );
        selection.transportability_mm = Some(floor_mm);
        if floor_mm > hydraulic.culvert.governing_dimension_mm() {
            log::debug!(
                "[Culvert] sizing: transportability floor {} mm exceeds hydraulic {}",
                floor_mm,
                hydraulic.culvert.describe()
            );
            selection.culvert = hydraulic.culvert.with_minimum_span(floor_mm);
            selection.method = SizingMethod::TransportabilityMatrix;
        }
        selection
    }

    fn assemble(
        &self,
        input: &CulvertSizingInput,
        flow: FlowAdjustment,
        hydraulic: &HydraulicSizing,
        selection: Selection,
        controlling_factor: ControllingFactor,
    ) -> CulvertSizingResult {
        let slope = effective_slope(self.config, input.stream_gradient);
        let capacity = selection.culvert.capacity(input.culvert_material, slope);
        let recommended_size = selection.culvert.governing_dimension_mm();
        // a capped Manning search means no available section carries the flow
        let capacity_sufficient =
            !hydraulic.manning.capped && capacity.max_flow >= flow.required_capacity;
        if !capacity_sufficient {
            log::warn!(
                "[Culvert] sizing: {} carries {:.2} m³/s, short of the {:.2} m³/s required",
                selection.culvert.describe(),
                capacity.max_flow,
                flow.required_capacity
            );
        }
        CulvertSizingResult {
            recommended_size,
            culvert: selection.culvert,
            method: selection.method,
            transportability_size: selection.transportability_mm,
            base_flow: flow.base_flow,
            climate_factor: flow.climate_factor,
            safety_factor: flow.safety_factor,
            design_flow: flow.design_flow,
            required_capacity: flow.required_capacity,
            controlling_factor,
            capacity,
            capacity_sufficient,
            transportable: recommended_size <= self.config.max_transportable_mm,
            comparison: MethodComparison {
                end_area_mm: hydraulic.end_area_mm,
                california: hydraulic.california,
                manning_mm: hydraulic.manning.culvert.governing_dimension_mm(),
                transportability_mm: selection.transportability_mm,
            },
        }
    }
}

/// Size a culvert with the default configuration and power-law flow estimate.
pub fn compute_culvert_sizing(
    input: &CulvertSizingInput,
) -> Result<CulvertSizingResult, ValidationErrors> {
    let config = SizingConfig::default();
    Sizer::new(&config, &PowerLawEstimator).compute(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputField;
    use crate::flow::LookupTableEstimator;
    use crate::geometry::StreamGeometry;
    use crate::math::approx_eq;
    use crate::region::Region;
    use crate::solver::STANDARD_DIAMETERS_MM;

    fn example_input() -> CulvertSizingInput {
        CulvertSizingInput {
            drainage_area: 50.0,
            stream_gradient: 2.0,
            region: Region::Coastal,
            culvert_material: CulvertMaterial::Csp,
            stream_geometry: StreamGeometry::from_measurements(vec![2.0], 1.0, vec![0.5]),
            use_climate_factors: false,
            projected_rainfall: None,
            use_transportability: false,
        }
    }

    fn narrow_steep_input() -> CulvertSizingInput {
        CulvertSizingInput {
            drainage_area: 5.0,
            stream_gradient: 12.0,
            region: Region::Interior,
            culvert_material: CulvertMaterial::Hdpe,
            stream_geometry: StreamGeometry::from_measurements(vec![0.5], 0.3, vec![0.3]),
            use_climate_factors: false,
            projected_rainfall: None,
            use_transportability: true,
        }
    }

    #[test]
    fn example_scenario() {
        let result = compute_culvert_sizing(&example_input()).unwrap();
        assert!(approx_eq(result.design_flow, 1.486_508_9 * 1.1, 1e-6));
        assert_eq!(result.safety_factor, 1.1);
        assert_eq!(result.climate_factor, 1.0);
        assert!(STANDARD_DIAMETERS_MM.contains(&result.recommended_size));
        assert!(result.capacity.max_flow >= result.design_flow);
        assert!(result.capacity_sufficient);
        assert_eq!(result.transportability_size, None);
    }

    #[test]
    fn wide_channel_sizes_a_box() {
        let result = compute_culvert_sizing(&example_input()).unwrap();
        assert_eq!(
            result.culvert,
            CulvertSize::Box {
                span_mm: 2000,
                rise_mm: 800
            }
        );
        assert_eq!(result.recommended_size, 2000);
        assert_eq!(result.method, SizingMethod::Manning);
        assert_eq!(result.comparison.end_area_mm, 1000);
        assert_eq!(result.comparison.california, CaliforniaEstimate::Size(1200));
        assert!(!result.transportable);
    }

    #[test]
    fn example_with_transportability() {
        let input = CulvertSizingInput {
            use_transportability: true,
            ..example_input()
        };
        let result = compute_culvert_sizing(&input).unwrap();
        assert_eq!(result.transportability_size, Some(600));
        assert_eq!(result.recommended_size, 2000.max(600));
        assert_eq!(result.method, SizingMethod::Manning);
    }

    #[test]
    fn transportability_dominates_small_hydraulic_size() {
        let result = compute_culvert_sizing(&narrow_steep_input()).unwrap();
        assert_eq!(result.comparison.california, CaliforniaEstimate::Size(500));
        assert_eq!(result.transportability_size, Some(1200));
        assert_eq!(result.method, SizingMethod::TransportabilityMatrix);
        assert_eq!(result.recommended_size, 1200);
        assert_eq!(result.culvert, CulvertSize::Round { diameter_mm: 1200 });
        assert_eq!(result.safety_factor, 1.3);
        assert!(result.transportable);
    }

    #[test]
    fn steep_smooth_barrel_is_inlet_controlled() {
        let result = compute_culvert_sizing(&narrow_steep_input()).unwrap();
        assert_eq!(result.controlling_factor, ControllingFactor::Inlet);
    }

    #[test]
    fn controlling_factor_rules() {
        let config = SizingConfig::default();
        assert_eq!(
            controlling_factor(&config, 5.0, CulvertMaterial::Concrete),
            ControllingFactor::Inlet
        );
        assert_eq!(
            controlling_factor(&config, 5.0, CulvertMaterial::Csp),
            ControllingFactor::Outlet
        );
        assert_eq!(
            controlling_factor(&config, 0.5, CulvertMaterial::Hdpe),
            ControllingFactor::Outlet
        );
        // between the bands defaults to outlet
        assert_eq!(
            controlling_factor(&config, 2.0, CulvertMaterial::Hdpe),
            ControllingFactor::Outlet
        );
    }

    #[test]
    fn identical_input_gives_identical_result() {
        let input = CulvertSizingInput {
            use_climate_factors: true,
            projected_rainfall: Some(80.0),
            use_transportability: true,
            ..example_input()
        };
        let first = compute_culvert_sizing(&input).unwrap();
        let second = compute_culvert_sizing(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.design_flow.to_bits(), second.design_flow.to_bits());
    }

    #[test]
    fn larger_catchment_never_shrinks_culvert() {
        let geometries = [
            StreamGeometry::from_measurements(vec![2.0], 1.0, vec![0.5]),
            StreamGeometry::from_measurements(vec![1.2], 0.8, vec![0.6]),
        ];
        for geometry in geometries {
            for region in Region::ALL {
                let mut previous_flow = 0.0;
                let mut previous_size = 0;
                for area in [1.0, 10.0, 50.0, 200.0, 1_000.0, 5_000.0, 20_000.0, 100_000.0] {
                    let input = CulvertSizingInput {
                        drainage_area: area,
                        region,
                        stream_geometry: geometry.clone(),
                        ..example_input()
                    };
                    let result = compute_culvert_sizing(&input).unwrap();
                    assert!(result.design_flow >= previous_flow);
                    assert!(result.recommended_size >= previous_size);
                    previous_flow = result.design_flow;
                    previous_size = result.recommended_size;
                }
            }
        }
    }

    #[test]
    fn climate_layer_never_reduces_flow() {
        for rainfall in [None, Some(10.0), Some(65.0), Some(120.0)] {
            let without = compute_culvert_sizing(&example_input()).unwrap();
            let input = CulvertSizingInput {
                use_climate_factors: true,
                projected_rainfall: rainfall,
                ..example_input()
            };
            let with = compute_culvert_sizing(&input).unwrap();
            assert!(with.design_flow > without.design_flow);
            assert!(with.climate_factor >= 1.1);
        }
    }

    #[test]
    fn results_are_non_negative() {
        let input = CulvertSizingInput {
            stream_gradient: 0.0,
            stream_geometry: StreamGeometry::from_measurements(vec![0.0], 0.0, vec![0.0]),
            ..example_input()
        };
        let result = compute_culvert_sizing(&input).unwrap();
        assert!(result.design_flow >= 0.0);
        assert!(result.capacity.max_flow >= 0.0);
        assert!(result.recommended_size > 0);
        assert!(result.capacity.max_flow >= result.design_flow);
    }

    #[test]
    fn zero_gradient_uses_slope_floor() {
        let flat = CulvertSizingInput {
            stream_gradient: 0.0,
            ..example_input()
        };
        let floored = CulvertSizingInput {
            stream_gradient: 0.5,
            ..example_input()
        };
        let a = compute_culvert_sizing(&flat).unwrap();
        let b = compute_culvert_sizing(&floored).unwrap();
        assert_eq!(a.culvert, b.culvert);
        assert_eq!(a.capacity, b.capacity);
    }

    #[test]
    fn oversized_catchment_is_capped_and_flagged() {
        let input = CulvertSizingInput {
            drainage_area: 1_000_000.0,
            stream_gradient: 0.5,
            stream_geometry: StreamGeometry::from_measurements(vec![1.2], 0.8, vec![0.6]),
            ..example_input()
        };
        let result = compute_culvert_sizing(&input).unwrap();
        assert_eq!(result.recommended_size, 3000);
        assert!(!result.capacity_sufficient);
        assert!(!result.transportable);
    }

    #[test]
    fn invalid_input_fails_before_estimation() {
        let input = CulvertSizingInput {
            drainage_area: -1.0,
            ..example_input()
        };
        let errors = compute_culvert_sizing(&input).unwrap_err();
        assert_eq!(errors.fields(), vec![InputField::DrainageArea]);
    }

    #[test]
    fn lookup_estimator_swaps_in() {
        let config = SizingConfig::default();
        let table = LookupTableEstimator::embedded().unwrap();
        let result = Sizer::new(&config, &table).compute(&example_input()).unwrap();
        // 0.5 km² Coastal breakpoint is 1.487 m³/s
        assert!(approx_eq(result.base_flow, 1.487, 1e-12));
        assert!(approx_eq(result.design_flow, 1.487 * 1.1, 1e-12));
    }

    #[test]
    fn custom_margin_changes_required_capacity() {
        let config = SizingConfig {
            capacity_margin: 1.5,
            ..SizingConfig::default()
        };
        let result = Sizer::new(&config, &PowerLawEstimator)
            .compute(&example_input())
            .unwrap();
        assert!(approx_eq(result.required_capacity, result.design_flow * 1.5, 1e-12));
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = compute_culvert_sizing(&example_input()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recommendedSize"], 2000);
        assert_eq!(json["method"], "Manning");
        assert_eq!(json["controllingFactor"], "outlet");
        assert_eq!(json["culvert"]["shape"], "box");
        assert_eq!(json["culvert"]["spanMm"], 2000);
    }
}
