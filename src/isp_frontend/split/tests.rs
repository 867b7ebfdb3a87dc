use crate::isp_frontend::common::error::{FrontendError, Result};
use crate::isp_frontend::common::geometry::Rect;
use crate::isp_frontend::config::SplitOverride;
use crate::isp_frontend::sensor::SensorTimingModel;
use crate::isp_frontend::split::solver::{split_from_band, split_from_override};
use crate::isp_frontend::split::{
    GeometryOracle, MODE_RULES, ModeDecision, ModeInputs, OracleInput, OracleOutput, OverlapBand,
    PipelineMode, SplitGeometrySolver, StripeEdge, SupportWindowOracle, evaluate_mode,
    evaluate_rules,
};
use crate::isp_frontend::stripe::{OutputPort, StatsEngine};
use crate::isp_frontend::test_utils::{WIDTH, frame_4208, sensor_4208, stats_grid};

fn inputs(required_clock_hz: u64) -> ModeInputs {
    ModeInputs {
        required_clock_hz,
        max_instance_clock_hz: 600_000_000,
        dual_threshold_hz: 480_000_000,
        dual_enabled: true,
        force_dual: false,
        force_single: false,
        camera_sharing_active: false,
        path_widths: vec![(OutputPort::Full, WIDTH, Some(4928))],
    }
}

fn rule_for(inputs: &ModeInputs) -> &'static str {
    evaluate_rules(MODE_RULES, inputs).1
}

struct FailingOracle;

impl GeometryOracle for FailingOracle {
    fn solve(&self, _input: &OracleInput<'_>) -> Result<OracleOutput> {
        Err(FrontendError::OracleFailure("solver rejected the request".into()))
    }
}

struct FixedBandOracle(OverlapBand);

impl GeometryOracle for FixedBandOracle {
    fn solve(&self, _input: &OracleInput<'_>) -> Result<OracleOutput> {
        Ok(OracleOutput::new(self.0, Vec::new()))
    }
}

#[test]
fn test_full_resolution_sensor_goes_dual() {
    let timing = SensorTimingModel::new(sensor_4208(), 16, 32);
    let required = timing.required_pixel_clock(WIDTH);
    assert!(required > 480_000_000);

    let inputs = inputs(required);
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Dual);
    assert_eq!(rule_for(&inputs), "clock_above_threshold");
}

#[test]
fn test_low_clock_stays_single() {
    let inputs = inputs(300_000_000);
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Single);
    assert_eq!(rule_for(&inputs), "default");
}

#[test]
fn test_dual_disabled_wins_over_everything() {
    let mut inputs = inputs(900_000_000);
    inputs.dual_enabled = false;
    inputs.force_dual = true;
    inputs.camera_sharing_active = true;
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Single);
    assert_eq!(rule_for(&inputs), "dual_disabled");
}

#[test]
fn test_force_dual_beats_sharing() {
    let mut inputs = inputs(100_000_000);
    inputs.force_dual = true;
    inputs.camera_sharing_active = true;
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Dual);
    assert_eq!(rule_for(&inputs), "force_dual");
}

#[test]
fn test_camera_sharing_prefers_single_when_it_fits() {
    let mut inputs = inputs(550_000_000);
    inputs.camera_sharing_active = true;
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Single);
    assert_eq!(rule_for(&inputs), "sharing_fits_single");

    inputs.required_clock_hz = 650_000_000;
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Dual);
    assert_eq!(rule_for(&inputs), "sharing_needs_dual");
}

#[test]
fn test_force_single_only_when_one_instance_suffices() {
    let mut inputs = inputs(550_000_000);
    inputs.force_single = true;
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Single);
    assert_eq!(rule_for(&inputs), "force_single");

    inputs.required_clock_hz = 700_000_000;
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Dual);
    assert_eq!(rule_for(&inputs), "clock_above_threshold");
}

#[test]
fn test_path_wider_than_single_limit_goes_dual() {
    let mut inputs = inputs(200_000_000);
    inputs.path_widths.push((OutputPort::FaceDetect, 2560, Some(1920)));
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Dual);
    assert_eq!(rule_for(&inputs), "path_too_wide");
}

#[test]
fn test_path_without_limit_never_forces_dual() {
    let mut inputs = inputs(200_000_000);
    inputs.path_widths = vec![(OutputPort::Ds4, 10_000, None)];
    assert_eq!(evaluate_mode(&inputs), PipelineMode::Single);
}

#[test]
fn test_mode_evaluation_is_pure() {
    let inputs = inputs(603_000_000);
    let first = evaluate_mode(&inputs);
    for _ in 0..8 {
        assert_eq!(evaluate_mode(&inputs), first);
    }
}

#[test]
fn test_empty_rule_table_falls_back_to_single() {
    assert_eq!(evaluate_rules(&[], &inputs(900_000_000)), (PipelineMode::Single, "no_rule"));
}

#[test]
fn test_mode_decision_is_terminal() {
    let mut decision = ModeDecision::default();
    assert_eq!(decision.mode(), None);

    assert_eq!(decision.decide(&inputs(603_000_000)), PipelineMode::Dual);
    assert_eq!(decision.decide(&inputs(100_000_000)), PipelineMode::Dual);
    assert_eq!(decision, ModeDecision::Decided(PipelineMode::Dual));
}

#[test]
fn test_override_split_at_midpoint() {
    let split = SplitOverride {
        offset: 0,
        left_padding: 16,
        right_padding: 16,
    };
    let params = split_from_override(WIDTH, &split).unwrap();
    assert_eq!(params.split_point, 2104);
    assert_eq!(params.left_stripe_width(), 2120);
    assert_eq!(params.right_stripe_width(), 2120);
    assert_eq!(params.right_stripe_start(), 2088);
    assert_eq!(params.overlap(), 32);
    assert!((params.ratio() - 0.5).abs() < 1e-9);
}

#[test]
fn test_override_split_outside_frame_is_invalid() {
    let split = SplitOverride {
        offset: 2100,
        left_padding: 16,
        right_padding: 16,
    };
    assert!(matches!(
        split_from_override(WIDTH, &split),
        Err(FrontendError::InvalidArgument(_))
    ));
}

#[test]
fn test_band_keeps_natural_midpoint_when_inside() {
    let band = OverlapBand {
        right_stripe_start: 2078,
        left_stripe_end: 2199,
    };
    let params = split_from_band(WIDTH, band).unwrap();
    assert_eq!(params.split_point, 2104);
    assert_eq!(params.left_padding, 26);
    assert_eq!(params.right_padding, 96);
}

#[test]
fn test_band_midpoint_used_when_natural_split_outside() {
    let band = OverlapBand {
        right_stripe_start: 2000,
        left_stripe_end: 2050,
    };
    let params = split_from_band(WIDTH, band).unwrap();
    assert_eq!(params.split_point, 2025);
    assert_eq!(params.left_padding, 25);
    assert_eq!(params.right_padding, 26);
}

#[test]
fn test_inverted_band_is_oracle_failure() {
    let band = OverlapBand {
        right_stripe_start: 2300,
        left_stripe_end: 2200,
    };
    assert!(matches!(
        split_from_band(WIDTH, band),
        Err(FrontendError::OracleFailure(_))
    ));
}

#[test]
fn test_band_outside_frame_is_oracle_failure() {
    let band = OverlapBand {
        right_stripe_start: -10,
        left_stripe_end: 30,
    };
    assert!(matches!(
        split_from_band(WIDTH, band),
        Err(FrontendError::OracleFailure(_))
    ));
}

#[test]
fn test_oracle_failure_propagates() {
    let oracle = FailingOracle;
    let result = SplitGeometrySolver::new(&oracle, None).compute_split_parameters(&frame_4208());
    assert!(matches!(result, Err(FrontendError::OracleFailure(_))));
}

#[test]
fn test_override_skips_the_oracle() {
    let oracle = FailingOracle;
    let split = SplitOverride {
        offset: 0,
        left_padding: 16,
        right_padding: 16,
    };
    let solution = SplitGeometrySolver::new(&oracle, Some(split))
        .compute_split_parameters(&frame_4208())
        .unwrap();
    assert_eq!(solution.params.split_point, 2104);
    assert!(solution.oracle_output.is_none());
}

#[test]
fn test_solver_keeps_oracle_output() {
    let band = OverlapBand {
        right_stripe_start: 2088,
        left_stripe_end: 2119,
    };
    let oracle = FixedBandOracle(band);
    let solution = SplitGeometrySolver::new(&oracle, None)
        .compute_split_parameters(&frame_4208())
        .unwrap();
    assert_eq!(solution.params.overlap(), 32);
    assert_eq!(solution.oracle_output.map(|o| o.band), Some(band));
}

#[test]
fn test_too_narrow_frame_cannot_split() {
    let mut frame = frame_4208();
    frame.camif_crop.width = 1;
    let oracle = SupportWindowOracle::default();
    assert!(matches!(
        SplitGeometrySolver::new(&oracle, None).compute_split_parameters(&frame),
        Err(FrontendError::InvalidArgument(_))
    ));
}

#[test]
fn test_support_window_band_covers_filters_and_stats() {
    let oracle = SupportWindowOracle::default();
    let solution = SplitGeometrySolver::new(&oracle, None)
        .compute_split_parameters(&frame_4208())
        .unwrap();
    let params = solution.params;
    assert_eq!(params.split_point, 2104);
    assert_eq!(params.left_padding, 26);
    assert_eq!(params.right_padding, 26);

    let output = solution.oracle_output.unwrap();
    let left = output.stripe(StripeEdge::Left).unwrap();
    let right = output.stripe(StripeEdge::Right).unwrap();
    assert_eq!(left.first_pixel, 0);
    assert_eq!(left.last_pixel + 1, params.left_stripe_width());
    assert_eq!(right.first_pixel, params.right_stripe_start());
    assert_eq!(right.last_pixel, WIDTH - 1);
}

#[test]
fn test_support_window_widens_for_straddling_grid() {
    let oracle = SupportWindowOracle::default();
    let mut frame = frame_4208();
    // Region 5 covers [2000, 2200)
    frame.stats[2] = stats_grid(StatsEngine::Bf, Rect::new(1000, 500, 2000, 1000), 10, 5);
    let solution = SplitGeometrySolver::new(&oracle, None)
        .compute_split_parameters(&frame)
        .unwrap();
    assert_eq!(solution.params.split_point, 2104);
    assert_eq!(solution.params.right_padding, 96);
    let bf = solution
        .oracle_output
        .unwrap()
        .stripe(StripeEdge::Left)
        .unwrap()
        .stats
        .iter()
        .find(|s| s.engine == StatsEngine::Bf)
        .cloned()
        .unwrap();
    assert_eq!(bf.horizontal_regions, 6);
}

#[test]
fn test_computed_split_overlap_identity() {
    let oracle = SupportWindowOracle::default();
    let mut frame = frame_4208();
    for support in [0u32, 3, 17, 64] {
        frame.filters[0].horizontal_support = support;
        let params = SplitGeometrySolver::new(&oracle, None)
            .compute_split_parameters(&frame)
            .unwrap()
            .params;
        assert_eq!(
            params.left_stripe_width() + params.right_stripe_width(),
            params.total_width + params.overlap()
        );
        assert!(params.split_point > 0 && params.split_point < params.total_width);
    }
}

#[test]
fn test_minimum_padding_without_filters() {
    let oracle = SupportWindowOracle::default();
    let mut frame = frame_4208();
    frame.filters.clear();
    frame.stats.clear();
    let params = SplitGeometrySolver::new(&oracle, None)
        .compute_split_parameters(&frame)
        .unwrap()
        .params;
    assert_eq!(params.left_padding, 16);
    assert_eq!(params.right_padding, 16);
}

#[test]
fn test_empty_stats_grid_is_infeasible() {
    let oracle = SupportWindowOracle::default();
    let mut frame = frame_4208();
    frame.stats[1].horizontal_regions = 0;
    assert!(matches!(
        SplitGeometrySolver::new(&oracle, None).compute_split_parameters(&frame),
        Err(FrontendError::OracleFailure(_))
    ));
}

#[test]
fn test_duplicate_stripe_records_rejected() {
    let oracle = SupportWindowOracle::default();
    let frame = frame_4208();
    let input = OracleInput {
        frame_width: WIDTH,
        frame_height: frame.camif_crop.height,
        filters: &frame.filters,
        stats: &frame.stats,
        paths: &frame.paths,
    };
    let output = oracle.solve(&input).unwrap();
    let left = output.stripe(StripeEdge::Left).unwrap().clone();
    let doubled = OracleOutput::new(output.band, vec![left.clone(), left]);
    assert!(matches!(
        doubled.stripe(StripeEdge::Left),
        Err(FrontendError::OracleFailure(_))
    ));
    assert!(doubled.stripe(StripeEdge::Right).is_err());
}
