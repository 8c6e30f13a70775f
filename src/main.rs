//! Gait Sensing Engine
//!
//! Standalone demo: feeds a synthetic walking sequence through the engine and
//! prints the resulting events and gait parameters.
//!
//! Usage: `gait-sensing [config.toml]`. Set `RUST_LOG=debug` to see every
//! detected event.

use std::env;
use std::f32::consts::PI;
use std::process::ExitCode;

use gait_sensing::{EngineConfig, Foot, GaitEngine, Keypoint, Landmark, Pose};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FRAME_INTERVAL_MS: u64 = 100;
const DURATION_MS: u64 = 10_000;

/// Walker at 150 px/m: 1 Hz stride, ankles bobbing in antiphase, drifting right.
fn walking_pose(t_ms: u64) -> Pose {
    let t = t_ms as f32 / 1000.0;
    let swing = 20.0 * (2.0 * PI * t).sin();
    let drift = 100.0 * t;

    Pose::default()
        .with(Landmark::LeftShoulder, Keypoint::new(266.25 + drift, 150.0, 0.95))
        .with(Landmark::RightShoulder, Keypoint::new(333.75 + drift, 150.0, 0.95))
        .with(Landmark::LeftHip, Keypoint::new(273.75 + drift, 240.0, 0.9))
        .with(Landmark::RightHip, Keypoint::new(326.25 + drift, 240.0, 0.9))
        .with(Landmark::LeftKnee, Keypoint::new(280.0 + drift, 320.0, 0.9))
        .with(Landmark::RightKnee, Keypoint::new(320.0 + drift, 320.0, 0.9))
        .with(Landmark::LeftAnkle, Keypoint::new(270.0 + drift, 400.0 + swing, 0.9))
        .with(Landmark::RightAnkle, Keypoint::new(315.0 + drift, 400.0 - swing, 0.9))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(%path, error = %e, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let mut engine = GaitEngine::new(config);

    match engine.auto_calibrate(&walking_pose(0)) {
        Some(calibration) => info!(pixels_per_meter = calibration.pixels_per_meter, "auto-calibrated"),
        None => info!("auto-calibration unavailable, spatial metrics will be zero"),
    }

    let mut event_total = 0;
    for t_ms in (0..DURATION_MS).step_by(FRAME_INTERVAL_MS as usize) {
        event_total += engine.add_pose(&walking_pose(t_ms), t_ms).len();
    }

    let params = engine.calculate_gait_parameters();
    let phase = engine.gait_phase();

    println!("Gait Sensing Engine v{}", env!("CARGO_PKG_VERSION"));
    println!("Frames buffered: {}, events detected: {}", engine.frame_count(), event_total);
    println!("Cadence:        {:.1} steps/min", params.cadence);
    println!("Stride length:  {:.2} m", params.stride_length);
    println!("Velocity:       {:.2} m/s", params.velocity);
    println!("Step width:     {:.2} m", params.step_width);
    println!("Stride time:    {:.2} s (stance {:.2} s, swing {:.2} s)", params.stride_time, params.stance_time, params.swing_time);
    println!("Symmetry:       {:.1} %", params.symmetry_index);
    println!("Confidence:     {:.2}", params.confidence);
    for foot in Foot::BOTH {
        let p = phase.foot(foot);
        println!("Phase ({:?}):   {:?} ({:.0}%)", foot, p.label, p.progress * 100.0);
    }
    println!("Double support: {}", phase.is_double_support());

    ExitCode::SUCCESS
}
