/// Basic usage example: feed pose keypoints, get gait events and parameters
use gait_sensing::{CalibrationData, EngineConfig, GaitEngine, NamedKeypoint, DEFAULT_EVENT_WINDOW_MS};

/// One frame of estimator output for a walker with a 1 Hz stride.
fn estimator_frame(t_ms: u64) -> Vec<NamedKeypoint> {
    let t = t_ms as f32 / 1000.0;
    let swing = 20.0 * (2.0 * std::f32::consts::PI * t).sin();
    let drift = 80.0 * t;

    vec![
        NamedKeypoint::new("nose", 215.0 + drift, 60.0, 0.98),
        NamedKeypoint::new("left_knee", 200.0 + drift, 300.0, 0.92),
        NamedKeypoint::new("right_knee", 230.0 + drift, 300.0, 0.91),
        NamedKeypoint::new("left_ankle", 200.0 + drift, 400.0 + swing, 0.88),
        NamedKeypoint::new("right_ankle", 230.0 + drift, 400.0 - swing, 0.87),
    ]
}

fn main() {
    println!("=== Gait Sensing Engine: Basic Example ===\n");

    // Default config: 300-frame history, 30-frame warm-up
    let mut engine = GaitEngine::new(EngineConfig::default());

    // Subject filmed at ~120 px per meter from a tripod at hip height
    let calibration = CalibrationData::new(120.0)
        .with_reference_height(1.75)
        .with_camera(0.9, 0.0);
    if let Err(e) = engine.calibrate(calibration) {
        eprintln!("calibration rejected: {e}");
        return;
    }

    println!("Processing 8 seconds of keypoints at 10 fps...\n");

    for t_ms in (0..8_000).step_by(100) {
        for event in engine.add_named_keypoints(&estimator_frame(t_ms), t_ms) {
            println!(
                "  [{:>5} ms] {:?} {:?} at ({:.0}, {:.0})",
                event.timestamp_ms, event.foot, event.event_type, event.position.x, event.position.y
            );
        }
    }

    let params = engine.calculate_gait_parameters();
    println!("\nGait parameters:");
    println!("  Cadence:       {:.1} steps/min", params.cadence);
    println!("  Stride length: {:.2} m", params.stride_length);
    println!("  Velocity:      {:.2} m/s", params.velocity);
    println!("  Stance/swing:  {:.2} s / {:.2} s", params.stance_time, params.swing_time);
    println!("  Symmetry:      {:.1} %", params.symmetry_index);
    println!("  Confidence:    {:.2}", params.confidence);

    let phase = engine.gait_phase();
    println!(
        "\nCurrent phase: left {:?} ({:.0}%), right {:?} ({:.0}%)",
        phase.left.label,
        phase.left.progress * 100.0,
        phase.right.label,
        phase.right.progress * 100.0
    );
    println!(
        "Events in the last {} s: {}",
        DEFAULT_EVENT_WINDOW_MS / 1000,
        engine.recent_events(DEFAULT_EVENT_WINDOW_MS).len()
    );
}
