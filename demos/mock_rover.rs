//! Desktop demo: a full voice-to-search round trip on mock hardware.
//!
//! Feeds a couple of recognizer transcript lines through the speech
//! parser, runs a search session for each accepted command, and prints
//! the reports. Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example mock_rover
//! ```

use anyhow::{Context, Result};
use trackbot::{
    hal::{MockDetector, MockFrameSource, MockLine},
    parse_command, CancellationToken, Config, DriveUnit, PwmChannel, Rover, SensorArray,
};

fn sensor_line(detecting: bool) -> MockLine {
    let line = MockLine::new();
    // Active-low: high means no line under the sensor
    line.set_input(!detecting);
    line
}

fn build_rover(config: Config) -> Rover<MockLine, MockFrameSource, MockDetector> {
    let mk = MockLine::new;
    let pwm_a = PwmChannel::start(mk(), config.pwm.frequency_hz, config.pwm.initial_duty);
    let pwm_b = PwmChannel::start(mk(), config.pwm.frequency_hz, config.pwm.initial_duty);
    let drive = DriveUnit::new(
        (mk(), mk()),
        (mk(), mk()),
        pwm_a,
        pwm_b,
        config.tracking.cruise_speed,
    );

    // Line under the two inner sensors: the tracker will drive straight
    let sensors = SensorArray::new(
        sensor_line(false),
        sensor_line(true),
        sensor_line(true),
        sensor_line(false),
    );

    // Scripted vision: two misses, then enough hits to confirm a hammer
    let mut frames = MockFrameSource::new();
    frames.queue_blank_frames(16);
    let mut detector = MockDetector::new();
    detector.push_frame_labels(&[]);
    detector.push_frame_labels(&["pliers"]);
    for _ in 0..config.search.confirmation_threshold {
        detector.push_frame_labels(&["hammer", "pliers"]);
    }

    Rover::new(drive, sensors, frames, detector, config)
}

fn main() -> Result<()> {
    env_logger::init();

    let transcripts = [
        "小车待命",            // no marker: ignored
        "识别成功:去找锤子",   // marker + "锤子": search for hammer
    ];

    let mut rover = build_rover(Config::default());
    let cancel = CancellationToken::new();

    for line in transcripts {
        let Some(target) = parse_command(line) else {
            println!("ignored: {line:?}");
            continue;
        };
        println!("command accepted: {line:?} -> target '{target}'");

        let report = rover
            .run_session(target, &cancel)
            .context("search session failed")?;
        println!("{report}");
    }

    rover.shutdown().context("shutdown failed")?;
    Ok(())
}
