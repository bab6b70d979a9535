//! Posture Session Simulation
//!
//! Generates synthetic landmark frames for testing posture-guard without a
//! camera. Walks through a scripted session:
//! - Calibration on an upright pose
//! - Upright work
//! - Slouching (head tilted down)
//! - Leaning toward the screen
//! - Head and shoulders tilted sideways
//! - Recovery
//!
//! Each phase adds Gaussian jitter to the pose. Frames go to stdout as JSON
//! client messages, one per line; the phase log goes to stderr.
//!
//! # Usage
//! ```bash
//! ./simulation --speed 0 | ./posture-guard --stdin
//! ```

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::io::{self, Write};
use std::time::Duration;

use posture_guard::protocol::ClientMessage;
use posture_guard::synthetic::{SyntheticFrameBuilder, SyntheticPose};

// ============================================================================
// Pose Constants
// ============================================================================

/// Upright viewing distance (cm)
const BASE_DISTANCE_CM: f64 = 60.0;
/// Slouch pitch (deg, negative = looking down)
const SLOUCH_PITCH: f64 = -22.0;
/// Leaning-forward distance (cm)
const LEAN_DISTANCE_CM: f64 = 45.0;
/// Sideways head roll (deg)
const TILT_ROLL: f64 = 20.0;
/// Shoulder tilt while leaning sideways (deg)
const TILT_SHOULDERS: f64 = 14.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "posture-simulation")]
#[command(about = "Synthetic landmark frames for posture-guard testing")]
#[command(version)]
struct Args {
    /// Seconds spent in each phase
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=3600))]
    phase_secs: u32,

    /// Frames per simulated second
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=60))]
    fps: u32,

    /// Time compression (1 = real-time, 0 = no delay)
    #[arg(short, long, default_value = "1")]
    speed: u32,

    /// Frame size in pixels
    #[arg(long, default_value = "640")]
    width: u32,
    #[arg(long, default_value = "480")]
    height: u32,

    /// Pose jitter standard deviation (deg / cm)
    #[arg(long, default_value = "0.6")]
    jitter: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the phase log on stderr
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Simulation Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Upright,
    Slouch,
    LeanForward,
    SideTilt,
    Recovery,
}

impl Phase {
    const SCRIPT: [Self; 5] = [
        Self::Upright,
        Self::Slouch,
        Self::LeanForward,
        Self::SideTilt,
        Self::Recovery,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Upright => "Upright (calibrated posture)",
            Self::Slouch => "Slouching (head tilted down)",
            Self::LeanForward => "Leaning toward the screen",
            Self::SideTilt => "Head and shoulders tilted sideways",
            Self::Recovery => "Recovery (back to upright)",
        }
    }

    fn pose(self) -> SyntheticPose {
        let upright = SyntheticPose::upright(BASE_DISTANCE_CM).with_shoulders(0.0);
        match self {
            Self::Upright | Self::Recovery => upright,
            Self::Slouch => SyntheticPose {
                pitch: SLOUCH_PITCH,
                ..upright
            },
            Self::LeanForward => SyntheticPose {
                distance_cm: LEAN_DISTANCE_CM,
                ..upright
            },
            Self::SideTilt => SyntheticPose {
                roll: TILT_ROLL,
                shoulder_tilt: Some(TILT_SHOULDERS),
                ..upright
            },
        }
    }
}

// ============================================================================
// Simulation State
// ============================================================================

struct Simulation {
    rng: StdRng,
    noise: Normal<f64>,
    builder: SyntheticFrameBuilder,
    clock_ms: i64,
    frame_interval_ms: i64,
    frames_generated: u64,
}

impl Simulation {
    fn new(args: &Args) -> Result<Self> {
        let rng = match args.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let noise = Normal::new(0.0, args.jitter.abs())
            .map_err(|e| anyhow!("Invalid jitter {}: {}", args.jitter, e))?;
        Ok(Self {
            rng,
            noise,
            builder: SyntheticFrameBuilder::new(args.width, args.height),
            clock_ms: Utc::now().timestamp_millis(),
            frame_interval_ms: 1000 / i64::from(args.fps),
            frames_generated: 0,
        })
    }

    fn jittered(&mut self, pose: SyntheticPose) -> SyntheticPose {
        let mut sample = || self.noise.sample(&mut self.rng);
        SyntheticPose {
            pitch: pose.pitch + sample(),
            yaw: pose.yaw + sample(),
            roll: pose.roll + sample(),
            distance_cm: (pose.distance_cm + sample()).max(10.0),
            shoulder_tilt: pose.shoulder_tilt.map(|t| t + sample()),
        }
    }

    fn next_frame(&mut self, phase: Phase) -> ClientMessage {
        let pose = self.jittered(phase.pose());
        let frame = self.builder.build_at(&pose, self.clock_ms);
        self.clock_ms += self.frame_interval_ms;
        self.frames_generated += 1;
        ClientMessage::Frame { frame }
    }
}

fn emit(out: &mut impl Write, message: &ClientMessage) -> Result<()> {
    serde_json::to_writer(&mut *out, message)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let mut sim = Simulation::new(&args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let frame_delay = (args.speed > 0)
        .then(|| Duration::from_millis(1000 / u64::from(args.fps) / u64::from(args.speed)));
    let frames_per_phase = u64::from(args.phase_secs) * u64::from(args.fps);

    // Calibrate on a clean upright frame before anything else
    let calibration = sim
        .builder
        .build_at(&Phase::Upright.pose(), sim.clock_ms);
    emit(&mut out, &ClientMessage::Calibrate {
        frame: Some(calibration),
    })?;

    for phase in Phase::SCRIPT {
        if !args.quiet {
            eprintln!("[simulation] Phase: {} ({}s)", phase.name(), args.phase_secs);
        }
        for _ in 0..frames_per_phase {
            let message = sim.next_frame(phase);
            emit(&mut out, &message)?;
            if let Some(delay) = frame_delay {
                std::thread::sleep(delay);
            }
        }
    }

    emit(&mut out, &ClientMessage::GetStatistics)?;
    if !args.quiet {
        eprintln!("[simulation] Done: {} frames", sim.frames_generated);
    }
    Ok(())
}
