//! Strange Attractors CLI - Run a headless attractor simulation.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use strange_attractors::{
    compute::{PoolStats, SimulationScheduler, StepReport},
    schema::{ControlBinding, ControlMap, FamilyId, PlatformBudget},
};

/// Nominal display refresh interval.
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        let family = args.get(2).map(String::as_str).unwrap_or("lorenz");
        print_example_controls(family);
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <family> [frames] [controls.json]", args[0]);
        eprintln!();
        eprintln!("Run a strange attractor particle simulation without rendering.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  family         One of: {}", family_list());
        eprintln!("  frames         Number of frames to simulate (default: 600)");
        eprintln!("  controls.json  Optional control map (partial maps are fine)");
        eprintln!();
        eprintln!("Example controls are printed with --example <family>.");
        std::process::exit(1);
    }

    let family = &args[1];
    let frames: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(600);

    // Load controls
    let controls: ControlMap = match args.get(3) {
        Some(path) => {
            let path = PathBuf::from(path);
            let text = fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("Error reading controls file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&text).unwrap_or_else(|e| {
                eprintln!("Error parsing controls: {}", e);
                std::process::exit(1);
            })
        }
        None => ControlMap::new(),
    };

    let mut scheduler = SimulationScheduler::new(PlatformBudget::desktop());
    if let Err(e) = scheduler.start(family, &controls) {
        eprintln!("Error: {}", e);
        eprintln!("Known families: {}", family_list());
        std::process::exit(1);
    }

    let Some(config) = scheduler.config().cloned() else {
        eprintln!("Error: simulation did not start");
        std::process::exit(1);
    };

    println!("Strange Attractor Simulation");
    println!("============================");
    println!("Family: {}", family);
    if let Some(params) = scheduler.parameters() {
        println!("Coefficients: {:?}", params.values());
    }
    println!("Particles: {}", config.particle_count);
    println!("Speed: {}x ({:?})", config.integration_speed, config.method);
    println!("Frames: {}", frames);
    println!();

    if let Some(stats) = scheduler.stats() {
        println!("Initial state:");
        print_stats(&stats);
        println!();
    }

    // Run simulation
    println!("Running simulation...");
    let start = Instant::now();
    let mut total = StepReport::default();

    for i in 0..frames {
        let Some(report) = scheduler.on_frame(FRAME_DT) else {
            break;
        };
        total.merge(&report.step);

        // Print progress every 10%
        if (i + 1) % (frames / 10).max(1) == 0 {
            let elapsed = start.elapsed().as_secs_f32();
            let frames_per_sec = (i + 1) as f32 / elapsed;
            let radius = scheduler.stats().map_or(0.0, |s| s.mean_radius);
            println!(
                "  Frame {}/{}: mean radius={:.4}, reseeded={}, {:.1} frames/s",
                i + 1,
                frames,
                radius,
                total.reseeded,
                frames_per_sec
            );
        }
    }

    let elapsed = start.elapsed();

    println!();
    if let Some(stats) = scheduler.stats() {
        println!("Final state:");
        print_stats(&stats);
        println!();
    }
    println!(
        "Reseeds: {} ({} non-finite, {} out of bounds)",
        total.reseeded, total.non_finite, total.out_of_bounds
    );
    println!(
        "Time: {:.2}s ({:.1} frames/s)",
        elapsed.as_secs_f32(),
        frames as f32 / elapsed.as_secs_f32()
    );

    scheduler.teardown();
}

fn print_stats(stats: &PoolStats) {
    println!(
        "  Centroid: ({:.4}, {:.4}, {:.4})",
        stats.centroid[0], stats.centroid[1], stats.centroid[2]
    );
    println!(
        "  Radius: mean {:.4}, max {:.4}",
        stats.mean_radius, stats.max_radius
    );
    println!("  Non-finite: {}", stats.non_finite);
}

fn family_list() -> String {
    FamilyId::ALL
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_example_controls(family: &str) {
    let family: FamilyId = match family.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let bound = ControlBinding::new(PlatformBudget::desktop()).bind(family, &ControlMap::new());
    match serde_json::to_string_pretty(&bound.to_control_map()) {
        Ok(json) => {
            println!("Example controls for {} (controls.json):", family);
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing controls: {}", e);
            std::process::exit(1);
        }
    }
}
