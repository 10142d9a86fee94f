//! Headless grass simulation driver
//!
//! Places a jittered field of blades, orbits a camera around it and runs the
//! simulate/cull/compact dispatch once per tick.
//!
//! Usage:
//!     simulate_grass [OPTIONS]
//!
//! Options:
//!     -n, --blades <N>             Number of blades (default: 4096)
//!     -t, --ticks <N>              Number of dispatches (default: 120)
//!     --dt <SECONDS>               Fixed time step (default: 0.016667)
//!     --seed <SEED>                Placement seed (default: 12345)
//!     -c, --config <PATH>          Load settings from JSON
//!     --write-config <PATH>        Write default settings to JSON and exit
//!     -h, --help                   Show this help message

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use rktri_grass::core::camera::Camera;
use rktri_grass::core::time::FixedStepClock;
use rktri_grass::core::types::Vec3;
use rktri_grass::grass::{Blade, DispatchStats, GrassConfig, GrassSystem};

fn print_help() {
    eprintln!("simulate_grass - Headless grass simulation driver");
    eprintln!();
    eprintln!("Usage: simulate_grass [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -n, --blades <N>             Number of blades (default: 4096)");
    eprintln!("    -t, --ticks <N>              Number of dispatches (default: 120)");
    eprintln!("    --dt <SECONDS>               Fixed time step (default: 0.016667)");
    eprintln!("    --seed <SEED>                Placement seed (default: 12345)");
    eprintln!("    -c, --config <PATH>          Load settings from JSON");
    eprintln!("    --write-config <PATH>        Write default settings to JSON and exit");
    eprintln!("    -h, --help                   Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    RUST_LOG=debug simulate_grass -n 100000 -t 60");
}

#[derive(Debug)]
struct Args {
    blades: usize,
    ticks: u32,
    dt: f32,
    seed: u32,
    config: Option<PathBuf>,
    write_config: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut parsed = Args {
        blades: 4096,
        ticks: 120,
        dt: 1.0 / 60.0,
        seed: 12345,
        config: None,
        write_config: None,
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "-h" || flag == "--help" {
            print_help();
            std::process::exit(0);
        }
        i += 1;
        let value = args
            .get(i)
            .ok_or_else(|| format!("Missing value for {}", flag))?;
        match flag {
            "-n" | "--blades" => {
                parsed.blades = value
                    .parse()
                    .map_err(|_| format!("Invalid blade count: {}", value))?;
            }
            "-t" | "--ticks" => {
                parsed.ticks = value
                    .parse()
                    .map_err(|_| format!("Invalid tick count: {}", value))?;
            }
            "--dt" => {
                parsed.dt = value
                    .parse()
                    .map_err(|_| format!("Invalid time step: {}", value))?;
            }
            "--seed" => {
                parsed.seed = value
                    .parse()
                    .map_err(|_| format!("Invalid seed: {}", value))?;
            }
            "-c" | "--config" => parsed.config = Some(PathBuf::from(value)),
            "--write-config" => parsed.write_config = Some(PathBuf::from(value)),
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(parsed)
}

/// Integer hash producing a value in [0, 1].
fn hash_2d(ix: u32, iz: u32, seed: u32) -> f32 {
    let mut h = ix.wrapping_mul(374761393)
        .wrapping_add(iz.wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1274126177));
    h = (h ^ (h >> 13)).wrapping_mul(1103515245);
    h = h ^ (h >> 16);
    (h & 0x7FFFFFFF) as f32 / 0x7FFFFFFF_u32 as f32
}

/// Lay blades on a square grid with 0.25m spacing, jittered per cell.
fn place_blades(count: usize, seed: u32) -> Vec<Blade> {
    let side = (count as f32).sqrt().ceil().max(1.0) as usize;
    let spacing = 0.25;
    let half = side as f32 * spacing * 0.5;

    (0..count)
        .map(|i| {
            let (ix, iz) = ((i % side) as u32, (i / side) as u32);
            let jx = hash_2d(ix, iz, seed) - 0.5;
            let jz = hash_2d(ix, iz, seed ^ 0x9E3779B9) - 0.5;
            let root = Vec3::new(
                ix as f32 * spacing - half + jx * spacing,
                0.0,
                iz as f32 * spacing - half + jz * spacing,
            );
            let orientation = hash_2d(ix, iz, seed.wrapping_add(1)) * std::f32::consts::TAU;
            let height = 0.6 + hash_2d(ix, iz, seed.wrapping_add(2)) * 0.8;
            let stiffness = 0.4 + hash_2d(ix, iz, seed.wrapping_add(3)) * 0.5;
            Blade::at_rest(root, Vec3::Y, orientation, height, 0.04, stiffness)
        })
        .collect()
}

fn main() {
    rktri_grass::core::logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.write_config {
        if let Err(e) = GrassConfig::default().save(path) {
            eprintln!("Failed to write {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("Wrote default config to {}", path.display());
        return;
    }

    let config = match &args.config {
        Some(path) => match GrassConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring {}: {}", path.display(), e);
                GrassConfig::default()
            }
        },
        None => GrassConfig::default(),
    };

    let blades = place_blades(args.blades, args.seed);
    let mut system = match GrassSystem::new(blades, config) {
        Ok(system) => system,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut clock = FixedStepClock::new(args.dt);
    let radius = (args.blades as f32).sqrt() * 0.25;
    let mut totals = DispatchStats::default();
    let start = Instant::now();

    for _ in 0..args.ticks {
        let time = clock.tick();
        let angle = time.total * 0.2;
        let eye = Vec3::new(angle.cos() * radius, 2.5, angle.sin() * radius);
        let camera = Camera::look_at(eye, Vec3::ZERO, Vec3::Y);

        let stats = system.dispatch(&camera.matrices(), time);
        totals.survivors += stats.survivors;
        totals.distance_culled += stats.distance_culled;
        totals.orientation_culled += stats.orientation_culled;
        totals.frustum_culled += stats.frustum_culled;
        totals.simulated += stats.simulated;
    }

    let elapsed = start.elapsed();
    let ticks = args.ticks.max(1) as f64;
    log::info!(
        "{} ticks over {} blades in {:.2}s ({:.2}ms/tick)",
        args.ticks,
        system.len(),
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1000.0 / ticks
    );
    log::info!(
        "Average per tick: {:.0} visible, {:.0} distance, {:.0} orientation, {:.0} frustum",
        totals.survivors as f64 / ticks,
        totals.distance_culled as f64 / ticks,
        totals.orientation_culled as f64 / ticks,
        totals.frustum_culled as f64 / ticks
    );
    println!("Final draw args: {:?}", system.draw_args());
}
