//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::CaptureBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

use super::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    simulator: SimulatorInfo,
    fleet: FleetInfo,
    camera: CameraInfo,
    output_pattern: String,
    capture: CaptureInfo,
}

#[derive(Serialize)]
struct SimulatorInfo {
    host: String,
    port: u16,
    timeout_secs: f64,
    synchronous_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed_delta_seconds: Option<f64>,
}

#[derive(Serialize)]
struct FleetInfo {
    vehicle_count: usize,
    speed: f64,
    blueprint_filter: String,
}

#[derive(Serialize)]
struct CameraInfo {
    blueprint: String,
    tune_period_ms: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct CaptureInfo {
    queue_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_ticks: Option<u64>,
    teardown: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = ?args.config, "Loading configuration info");

    let blueprint = load_blueprint(args.config.as_deref())?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

/// Camera attributes and exposure merged, sorted by key
fn camera_attributes(blueprint: &CaptureBlueprint) -> BTreeMap<String, String> {
    let camera = &blueprint.camera;
    camera
        .attributes
        .to_attribute_map()
        .into_iter()
        .chain(camera.exposure.to_attribute_map())
        .collect()
}

fn build_config_info(blueprint: &CaptureBlueprint, args: &InfoArgs) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        simulator: SimulatorInfo {
            host: blueprint.simulator.host.clone(),
            port: blueprint.simulator.port,
            timeout_secs: blueprint.simulator.timeout_secs,
            synchronous_mode: blueprint.world.synchronous_mode,
            fixed_delta_seconds: blueprint.world.fixed_delta_seconds,
        },
        fleet: FleetInfo {
            vehicle_count: blueprint.fleet.vehicle_count,
            speed: blueprint.fleet.speed,
            blueprint_filter: blueprint.fleet.blueprint_filter.clone(),
        },
        camera: CameraInfo {
            blueprint: blueprint.camera.blueprint.clone(),
            tune_period_ms: blueprint.camera.tune_period_ms,
            attributes: if args.camera {
                camera_attributes(blueprint)
            } else {
                BTreeMap::new()
            },
        },
        output_pattern: output_pattern(blueprint),
        capture: CaptureInfo {
            queue_timeout_ms: blueprint.capture.queue_timeout_ms,
            max_ticks: blueprint.capture.max_ticks,
            teardown: format!("{:?}", blueprint.capture.teardown),
        },
    }
}

fn output_pattern(blueprint: &CaptureBlueprint) -> String {
    format!(
        "{}/{}_{}/camera_<i>_folder/image_<i>_<frame>.png",
        blueprint.output.root.display(),
        blueprint.output.timestamp_format,
        blueprint.output.run_label
    )
}

fn print_config_info(blueprint: &CaptureBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               CARLA Capture Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Simulator");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ CARLA Server: {}:{}",
        blueprint.simulator.host, blueprint.simulator.port
    );
    println!("   ├─ Synchronous: {}", blueprint.world.synchronous_mode);
    match blueprint.world.fixed_delta_seconds {
        Some(delta) => println!("   └─ Fixed delta: {delta}s"),
        None => println!("   └─ Fixed delta: variable"),
    }

    println!("\n🚗 Fleet");
    println!("   ├─ Vehicles: {}", blueprint.fleet.vehicle_count);
    println!("   ├─ Blueprint filter: {}", blueprint.fleet.blueprint_filter);
    println!("   └─ Speed: {} m/s", blueprint.fleet.speed);

    println!("\n📷 Camera (one per vehicle)");
    println!("   ├─ Blueprint: {}", blueprint.camera.blueprint);
    println!("   ├─ Mount: {}", blueprint.camera.transform.location);
    if args.camera {
        println!("   ├─ Re-applied every {} ms", blueprint.camera.tune_period_ms);
        let attributes = camera_attributes(blueprint);
        let last = attributes.len().saturating_sub(1);
        for (i, (key, value)) in attributes.iter().enumerate() {
            let prefix = if i == last { "└─" } else { "├─" };
            println!("   {} {} = {}", prefix, key, value);
        }
    } else {
        println!(
            "   └─ {}x{} @ {}s",
            blueprint.camera.attributes.image_size_x,
            blueprint.camera.attributes.image_size_y,
            blueprint.camera.attributes.sensor_tick
        );
    }

    println!("\n💾 Output");
    println!("   └─ {}", output_pattern(blueprint));

    println!("\n⚙️  Capture");
    println!(
        "   ├─ Queue timeout: {} ms",
        blueprint.capture.queue_timeout_ms
    );
    match blueprint.capture.max_ticks {
        Some(n) => println!("   ├─ Max ticks: {n}"),
        None => println!("   ├─ Max ticks: until interrupted"),
    }
    println!("   └─ Teardown: {:?}", blueprint.capture.teardown);
    println!();
}
