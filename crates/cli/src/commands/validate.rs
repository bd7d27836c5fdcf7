//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CaptureBlueprint, TeardownPolicy};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    simulator: String,
    vehicle_count: usize,
    camera_blueprint: String,
    image_size: (u32, u32),
    output_root: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    simulator: format!(
                        "{}:{}",
                        blueprint.simulator.host, blueprint.simulator.port
                    ),
                    vehicle_count: blueprint.fleet.vehicle_count,
                    camera_blueprint: blueprint.camera.blueprint.clone(),
                    image_size: (
                        blueprint.camera.attributes.image_size_x,
                        blueprint.camera.attributes.image_size_y,
                    ),
                    output_root: blueprint.output.root.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &CaptureBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.world.synchronous_mode {
        warnings.push(
            "world.synchronous_mode is false - camera frames are not paced by ticks".to_string(),
        );
    }

    if let Some(delta) = blueprint.world.fixed_delta_seconds {
        let sensor_tick = blueprint.camera.attributes.sensor_tick;
        if sensor_tick > delta {
            warnings.push(format!(
                "camera.attributes.sensor_tick ({sensor_tick}s) is longer than \
                 world.fixed_delta_seconds ({delta}s) - cameras will skip ticks"
            ));
        }
    }

    if blueprint.capture.teardown == TeardownPolicy::PurgeWorld {
        warnings.push(
            "capture.teardown = purge_world destroys actors not created by this run".to_string(),
        );
    }

    if blueprint.capture.max_ticks.is_none() {
        warnings.push("capture.max_ticks is not set - run until interrupted".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Simulator: {}", summary.simulator);
            println!("  Vehicles: {}", summary.vehicle_count);
            println!(
                "  Camera: {} ({}x{})",
                summary.camera_blueprint, summary.image_size.0, summary.image_size.1
            );
            println!("  Output root: {}", summary.output_root);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
