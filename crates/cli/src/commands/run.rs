//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::CaptureBlueprint;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{CaptureConfig, CaptureRun};

use super::load_blueprint;

/// Execute the `run` command
pub async fn run_capture(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;
    apply_overrides(&mut blueprint, args);

    config_loader::validate(&blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    info!(
        host = %blueprint.simulator.host,
        port = blueprint.simulator.port,
        vehicles = blueprint.fleet.vehicle_count,
        output = %blueprint.output.root.display(),
        max_ticks = ?blueprint.capture.max_ticks,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let config = CaptureConfig {
        blueprint,
        mock: args.mock,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // The signal only stops the loop; the session still tears down
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                warn!("Received shutdown signal, stopping capture...");
                stop_tx.send_replace(true);
            }
            Err(e) => {
                error!(error = %e, "Signal handling unavailable, run with --max-ticks to stop");
                // Keep the sender alive so the loop is not stopped
                std::future::pending::<()>().await;
            }
        }
    });

    info!("Starting capture...");
    let stats = CaptureRun::new(config)
        .run(stop_rx)
        .await
        .context("Capture execution failed")?;

    info!(
        ticks = stats.report.ticks,
        frames_collected = stats.report.summary.frames_collected,
        frames_missed = stats.report.summary.frames_missed,
        duration_secs = stats.duration.as_secs_f64(),
        "Capture completed"
    );
    stats.print_summary();

    info!("CARLA Capture finished");
    Ok(())
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(blueprint: &mut CaptureBlueprint, args: &RunArgs) {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding CARLA host from CLI");
        blueprint.simulator.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port, "Overriding CARLA port from CLI");
        blueprint.simulator.port = port;
    }
    if let Some(vehicles) = args.vehicles {
        info!(vehicles, "Overriding vehicle count from CLI");
        blueprint.fleet.vehicle_count = vehicles;
    }
    if let Some(speed) = args.speed {
        info!(speed, "Overriding vehicle speed from CLI");
        blueprint.fleet.speed = speed;
    }
    if let Some(ref output) = args.output {
        info!(output = %output.display(), "Overriding output root from CLI");
        blueprint.output.root = output.clone();
    }
    if let Some(max_ticks) = args.max_ticks {
        blueprint.capture.max_ticks = (max_ticks > 0).then_some(max_ticks);
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() -> std::result::Result<(), CliError> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| CliError::shutdown(format!("Ctrl+C handler: {e}")))
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .map_err(|e| CliError::shutdown(format!("SIGTERM handler: {e}")))?;
        signal.recv().await;
        Ok(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::result::Result<(), CliError>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &CaptureBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!(
        "Simulator: {}:{} (timeout {}s)",
        blueprint.simulator.host, blueprint.simulator.port, blueprint.simulator.timeout_secs
    );
    println!(
        "World: synchronous={}, fixed_delta_seconds={:?}",
        blueprint.world.synchronous_mode, blueprint.world.fixed_delta_seconds
    );
    println!(
        "Fleet: {} x '{}' at {} m/s",
        blueprint.fleet.vehicle_count, blueprint.fleet.blueprint_filter, blueprint.fleet.speed
    );
    let attributes = &blueprint.camera.attributes;
    println!(
        "Camera: {} {}x{}, sensor_tick={}s",
        blueprint.camera.blueprint,
        attributes.image_size_x,
        attributes.image_size_y,
        attributes.sensor_tick
    );
    println!(
        "Output: {}/{}_{}",
        blueprint.output.root.display(),
        blueprint.output.timestamp_format,
        blueprint.output.run_label
    );
    match blueprint.capture.max_ticks {
        Some(n) => println!("Ticks: {n}"),
        None => println!("Ticks: until interrupted"),
    }
    println!();
}
