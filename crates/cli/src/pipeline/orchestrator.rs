//! Capture orchestrator - picks the simulator client and drives a session.
//!
//! The real CARLA client needs the `real-carla` feature (on by default).
//! The mock simulator only runs when asked for with `--mock`.

use std::time::Instant;

use actor_factory::SimulatorClient;
use anyhow::{Context, Result};
use capture::Session;
use contracts::CaptureBlueprint;
use tokio::sync::watch;
use tracing::{info, warn};

use super::RunStats;

/// Capture run configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// The capture blueprint, CLI overrides already applied
    pub blueprint: CaptureBlueprint,

    /// Capture from the mock simulator
    pub mock: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main capture orchestrator
pub struct CaptureRun {
    config: CaptureConfig,
}

impl CaptureRun {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Run the session to completion
    ///
    /// `stop` ends the capture loop early; teardown still runs.
    pub async fn run(self, stop: watch::Receiver<bool>) -> Result<RunStats> {
        if let Some(port) = self.config.metrics_port {
            start_metrics(port);
        }

        if self.config.mock {
            return self.run_mock(stop).await;
        }
        self.run_real(stop).await
    }

    /// Run against a real CARLA server
    #[cfg(feature = "real-carla")]
    async fn run_real(self, stop: watch::Receiver<bool>) -> Result<RunStats> {
        use actor_factory::RealCarlaClient;

        let simulator = &self.config.blueprint.simulator;
        info!(
            host = %simulator.host,
            port = simulator.port,
            "Connecting to CARLA server..."
        );
        self.run_with(RealCarlaClient::new(), stop).await
    }

    #[cfg(not(feature = "real-carla"))]
    async fn run_real(self, _stop: watch::Receiver<bool>) -> Result<RunStats> {
        anyhow::bail!("built without the `real-carla` feature; rebuild with default features or pass --mock")
    }

    /// Run against the mock simulator
    async fn run_mock(self, stop: watch::Receiver<bool>) -> Result<RunStats> {
        use actor_factory::{grid_spawn_points, MockConfig, MockSimulatorClient};

        warn!("Capturing from the mock simulator, images are synthetic");
        let vehicles = self.config.blueprint.fleet.vehicle_count;
        let client = MockSimulatorClient::with_config(MockConfig {
            spawn_points: grid_spawn_points(vehicles.max(8) * 2),
            ..Default::default()
        });
        self.run_with(client, stop).await
    }

    async fn run_with<C>(self, client: C, stop: watch::Receiver<bool>) -> Result<RunStats>
    where
        C: SimulatorClient + Clone + 'static,
    {
        let start_time = Instant::now();
        let blueprint = self.config.blueprint;
        let cameras = blueprint.fleet.vehicle_count;

        let report = Session::new(client, blueprint)
            .execute(stop)
            .await
            .context("Capture session failed")?;

        Ok(RunStats {
            duration: start_time.elapsed(),
            cameras,
            report,
        })
    }
}

/// Start the Prometheus endpoint; a failure only costs the metrics
fn start_metrics(port: u16) -> bool {
    match observability::init_metrics_only(port) {
        Ok(()) => {
            info!("Metrics endpoint available on port {}", port);
            true
        }
        Err(e) => {
            warn!(port, error = %e, "Metrics endpoint unavailable, continuing without it");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CameraAttributes;

    fn small_blueprint(root: &std::path::Path) -> CaptureBlueprint {
        let mut blueprint = CaptureBlueprint::default();
        blueprint.fleet.vehicle_count = 2;
        blueprint.camera.attributes = CameraAttributes {
            image_size_x: 8,
            image_size_y: 6,
            ..Default::default()
        };
        blueprint.output.root = root.to_path_buf();
        blueprint.capture.max_ticks = Some(2);
        blueprint
    }

    #[tokio::test]
    async fn test_mock_run_writes_images() {
        let dir = tempfile::tempdir().unwrap();

        let (_stop_tx, stop_rx) = watch::channel(false);
        let stats = CaptureRun::new(CaptureConfig {
            blueprint: small_blueprint(dir.path()),
            mock: true,
            metrics_port: None,
        })
        .run(stop_rx)
        .await
        .unwrap();

        assert_eq!(stats.report.ticks, 2);
        assert_eq!(stats.report.summary.frames_collected, 4);
        let run_dir = stats.report.run_dir.unwrap();
        assert!(run_dir.join("camera_1_folder").join("image_1_2.png").exists());
        assert!(run_dir.join("camera_2_folder").join("position.txt").exists());
    }

    #[tokio::test]
    async fn test_busy_metrics_port_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let busy = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = busy.local_addr().unwrap().port();

        assert!(!start_metrics(port));

        let (_stop_tx, stop_rx) = watch::channel(false);
        let stats = CaptureRun::new(CaptureConfig {
            blueprint: small_blueprint(dir.path()),
            mock: true,
            metrics_port: Some(port),
        })
        .run(stop_rx)
        .await
        .unwrap();

        assert_eq!(stats.report.ticks, 2);
    }

    #[cfg(not(feature = "real-carla"))]
    #[tokio::test]
    async fn test_real_run_needs_feature() {
        let dir = tempfile::tempdir().unwrap();

        let (_stop_tx, stop_rx) = watch::channel(false);
        let err = CaptureRun::new(CaptureConfig {
            blueprint: small_blueprint(dir.path()),
            mock: false,
            metrics_port: None,
        })
        .run(stop_rx)
        .await
        .unwrap_err();

        assert!(err.to_string().contains("--mock"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
