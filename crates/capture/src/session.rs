//! 采集会话
//!
//! 串起一次完整运行：连接、同步模式、车队、相机、队列、回调、
//! 属性任务、主循环，以及无论成败都会执行的清理。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use actor_factory::{ActorFactory, CameraBinding, SimulatorClient, TeardownReport};
use chrono::{DateTime, Local};
use contracts::{CaptureBlueprint, ContractError, WorldSettings};
use observability::{record_spawn_retry, CaptureSummary};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::capture_loop::{CaptureLoop, CollectTarget};
use crate::error::{CaptureError, Result};
use crate::handler::FrameHandler;
use crate::layout::RunLayout;
use crate::pose_log::PoseLog;
use crate::queues::FrameQueueSet;
use crate::tuner::{AttributeTuner, TunerSet};

/// 会话结束后的报告
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// 完成的 tick 数
    pub ticks: u64,
    pub summary: CaptureSummary,
    pub teardown: TeardownReport,
    /// 原始世界设置是否已恢复
    pub settings_restored: bool,
    pub run_dir: Option<PathBuf>,
}

/// 清理结果
#[derive(Debug, Clone, Default)]
pub struct TeardownOutcome {
    pub actors: TeardownReport,
    pub settings_restored: bool,
}

/// 一次采集运行
pub struct Session<C: SimulatorClient + Clone + 'static> {
    blueprint: CaptureBlueprint,
    factory: ActorFactory<C>,
    started_at: DateTime<Local>,
    original_settings: Option<WorldSettings>,
    layout: Option<RunLayout>,
    bindings: Vec<CameraBinding>,
    tuners: Option<TunerSet>,
    capture: Option<CaptureLoop<C>>,
    spawn_collisions: u64,
}

impl<C: SimulatorClient + Clone + 'static> Session<C> {
    /// 客户端尚未连接，`setup` 负责连接
    pub fn new(client: C, blueprint: CaptureBlueprint) -> Self {
        Self {
            blueprint,
            factory: ActorFactory::new(client),
            started_at: Local::now(),
            original_settings: None,
            layout: None,
            bindings: Vec::new(),
            tuners: None,
            capture: None,
            spawn_collisions: 0,
        }
    }

    /// 固定运行目录的时间戳
    pub fn with_start_time(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn bindings(&self) -> &[CameraBinding] {
        &self.bindings
    }

    pub fn run_dir(&self) -> Option<&Path> {
        self.layout.as_ref().map(RunLayout::run_dir)
    }

    pub fn factory(&self) -> &ActorFactory<C> {
        &self.factory
    }

    /// 当前统计摘要
    pub fn summary(&self) -> CaptureSummary {
        match &self.capture {
            Some(capture) => capture.stats().summary(),
            None => CaptureSummary {
                spawn_collisions: self.spawn_collisions,
                ..Default::default()
            },
        }
    }

    /// 准备采集
    ///
    /// 任一步失败直接返回；已创建的资源由 `teardown` 清理。
    #[instrument(
        name = "session_setup",
        skip(self),
        fields(
            host = %self.blueprint.simulator.host,
            port = self.blueprint.simulator.port,
            vehicles = self.blueprint.fleet.vehicle_count
        )
    )]
    pub async fn setup(&mut self) -> Result<()> {
        let simulator = &self.blueprint.simulator;
        let timeout = Duration::try_from_secs_f64(simulator.timeout_secs).map_err(|e| {
            ContractError::config_validation("simulator.timeout_secs", e.to_string())
        })?;
        self.factory
            .client_mut()
            .connect(&simulator.host, simulator.port, timeout)
            .await?;
        info!("connected to simulator");

        let client = self.factory.client().clone();

        let original = client.world_settings().await?;
        self.original_settings = Some(original);
        let settings = self.blueprint.world.apply_to(&original);
        client.apply_world_settings(&settings).await?;
        info!(
            synchronous_mode = settings.synchronous_mode,
            fixed_delta_seconds = ?settings.fixed_delta_seconds,
            "world settings applied"
        );

        let fleet = self.factory.spawn_fleet(&self.blueprint.fleet).await?;
        self.spawn_collisions = fleet.collisions as u64;
        record_spawn_retry(self.spawn_collisions);

        self.bindings = self
            .factory
            .attach_cameras(&self.blueprint.camera, &fleet.vehicles)
            .await?;

        let layout = RunLayout::create(&self.blueprint.output, &self.started_at)?;

        let (producers, consumers) =
            FrameQueueSet::new(self.bindings.iter().map(|b| b.camera.clone())).split();
        info!(queues = consumers.len(), "frame queues ready");

        let mut targets = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            let folder = layout.create_camera_folder(binding.ordinal)?;
            let pose_log = Arc::new(PoseLog::new(&folder));

            let handler =
                FrameHandler::new(binding.clone(), folder, pose_log.clone(), producers.clone());
            client.listen(binding.actor_id, handler.into_callback())?;
            targets.push(CollectTarget::new(binding, pose_log));

            info!(
                camera = %binding.camera,
                actor_id = binding.actor_id,
                vehicle_id = binding.vehicle_id,
                "camera listening"
            );
        }
        self.layout = Some(layout);

        let mut tuners = TunerSet::new();
        for binding in &self.bindings {
            tuners.spawn(AttributeTuner::new(
                client.clone(),
                binding,
                &self.blueprint.camera,
            ));
        }
        self.tuners = Some(tuners);

        let loop_config = &self.blueprint.capture;
        let mut capture = CaptureLoop::new(
            client,
            consumers,
            targets,
            Duration::from_millis(loop_config.queue_timeout_ms),
            loop_config.max_ticks,
        );
        capture.stats_mut().on_spawn_collisions(self.spawn_collisions);
        self.capture = Some(capture);

        info!(cameras = self.bindings.len(), "session ready");
        Ok(())
    }

    /// 运行主循环，返回完成的 tick 数
    pub async fn run(&mut self, stop: watch::Receiver<bool>) -> Result<u64> {
        let capture = self
            .capture
            .as_mut()
            .ok_or(CaptureError::NotReady { stage: "setup" })?;
        capture.run(stop).await
    }

    /// 清理：停止属性任务和回调，恢复世界设置，销毁 actors
    ///
    /// 可重复调用；第二次调用只处理上次遗留的部分。
    #[instrument(name = "session_teardown", skip(self))]
    pub async fn teardown(&mut self) -> TeardownOutcome {
        if let Some(tuners) = self.tuners.take() {
            tuners.shutdown().await;
        }

        let client = self.factory.client();
        for binding in &self.bindings {
            if let Err(e) = client.stop_listening(binding.actor_id) {
                warn!(camera = %binding.camera, error = %e, "failed to stop listening");
            }
        }

        let mut settings_restored = false;
        if let Some(original) = self.original_settings {
            match client.apply_world_settings(&original).await {
                Ok(()) => {
                    info!("original world settings restored");
                    self.original_settings = None;
                    settings_restored = true;
                }
                Err(e) => error!(error = %e, "failed to restore world settings"),
            }
        }

        let actors = self
            .factory
            .teardown(self.blueprint.capture.teardown)
            .await;

        TeardownOutcome {
            actors,
            settings_restored,
        }
    }

    /// setup + run + teardown
    ///
    /// setup 或 run 失败时仍执行 teardown，然后返回原错误。
    pub async fn execute(mut self, stop: watch::Receiver<bool>) -> Result<SessionReport> {
        let outcome = match self.setup().await {
            Ok(()) => self.run(stop).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            error!(error = %e, "capture failed, tearing down");
        }
        let teardown = self.teardown().await;

        let ticks = outcome?;
        Ok(SessionReport {
            ticks,
            summary: self.summary(),
            teardown: teardown.actors,
            settings_restored: teardown.settings_restored,
            run_dir: self.run_dir().map(Path::to_path_buf),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_factory::{grid_spawn_points, ActorKind, MockConfig, MockSimulatorClient};
    use chrono::TimeZone;
    use contracts::{CameraAttributes, CameraConfig, FleetConfig, OutputConfig};

    fn blueprint(root: &Path, vehicles: usize, max_ticks: u64) -> CaptureBlueprint {
        let mut bp = CaptureBlueprint::default();
        bp.fleet = FleetConfig {
            vehicle_count: vehicles,
            ..Default::default()
        };
        bp.camera = CameraConfig {
            attributes: CameraAttributes {
                image_size_x: 4,
                image_size_y: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        bp.output = OutputConfig {
            root: root.to_path_buf(),
            ..Default::default()
        };
        bp.capture.queue_timeout_ms = 200;
        bp.capture.max_ticks = Some(max_ticks);
        bp
    }

    #[tokio::test]
    async fn test_execute_captures_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            foreign_actors: 1,
            ..Default::default()
        });
        let original = client.current_settings();
        let (_stop_tx, stop_rx) = watch::channel(false);

        let started_at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).single().unwrap();

        let report = Session::new(client.clone(), blueprint(dir.path(), 2, 3))
            .with_start_time(started_at)
            .execute(stop_rx)
            .await
            .unwrap();

        assert_eq!(report.ticks, 3);
        assert_eq!(report.summary.frames_collected, 6);
        assert_eq!(report.summary.frames_missed, 0);
        assert_eq!(report.teardown.destroyed, 4);
        assert!(report.settings_restored);

        // synchronous mode on, then restored
        let history = client.settings_history();
        assert!(history[0].synchronous_mode);
        assert_eq!(client.current_settings(), original);
        assert_eq!(client.all_actor_ids(), vec![1]);

        let run_dir = report.run_dir.unwrap();
        assert_eq!(run_dir, dir.path().join("03-05-14-07_10fps_wet"));
        let folder = run_dir.join("camera_2_folder");
        assert!(folder.join("image_2_1.png").exists());
        assert!(folder.join("image_2_3.png").exists());
    }

    #[tokio::test]
    async fn test_setup_failure_still_restores_settings() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            spawn_points: grid_spawn_points(1),
            ..Default::default()
        });
        let original = client.current_settings();
        let (_stop_tx, stop_rx) = watch::channel(false);

        let err = Session::new(client.clone(), blueprint(dir.path(), 2, 1))
            .execute(stop_rx)
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Simulator(_)));
        assert_eq!(client.current_settings(), original);
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_run_before_setup_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(MockSimulatorClient::new(), blueprint(dir.path(), 1, 1));
        let (_stop_tx, stop_rx) = watch::channel(false);

        let err = session.run(stop_rx).await.unwrap_err();
        assert!(matches!(err, CaptureError::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_teardown_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::new();
        let mut session = Session::new(client.clone(), blueprint(dir.path(), 1, 1));
        session.setup().await.unwrap();
        assert_eq!(client.actor_ids_of(ActorKind::Camera).len(), 1);

        let first = session.teardown().await;
        let second = session.teardown().await;

        assert!(first.settings_restored);
        assert_eq!(first.actors.destroyed, 2);
        assert!(!second.settings_restored);
        assert_eq!(second.actors.destroyed, 0);
        assert_eq!(client.actor_count(), 0);
    }
}
