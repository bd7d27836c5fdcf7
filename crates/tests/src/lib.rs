//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置快照测试
//! - 基于 mock 仿真器的完整采集会话 e2e 测试（无需 CARLA）

#[cfg(test)]
mod contract_tests {
    use contracts::{CaptureBlueprint, TeardownPolicy};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_empty_config_reproduces_capture_defaults() {
        let bp = config_loader::ConfigLoader::load_from_str("", config_loader::ConfigFormat::Toml)
            .unwrap();

        assert_eq!(bp.simulator.host, "localhost");
        assert_eq!(bp.simulator.port, 2000);
        assert!(bp.world.synchronous_mode);
        assert_eq!(bp.world.fixed_delta_seconds, Some(0.2));
        assert_eq!(bp.camera.blueprint, "sensor.camera.rgb");
        assert_eq!(bp.camera.tune_period_ms, 100);
        assert_eq!(bp.output.run_label, "10fps_wet");
        assert_eq!(bp.capture.teardown, TeardownPolicy::Owned);
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let bp = config_loader::ConfigLoader::load_from_str(
            include_str!("../../../config.toml"),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let defaults = CaptureBlueprint::default();

        assert_eq!(bp.fleet.vehicle_count, defaults.fleet.vehicle_count);
        assert_eq!(bp.camera.transform, defaults.camera.transform);
        assert_eq!(bp.camera.attributes, defaults.camera.attributes);
        assert_eq!(bp.camera.exposure, defaults.camera.exposure);
        assert_eq!(bp.output.timestamp_format, defaults.output.timestamp_format);
        assert_eq!(bp.capture.max_ticks, None);
    }

    #[test]
    fn test_toml_round_trip_keeps_overrides() {
        let mut bp = CaptureBlueprint::default();
        bp.fleet.vehicle_count = 7;
        bp.capture.teardown = TeardownPolicy::PurgeWorld;

        let toml = config_loader::ConfigLoader::to_toml(&bp).unwrap();
        let parsed =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();

        assert_eq!(parsed.fleet.vehicle_count, 7);
        assert_eq!(parsed.capture.teardown, TeardownPolicy::PurgeWorld);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::time::Duration;

    use actor_factory::{grid_spawn_points, ActorKind, MockConfig, MockSimulatorClient};
    use capture::{Session, POSE_HEADER};
    use contracts::{CameraAttributes, CaptureBlueprint, TeardownPolicy};
    use tokio::sync::watch;

    /// Small images keep PNG encoding cheap
    fn blueprint(root: &Path, vehicles: usize, max_ticks: Option<u64>) -> CaptureBlueprint {
        let mut bp = CaptureBlueprint::default();
        bp.fleet.vehicle_count = vehicles;
        bp.camera.attributes = CameraAttributes {
            image_size_x: 4,
            image_size_y: 3,
            ..Default::default()
        };
        bp.output.root = root.to_path_buf();
        bp.capture.queue_timeout_ms = 500;
        bp.capture.max_ticks = max_ticks;
        bp
    }

    fn no_stop() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    /// One vehicle, world starting at frame 41: the first tick yields frame 42
    #[tokio::test]
    async fn test_single_camera_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            initial_frame: 41,
            ..Default::default()
        });
        let (_stop_tx, stop_rx) = no_stop();

        let report = Session::new(client.clone(), blueprint(dir.path(), 1, Some(1)))
            .execute(stop_rx)
            .await
            .unwrap();

        assert_eq!(report.ticks, 1);
        assert_eq!(report.summary.first_world_frame, Some(42));
        assert_eq!(report.summary.frames_collected, 1);

        let folder = report.run_dir.unwrap().join("camera_1_folder");
        assert!(folder.join("image_1_42.png").exists());

        // Header, the callback record, the collect record
        let poses = std::fs::read_to_string(folder.join("position.txt")).unwrap();
        let lines: Vec<&str> = poses.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], POSE_HEADER);
        assert_eq!(
            lines[1],
            "Position: Location(x=1.500000, y=0.000000, z=2.500000), \
             Rotation: Rotation(pitch=0.000000, yaw=0.000000, roll=0.000000)"
        );
    }

    /// N vehicles give N cameras, each on its own vehicle, with its own folder
    #[tokio::test]
    async fn test_one_camera_per_vehicle() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::new();
        let mut session = Session::new(client.clone(), blueprint(dir.path(), 3, Some(2)));

        session.setup().await.unwrap();

        let bindings = session.bindings().to_vec();
        assert_eq!(bindings.len(), 3);
        let vehicles = client.actor_ids_of(ActorKind::Vehicle);
        assert_eq!(vehicles.len(), 3);
        for (i, binding) in bindings.iter().enumerate() {
            assert_eq!(binding.ordinal, i + 1);
            assert_eq!(binding.camera.as_str(), format!("camera_{}", i + 1));
            assert_eq!(client.parent_of(binding.actor_id), Some(binding.vehicle_id));
            assert!(client.is_listening(binding.actor_id));
        }
        let mut parents: Vec<_> = bindings.iter().map(|b| b.vehicle_id).collect();
        parents.sort_unstable();
        parents.dedup();
        assert_eq!(parents.len(), 3);

        let (_stop_tx, stop_rx) = no_stop();
        let ticks = session.run(stop_rx).await.unwrap();
        let run_dir = session.run_dir().unwrap().to_path_buf();
        session.teardown().await;

        assert_eq!(ticks, 2);
        for i in 1..=3 {
            let folder = run_dir.join(format!("camera_{i}_folder"));
            assert!(folder.join(format!("image_{i}_1.png")).exists());
            assert!(folder.join(format!("image_{i}_2.png")).exists());
        }
    }

    /// Frames from one camera come out in delivery order, one per tick
    #[tokio::test]
    async fn test_frames_collected_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            delivery_delay: Some(Duration::from_millis(5)),
            ..Default::default()
        });
        let (_stop_tx, stop_rx) = no_stop();

        let report = Session::new(client, blueprint(dir.path(), 1, Some(5)))
            .execute(stop_rx)
            .await
            .unwrap();

        assert_eq!(report.summary.frames_collected, 5);
        assert_eq!(report.summary.frames_missed, 0);
        // Every frame was collected on the tick that produced it
        assert_eq!(report.summary.frame_lag.max, 0.0);

        let folder = report.run_dir.unwrap().join("camera_1_folder");
        let poses = std::fs::read_to_string(folder.join("position.txt")).unwrap();
        assert_eq!(poses.lines().count(), 1 + 2 * 5);
    }

    /// Occupied spawn points are retried until every vehicle is placed
    #[tokio::test]
    async fn test_spawn_collisions_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            spawn_points: grid_spawn_points(6),
            occupied_spawn_points: vec![0, 1, 2],
            ..Default::default()
        });
        let (_stop_tx, stop_rx) = no_stop();

        let report = Session::new(client.clone(), blueprint(dir.path(), 3, Some(1)))
            .execute(stop_rx)
            .await
            .unwrap();

        assert_eq!(report.summary.frames_collected, 3);
        assert_eq!(
            report.summary.spawn_collisions as usize,
            client.spawn_attempts() - 3
        );
    }

    /// A silent camera is counted as missed and does not block the others
    #[tokio::test]
    async fn test_missing_camera_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::new();
        let mut bp = blueprint(dir.path(), 2, Some(2));
        bp.capture.queue_timeout_ms = 50;
        let mut session = Session::new(client.clone(), bp);
        session.setup().await.unwrap();

        let silent = session.bindings()[0].actor_id;
        client.mute(silent);

        let (_stop_tx, stop_rx) = no_stop();
        let ticks = session.run(stop_rx).await.unwrap();
        let summary = session.summary();
        session.teardown().await;

        assert_eq!(ticks, 2);
        assert_eq!(summary.frames_missed, 2);
        assert_eq!(summary.frames_collected, 2);
        let (name, counts) = &summary.per_camera[0];
        assert_eq!(name, "camera_1");
        assert_eq!(counts.missed, 2);
        assert_eq!(summary.per_camera[1].1.collected, 2);
    }

    /// Teardown restores world settings and removes only this run's actors
    #[tokio::test]
    async fn test_teardown_restores_world() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            foreign_actors: 3,
            ..Default::default()
        });
        let original = client.current_settings();
        let (_stop_tx, stop_rx) = no_stop();

        let report = Session::new(client.clone(), blueprint(dir.path(), 2, Some(1)))
            .execute(stop_rx)
            .await
            .unwrap();

        assert!(report.settings_restored);
        assert_eq!(report.teardown.destroyed, 4);
        assert!(report.teardown.failed.is_empty());
        assert_eq!(client.current_settings(), original);
        assert_eq!(client.all_actor_ids(), vec![1, 2, 3]);
        assert!(client.actor_ids_of(ActorKind::Camera).is_empty());
    }

    #[tokio::test]
    async fn test_purge_world_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::with_config(MockConfig {
            foreign_actors: 3,
            ..Default::default()
        });
        let mut bp = blueprint(dir.path(), 1, Some(1));
        bp.capture.teardown = TeardownPolicy::PurgeWorld;
        let (_stop_tx, stop_rx) = no_stop();

        let report = Session::new(client.clone(), bp)
            .execute(stop_rx)
            .await
            .unwrap();

        assert_eq!(report.teardown.purged, 3);
        assert_eq!(client.actor_count(), 0);
    }

    /// Stop signal ends an unbounded run and teardown still happens
    #[tokio::test]
    async fn test_stop_signal_ends_unbounded_run() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::new();
        let (stop_tx, stop_rx) = watch::channel(false);

        let session = tokio::spawn(
            Session::new(client.clone(), blueprint(dir.path(), 1, None)).execute(stop_rx),
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop_tx.send_replace(true);

        let report = session.await.unwrap().unwrap();

        assert!(report.ticks > 0);
        assert!(report.settings_restored);
        assert_eq!(client.actor_count(), 0);
        assert!(!client.current_settings().synchronous_mode);
    }

    /// Unknown camera blueprint fails setup and leaves nothing behind
    #[tokio::test]
    async fn test_setup_failure_leaves_clean_world() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimulatorClient::new();
        let mut bp = blueprint(dir.path(), 2, Some(1));
        bp.camera.blueprint = "sensor.camera.thermal".to_string();
        let (_stop_tx, stop_rx) = no_stop();

        let result = Session::new(client.clone(), bp).execute(stop_rx).await;

        assert!(result.is_err());
        assert_eq!(client.actor_count(), 0);
        assert!(!client.current_settings().synchronous_mode);
    }
}
