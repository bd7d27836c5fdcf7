//! 同步采集主循环
//!
//! 每次迭代：tick 世界，然后按注册顺序从每个相机队列各取一条记录。

use std::sync::Arc;
use std::time::Duration;

use actor_factory::{CameraBinding, SimulatorClient};
use contracts::{CameraId, FrameRecord};
use observability::{
    record_frame_collected, record_frame_missed, record_handler_failure, record_queue_depth,
    record_tick, CaptureStatsAggregator,
};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::pose_log::PoseLog;
use crate::queues::FrameConsumers;

/// 主循环要消费的相机
#[derive(Debug, Clone)]
pub struct CollectTarget {
    pub camera: CameraId,
    pub pose_log: Arc<PoseLog>,
}

impl CollectTarget {
    pub fn new(binding: &CameraBinding, pose_log: Arc<PoseLog>) -> Self {
        Self {
            camera: binding.camera.clone(),
            pose_log,
        }
    }
}

/// 一次 tick 的结果
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub world_frame: u64,
    pub collected: Vec<FrameRecord>,
    pub missed: Vec<CameraId>,
}

/// 采集主循环
pub struct CaptureLoop<C> {
    client: C,
    consumers: FrameConsumers,
    targets: Vec<CollectTarget>,
    queue_timeout: Duration,
    max_ticks: Option<u64>,
    stats: CaptureStatsAggregator,
}

impl<C: SimulatorClient> CaptureLoop<C> {
    /// `max_ticks` 为 None 或 0 时一直运行到停止信号
    pub fn new(
        client: C,
        consumers: FrameConsumers,
        targets: Vec<CollectTarget>,
        queue_timeout: Duration,
        max_ticks: Option<u64>,
    ) -> Self {
        Self {
            client,
            consumers,
            targets,
            queue_timeout,
            max_ticks: max_ticks.filter(|&n| n > 0),
            stats: CaptureStatsAggregator::new(),
        }
    }

    pub fn stats(&self) -> &CaptureStatsAggregator {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut CaptureStatsAggregator {
        &mut self.stats
    }

    /// 执行一次迭代
    ///
    /// 某个相机超时只记为丢帧，继续处理下一个相机。
    pub async fn step(&mut self) -> Result<TickReport> {
        let world_frame = self.client.tick().await?;
        info!(world_frame, "World's frame: {}", world_frame);
        record_tick(world_frame);
        self.stats.on_tick(world_frame);

        let mut report = TickReport {
            world_frame,
            ..Default::default()
        };

        for target in &self.targets {
            let camera = &target.camera;
            match self
                .consumers
                .recv_timeout(camera, self.queue_timeout)
                .await?
            {
                Some(record) => {
                    info!(
                        frame = record.frame,
                        camera = %record.camera,
                        "    Frame: {}   Sensor: {}",
                        record.frame,
                        record.camera
                    );
                    if let Err(e) = target.pose_log.append(&record.transform) {
                        error!(camera = %camera, error = %e, "failed to append pose record");
                        record_handler_failure(camera, e.stage());
                    }
                    record_frame_collected(camera, world_frame.saturating_sub(record.frame));
                    self.stats.on_collected(world_frame, &record);
                    report.collected.push(record);
                }
                None => {
                    warn!(
                        camera = %camera,
                        world_frame,
                        timeout_ms = self.queue_timeout.as_millis() as u64,
                        "Some of the sensor information is missed"
                    );
                    record_frame_missed(camera);
                    self.stats.on_missed(camera);
                    report.missed.push(camera.clone());
                }
            }
            record_queue_depth(camera, self.consumers.depth(camera));
        }

        Ok(report)
    }

    /// 循环直到达到 `max_ticks` 或收到停止信号，返回完成的 tick 数
    ///
    /// 停止信号的发送端被丢弃也视为停止。
    #[instrument(
        name = "capture_loop",
        skip(self, stop),
        fields(cameras = self.targets.len(), max_ticks = ?self.max_ticks)
    )]
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<u64> {
        let mut ticks = 0u64;
        info!("capture loop started");

        loop {
            if *stop.borrow() {
                info!("stop requested");
                break;
            }
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                info!(ticks, "tick limit reached");
                break;
            }

            tokio::select! {
                biased;
                _ = stop.changed() => {
                    info!("stop requested");
                    break;
                }
                report = self.step() => {
                    report?;
                    ticks += 1;
                }
            }
        }

        info!(ticks, "capture loop finished");
        Ok(ticks)
    }
}
