//! Capture 指标收集模块
//!
//! 记录采集循环、帧投递和 actor 生成的运行指标。

use std::collections::BTreeMap;

use contracts::{CameraId, FrameRecord};
use metrics::{counter, gauge, histogram};

/// 记录一次世界 tick
pub fn record_tick(world_frame: u64) {
    counter!("carla_capture_ticks_total").increment(1);
    gauge!("carla_capture_world_frame").set(world_frame as f64);
}

/// 记录投递线程送达的一帧
pub fn record_frame_received(camera: &str) {
    counter!(
        "carla_capture_frames_received_total",
        "camera" => camera.to_string()
    )
    .increment(1);
}

/// 记录主循环取出的一帧
///
/// `lag_frames` = 当前世界帧号 - 相机帧号
pub fn record_frame_collected(camera: &str, lag_frames: u64) {
    counter!(
        "carla_capture_frames_collected_total",
        "camera" => camera.to_string()
    )
    .increment(1);
    histogram!("carla_capture_frame_lag_frames").record(lag_frames as f64);
}

/// 记录一次队列等待超时
pub fn record_frame_missed(camera: &str) {
    counter!(
        "carla_capture_frames_missed_total",
        "camera" => camera.to_string()
    )
    .increment(1);
}

/// 记录 spawn 冲突重试
pub fn record_spawn_retry(count: u64) {
    if count > 0 {
        counter!("carla_capture_spawn_retries_total").increment(count);
    }
}

/// 记录回调处理失败
///
/// `stage`: "image" / "pose" / "enqueue"
pub fn record_handler_failure(camera: &str, stage: &str) {
    counter!(
        "carla_capture_handler_failures_total",
        "camera" => camera.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(camera: &str, depth: usize) {
    gauge!(
        "carla_capture_queue_depth",
        "camera" => camera.to_string()
    )
    .set(depth as f64);
}

/// 采集统计聚合器
///
/// 在内存中聚合指标，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CaptureStatsAggregator {
    /// tick 次数
    pub ticks: u64,

    /// 第一个世界帧号
    pub first_world_frame: Option<u64>,

    /// 最后一个世界帧号
    pub last_world_frame: Option<u64>,

    /// spawn 冲突次数
    pub spawn_collisions: u64,

    /// 帧滞后统计 (世界帧 - 相机帧)
    pub lag_stats: RunningStats,

    /// 各相机收集/丢失计数
    pub per_camera: BTreeMap<CameraId, CameraCounts>,
}

/// 单个相机的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraCounts {
    pub collected: u64,
    pub missed: u64,
}

impl CaptureStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次 tick
    pub fn on_tick(&mut self, world_frame: u64) {
        self.ticks += 1;
        self.first_world_frame.get_or_insert(world_frame);
        self.last_world_frame = Some(world_frame);
    }

    /// 记录收集到的一帧
    pub fn on_collected(&mut self, world_frame: u64, record: &FrameRecord) {
        self.lag_stats
            .push(world_frame.saturating_sub(record.frame) as f64);
        self.per_camera
            .entry(record.camera.clone())
            .or_default()
            .collected += 1;
    }

    /// 记录一次丢帧
    pub fn on_missed(&mut self, camera: &CameraId) {
        self.per_camera.entry(camera.clone()).or_default().missed += 1;
    }

    /// 记录 spawn 冲突
    pub fn on_spawn_collisions(&mut self, count: u64) {
        self.spawn_collisions += count;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> CaptureSummary {
        let collected: u64 = self.per_camera.values().map(|c| c.collected).sum();
        let missed: u64 = self.per_camera.values().map(|c| c.missed).sum();
        let attempts = collected + missed;

        CaptureSummary {
            ticks: self.ticks,
            first_world_frame: self.first_world_frame,
            last_world_frame: self.last_world_frame,
            frames_collected: collected,
            frames_missed: missed,
            miss_rate: if attempts > 0 {
                missed as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            spawn_collisions: self.spawn_collisions,
            frame_lag: StatsSummary::from(&self.lag_stats),
            per_camera: self
                .per_camera
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

/// 采集摘要
#[derive(Debug, Clone, Default)]
pub struct CaptureSummary {
    pub ticks: u64,
    pub first_world_frame: Option<u64>,
    pub last_world_frame: Option<u64>,
    pub frames_collected: u64,
    pub frames_missed: u64,
    pub miss_rate: f64,
    pub spawn_collisions: u64,
    pub frame_lag: StatsSummary,
    /// 按注册顺序排列
    pub per_camera: Vec<(String, CameraCounts)>,
}

impl std::fmt::Display for CaptureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Summary ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        if let (Some(first), Some(last)) = (self.first_world_frame, self.last_world_frame) {
            writeln!(f, "World frames: {first}..={last}")?;
        }
        writeln!(f, "Frames collected: {}", self.frames_collected)?;
        writeln!(
            f,
            "Frames missed: {} ({:.2}%)",
            self.frames_missed, self.miss_rate
        )?;
        writeln!(f, "Spawn collisions: {}", self.spawn_collisions)?;
        writeln!(f, "Frame lag (frames): {}", self.frame_lag)?;

        if !self.per_camera.is_empty() {
            writeln!(f, "Per camera:")?;
            for (camera, counts) in &self.per_camera {
                writeln!(
                    f,
                    "  {}: collected={}, missed={}",
                    camera, counts.collected, counts.missed
                )?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
