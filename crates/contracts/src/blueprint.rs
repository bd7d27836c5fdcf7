//! CaptureBlueprint - Config Loader 输出
//!
//! 描述一次采集运行的完整配置：仿真器连接、世界设置、车队、相机、输出目录、采集循环。
//! 所有字段都有默认值，默认值即原始采集脚本的常量，空配置文件也是合法配置。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Location, Rotation, Transform, WorldSettings};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的采集配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 仿真器连接
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// 世界设置 (运行期间生效，退出时恢复)
    #[serde(default)]
    pub world: WorldConfig,

    /// 车队
    #[serde(default)]
    pub fleet: FleetConfig,

    /// 每辆车挂载的相机
    #[serde(default)]
    pub camera: CameraConfig,

    /// 输出目录
    #[serde(default)]
    pub output: OutputConfig,

    /// 采集循环
    #[serde(default)]
    pub capture: CaptureLoopConfig,
}

/// 仿真器连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// CARLA 服务器地址
    #[serde(default = "default_host")]
    pub host: String,

    /// CARLA 服务器端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// RPC 超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2000
}

fn default_timeout_secs() -> f64 {
    10.0
}

/// 世界设置覆盖
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldConfig {
    /// 同步模式
    #[serde(default = "default_synchronous_mode")]
    pub synchronous_mode: bool,

    /// 固定步长 (秒)
    #[serde(default = "default_fixed_delta")]
    pub fixed_delta_seconds: Option<f64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            synchronous_mode: default_synchronous_mode(),
            fixed_delta_seconds: default_fixed_delta(),
        }
    }
}

impl WorldConfig {
    /// 在当前世界设置上叠加本配置，其余字段保持不变
    pub fn apply_to(&self, current: &WorldSettings) -> WorldSettings {
        WorldSettings {
            synchronous_mode: self.synchronous_mode,
            fixed_delta_seconds: self.fixed_delta_seconds,
            ..*current
        }
    }
}

fn default_synchronous_mode() -> bool {
    true
}

fn default_fixed_delta() -> Option<f64> {
    Some(0.2)
}

/// 车队配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// 车辆数量，必须 >= 1
    #[serde(default = "default_vehicle_count")]
    pub vehicle_count: usize,

    /// 初始目标速度 (m/s)，沿车辆 x 轴
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// 车辆蓝图过滤模式
    #[serde(default = "default_blueprint_filter")]
    pub blueprint_filter: String,

    /// 每辆车最多尝试 spawn 的次数
    #[serde(default = "default_max_spawn_attempts")]
    pub max_spawn_attempts: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vehicle_count: default_vehicle_count(),
            speed: default_speed(),
            blueprint_filter: default_blueprint_filter(),
            max_spawn_attempts: default_max_spawn_attempts(),
        }
    }
}

fn default_vehicle_count() -> usize {
    10
}

fn default_speed() -> f64 {
    10.0
}

fn default_blueprint_filter() -> String {
    "vehicle.*".to_string()
}

fn default_max_spawn_attempts() -> usize {
    32
}

/// 相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// 相机蓝图
    #[serde(default = "default_camera_blueprint")]
    pub blueprint: String,

    /// 属性调节周期 (毫秒)
    #[serde(default = "default_tune_period_ms")]
    pub tune_period_ms: u64,

    /// 相对于车辆的挂载位姿
    #[serde(default = "default_camera_transform")]
    pub transform: Transform,

    /// 周期性写入的相机属性
    #[serde(default)]
    pub attributes: CameraAttributes,

    /// 启动时写入一次的曝光设置
    #[serde(default)]
    pub exposure: ExposureSettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            blueprint: default_camera_blueprint(),
            tune_period_ms: default_tune_period_ms(),
            transform: default_camera_transform(),
            attributes: CameraAttributes::default(),
            exposure: ExposureSettings::default(),
        }
    }
}

fn default_camera_blueprint() -> String {
    "sensor.camera.rgb".to_string()
}

fn default_camera_transform() -> Transform {
    Transform::new(Location::new(1.5, 0.0, 2.5), Rotation::new(0.0, 0.0, 0.0))
}

fn default_tune_period_ms() -> u64 {
    100
}

/// 相机属性
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraAttributes {
    /// 传感器采样间隔 (秒)
    #[serde(default = "default_sensor_tick")]
    pub sensor_tick: f64,

    /// 图像宽度
    #[serde(default = "default_image_size_x")]
    pub image_size_x: u32,

    /// 图像高度
    #[serde(default = "default_image_size_y")]
    pub image_size_y: u32,

    /// 焦距
    #[serde(default = "default_focal_length")]
    pub focal_length: f64,

    /// 光圈
    #[serde(default = "default_aperture")]
    pub aperture: f64,
}

impl Default for CameraAttributes {
    fn default() -> Self {
        Self {
            sensor_tick: default_sensor_tick(),
            image_size_x: default_image_size_x(),
            image_size_y: default_image_size_y(),
            focal_length: default_focal_length(),
            aperture: default_aperture(),
        }
    }
}

impl CameraAttributes {
    /// 转换为 CARLA 蓝图属性表
    pub fn to_attribute_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("sensor_tick".to_string(), self.sensor_tick.to_string()),
            ("image_size_x".to_string(), self.image_size_x.to_string()),
            ("image_size_y".to_string(), self.image_size_y.to_string()),
            ("focal_distance".to_string(), self.focal_length.to_string()),
            ("fstop".to_string(), self.aperture.to_string()),
        ])
    }
}

fn default_sensor_tick() -> f64 {
    0.1
}

fn default_image_size_x() -> u32 {
    800
}

fn default_image_size_y() -> u32 {
    600
}

fn default_focal_length() -> f64 {
    4.0
}

fn default_aperture() -> f64 {
    2.0
}

/// 曝光设置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureSettings {
    #[serde(default = "default_exposure")]
    pub exposure_compensation: f64,

    #[serde(default = "default_exposure")]
    pub exposure_max_bright: f64,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            exposure_compensation: default_exposure(),
            exposure_max_bright: default_exposure(),
        }
    }
}

impl ExposureSettings {
    /// 转换为 CARLA 蓝图属性表
    pub fn to_attribute_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "exposure_compensation".to_string(),
                self.exposure_compensation.to_string(),
            ),
            (
                "exposure_max_bright".to_string(),
                self.exposure_max_bright.to_string(),
            ),
        ])
    }
}

fn default_exposure() -> f64 {
    0.5
}

/// 输出目录配置
///
/// 运行目录：`<root>/<timestamp>_<run_label>/camera_<i>_folder`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出根目录
    #[serde(default = "default_output_root")]
    pub root: std::path::PathBuf,

    /// 运行目录标签
    #[serde(default = "default_run_label")]
    pub run_label: String,

    /// 运行目录时间戳格式 (strftime)
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            run_label: default_run_label(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

fn default_output_root() -> std::path::PathBuf {
    std::path::PathBuf::from("images")
}

fn default_run_label() -> String {
    "10fps_wet".to_string()
}

fn default_timestamp_format() -> String {
    "%m-%d-%H-%M".to_string()
}

/// 采集循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureLoopConfig {
    /// 每个相机队列的最长等待 (毫秒)
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,

    /// 最多 tick 次数，None = 直到中断
    #[serde(default)]
    pub max_ticks: Option<u64>,

    /// 退出时的 actor 清理策略
    #[serde(default)]
    pub teardown: TeardownPolicy,
}

impl Default for CaptureLoopConfig {
    fn default() -> Self {
        Self {
            queue_timeout_ms: default_queue_timeout_ms(),
            max_ticks: None,
            teardown: TeardownPolicy::default(),
        }
    }
}

fn default_queue_timeout_ms() -> u64 {
    1000
}

/// Actor 清理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    /// 只销毁本次运行创建的 actors
    #[default]
    Owned,
    /// 销毁世界中的所有 actors (包括非本次运行创建的)
    PurgeWorld,
}
