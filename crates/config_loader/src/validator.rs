//! 配置校验模块
//!
//! 校验规则：
//! - 1 <= vehicle_count <= MAX_VEHICLE_COUNT，max_spawn_attempts >= 1，speed 为有限数
//! - 同步模式必须配置 fixed_delta_seconds，且 > 0
//! - 相机分辨率 > 0，sensor_tick >= 0，调节周期 > 0
//! - 队列等待时间 > 0
//! - 蓝图名称非空，run_label 不含路径分隔符

use contracts::{CaptureBlueprint, ContractError};

/// 单次运行允许的最大车辆数
const MAX_VEHICLE_COUNT: usize = 1024;

/// 校验 CaptureBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    validate_simulator(blueprint)?;
    validate_world(blueprint)?;
    validate_fleet(blueprint)?;
    validate_camera(blueprint)?;
    validate_output(blueprint)?;
    validate_capture(blueprint)?;
    Ok(())
}

fn validate_simulator(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let sim = &blueprint.simulator;
    if sim.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "simulator.host",
            "host cannot be empty",
        ));
    }
    if !(sim.timeout_secs.is_finite() && sim.timeout_secs > 0.0) {
        return Err(ContractError::config_validation(
            "simulator.timeout_secs",
            format!("timeout_secs must be > 0, got {}", sim.timeout_secs),
        ));
    }
    Ok(())
}

fn validate_world(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let world = &blueprint.world;
    match world.fixed_delta_seconds {
        Some(delta) if !(delta.is_finite() && delta > 0.0) => Err(ContractError::config_validation(
            "world.fixed_delta_seconds",
            format!("fixed_delta_seconds must be > 0, got {delta}"),
        )),
        None if world.synchronous_mode => Err(ContractError::config_validation(
            "world.fixed_delta_seconds",
            "synchronous_mode requires a fixed_delta_seconds",
        )),
        _ => Ok(()),
    }
}

fn validate_fleet(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let fleet = &blueprint.fleet;
    if fleet.vehicle_count == 0 {
        return Err(ContractError::config_validation(
            "fleet.vehicle_count",
            "vehicle_count must be >= 1",
        ));
    }
    if fleet.vehicle_count > MAX_VEHICLE_COUNT {
        return Err(ContractError::config_validation(
            "fleet.vehicle_count",
            format!(
                "vehicle_count must be <= {MAX_VEHICLE_COUNT}, got {}",
                fleet.vehicle_count
            ),
        ));
    }
    if !fleet.speed.is_finite() {
        return Err(ContractError::config_validation(
            "fleet.speed",
            format!("speed must be finite, got {}", fleet.speed),
        ));
    }
    if fleet.max_spawn_attempts == 0 {
        return Err(ContractError::config_validation(
            "fleet.max_spawn_attempts",
            "max_spawn_attempts must be >= 1",
        ));
    }
    if fleet.blueprint_filter.trim().is_empty() {
        return Err(ContractError::config_validation(
            "fleet.blueprint_filter",
            "blueprint_filter cannot be empty",
        ));
    }
    Ok(())
}

fn validate_camera(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let camera = &blueprint.camera;
    if camera.blueprint.trim().is_empty() {
        return Err(ContractError::config_validation(
            "camera.blueprint",
            "camera blueprint cannot be empty",
        ));
    }
    let attrs = &camera.attributes;
    if attrs.image_size_x == 0 || attrs.image_size_y == 0 {
        return Err(ContractError::config_validation(
            "camera.attributes.image_size",
            format!(
                "image size must be > 0, got {}x{}",
                attrs.image_size_x, attrs.image_size_y
            ),
        ));
    }
    if !(attrs.sensor_tick.is_finite() && attrs.sensor_tick >= 0.0) {
        return Err(ContractError::config_validation(
            "camera.attributes.sensor_tick",
            format!("sensor_tick must be >= 0, got {}", attrs.sensor_tick),
        ));
    }
    if camera.tune_period_ms == 0 {
        return Err(ContractError::config_validation(
            "camera.tune_period_ms",
            "tune_period_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_output(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let label = &blueprint.output.run_label;
    if label.contains('/') || label.contains('\\') {
        return Err(ContractError::config_validation(
            "output.run_label",
            format!("run_label must not contain path separators, got '{label}'"),
        ));
    }
    if blueprint.output.timestamp_format.trim().is_empty() {
        return Err(ContractError::config_validation(
            "output.timestamp_format",
            "timestamp_format cannot be empty",
        ));
    }
    Ok(())
}

fn validate_capture(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    if blueprint.capture.queue_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "capture.queue_timeout_ms",
            "queue_timeout_ms must be > 0",
        ));
    }
    Ok(())
}
