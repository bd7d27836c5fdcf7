//! CameraFrame / FrameRecord - 相机帧与队列记录
//!
//! `CameraFrame` 由仿真器客户端的投递线程通过回调送达；
//! `FrameRecord` 是回调写入每相机队列、主循环取出的条目。

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{CameraId, Transform};

/// 相机帧
///
/// 像素为 CARLA 原生的 BGRA8 排列。
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// 仿真帧序号
    pub frame: u64,

    /// 仿真时间戳 (seconds)
    pub timestamp: f64,

    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// BGRA8 像素数据 (零拷贝)
    pub data: Bytes,
}

impl CameraFrame {
    /// 期望的像素字节数 (width * height * 4)
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// 队列条目：(frame_number, camera_name, transform)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// 帧序号
    pub frame: u64,

    /// 相机名称 (`camera_<i>`)
    pub camera: CameraId,

    /// 相机挂载位姿 (注册时固定)
    pub transform: Transform,
}

/// 帧回调类型
///
/// 由仿真器客户端在自己的投递线程上调用。
pub type FrameCallback = Arc<dyn Fn(CameraFrame) + Send + Sync>;
