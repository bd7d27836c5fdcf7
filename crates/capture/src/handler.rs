//! 帧回调处理
//!
//! 每个相机一个 handler，在投递线程上依次：保存 PNG、追加位姿、入队。

use std::path::PathBuf;
use std::sync::Arc;

use actor_factory::CameraBinding;
use contracts::{CameraFrame, FrameCallback, FrameRecord};
use observability::{record_frame_received, record_handler_failure};
use tracing::{debug, error};

use crate::error::Result;
use crate::image_writer::save_frame_png;
use crate::pose_log::PoseLog;
use crate::queues::FrameProducers;

/// 单个相机的帧处理器
///
/// 绑定在注册时按值捕获，回调里的相机名称和序号不会随循环变量变化。
pub struct FrameHandler {
    binding: CameraBinding,
    folder: PathBuf,
    pose_log: Arc<PoseLog>,
    producers: FrameProducers,
}

impl FrameHandler {
    pub fn new(
        binding: CameraBinding,
        folder: PathBuf,
        pose_log: Arc<PoseLog>,
        producers: FrameProducers,
    ) -> Self {
        Self {
            binding,
            folder,
            pose_log,
            producers,
        }
    }

    pub fn binding(&self) -> &CameraBinding {
        &self.binding
    }

    /// 处理一帧
    ///
    /// 图像或位姿写入失败时仍然入队，主循环不会因此等到超时；
    /// 失败在入队之后返回。
    pub fn handle(&self, frame: &CameraFrame) -> Result<FrameRecord> {
        let saved = save_frame_png(
            &self.folder,
            &self.binding.camera,
            self.binding.ordinal,
            frame,
        );
        let logged = self.pose_log.append(&self.binding.transform);

        let record = FrameRecord {
            frame: frame.frame,
            camera: self.binding.camera.clone(),
            transform: self.binding.transform,
        };
        self.producers.push(record.clone())?;

        saved?;
        logged?;
        Ok(record)
    }

    /// 转换为仿真器客户端可调用的回调
    pub fn into_callback(self) -> FrameCallback {
        let handler = Arc::new(self);
        Arc::new(move |frame| handler.on_frame(frame))
    }

    fn on_frame(&self, frame: CameraFrame) {
        let camera = &self.binding.camera;
        debug!(
            camera = %camera,
            frame = frame.frame,
            "Received data from {}, Frame: {}",
            camera,
            frame.frame
        );
        record_frame_received(camera);

        if let Err(e) = self.handle(&frame) {
            error!(
                camera = %camera,
                frame = frame.frame,
                stage = e.stage(),
                error = %e,
                "frame handling failed"
            );
            record_handler_failure(camera, e.stage());
        }
    }
}
