//! 每相机帧队列
//!
//! 回调 (投递线程) 作为生产者，主循环作为唯一消费者。
//! 同一相机内 FIFO，队列之间互不影响。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use contracts::{CameraId, FrameRecord};
use tokio::sync::mpsc;

use crate::error::{CaptureError, Result};

/// 一组按相机划分的队列
pub struct FrameQueueSet {
    producers: FrameProducers,
    consumers: FrameConsumers,
}

impl FrameQueueSet {
    /// 为每个相机创建一条无界队列，保持传入顺序
    pub fn new(cameras: impl IntoIterator<Item = CameraId>) -> Self {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        let mut order = Vec::new();

        for camera in cameras {
            if senders.contains_key(&camera) {
                continue;
            }
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(camera.clone(), tx);
            receivers.insert(camera.clone(), rx);
            order.push(camera);
        }

        Self {
            producers: FrameProducers {
                senders: Arc::new(senders),
            },
            consumers: FrameConsumers { receivers, order },
        }
    }

    pub fn split(self) -> (FrameProducers, FrameConsumers) {
        (self.producers, self.consumers)
    }
}

/// 生产端，可克隆到每个回调中
#[derive(Clone)]
pub struct FrameProducers {
    senders: Arc<HashMap<CameraId, mpsc::UnboundedSender<FrameRecord>>>,
}

impl FrameProducers {
    /// 将记录放入其相机的队列
    pub fn push(&self, record: FrameRecord) -> Result<()> {
        let sender = self
            .senders
            .get(&record.camera)
            .ok_or_else(|| CaptureError::UnknownCamera {
                camera: record.camera.clone(),
            })?;
        sender.send(record).map_err(|e| CaptureError::QueueClosed {
            camera: e.0.camera,
        })
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// 消费端，由主循环独占
pub struct FrameConsumers {
    receivers: HashMap<CameraId, mpsc::UnboundedReceiver<FrameRecord>>,
    order: Vec<CameraId>,
}

impl FrameConsumers {
    /// 等待 `camera` 队列中的下一条记录
    ///
    /// 超时返回 `Ok(None)`，记录不会丢失，留给下一次调用。
    pub async fn recv_timeout(
        &mut self,
        camera: &CameraId,
        timeout: Duration,
    ) -> Result<Option<FrameRecord>> {
        let rx = self
            .receivers
            .get_mut(camera)
            .ok_or_else(|| CaptureError::UnknownCamera {
                camera: camera.clone(),
            })?;

        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => Err(CaptureError::QueueClosed {
                camera: camera.clone(),
            }),
            Err(_) => Ok(None),
        }
    }

    /// 当前排队的记录数
    pub fn depth(&self, camera: &CameraId) -> usize {
        self.receivers.get(camera).map_or(0, |rx| rx.len())
    }

    /// 注册顺序的相机列表
    pub fn cameras(&self) -> &[CameraId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
