//! CARLA camera wrapper
//!
//! Wraps a native CARLA `Sensor` carrying an RGB camera and converts its
//! images into `CameraFrame`s. Only compiled when `real-carla` feature is enabled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use carla::client::{ActorBase, Sensor};
use carla::sensor::data::Image;
use carla::sensor::{SensorData, SensorDataBase};
use contracts::{ActorId, CameraFrame, FrameCallback};
use tracing::{debug, info, trace, warn};

/// Convert CARLA sensor data into a camera frame
///
/// Returns None when the data is not an image.
pub fn convert_image(data: &SensorData) -> Option<CameraFrame> {
    let frame = data.frame() as u64;
    let timestamp = data.timestamp();
    let image = Image::try_from(data.clone()).ok()?;
    Some(CameraFrame {
        frame,
        timestamp,
        width: image.width() as u32,
        height: image.height() as u32,
        data: Bytes::copy_from_slice(image.as_raw_bytes()),
    })
}

/// CARLA camera
#[derive(Clone)]
pub struct CarlaCamera {
    actor_id: ActorId,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
    /// Attributes requested after spawn
    attributes: Arc<Mutex<HashMap<String, String>>>,
}

impl CarlaCamera {
    pub fn new(actor_id: ActorId, sensor: Sensor, attributes: HashMap<String, String>) -> Self {
        Self {
            actor_id,
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
            attributes: Arc::new(Mutex::new(attributes)),
        }
    }

    pub fn listen(&self, callback: FrameCallback) {
        // Idempotent: if already listening, don't register again
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(actor_id = self.actor_id, "camera already listening");
            return;
        }

        let actor_id = self.actor_id;
        let listening = self.listening.clone();
        debug!(actor_id, "starting CARLA camera");

        self.sensor.listen(move |sensor_data| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            match convert_image(&sensor_data) {
                Some(frame) => callback(frame),
                None => trace!(actor_id, "non-image sensor data dropped"),
            }
        });
    }

    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(actor_id = self.actor_id, "stopping CARLA camera");
            self.sensor.stop();
        }
    }

    /// A spawned CARLA sensor cannot be reconfigured; requested values are
    /// kept and logged when they differ from the spawn-time ones.
    pub fn record_attributes(&self, requested: &HashMap<String, String>) {
        let mut current = self
            .attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (key, value) in requested {
            if current.get(key) != Some(value) {
                info!(actor_id = self.actor_id, key, value, "camera attribute changed after spawn");
                current.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn destroy(self) -> bool {
        self.stop();
        self.sensor.destroy()
    }
}
