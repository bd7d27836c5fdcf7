//! PNG 写出
//!
//! CARLA 相机输出 BGRA8，写盘前交换为 RGBA8。

use std::path::{Path, PathBuf};

use contracts::{CameraFrame, CameraId};

use crate::error::{CaptureError, Result};

/// `image_<ordinal>_<frame>.png`
pub fn image_file_name(ordinal: usize, frame: u64) -> String {
    format!("image_{ordinal}_{frame}.png")
}

/// 将一帧保存为 `folder/image_<ordinal>_<frame>.png`，返回写出的路径
pub fn save_frame_png(
    folder: &Path,
    camera: &CameraId,
    ordinal: usize,
    frame: &CameraFrame,
) -> Result<PathBuf> {
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(CaptureError::InvalidFrame {
            camera: camera.clone(),
            frame: frame.frame,
            expected,
            actual: frame.data.len(),
        });
    }

    let path = folder.join(image_file_name(ordinal, frame.frame));

    let mut rgba = frame.data.to_vec();
    for chunk in rgba.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }

    image::save_buffer(
        &path,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
    )
    .map_err(|e| CaptureError::Image {
        path: path.clone(),
        message: e.to_string(),
    })?;

    Ok(path)
}
