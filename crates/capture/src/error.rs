//! Capture error types

use std::path::PathBuf;

use actor_factory::ActorFactoryError;
use contracts::{CameraId, ContractError};
use thiserror::Error;

/// Capture-specific errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Directory creation or file write failed
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run folder name could not be rendered
    #[error("invalid run folder timestamp format '{format}'")]
    TimestampFormat { format: String },

    /// PNG encoding failed
    #[error("failed to save image {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    /// Pose record could not be appended
    #[error("failed to append pose record to {}: {source}", path.display())]
    PoseLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pixel buffer does not match the frame dimensions
    #[error("frame {frame} of {camera} carries {actual} bytes, expected {expected}")]
    InvalidFrame {
        camera: CameraId,
        frame: u64,
        expected: usize,
        actual: usize,
    },

    /// No queue registered for this camera
    #[error("no frame queue for {camera}")]
    UnknownCamera { camera: CameraId },

    /// The other end of a camera queue is gone
    #[error("frame queue for {camera} is closed")]
    QueueClosed { camera: CameraId },

    /// Operation called before `setup`
    #[error("session not ready: {stage} has not run")]
    NotReady { stage: &'static str },

    /// Simulator / actor error
    #[error(transparent)]
    Simulator(#[from] ActorFactoryError),

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl CaptureError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Frame handler stage the error belongs to, used as a metric label
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Image { .. } | Self::InvalidFrame { .. } => "image",
            Self::PoseLog { .. } => "pose",
            Self::UnknownCamera { .. } | Self::QueueClosed { .. } => "enqueue",
            _ => "other",
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, CaptureError>;
