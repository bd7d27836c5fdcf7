//! 相机位姿记录 (`position.txt`)

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use contracts::Transform;

use crate::error::{CaptureError, Result};

pub const POSE_FILE_NAME: &str = "position.txt";
pub const POSE_HEADER: &str = "Camera Position and Rotation Records:";

/// 单个相机目录下的位姿记录文件
///
/// 投递线程和主循环都会追加，写入由内部锁串行化。
#[derive(Debug)]
pub struct PoseLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PoseLog {
    pub fn new(folder: &Path) -> Self {
        Self {
            path: folder.join(POSE_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 格式化一条记录 (不含换行)
    pub fn format_record(transform: &Transform) -> String {
        format!(
            "Position: {}, Rotation: {}",
            transform.location, transform.rotation
        )
    }

    /// 追加一条记录，文件为空时先写表头
    pub fn append(&self, transform: &Transform) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let map_err = |source| CaptureError::PoseLog {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(map_err)?;

        let mut buf = String::new();
        if file.metadata().map_err(map_err)?.len() == 0 {
            buf.push_str(POSE_HEADER);
            buf.push('\n');
        }
        buf.push_str(&Self::format_record(transform));
        buf.push('\n');

        file.write_all(buf.as_bytes()).map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Location, Rotation};

    fn mount() -> Transform {
        Transform {
            location: Location {
                x: 1.5,
                y: 0.0,
                z: 2.4,
            },
            rotation: Rotation {
                pitch: -10.0,
                yaw: 0.0,
                roll: 0.0,
            },
        }
    }

    #[test]
    fn test_record_format() {
        assert_eq!(
            PoseLog::format_record(&mount()),
            "Position: Location(x=1.500000, y=0.000000, z=2.400000), \
             Rotation: Rotation(pitch=-10.000000, yaw=0.000000, roll=0.000000)"
        );
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = PoseLog::new(dir.path());

        log.append(&mount()).unwrap();
        log.append(&mount()).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], POSE_HEADER);
        assert!(lines[1].starts_with("Position: Location(x=1.500000"));
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn test_missing_folder_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = PoseLog::new(&dir.path().join("gone"));

        let err = log.append(&mount()).unwrap_err();
        assert!(matches!(err, CaptureError::PoseLog { .. }));
        assert_eq!(err.stage(), "pose");
    }
}
