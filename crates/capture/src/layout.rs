//! 输出目录布局
//!
//! `<root>/<timestamp>_<run_label>/camera_<i>_folder`

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use contracts::OutputConfig;
use tracing::info;

use crate::error::{CaptureError, Result};

/// 一次运行的输出目录
#[derive(Debug, Clone)]
pub struct RunLayout {
    run_dir: PathBuf,
}

impl RunLayout {
    /// 渲染运行目录名 `<timestamp>_<run_label>`
    pub fn run_dir_name<Tz>(output: &OutputConfig, now: &DateTime<Tz>) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut name = String::new();
        // chrono reports bad specifiers as a fmt error instead of panicking here
        write!(name, "{}", now.format(&output.timestamp_format)).map_err(|_| {
            CaptureError::TimestampFormat {
                format: output.timestamp_format.clone(),
            }
        })?;
        name.push('_');
        name.push_str(&output.run_label);
        Ok(name)
    }

    /// 创建运行目录 (已存在时复用)
    pub fn create<Tz>(output: &OutputConfig, now: &DateTime<Tz>) -> Result<Self>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let run_dir = output.root.join(Self::run_dir_name(output, now)?);
        std::fs::create_dir_all(&run_dir).map_err(|e| CaptureError::io(&run_dir, e))?;
        info!(run_dir = %run_dir.display(), "output directory ready");
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// 第 `ordinal` 个相机的目录路径
    pub fn camera_folder(&self, ordinal: usize) -> PathBuf {
        self.run_dir.join(format!("camera_{ordinal}_folder"))
    }

    /// 创建相机目录并返回路径
    pub fn create_camera_folder(&self, ordinal: usize) -> Result<PathBuf> {
        let folder = self.camera_folder(ordinal);
        std::fs::create_dir_all(&folder).map_err(|e| CaptureError::io(&folder, e))?;
        Ok(folder)
    }
}
