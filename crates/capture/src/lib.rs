//! # Capture
//!
//! 多相机同步采集。
//!
//! ## 数据流
//!
//! ```text
//! simulator delivery thread           main loop (tokio)
//!   FrameHandler::on_frame              tick()
//!     -> image_<i>_<frame>.png           -> recv_timeout(camera_1)
//!     -> position.txt                    -> recv_timeout(camera_2)
//!     -> FrameQueueSet  ---------------> ...
//! ```
//!
//! 每个相机一条 FIFO 队列，主循环在每次 tick 后按注册顺序各取一条；
//! 超时记为丢帧并继续下一个相机。

pub mod capture_loop;
pub mod error;
pub mod handler;
pub mod image_writer;
pub mod layout;
pub mod pose_log;
pub mod queues;
pub mod session;
pub mod tuner;

pub use capture_loop::{CaptureLoop, CollectTarget, TickReport};
pub use error::{CaptureError, Result};
pub use handler::FrameHandler;
pub use image_writer::{image_file_name, save_frame_png};
pub use layout::RunLayout;
pub use pose_log::{PoseLog, POSE_FILE_NAME, POSE_HEADER};
pub use queues::{FrameConsumers, FrameProducers, FrameQueueSet};
pub use session::{Session, SessionReport, TeardownOutcome};
pub use tuner::{AttributeTuner, TunerSet};
