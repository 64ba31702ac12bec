use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error(
        "force_frame_rate takes a frame rate between 0 and 125, got {fps}; forcing frame rates higher than 125 fps is not supported"
    )]
    InvalidFrameRate { fps: i32 },

    #[error("invalid scheduler configuration: {0}")]
    Config(String),
}
