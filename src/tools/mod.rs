mod ffmpeg_command;
mod ffprobe_info;
mod path_validator;

pub use ffmpeg_command::FfmpegCommand;
pub use ffprobe_info::{VideoInfo, get_video_info};
pub use path_validator::{ensure_parent_directory_exists, validate_file_exists};
