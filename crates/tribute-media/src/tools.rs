//! External tool discovery.

use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// Verify the encoder and probe binaries are present and executable.
///
/// Accepts bare names (resolved against `PATH`) or explicit paths.
pub fn verify_tools(ffmpeg: &Path, ffprobe: &Path) -> MediaResult<()> {
    which::which(ffmpeg).map_err(|_| MediaError::FfmpegNotFound)?;
    which::which(ffprobe).map_err(|_| MediaError::FfprobeNotFound)?;
    Ok(())
}
