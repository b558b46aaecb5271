//! Video probing and frame decoding via ffprobe/ffmpeg.
//!
//! Metadata comes from `ffprobe -print_format json`; individual frames are
//! piped out of `ffmpeg` as single JPEGs and decoded in memory, so no
//! intermediate files are written.

use std::path::Path;

use image::DynamicImage;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Thumbnail output dimensions.
pub const THUMBNAIL_WIDTH: u32 = 320;
pub const THUMBNAIL_HEIGHT: u32 = 180;

/// Default timestamp for thumbnail extraction, clamped into the duration.
pub const THUMBNAIL_TIMESTAMP_SECS: f64 = 1.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for video probing and frame extraction.
#[derive(Debug, thiserror::Error)]
pub enum VideoSourceError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    BinaryNotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("failed to decode extracted frame: {0}")]
    DecodeError(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub index: i32,
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
    pub nb_frames: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub size: Option<String>,
    pub format_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, VideoSourceError> {
    if !path.exists() {
        return Err(VideoSourceError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(VideoSourceError::BinaryNotFound)?;

    if !output.status.success() {
        return Err(VideoSourceError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| VideoSourceError::ParseError(format!("{e}: {stdout}")))
}

// ---------------------------------------------------------------------------
// Frame extraction
// ---------------------------------------------------------------------------

/// Decode a single frame at the given timestamp.
///
/// The frame is piped out of ffmpeg as one JPEG on stdout and decoded in
/// memory.
pub async fn extract_frame(
    path: &Path,
    timestamp_secs: f64,
) -> Result<DynamicImage, VideoSourceError> {
    if !path.exists() {
        return Err(VideoSourceError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffmpeg")
        .args(["-v", "quiet", "-ss", &format!("{timestamp_secs:.3}"), "-i"])
        .arg(path)
        .args(["-vframes", "1", "-f", "image2pipe", "-vcodec", "mjpeg", "-"])
        .output()
        .await
        .map_err(VideoSourceError::BinaryNotFound)?;

    if !output.status.success() || output.stdout.is_empty() {
        return Err(VideoSourceError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let frame =
        image::load_from_memory_with_format(&output.stdout, image::ImageFormat::Jpeg)?;
    Ok(frame)
}

/// Generate a JPEG thumbnail for a video.
///
/// Extracts the frame at [`THUMBNAIL_TIMESTAMP_SECS`] (clamped into the
/// video duration), resizes to 320x180, and returns the encoded bytes.
pub async fn generate_thumbnail(
    path: &Path,
    duration_secs: f64,
) -> Result<Vec<u8>, VideoSourceError> {
    let timestamp = if duration_secs > 0.0 {
        THUMBNAIL_TIMESTAMP_SECS.min(duration_secs / 2.0)
    } else {
        0.0
    };

    let frame = extract_frame(path, timestamp).await?;
    let thumbnail = frame.resize_exact(
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        image::imageops::FilterType::Triangle,
    );

    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 85);
    thumbnail.write_with_encoder(encoder)?;
    Ok(bytes)
}

/// Encode any image as JPEG bytes (face crops, heatmaps).
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, VideoSourceError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 90);
    image.write_with_encoder(encoder)?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video duration in seconds from ffprobe output.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    // Try format-level duration first.
    if let Some(d) = &probe.format.duration {
        if let Ok(secs) = d.parse::<f64>() {
            return secs;
        }
    }
    // Fall back to the first video stream's duration.
    if let Some(stream) = first_video_stream(probe) {
        if let Some(d) = &stream.duration {
            if let Ok(secs) = d.parse::<f64>() {
                return secs;
            }
        }
    }
    0.0
}

/// Parse the video framerate from ffprobe output.
///
/// The `r_frame_rate` field is a fraction like `"30/1"` or `"24000/1001"`.
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    first_video_stream(probe)
        .and_then(|s| s.r_frame_rate.as_deref())
        .map(parse_fraction)
        .unwrap_or(0.0)
}

/// Parse a fraction string like `"30/1"` into a float.
fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
    }
    s.parse::<f64>().unwrap_or(0.0)
}

/// Count total frames from ffprobe output.
pub fn parse_total_frames(probe: &FfprobeOutput) -> i64 {
    if let Some(stream) = first_video_stream(probe) {
        if let Some(nb) = &stream.nb_frames {
            if let Ok(n) = nb.parse::<i64>() {
                return n;
            }
        }
    }
    // Estimate from duration * framerate.
    let duration = parse_duration(probe);
    let fps = parse_framerate(probe);
    if duration > 0.0 && fps > 0.0 {
        return (duration * fps).round() as i64;
    }
    0
}

/// Find the first video stream's codec name.
pub fn parse_video_codec(probe: &FfprobeOutput) -> String {
    first_video_stream(probe)
        .and_then(|s| s.codec_name.clone())
        .unwrap_or_default()
}

/// Find the first video stream's resolution.
pub fn parse_resolution(probe: &FfprobeOutput) -> (i32, i32) {
    first_video_stream(probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0))
}

/// Parse the container-level file size in bytes.
pub fn parse_file_size(probe: &FfprobeOutput) -> i64 {
    probe
        .format
        .size
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
