//! Source file checks run before any surface is built.
//!
//! Only headers and the first animation frame are decoded, so every check is
//! bounded no matter how large the file is.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, ImageFormat, ImageReader};

use crate::types::WallpaperError;

/// Extensions accepted for video wallpapers.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov"];

/// Maps an I/O failure on the source file to a wallpaper error.
#[must_use]
pub fn io_error(err: &io::Error) -> WallpaperError {
    match err.kind() {
        io::ErrorKind::NotFound => WallpaperError::FileNotFound,
        io::ErrorKind::PermissionDenied => WallpaperError::SystemPermissionDenied,
        _ => WallpaperError::Unknown,
    }
}

/// Checks that `path` names an existing, readable file.
///
/// # Errors
///
/// `FileNotFound` if the path is empty, missing or not a file;
/// `SystemPermissionDenied` if it cannot be opened.
pub fn check_source(path: &Path) -> Result<(), WallpaperError> {
    if path.as_os_str().is_empty() {
        return Err(WallpaperError::FileNotFound);
    }

    let metadata = std::fs::metadata(path).map_err(|err| io_error(&err))?;
    if !metadata.is_file() {
        return Err(WallpaperError::FileNotFound);
    }

    File::open(path).map(drop).map_err(|err| io_error(&err))
}

/// Checks that `path` is a decodable still image.
///
/// # Errors
///
/// `InvalidFormat` if the format is not recognised or the header is invalid.
pub fn probe_still_image(path: &Path) -> Result<(), WallpaperError> {
    let reader = open_image(path)?;
    if reader.format().is_none() {
        return Err(WallpaperError::InvalidFormat);
    }

    let (width, height) = reader.into_dimensions().map_err(|err| {
        tracing::debug!(path = %path.display(), error = %err, "image header rejected");
        WallpaperError::InvalidFormat
    })?;

    if width == 0 || height == 0 {
        return Err(WallpaperError::InvalidFormat);
    }

    Ok(())
}

/// Checks that `path` is a GIF, PNG/APNG or WebP container whose first frame
/// decodes.
///
/// # Errors
///
/// `InvalidFormat` for any other format or an undecodable first frame.
pub fn probe_animation(path: &Path) -> Result<(), WallpaperError> {
    let format = open_image(path)?.format();
    let file = BufReader::new(File::open(path).map_err(|err| io_error(&err))?);
    let invalid = |err: image::ImageError| {
        tracing::debug!(path = %path.display(), error = %err, "animation rejected");
        WallpaperError::InvalidFormat
    };

    let first_frame = match format {
        Some(ImageFormat::Gif) => GifDecoder::new(file).map_err(invalid)?.into_frames().next(),
        Some(ImageFormat::Png) => {
            let decoder = PngDecoder::new(file).map_err(invalid)?;
            if !decoder.is_apng().map_err(invalid)? {
                return probe_still_image(path);
            }
            decoder.apng().map_err(invalid)?.into_frames().next()
        }
        Some(ImageFormat::WebP) => {
            let decoder = WebPDecoder::new(file).map_err(invalid)?;
            if !decoder.has_animation() {
                return probe_still_image(path);
            }
            decoder.into_frames().next()
        }
        _ => return Err(WallpaperError::InvalidFormat),
    };

    match first_frame {
        Some(Ok(_)) => Ok(()),
        Some(Err(err)) => Err(invalid(err)),
        None => Err(WallpaperError::InvalidFormat),
    }
}

/// Whether `path` has a video extension the player supports.
#[must_use]
pub fn is_supported_video(path: &Path) -> bool { has_extension(path, VIDEO_EXTENSIONS) }

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}

fn open_image(path: &Path) -> Result<ImageReader<BufReader<File>>, WallpaperError> {
    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|err| io_error(&err))
}
