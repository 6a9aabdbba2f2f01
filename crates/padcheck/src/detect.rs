//! End-to-end helpers over image files, built on the `image` crate.

use std::fs;
use std::path::{Path, PathBuf};

use padcheck_core::{FrameError, RgbaImage};
use padcheck_detect::{DetectionPath, PadDetection, PadDetector};
use padcheck_validate::FrameSource;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the file-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("no image files in {0}")]
    NoFrames(PathBuf),
}

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

/// Convert a decoded `image::RgbaImage` into the workspace frame type.
pub fn rgba_frame(img: ::image::RgbaImage) -> Result<RgbaImage, DetectError> {
    let (w, h) = img.dimensions();
    Ok(RgbaImage::from_raw(w as usize, h as usize, img.into_raw())?)
}

/// Copy a raw RGBA8 buffer into an owned frame, checking its length.
pub fn rgba_image_from_slice(
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<RgbaImage, DetectError> {
    Ok(RgbaImage::from_raw(width as usize, height as usize, data.to_vec())?)
}

/// Decode any supported image file into an RGBA frame.
pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbaImage, DetectError> {
    let img = ::image::open(path.as_ref())?;
    rgba_frame(img.to_rgba8())
}

/// Detect pads in an image file.
///
/// An unreadable file yields an empty [`DetectionPath::Failed`] detection:
/// without pixels there is nothing for either detector to work on.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))
)]
pub fn detect_pads_in_file(path: impl AsRef<Path>, detector: &PadDetector) -> PadDetection {
    match load_frame(path.as_ref()) {
        Ok(frame) => detector.detect_with_report(&frame.view()),
        Err(err) => {
            log::warn!("cannot decode {}: {err}", path.as_ref().display());
            PadDetection {
                candidates: Vec::new(),
                path: DetectionPath::Failed,
                hsv_foreground: None,
            }
        }
    }
}

/// Cycles through the image files of a directory in name order.
///
/// The listing is taken once, at construction.
#[derive(Clone, Debug)]
pub struct DirectoryFrameSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DetectError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_frame && path.is_file() {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(DetectError::NoFrames(dir.to_path_buf()));
        }
        files.sort();
        log::debug!("{} frames in {}", files.len(), dir.display());
        Ok(Self { files, next: 0 })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl FrameSource for DirectoryFrameSource {
    type Error = DetectError;

    fn next_frame(&mut self) -> Result<RgbaImage, DetectError> {
        let path = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();
        load_frame(path)
    }
}
