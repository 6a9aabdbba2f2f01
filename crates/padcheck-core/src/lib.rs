//! Core types for gap pad inspection.
//!
//! This crate is intentionally small. It defines the borrowed/owned RGBA
//! frame types handed in by a capture collaborator, the binary [`Mask`]
//! produced by segmentation, pixel bounding boxes, and the logger used by
//! the rest of the workspace. It does *not* depend on any image codec.

mod geom;
mod image;
mod logger;
mod mask;

pub use geom::BoundingBox;
pub use image::{FrameError, RgbaImage, RgbaImageView};
pub use mask::{Mask, MASK_OFF, MASK_ON};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
