/// Errors describing a frame buffer that cannot be processed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid RGBA buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
}

/// Borrowed RGBA8 frame, row-major, 4 bytes per pixel.
#[derive(Clone, Copy, Debug)]
pub struct RgbaImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h*4
}

/// Owned RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl<'a> RgbaImageView<'a> {
    /// Check that the dimensions are non-zero and match the buffer length.
    pub fn validate(&self) -> Result<(), FrameError> {
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(4))
            .filter(|&n| n > 0)
            .ok_or(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        if self.data.len() != expected {
            return Err(FrameError::InvalidBuffer {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// RGB triple of pixel `idx` (alpha is ignored by every classifier).
    #[inline]
    pub fn rgb(&self, idx: usize) -> [u8; 3] {
        let o = idx * 4;
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// Iterate RGB triples in row-major order.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + 'a {
        self.data.chunks_exact(4).map(|px| [px[0], px[1], px[2]])
    }
}

impl RgbaImage {
    /// Frame filled with a single opaque color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build an owned frame from a raw buffer, validating its length.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, FrameError> {
        let img = Self {
            width,
            height,
            data,
        };
        img.view().validate()?;
        Ok(img)
    }

    pub fn view(&self) -> RgbaImageView<'_> {
        RgbaImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Paint an axis-aligned rectangle; pixels outside the frame are skipped.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, rgb: [u8; 3]) {
        for y in y0..(y0 + h).min(self.height) {
            for x in x0..(x0 + w).min(self.width) {
                let o = (y * self.width + x) * 4;
                self.data[o..o + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_dimensions() {
        let view = RgbaImageView {
            width: 0,
            height: 4,
            data: &[],
        };
        assert_eq!(
            view.validate(),
            Err(FrameError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn validate_rejects_short_buffer() {
        let data = vec![0u8; 15];
        let view = RgbaImageView {
            width: 2,
            height: 2,
            data: &data,
        };
        assert_eq!(
            view.validate(),
            Err(FrameError::InvalidBuffer {
                expected: 16,
                got: 15
            })
        );
    }

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut img = RgbaImage::filled(4, 4, [0, 0, 0]);
        img.fill_rect(2, 2, 10, 10, [255, 0, 0]);
        let view = img.view();
        assert_eq!(view.rgb(0), [0, 0, 0]);
        assert_eq!(view.rgb(15), [255, 0, 0]);
        assert_eq!(view.rgb_pixels().filter(|p| p[0] == 255).count(), 4);
    }
}
