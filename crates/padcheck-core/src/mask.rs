//! Binary segmentation mask.

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Row-major binary mask; every value is either [`MASK_ON`] or [`MASK_OFF`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    /// All-background mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![MASK_OFF; width * height],
        }
    }

    /// Build a mask from a per-pixel predicate.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.data[y * width + x] = MASK_ON;
                }
            }
        }
        mask
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn is_on(&self, x: usize, y: usize) -> bool {
        self.data[self.index(x, y)] == MASK_ON
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        let idx = self.index(x, y);
        self.data[idx] = if on { MASK_ON } else { MASK_OFF };
    }

    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v == MASK_ON).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == MASK_OFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_sets_binary_values() {
        let mask = Mask::from_fn(4, 3, |x, y| x == y);
        assert_eq!(mask.count_foreground(), 3);
        assert!(mask.data.iter().all(|&v| v == MASK_ON || v == MASK_OFF));
        assert!(mask.is_on(2, 2));
        assert!(!mask.is_on(3, 2));
    }
}
