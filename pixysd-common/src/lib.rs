
mod layout;

pub use layout::*;

/// A pixel buffer didn't match the dimensions it was meant to fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeMismatch {
    pub expected: usize,
    pub got: usize,
}
impl std::fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source has {} bytes, image needs {}", self.got, self.expected)
    }
}
impl std::error::Error for SizeMismatch {}

/// Timestamp recorded by the device alongside a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    /// Monotonic microseconds since boot (frame header field)
    Micros(u32),

    /// Boot counter plus milliseconds since boot, packed into the first
    /// bytes of the pixel data by the firmware.
    Boot { boot_count: u16, millis: u32 },
}
impl Timestamp {
    pub fn milliseconds(&self) -> f64 {
        match self {
            Self::Micros(us) => *us as f64 / 1000.0,
            Self::Boot { millis, .. } => *millis as f64,
        }
    }
}
impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Micros(_) => write!(f, "{:.3} ms", self.milliseconds()),
            Self::Boot { boot_count, millis } => {
                write!(f, "boot {} +{} ms", boot_count, millis)
            },
        }
    }
}

/// Bounding box of a blob detected by the on-board colour tracker.
///
/// The device stores these as five little-endian words in the order
/// `signature, left, right, top, bottom`. Nothing guarantees that
/// `left <= right` or `top <= bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlobRect {
    pub signature: u16,
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
}
impl BlobRect {
    /// Size of one record on the card
    pub const WIRE_LEN: usize = 10;

    pub fn top_left(&self) -> (u16, u16) {
        (self.left, self.top)
    }

    pub fn bottom_right(&self) -> (u16, u16) {
        (self.right, self.bottom)
    }
}

/// Container for an 8-bit grayscale frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameImage {
    data: Box<[u8]>,
    width: usize,
    height: usize,
}
impl FrameImage {
    pub fn new(width: usize, height: usize) -> Self {
        let data = vec![0u8; width * height].into_boxed_slice();
        Self { width, height, data }
    }

    pub fn new_from_slice(width: usize, height: usize, src: &[u8])
        -> Result<Self, SizeMismatch>
    {
        let mut res = Self::new(width, height);
        res.fill_from_slice(src)?;
        Ok(res)
    }

    pub fn fill_from_slice(&mut self, src: &[u8]) -> Result<(), SizeMismatch> {
        if src.len() != self.size_bytes() {
            return Err(SizeMismatch {
                expected: self.size_bytes(),
                got: src.len()
            });
        }
        self.data.copy_from_slice(src);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_vec()
    }

    /// Draw a one pixel wide outline of `rect` with the value `val`.
    ///
    /// Corners are normalized first, and anything outside the image is
    /// clipped.
    pub fn draw_rect_outline(&mut self, rect: &BlobRect, val: u8) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = rect.left.min(rect.right) as usize;
        let x1 = rect.left.max(rect.right) as usize;
        let y0 = rect.top.min(rect.bottom) as usize;
        let y1 = rect.top.max(rect.bottom) as usize;
        if x0 >= self.width || y0 >= self.height {
            return;
        }
        let x1c = x1.min(self.width - 1);
        let y1c = y1.min(self.height - 1);

        for x in x0..=x1c {
            self.data[y0 * self.width + x] = val;
            if y1 < self.height {
                self.data[y1 * self.width + x] = val;
            }
        }
        for y in y0..=y1c {
            self.data[y * self.width + x0] = val;
            if x1 < self.width {
                self.data[y * self.width + x1] = val;
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rejects_wrong_size() {
        let mut img = FrameImage::new(4, 2);
        let err = img.fill_from_slice(&[0u8; 7]).unwrap_err();
        assert_eq!(err, SizeMismatch { expected: 8, got: 7 });
        assert!(img.fill_from_slice(&[1u8; 8]).is_ok());
        assert_eq!(img.pixel(3, 1), Some(1));
        assert_eq!(img.pixel(4, 1), None);
    }

    #[test]
    fn rows_are_row_major() {
        let src: Vec<u8> = (0..12).collect();
        let img = FrameImage::new_from_slice(4, 3, &src).unwrap();
        assert_eq!(img.row(1), &[4, 5, 6, 7]);
        assert_eq!(img.pixel(2, 2), Some(10));
    }

    #[test]
    fn outline_is_drawn_and_clipped() {
        let mut img = FrameImage::new(6, 5);
        // Corners given in reverse order, bottom edge runs off the image
        let rect = BlobRect { signature: 1, left: 4, right: 1, top: 2, bottom: 9 };
        img.draw_rect_outline(&rect, 255);

        // Top edge
        for x in 1..=4 {
            assert_eq!(img.pixel(x, 2), Some(255));
        }
        // Side edges down to the last row
        for y in 2..5 {
            assert_eq!(img.pixel(1, y), Some(255));
            assert_eq!(img.pixel(4, y), Some(255));
        }
        // Interior untouched
        assert_eq!(img.pixel(2, 3), Some(0));
        assert_eq!(img.pixel(0, 0), Some(0));
    }

    #[test]
    fn outline_outside_image_is_ignored() {
        let mut img = FrameImage::new(3, 3);
        let rect = BlobRect { signature: 0, left: 10, right: 12, top: 0, bottom: 1 };
        img.draw_rect_outline(&rect, 255);
        assert!(img.as_slice().iter().all(|p| *p == 0));
    }

    #[test]
    fn boot_timestamp_display() {
        let ts = Timestamp::Boot { boot_count: 3, millis: 1500 };
        assert_eq!(ts.to_string(), "boot 3 +1500 ms");
        assert_eq!(Timestamp::Micros(2500).milliseconds(), 2.5);
    }
}
