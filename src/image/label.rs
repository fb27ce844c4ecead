//! Owned region label map in row-major layout (stride == width).
//!
//! Labels are non-negative region ids. Id 0 is reserved for
//! "boundary / unassigned" in boundary and merge contexts only; elsewhere
//! ids run 1..=m.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelImage {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of u32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<u32>,
}

impl LabelImage {
    /// Construct a zero-initialized label map of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0; w * h],
        }
    }

    /// Wrap an existing row-major buffer. Panics if the length is not `w · h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<u32>) -> Self {
        assert_eq!(data.len(), w * h, "buffer length must equal w*h");
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    #[inline]
    /// Get the label at (x, y).
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Set the label at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: u32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Largest label present in the map (0 for an empty map).
    pub fn max_label(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// True when every pixel carries the same label.
    pub fn is_uniform(&self) -> bool {
        match self.data.first() {
            Some(&first) => self.data.iter().all(|&s| s == first),
            None => true,
        }
    }
}

impl crate::image::traits::ImageView for LabelImage {
    type Pixel = u32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u32]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}
