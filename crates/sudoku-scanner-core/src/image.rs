use crate::ImageSize;

/// Borrowed 8-bit RGB image, row-major, 3 bytes per pixel.
///
/// This is what the external grid collaborators see; it carries no decoder
/// or file association.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h*3
}

impl<'a> RgbImageView<'a> {
    pub const CHANNELS: usize = 3;

    /// Wrap `data`, checking that its length matches the dimensions.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(Self::CHANNELS)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width as u32, self.height as u32)
    }
}
