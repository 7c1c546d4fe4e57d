//! Texture generation for the frame view.

use egui::ColorImage;
use peakpick_core::{render_rgba, Colormap, DisplayRange, Frame, PixelRegion};

/// Everything the rendered pixels depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureKey {
    pub frame: usize,
    pub colormap: Colormap,
    pub range: DisplayRange,
}

/// Uploaded image of one frame.
pub struct FrameTexture {
    pub key: TextureKey,
    pub handle: egui::TextureHandle,
    /// Frame width and height in pixels.
    pub size: [usize; 2],
}

impl FrameTexture {
    #[must_use]
    pub fn is_current(&self, key: &TextureKey) -> bool {
        self.key == *key
    }
}

/// Colour image of a whole frame, top row first.
#[must_use]
pub fn frame_image(frame: &Frame, colormap: Colormap, range: DisplayRange) -> ColorImage {
    let pixels = render_rgba(frame, PixelRegion::full(frame), range, colormap);
    ColorImage::from_rgba_unmultiplied([frame.width(), frame.height()], &pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;

    #[test]
    fn test_frame_image_layout() {
        let frame = Frame::new(3, 2, vec![0, 250, 500, 0, 0, 1000]).unwrap();
        let image = frame_image(&frame, Colormap::Grayscale, DisplayRange::new(0.0, 500.0));
        assert_eq!(image.size, [3, 2]);
        assert_eq!(image.pixels[0], Color32::BLACK);
        assert_eq!(image.pixels[2], Color32::WHITE);
        // Values above vmax saturate.
        assert_eq!(image.pixels[5], Color32::WHITE);
    }
}
