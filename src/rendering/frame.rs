//! Frame buffers and the stretch blit both render drivers draw with.

use image::RgbaImage;

use super::coord::{MediaSpace, Rect, Size};

/// A drawn output frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame number (0-indexed).
    pub frame_number: u32,
    /// Timestamp in seconds.
    pub timestamp: f64,
    /// RGBA pixels.
    pub image: RgbaImage,
}

impl Frame {
    pub fn new(frame_number: u32, timestamp: f64, image: RgbaImage) -> Self {
        Self {
            frame_number,
            timestamp,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// What to draw for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// The whole media frame, scaled to the target.
    FullFrame,
    /// Only `source`, stretched over the whole target.
    Zoomed { source: Rect<MediaSpace> },
}

impl DrawCommand {
    /// The media rectangle this command samples.
    pub fn source_rect(&self, media: Size<MediaSpace>) -> Rect<MediaSpace> {
        match self {
            DrawCommand::FullFrame => Rect::full(media),
            DrawCommand::Zoomed { source } => *source,
        }
    }

    pub fn is_zoomed(&self) -> bool {
        matches!(self, DrawCommand::Zoomed { .. })
    }
}

/// Nearest-neighbour stretch of `region` (in `src` pixels) over all of `dst`.
///
/// Each destination pixel samples the source at its own centre, so the
/// mapping is the same regardless of which driver owns `dst`.
pub fn stretch_blit(src: &RgbaImage, region: Rect<MediaSpace>, dst: &mut RgbaImage) {
    let (src_w, src_h) = src.dimensions();
    let (dst_w, dst_h) = dst.dimensions();
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return;
    }

    let step_x = region.size.width / dst_w as f64;
    let step_y = region.size.height / dst_h as f64;
    let max_x = (src_w - 1) as f64;
    let max_y = (src_h - 1) as f64;

    for dst_y in 0..dst_h {
        let sy = (region.origin.y + (dst_y as f64 + 0.5) * step_y)
            .floor()
            .clamp(0.0, max_y) as u32;
        for dst_x in 0..dst_w {
            let sx = (region.origin.x + (dst_x as f64 + 0.5) * step_x)
                .floor()
                .clamp(0.0, max_x) as u32;
            dst.put_pixel(dst_x, dst_y, *src.get_pixel(sx, sy));
        }
    }
}

/// Draw the whole source over the target.
pub fn full_frame_blit(src: &RgbaImage, dst: &mut RgbaImage) {
    if src.dimensions() == dst.dimensions() {
        dst.copy_from_slice(src.as_raw());
        return;
    }
    let region = Rect::full(Size::from_u32(src.width(), src.height()));
    stretch_blit(src, region, dst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Each pixel encodes its own coordinates.
    fn coordinate_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_full_frame_blit_same_size_copies() {
        let src = coordinate_image(8, 4);
        let mut dst = RgbaImage::new(8, 4);
        full_frame_blit(&src, &mut dst);
        assert_eq!(src, dst);
    }

    #[test]
    fn test_full_frame_blit_downscale() {
        let src = coordinate_image(8, 4);
        let mut dst = RgbaImage::new(4, 2);
        full_frame_blit(&src, &mut dst);
        // Centre of dst pixel (1, 1) maps to src (3, 3)
        assert_eq!(dst.get_pixel(1, 1), &Rgba([3, 3, 0, 255]));
    }

    #[test]
    fn test_zoomed_blit_samples_region() {
        let src = coordinate_image(100, 60);
        let mut dst = RgbaImage::new(100, 60);
        let region = Rect::from_coords(50.0, 30.0, 50.0, 30.0);
        stretch_blit(&src, region, &mut dst);

        assert_eq!(dst.get_pixel(0, 0), &Rgba([50, 30, 0, 255]));
        assert_eq!(dst.get_pixel(99, 59), &Rgba([99, 59, 0, 255]));
        assert_eq!(dst.get_pixel(2, 2), &Rgba([51, 31, 0, 255]));
    }

    #[test]
    fn test_draw_command_source_rect() {
        let media = Size::<MediaSpace>::new(100.0, 60.0);
        assert_eq!(DrawCommand::FullFrame.source_rect(media), Rect::full(media));
        let zoomed = DrawCommand::Zoomed {
            source: Rect::from_coords(10.0, 10.0, 50.0, 30.0),
        };
        assert!(zoomed.is_zoomed());
        assert_eq!(zoomed.source_rect(media).origin.x, 10.0);
    }
}
