//! Type-safe coordinate system for the zoom pipeline.
//!
//! Every point the engine touches lives in one of three pixel spaces:
//!
//! ```text
//! ViewportSpace → MediaSpace → TargetSpace
//! ```
//!
//! - `ViewportSpace`: the tracked browser tab, where cursor samples were taken.
//! - `MediaSpace`: native pixels of the recorded video; the camera lives here.
//! - `TargetSpace`: the surface being drawn (preview canvas or export frame).
//!
//! Each space is a phantom type so coordinates from different spaces cannot be
//! mixed without going through one of the conversions below. All conversions
//! are axis-aligned scales (plus the zoom window's translation), and every
//! forward conversion has an exact inverse next to it.

use std::ops::{Add, Div, Mul, Sub};

/// Pixel coordinates inside the tracked browser viewport.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct ViewportSpace;

/// Pixel coordinates of the native recorded video.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct MediaSpace;

/// Pixel coordinates of the surface currently being drawn to.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct TargetSpace;

/// A 2D coordinate with an associated coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: std::marker::PhantomData<TSpace>,
}

impl<TSpace: Default> Coord<TSpace> {
    /// Create a new coordinate in the specified space.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: std::marker::PhantomData,
        }
    }

    /// Convert to a tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Clamp coordinates to a range.
    pub fn clamp(self, min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }

    /// Linear interpolation between two coordinates.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Get the distance to another coordinate.
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl<T: Default> Add for Coord<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Default> Sub for Coord<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Default> Mul<f64> for Coord<T> {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl<T: Default> Div<f64> for Coord<T> {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

/// Size in a specific coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size<TSpace> {
    pub width: f64,
    pub height: f64,
    _space: std::marker::PhantomData<TSpace>,
}

impl<TSpace: Default> Size<TSpace> {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            _space: std::marker::PhantomData,
        }
    }

    pub fn from_u32(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    pub fn center(&self) -> Coord<TSpace> {
        Coord::new(self.width / 2.0, self.height / 2.0)
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A rectangular region in a specific coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect<TSpace> {
    pub origin: Coord<TSpace>,
    pub size: Size<TSpace>,
}

impl<TSpace: Default + Copy> Rect<TSpace> {
    pub fn new(origin: Coord<TSpace>, size: Size<TSpace>) -> Self {
        Self { origin, size }
    }

    pub fn from_coords(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Coord::new(x, y), Size::new(width, height))
    }

    /// The whole of a surface.
    pub fn full(size: Size<TSpace>) -> Self {
        Self::new(Coord::new(0.0, 0.0), size)
    }

    pub fn bottom_right(&self) -> Coord<TSpace> {
        Coord::new(
            self.origin.x + self.size.width,
            self.origin.y + self.size.height,
        )
    }

    pub fn center(&self) -> Coord<TSpace> {
        Coord::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn contains(&self, point: Coord<TSpace>) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.size.width
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.size.height
    }

    /// Whether this rectangle lies entirely inside `bounds`.
    pub fn is_within(&self, bounds: Size<TSpace>) -> bool {
        self.origin.x >= 0.0
            && self.origin.y >= 0.0
            && self.origin.x + self.size.width <= bounds.width
            && self.origin.y + self.size.height <= bounds.height
    }
}

/// `num / den`, or 1.0 when the denominator cannot be divided by.
fn ratio(num: f64, den: f64) -> f64 {
    if den.is_finite() && den > 0.0 && num.is_finite() {
        num / den
    } else {
        1.0
    }
}

// ============================================================================
// Viewport ⇄ Media
// ============================================================================

impl Coord<ViewportSpace> {
    /// Scale a cursor sample into native video pixels.
    pub fn to_media_space(
        &self,
        viewport: Size<ViewportSpace>,
        media: Size<MediaSpace>,
    ) -> Coord<MediaSpace> {
        Coord::new(
            self.x * ratio(media.width, viewport.width),
            self.y * ratio(media.height, viewport.height),
        )
    }
}

impl Coord<MediaSpace> {
    /// Inverse of [`Coord::<ViewportSpace>::to_media_space`].
    pub fn to_viewport_space(
        &self,
        media: Size<MediaSpace>,
        viewport: Size<ViewportSpace>,
    ) -> Coord<ViewportSpace> {
        Coord::new(
            self.x / ratio(media.width, viewport.width),
            self.y / ratio(media.height, viewport.height),
        )
    }

    /// Full-frame (unzoomed) mapping onto the drawing surface.
    pub fn to_target_space(
        &self,
        media: Size<MediaSpace>,
        target: Size<TargetSpace>,
    ) -> Coord<TargetSpace> {
        Coord::new(
            self.x * ratio(target.width, media.width),
            self.y * ratio(target.height, media.height),
        )
    }

    /// Position of a media point on a surface showing only `source`,
    /// stretched to fill the surface.
    pub fn to_zoomed_target_space(
        &self,
        source: &Rect<MediaSpace>,
        target: Size<TargetSpace>,
    ) -> Coord<TargetSpace> {
        Coord::new(
            (self.x - source.origin.x) * ratio(target.width, source.size.width),
            (self.y - source.origin.y) * ratio(target.height, source.size.height),
        )
    }

    /// Build a media point from percentages (0-100) of the media size.
    pub fn from_percent(percent_x: f64, percent_y: f64, media: Size<MediaSpace>) -> Self {
        Coord::new(
            percent_x / 100.0 * media.width,
            percent_y / 100.0 * media.height,
        )
    }

    /// Express a media point as percentages (0-100) of the media size.
    pub fn to_percent(&self, media: Size<MediaSpace>) -> (f64, f64) {
        (
            self.x / ratio(media.width, 100.0),
            self.y / ratio(media.height, 100.0),
        )
    }
}

impl Coord<TargetSpace> {
    /// Inverse of [`Coord::<MediaSpace>::to_target_space`].
    pub fn to_media_space(
        &self,
        target: Size<TargetSpace>,
        media: Size<MediaSpace>,
    ) -> Coord<MediaSpace> {
        Coord::new(
            self.x / ratio(target.width, media.width),
            self.y / ratio(target.height, media.height),
        )
    }

    /// Inverse of [`Coord::<MediaSpace>::to_zoomed_target_space`].
    pub fn from_zoomed_to_media_space(
        &self,
        source: &Rect<MediaSpace>,
        target: Size<TargetSpace>,
    ) -> Coord<MediaSpace> {
        Coord::new(
            self.x / ratio(target.width, source.size.width) + source.origin.x,
            self.y / ratio(target.height, source.size.height) + source.origin.y,
        )
    }
}

// ============================================================================
// Zoom window
// ============================================================================

/// The media rectangle that, stretched over the whole target, is the zoom.
///
/// The window is `media / scale` wide and tall, centred on the camera and then
/// clamped so it never leaves the media, even when the camera sits on a corner.
/// A scale below 1 (or a non-finite one) is treated as 1, and a non-finite
/// camera centre falls back to the middle of the media.
pub fn zoomed_source_rect(
    scale: f64,
    center: Coord<MediaSpace>,
    media: Size<MediaSpace>,
) -> Rect<MediaSpace> {
    let scale = if scale.is_finite() { scale.max(1.0) } else { 1.0 };
    let width = media.width / scale;
    let height = media.height / scale;

    let center = if center.is_finite() {
        center
    } else {
        media.center()
    };

    let x = (center.x - width / 2.0).clamp(0.0, (media.width - width).max(0.0));
    let y = (center.y - height / 2.0).clamp(0.0, (media.height - height).max(0.0));

    Rect::from_coords(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> Size<MediaSpace> {
        Size::new(1920.0, 1080.0)
    }

    #[test]
    fn test_viewport_to_media_scales_each_axis() {
        let viewport = Size::<ViewportSpace>::new(960.0, 540.0);
        let point = Coord::<ViewportSpace>::new(480.0, 100.0);
        let mapped = point.to_media_space(viewport, media());
        assert!((mapped.x - 960.0).abs() < 1e-9);
        assert!((mapped.y - 200.0).abs() < 1e-9);

        let back = mapped.to_viewport_space(media(), viewport);
        assert!((back.x - 480.0).abs() < 1e-9);
        assert!((back.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_viewport_is_identity() {
        let viewport = Size::<ViewportSpace>::new(0.0, 0.0);
        let point = Coord::<ViewportSpace>::new(12.0, 34.0);
        let mapped = point.to_media_space(viewport, media());
        assert_eq!(mapped.as_tuple(), (12.0, 34.0));
    }

    #[test]
    fn test_media_to_target_round_trip() {
        let target = Size::<TargetSpace>::new(1280.0, 720.0);
        let point = Coord::<MediaSpace>::new(1500.0, 300.0);
        let on_target = point.to_target_space(media(), target);
        assert!((on_target.x - 1000.0).abs() < 1e-9);
        assert!((on_target.y - 200.0).abs() < 1e-9);

        let back = on_target.to_media_space(target, media());
        assert!((back.x - 1500.0).abs() < 1e-9);
        assert!((back.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_rect_centered() {
        let rect = zoomed_source_rect(2.0, media().center(), media());
        assert!((rect.size.width - 960.0).abs() < 1e-9);
        assert!((rect.size.height - 540.0).abs() < 1e-9);
        assert!((rect.origin.x - 480.0).abs() < 1e-9);
        assert!((rect.origin.y - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_rect_stays_inside_media_at_corners() {
        let corners = [
            Coord::<MediaSpace>::new(0.0, 0.0),
            Coord::new(1920.0, 0.0),
            Coord::new(0.0, 1080.0),
            Coord::new(1920.0, 1080.0),
            Coord::new(-500.0, 5000.0),
        ];
        for scale in [1.0, 1.01, 1.5, 2.0, 3.7, 10.0] {
            for corner in corners {
                let rect = zoomed_source_rect(scale, corner, media());
                assert!(
                    rect.is_within(media()),
                    "scale {} at {:?} produced {:?}",
                    scale,
                    corner.as_tuple(),
                    rect
                );
            }
        }
    }

    #[test]
    fn test_source_rect_degenerate_inputs() {
        let rect = zoomed_source_rect(f64::NAN, Coord::new(f64::NAN, 0.0), media());
        assert_eq!(rect, Rect::full(media()));

        let rect = zoomed_source_rect(0.5, Coord::new(10.0, 10.0), media());
        assert_eq!(rect, Rect::full(media()));
    }

    #[test]
    fn test_zoomed_target_round_trip() {
        let target = Size::<TargetSpace>::new(1280.0, 720.0);
        let rect = zoomed_source_rect(2.5, Coord::new(1700.0, 900.0), media());

        let point = Coord::<MediaSpace>::new(1600.0, 800.0);
        let on_screen = point.to_zoomed_target_space(&rect, target);
        let back = on_screen.from_zoomed_to_media_space(&rect, target);
        assert!((back.x - point.x).abs() < 1e-9);
        assert!((back.y - point.y).abs() < 1e-9);

        // Window corners land on surface corners
        let top_left = rect.origin.to_zoomed_target_space(&rect, target);
        assert!(top_left.x.abs() < 1e-9 && top_left.y.abs() < 1e-9);
        let bottom_right = rect.bottom_right().to_zoomed_target_space(&rect, target);
        assert!((bottom_right.x - 1280.0).abs() < 1e-9);
        assert!((bottom_right.y - 720.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_round_trip() {
        let point = Coord::<MediaSpace>::from_percent(25.0, 75.0, media());
        assert!((point.x - 480.0).abs() < 1e-9);
        assert!((point.y - 810.0).abs() < 1e-9);

        let (px, py) = point.to_percent(media());
        assert!((px - 25.0).abs() < 1e-9);
        assert!((py - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_coord_arithmetic() {
        let a = Coord::<MediaSpace>::new(10.0, 20.0);
        let b = Coord::<MediaSpace>::new(5.0, 10.0);

        assert_eq!((a + b).as_tuple(), (15.0, 30.0));
        assert_eq!((a - b).as_tuple(), (5.0, 10.0));
        assert_eq!((a * 2.0).as_tuple(), (20.0, 40.0));
        assert_eq!((a / 2.0).as_tuple(), (5.0, 10.0));
        assert_eq!(a.lerp(b, 0.5).as_tuple(), (7.5, 15.0));
    }
}
