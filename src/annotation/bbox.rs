//! Corner-format bounding boxes tagged with their coordinate space.

use std::fmt;
use std::marker::PhantomData;

/// Marker type for pixel coordinates (absolute values).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for normalized coordinates (fractions of the image size).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// An axis-aligned bounding box stored as its corners.
///
/// The `TSpace` parameter is either [`Pixel`] or [`Normalized`], so a box
/// measured in pixels cannot be written where a normalized one is expected.
///
/// The constructor does not enforce `min < max`: a degenerate annotation
/// still converts, and [`BBoxXYXY::is_ordered`] reports the problem.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Builds a box from its center point and size.
    ///
    /// `xmin = cx - w/2`, `xmax = cx + w/2`, and likewise for y.
    #[inline]
    pub fn from_center_size(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if all four corners are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true if min <= max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }
}

impl<TSpace> fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl BBoxXYXY<Pixel> {
    /// Divides every corner by the image dimensions.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.xmin / image_width,
            self.ymin / image_height,
            self.xmax / image_width,
            self.ymax / image_height,
        )
    }
}

impl BBoxXYXY<Normalized> {
    /// Scales every corner back up to pixels.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xyxy(
            self.xmin * image_width,
            self.ymin * image_height,
            self.xmax * image_width,
            self.ymax * image_height,
        )
    }

    /// Reinterprets a box whose source already used normalized units.
    pub fn assume_normalized(bbox: BBoxXYXY<Pixel>) -> Self {
        Self::from_xyxy(bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_size_corners() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_center_size(50.0, 40.0, 20.0, 10.0);
        assert_eq!(bbox.xmin(), 40.0);
        assert_eq!(bbox.xmax(), 60.0);
        assert_eq!(bbox.ymin(), 35.0);
        assert_eq!(bbox.ymax(), 45.0);
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 10.0);
    }

    #[test]
    fn positive_size_is_ordered() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_center_size(0.0, 0.0, 0.5, 3.0);
        assert!(bbox.xmin() < bbox.xmax());
        assert!(bbox.ymin() < bbox.ymax());
        assert!(bbox.is_ordered());

        let flipped: BBoxXYXY<Pixel> = BBoxXYXY::from_center_size(0.0, 0.0, -2.0, 3.0);
        assert!(!flipped.is_ordered());
    }

    #[test]
    fn normalize_divides_by_dimensions() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(64.0, 96.0, 320.0, 384.0);
        let norm = bbox.to_normalized(640.0, 480.0);
        assert!((norm.xmin() - 0.1).abs() < 1e-12);
        assert!((norm.ymin() - 0.2).abs() < 1e-12);
        assert!((norm.xmax() - 0.5).abs() < 1e-12);
        assert!((norm.ymax() - 0.8).abs() < 1e-12);

        let back = norm.to_pixel(640.0, 480.0);
        assert!((back.xmax() - 320.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_detected() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(f64::NAN, 0.0, 1.0, 1.0);
        assert!(!bbox.is_finite());
    }
}
