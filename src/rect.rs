use nalgebra::Vector4;
use num::Float;
use std::fmt::Debug;

/* ------------------------------------------------------------------------------
 * Type aliases
 * ------------------------------------------------------------------------------ */
/// Box as `[cx, cy, w, h]`, the layout the motion filter measures.
pub type Cxcywh<T> = Vector4<T>;

/* ------------------------------------------------------------------------------
 * Rect struct
 * ------------------------------------------------------------------------------ */

/// Axis-aligned box stored as top-left / bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<T>
where
    T: Debug + Float,
{
    x1: T,
    y1: T,
    x2: T,
    y2: T,
}

impl<T> Rect<T>
where
    T: Debug + Float,
{
    pub fn from_corners(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from its center and extent.
    pub fn from_center(cx: T, cy: T, width: T, height: T) -> Self {
        let two = T::one() + T::one();
        Self {
            x1: cx - width / two,
            y1: cy - height / two,
            x2: cx + width / two,
            y2: cy + height / two,
        }
    }

    #[inline(always)]
    pub fn top_left(&self) -> (T, T) {
        (self.x1, self.y1)
    }

    #[inline(always)]
    pub fn bottom_right(&self) -> (T, T) {
        (self.x2, self.y2)
    }

    #[inline(always)]
    pub fn width(&self) -> T {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> T {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (T, T) {
        let two = T::one() + T::one();
        (self.x1 + self.width() / two, self.y1 + self.height() / two)
    }

    /// Finite corners with `bottom_right > top_left` on both axes.
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x2 > self.x1
            && self.y2 > self.y1
    }

    /// Pixel-inclusive area, `(x2 - x1 + 1) * (y2 - y1 + 1)`.
    pub fn area(&self) -> T {
        (self.width() + T::one()) * (self.height() + T::one())
    }

    /// Intersection-over-union with the pixel-inclusive convention.
    ///
    /// Disjoint boxes yield zero and the result is clamped into `[0, 1]`.
    pub fn calc_iou(&self, other: &Rect<T>) -> T {
        let iw = self.x2.min(other.x2) - self.x1.max(other.x1) + T::one();
        if iw <= T::zero() {
            return T::zero();
        }
        let ih = self.y2.min(other.y2) - self.y1.max(other.y1) + T::one();
        if ih <= T::zero() {
            return T::zero();
        }

        let inter = iw * ih;
        let union = self.area() + other.area() - inter;
        if union <= T::zero() {
            return T::zero();
        }
        (inter / union).max(T::zero()).min(T::one())
    }

    pub fn get_cxcywh(&self) -> Cxcywh<T>
    where
        T: 'static,
    {
        let (cx, cy) = self.center();
        Vector4::new(cx, cy, self.width(), self.height())
    }

    /// Get bounding box as [x1, y1, x2, y2] format
    pub fn get_xyxy(&self) -> [T; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}
