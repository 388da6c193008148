#![forbid(unsafe_code)]

//! Rectangle math for anchored overlays.
//!
//! All coordinates are CSS-style pixels in viewport space: `x` grows to the
//! right, `y` grows downwards, and a [`Rect`] is described by its top-left
//! corner plus a non-negative size.
//!
//! # Invariants
//!
//! 1. Every function here is pure: no state, no allocation.
//! 2. [`clamp_into_viewport`] never returns a rect starting before the
//!    viewport origin, even when the rect is larger than the viewport.
//! 3. [`available_space`] is never negative.
//!
//! # Failure Modes
//!
//! None. Inputs are assumed to be validated rectangles; non-finite values
//! are rejected earlier by [`Rect::is_measurable`].

/// A point in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and non-negative.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    /// Extent along the axis that `side` moves away from the anchor.
    #[inline]
    pub fn main_extent(self, side: Side) -> f64 {
        if side.is_vertical() {
            self.height
        } else {
            self.width
        }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Finite coordinates and a non-zero size.
    ///
    /// An anchor that fails this check is skipped during placement.
    pub fn is_measurable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Shrink by `margin` on every side. Never produces a negative size.
    pub fn inset(&self, margin: f64) -> Rect {
        let width = (self.width - 2.0 * margin).max(0.0);
        let height = (self.height - 2.0 * margin).max(0.0);
        Rect::new(self.x + margin, self.y + margin, width, height)
    }

    /// Same size, moved to `(x, y)`.
    #[inline]
    pub fn with_origin(&self, x: f64, y: f64) -> Rect {
        Rect::new(x, y, self.width, self.height)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// `other` lies entirely inside `self` (edges may touch).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlapping region, or `None` when the rects are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    #[inline]
    pub fn overlap_area(&self, other: &Rect) -> f64 {
        self.intersection(other).map_or(0.0, |r| r.area())
    }
}

/// The side of an anchor an overlay is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    #[inline]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Top and bottom move the overlay along the y axis.
    #[inline]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    /// The two sides on the other axis, in `(leading, trailing)` order.
    #[inline]
    pub const fn perpendicular(self) -> [Side; 2] {
        if self.is_vertical() {
            [Side::Left, Side::Right]
        } else {
            [Side::Top, Side::Bottom]
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Distance from the anchor's edge on `side` to the matching viewport edge.
pub fn available_space(anchor: &Rect, viewport: &Rect, side: Side) -> f64 {
    let space = match side {
        Side::Top => anchor.y - viewport.y,
        Side::Bottom => viewport.bottom() - anchor.bottom(),
        Side::Left => anchor.x - viewport.x,
        Side::Right => viewport.right() - anchor.right(),
    };
    space.max(0.0)
}

/// Whether `size` fits in `available`.
#[inline]
pub fn fits(size: f64, available: f64) -> bool {
    size <= available
}

/// Translate `rect` so it lies inside `viewport`.
///
/// On an axis where `rect` is larger than the viewport the rect is pinned to
/// the viewport's start edge, so the leading part of the content stays
/// visible.
pub fn clamp_into_viewport(rect: Rect, viewport: &Rect) -> Rect {
    let x = clamp_axis(rect.x, rect.width, viewport.x, viewport.width);
    let y = clamp_axis(rect.y, rect.height, viewport.y, viewport.height);
    rect.with_origin(x, y)
}

fn clamp_axis(pos: f64, extent: f64, start: f64, span: f64) -> f64 {
    if extent >= span {
        return start;
    }
    pos.clamp(start, start + span - extent)
}
