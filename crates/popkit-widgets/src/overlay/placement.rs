#![forbid(unsafe_code)]

//! Anchored placement.
//!
//! [`compute`] decides where an overlay of a given size goes relative to its
//! anchor: which side, which alignment on the cross axis, and the final
//! top-left coordinate. It is a pure function of its inputs.
//!
//! # Candidate order
//!
//! - `Auto`: sides by available space, largest first (ties: bottom, top,
//!   right, left); each side tries `center`, `start`, `end`.
//! - Concrete with repositioning: the preferred placement, the opposite side
//!   with the same alignment, the preferred side's other alignments, the
//!   opposite side's other alignments, then both perpendicular sides (more
//!   space first).
//! - Concrete without repositioning: the preferred placement only.
//!
//! The first candidate whose rect lies inside the viewport shrunk by
//! `margin` wins.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Nothing fits | Larger than any free region | Best overlap, clamped, `overflowed` set |
//! | Invalid overlay size | NaN or negative dimensions | Treated as zero-sized |
//! | Invalid margin | NaN or negative | Treated as zero |

use std::fmt;
use std::str::FromStr;

use popkit_core::geometry::{Point, Rect, Side, Size, available_space, clamp_into_viewport};

/// Gap between anchor and overlay, also kept clear at the viewport edges.
pub const DEFAULT_MARGIN: f64 = 8.0;

/// Tie order when two sides have the same free space.
const AUTO_SIDE_ORDER: [Side; 4] = [Side::Bottom, Side::Top, Side::Right, Side::Left];

/// Cross-axis alignment of the overlay against the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    /// Leading edges line up (left edges for top/bottom placements).
    Start,
    Center,
    /// Trailing edges line up.
    End,
}

impl Align {
    pub const ALL: [Align; 3] = [Align::Start, Align::Center, Align::End];

    pub const fn as_str(self) -> &'static str {
        match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
        }
    }
}

/// A concrete side + alignment pair such as `bottom-start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub side: Side,
    pub align: Align,
}

impl Placement {
    #[must_use]
    pub const fn new(side: Side, align: Align) -> Self {
        Self { side, align }
    }

    pub const BOTTOM_START: Self = Self::new(Side::Bottom, Align::Start);
    pub const BOTTOM: Self = Self::new(Side::Bottom, Align::Center);
    pub const BOTTOM_END: Self = Self::new(Side::Bottom, Align::End);
    pub const TOP_START: Self = Self::new(Side::Top, Align::Start);
    pub const TOP: Self = Self::new(Side::Top, Align::Center);
    pub const TOP_END: Self = Self::new(Side::Top, Align::End);
    pub const LEFT_START: Self = Self::new(Side::Left, Align::Start);
    pub const LEFT: Self = Self::new(Side::Left, Align::Center);
    pub const LEFT_END: Self = Self::new(Side::Left, Align::End);
    pub const RIGHT_START: Self = Self::new(Side::Right, Align::Start);
    pub const RIGHT: Self = Self::new(Side::Right, Align::Center);
    pub const RIGHT_END: Self = Self::new(Side::Right, Align::End);

    /// All twelve placements, side-major.
    pub fn all() -> impl Iterator<Item = Placement> {
        Side::ALL
            .into_iter()
            .flat_map(|side| Align::ALL.into_iter().map(move |align| Placement::new(side, align)))
    }

    /// Top-left corner of an overlay of `size` placed against `anchor`.
    #[must_use]
    pub fn origin(self, anchor: &Rect, size: Size, margin: f64) -> Point {
        let cross = |start: f64, center: f64, end: f64, extent: f64| match self.align {
            Align::Start => start,
            Align::Center => center - extent / 2.0,
            Align::End => end - extent,
        };
        match self.side {
            Side::Bottom => Point::new(
                cross(anchor.x, anchor.center_x(), anchor.right(), size.width),
                anchor.bottom() + margin,
            ),
            Side::Top => Point::new(
                cross(anchor.x, anchor.center_x(), anchor.right(), size.width),
                anchor.y - margin - size.height,
            ),
            Side::Right => Point::new(
                anchor.right() + margin,
                cross(anchor.y, anchor.center_y(), anchor.bottom(), size.height),
            ),
            Side::Left => Point::new(
                anchor.x - margin - size.width,
                cross(anchor.y, anchor.center_y(), anchor.bottom(), size.height),
            ),
        }
    }

    fn rect(self, anchor: &Rect, size: Size, margin: f64) -> Rect {
        Rect::from_origin_size(self.origin(anchor, size, margin), size)
    }
}

impl fmt::Display for Placement {
    /// `bottom-start`, `top-end`; center alignment prints as the bare side.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.align {
            Align::Center => f.write_str(self.side.as_str()),
            align => write!(f, "{}-{}", self.side.as_str(), align.as_str()),
        }
    }
}

/// Requested position: let the engine choose, or a concrete placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Position {
    #[default]
    Auto,
    At(Placement),
}

impl Position {
    /// The concrete placement, if one was requested.
    #[must_use]
    pub const fn placement(self) -> Option<Placement> {
        match self {
            Position::Auto => None,
            Position::At(p) => Some(p),
        }
    }
}

impl From<Placement> for Position {
    fn from(p: Placement) -> Self {
        Position::At(p)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Auto => f.write_str("auto"),
            Position::At(p) => fmt::Display::fmt(p, f),
        }
    }
}

/// Error returned when a position string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePositionError {
    Empty,
    UnknownSide(String),
    UnknownAlign(String),
}

impl fmt::Display for ParsePositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty position"),
            Self::UnknownSide(s) => {
                write!(f, "unknown side {s:?} (expected top, bottom, left or right)")
            }
            Self::UnknownAlign(s) => {
                write!(f, "unknown alignment {s:?} (expected start, center or end)")
            }
        }
    }
}

impl std::error::Error for ParsePositionError {}

fn parse_side(s: &str) -> Result<Side, ParsePositionError> {
    Side::ALL
        .into_iter()
        .find(|side| side.as_str() == s)
        .ok_or_else(|| ParsePositionError::UnknownSide(s.to_owned()))
}

fn parse_align(s: &str) -> Result<Align, ParsePositionError> {
    Align::ALL
        .into_iter()
        .find(|align| align.as_str() == s)
        .ok_or_else(|| ParsePositionError::UnknownAlign(s.to_owned()))
}

impl FromStr for Placement {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(ParsePositionError::Empty);
        }
        match s.split_once('-') {
            Some((side, align)) => Ok(Placement::new(parse_side(side)?, parse_align(align)?)),
            None => Ok(Placement::new(parse_side(&s)?, Align::Center)),
        }
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Position::Auto);
        }
        s.parse().map(Position::At)
    }
}

impl TryFrom<String> for Position {
    type Error = ParsePositionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.to_string()
    }
}

/// Inputs to [`compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub anchor: Rect,
    pub viewport: Rect,
    pub preferred: Position,
    pub margin: f64,
    pub allow_repositioning: bool,
}

impl PlacementRequest {
    /// `Auto`, default margin, repositioning allowed.
    #[must_use]
    pub fn new(anchor: Rect, viewport: Rect) -> Self {
        Self {
            anchor,
            viewport,
            preferred: Position::Auto,
            margin: DEFAULT_MARGIN,
            allow_repositioning: true,
        }
    }

    #[must_use]
    pub fn preferred(mut self, position: impl Into<Position>) -> Self {
        self.preferred = position.into();
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn allow_repositioning(mut self, allow: bool) -> Self {
        self.allow_repositioning = allow;
        self
    }
}

/// Result of [`compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedPlacement {
    pub resolved: Placement,
    pub x: f64,
    pub y: f64,
    /// The resolved side differs from the requested one.
    pub flipped: bool,
    /// No candidate fit; the coordinates are a best effort.
    pub overflowed: bool,
}

impl ComputedPlacement {
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The overlay's rect at this placement.
    #[must_use]
    pub fn rect(&self, size: Size) -> Rect {
        Rect::from_origin_size(self.origin(), size)
    }
}

fn sanitize(size: Size, margin: f64) -> (Size, f64) {
    let size = if size.is_valid() { size } else { Size::default() };
    let margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
    (size, margin)
}

/// Sides ordered by free space around `anchor`, largest first.
fn sides_by_space(anchor: &Rect, viewport: &Rect) -> [Side; 4] {
    let mut sides = AUTO_SIDE_ORDER;
    // Stable sort keeps the tie order.
    sides.sort_by(|a, b| {
        available_space(anchor, viewport, *b).total_cmp(&available_space(anchor, viewport, *a))
    });
    sides
}

fn candidates(request: &PlacementRequest) -> Vec<Placement> {
    let anchor = &request.anchor;
    let viewport = &request.viewport;
    match request.preferred {
        Position::Auto => sides_by_space(anchor, viewport)
            .into_iter()
            .flat_map(|side| {
                [Align::Center, Align::Start, Align::End]
                    .into_iter()
                    .map(move |align| Placement::new(side, align))
            })
            .collect(),
        Position::At(preferred) if !request.allow_repositioning => vec![preferred],
        Position::At(preferred) => {
            let opposite = preferred.side.opposite();
            let others = || Align::ALL.into_iter().filter(move |a| *a != preferred.align);

            let mut out = Vec::with_capacity(12);
            out.push(preferred);
            out.push(Placement::new(opposite, preferred.align));
            out.extend(others().map(|a| Placement::new(preferred.side, a)));
            out.extend(others().map(|a| Placement::new(opposite, a)));

            let [lead, trail] = preferred.side.perpendicular();
            let mut perpendicular = [lead, trail];
            if available_space(anchor, viewport, trail) > available_space(anchor, viewport, lead) {
                perpendicular.swap(0, 1);
            }
            for side in perpendicular {
                out.push(Placement::new(side, preferred.align));
                out.extend(others().map(|a| Placement::new(side, a)));
            }
            out
        }
    }
}

/// Side the fallback settles on when nothing fits.
fn fallback_side(request: &PlacementRequest, size: Size, margin: f64) -> Side {
    let anchor = &request.anchor;
    let viewport = &request.viewport;
    match request.preferred {
        Position::Auto => sides_by_space(anchor, viewport)[0],
        Position::At(preferred) => {
            let room = available_space(anchor, viewport, preferred.side) - 2.0 * margin;
            if !request.allow_repositioning || size.main_extent(preferred.side) <= room {
                preferred.side
            } else {
                preferred.side.opposite()
            }
        }
    }
}

/// Place an overlay of `overlay` size according to `request`.
#[must_use]
pub fn compute(request: &PlacementRequest, overlay: Size) -> ComputedPlacement {
    let (size, margin) = sanitize(overlay, request.margin);
    let bounds = request.viewport.inset(margin);
    let preferred_side = request.preferred.placement().map(|p| p.side);
    let finish = |resolved: Placement, origin: Point, overflowed: bool| ComputedPlacement {
        resolved,
        x: origin.x,
        y: origin.y,
        flipped: preferred_side.is_some_and(|side| side != resolved.side),
        overflowed,
    };

    let candidates = candidates(request);
    for candidate in &candidates {
        let rect = candidate.rect(&request.anchor, size, margin);
        if bounds.contains_rect(&rect) {
            return finish(*candidate, rect.origin(), false);
        }
    }

    let side = fallback_side(request, size, margin);
    let mut best: Option<(Placement, Rect, f64)> = None;
    for candidate in candidates.iter().filter(|c| c.side == side) {
        let rect = candidate.rect(&request.anchor, size, margin);
        let overlap = rect.overlap_area(&bounds);
        if best.is_none_or(|(_, _, area)| overlap > area) {
            best = Some((*candidate, rect, overlap));
        }
    }

    // The fallback side always has candidates; the preferred placement is
    // the last resort for a malformed request.
    let (resolved, rect) = match best {
        Some((placement, rect, _)) => (placement, rect),
        None => {
            let placement = request
                .preferred
                .placement()
                .unwrap_or(Placement::new(side, Align::Center));
            (placement, placement.rect(&request.anchor, size, margin))
        }
    };
    let rect = if request.allow_repositioning {
        clamp_into_viewport(rect, &bounds)
    } else {
        rect
    };
    finish(resolved, rect.origin(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn anchor() -> Rect {
        Rect::new(10.0, 10.0, 100.0, 30.0)
    }

    fn viewport(w: f64, h: f64) -> Rect {
        Rect::from_size(Size::new(w, h))
    }

    fn overlay() -> Size {
        Size::new(200.0, 150.0)
    }

    #[test]
    fn bottom_start_fits_as_requested() {
        let req = PlacementRequest::new(anchor(), viewport(800.0, 600.0))
            .preferred(Placement::BOTTOM_START);
        let out = compute(&req, overlay());
        assert_eq!(out.resolved, Placement::BOTTOM_START);
        assert_eq!((out.x, out.y), (10.0, 48.0));
        assert!(!out.flipped);
        assert!(!out.overflowed);
    }

    #[test]
    fn short_viewport_flips_to_top_start() {
        let req = PlacementRequest::new(anchor(), viewport(800.0, 60.0))
            .preferred(Placement::BOTTOM_START);
        let out = compute(&req, overlay());
        assert_eq!(out.resolved, Placement::TOP_START);
        assert!(out.flipped);
        assert!(out.overflowed);
        // Taller than the shrunk viewport: pinned to its top edge.
        assert_eq!((out.x, out.y), (10.0, 8.0));
    }

    #[test]
    fn anchor_near_bottom_flips_to_top() {
        let req = PlacementRequest::new(
            Rect::new(300.0, 540.0, 100.0, 30.0),
            viewport(800.0, 600.0),
        )
        .preferred(Placement::BOTTOM_START);
        let out = compute(&req, overlay());
        assert_eq!(out.resolved, Placement::TOP_START);
        assert_eq!((out.x, out.y), (300.0, 540.0 - 8.0 - 150.0));
        assert!(out.flipped);
        assert!(!out.overflowed);
    }

    #[test]
    fn alignment_shifts_before_changing_side() {
        // Near the right edge: start and center overflow horizontally and
        // the top has no room, so bottom-end wins.
        let req = PlacementRequest::new(
            Rect::new(650.0, 100.0, 100.0, 30.0),
            viewport(800.0, 600.0),
        )
        .preferred(Placement::BOTTOM_START);
        let out = compute(&req, overlay());
        assert_eq!(out.resolved, Placement::BOTTOM_END);
        assert_eq!((out.x, out.y), (550.0, 138.0));
        assert!(!out.flipped);
    }

    #[test]
    fn perpendicular_sides_are_last_resort() {
        // Neither above nor below has room; the right side does.
        let req = PlacementRequest::new(
            Rect::new(10.0, 200.0, 100.0, 200.0),
            viewport(800.0, 600.0),
        )
        .preferred(Placement::BOTTOM_START);
        let out = compute(&req, Size::new(200.0, 300.0));
        assert_eq!(out.resolved.side, Side::Right);
        assert!(out.flipped);
        assert!(!out.overflowed);
    }

    #[test]
    fn without_repositioning_keeps_preferred_unclamped() {
        let req = PlacementRequest::new(anchor(), viewport(800.0, 60.0))
            .preferred(Placement::BOTTOM_START)
            .allow_repositioning(false);
        let out = compute(&req, overlay());
        assert_eq!(out.resolved, Placement::BOTTOM_START);
        assert_eq!((out.x, out.y), (10.0, 48.0));
        assert!(!out.flipped);
        assert!(out.overflowed);
    }

    #[test]
    fn auto_prefers_side_with_most_space() {
        let req = PlacementRequest::new(
            Rect::new(350.0, 500.0, 100.0, 30.0),
            viewport(800.0, 600.0),
        );
        let out = compute(&req, overlay());
        assert_eq!(out.resolved, Placement::TOP);
        assert_eq!(out.x, 400.0 - 100.0);
        assert!(!out.flipped, "auto never reports a flip");
    }

    #[test]
    fn auto_ties_prefer_bottom() {
        let req = PlacementRequest::new(
            Rect::new(250.0, 250.0, 100.0, 100.0),
            viewport(600.0, 600.0),
        );
        assert_eq!(sides_by_space(&req.anchor, &req.viewport), AUTO_SIDE_ORDER);
        let out = compute(&req, Size::new(100.0, 100.0));
        assert_eq!(out.resolved, Placement::BOTTOM);
        assert_eq!((out.x, out.y), (250.0, 358.0));
    }

    #[test]
    fn end_alignment_lines_up_trailing_edges() {
        let anchor = Rect::new(300.0, 100.0, 100.0, 40.0);
        let size = Size::new(50.0, 20.0);
        assert_eq!(Placement::BOTTOM_END.origin(&anchor, size, 8.0), Point::new(350.0, 148.0));
        assert_eq!(Placement::LEFT_END.origin(&anchor, size, 8.0), Point::new(242.0, 120.0));
        assert_eq!(Placement::RIGHT.origin(&anchor, size, 8.0), Point::new(408.0, 110.0));
    }

    #[test]
    fn concrete_candidates_cover_all_placements() {
        let req = PlacementRequest::new(anchor(), viewport(800.0, 600.0))
            .preferred(Placement::LEFT_END);
        let list = candidates(&req);
        assert_eq!(list.len(), 12);
        assert_eq!(list[0], Placement::LEFT_END);
        assert_eq!(list[1], Placement::RIGHT_END);
        assert_eq!(list[2], Placement::LEFT_START);
        for p in Placement::all() {
            assert!(list.contains(&p), "{p} missing");
        }
    }

    #[test]
    fn invalid_inputs_are_sanitized() {
        let req = PlacementRequest::new(anchor(), viewport(800.0, 600.0))
            .preferred(Placement::BOTTOM_START)
            .margin(f64::NAN);
        let out = compute(&req, Size::new(f64::NAN, -1.0));
        assert!(out.x.is_finite() && out.y.is_finite());
        assert_eq!((out.x, out.y), (10.0, 40.0));
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("auto".parse::<Position>(), Ok(Position::Auto));
        assert_eq!(
            "bottom-start".parse::<Position>(),
            Ok(Position::At(Placement::BOTTOM_START))
        );
        assert_eq!("Top".parse::<Placement>(), Ok(Placement::TOP));
        assert_eq!("left-center".parse::<Placement>(), Ok(Placement::LEFT));
        assert_eq!(Placement::TOP_END.to_string(), "top-end");
        assert_eq!(Placement::RIGHT.to_string(), "right");
        assert_eq!(Position::Auto.to_string(), "auto");
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<Position>(), Err(ParsePositionError::Empty));
        assert_eq!(
            "middle".parse::<Placement>(),
            Err(ParsePositionError::UnknownSide("middle".into()))
        );
        assert_eq!(
            "top-left".parse::<Placement>(),
            Err(ParsePositionError::UnknownAlign("left".into()))
        );
        let msg = ParsePositionError::UnknownSide("x".into()).to_string();
        assert!(msg.contains("unknown side"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn position_serializes_as_string() {
        let json = serde_json::to_string(&Position::At(Placement::BOTTOM_END)).unwrap();
        assert_eq!(json, "\"bottom-end\"");
        let back: Position = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(back, Position::Auto);
        assert!(serde_json::from_str::<Position>("\"sideways\"").is_err());
    }

    fn arb_position() -> impl Strategy<Value = Position> {
        prop_oneof![
            Just(Position::Auto),
            (0usize..4, 0usize..3)
                .prop_map(|(s, a)| Position::At(Placement::new(Side::ALL[s], Align::ALL[a]))),
        ]
    }

    proptest! {
        #[test]
        fn fitting_overlay_stays_inside_viewport(
            ax in 0i32..800, ay in 0i32..600,
            aw in 1i32..200, ah in 1i32..80,
            ow in 0i32..400, oh in 0i32..300,
            margin in 0i32..16,
            position in arb_position(),
        ) {
            let req = PlacementRequest::new(
                Rect::new(f64::from(ax), f64::from(ay), f64::from(aw), f64::from(ah)),
                viewport(800.0, 600.0),
            )
            .preferred(position)
            .margin(f64::from(margin));
            let size = Size::new(f64::from(ow), f64::from(oh));
            let out = compute(&req, size);
            let bounds = req.viewport.inset(req.margin);
            prop_assert!(out.x.is_finite() && out.y.is_finite());
            if size.width <= bounds.width && size.height <= bounds.height {
                prop_assert!(bounds.contains_rect(&out.rect(size)), "{out:?}");
            }
            if !out.overflowed {
                prop_assert!(bounds.contains_rect(&out.rect(size)));
            }
        }

        #[test]
        fn compute_is_deterministic(
            ax in -100i32..900, ay in -100i32..700,
            ow in 0i32..900, oh in 0i32..700,
            repositioning in any::<bool>(),
            position in arb_position(),
        ) {
            let req = PlacementRequest::new(
                Rect::new(f64::from(ax), f64::from(ay), 120.0, 32.0),
                viewport(800.0, 600.0),
            )
            .preferred(position)
            .allow_repositioning(repositioning);
            let size = Size::new(f64::from(ow), f64::from(oh));
            prop_assert_eq!(compute(&req, size), compute(&req, size));
        }

        #[test]
        fn flipped_iff_side_changed(
            ay in 0i32..600,
            oh in 0i32..400,
            align in 0usize..3,
        ) {
            let preferred = Placement::new(Side::Bottom, Align::ALL[align]);
            let req = PlacementRequest::new(
                Rect::new(300.0, f64::from(ay), 100.0, 30.0),
                viewport(800.0, 600.0),
            )
            .preferred(preferred);
            let out = compute(&req, Size::new(200.0, f64::from(oh)));
            prop_assert_eq!(out.flipped, out.resolved.side != Side::Bottom);
        }
    }
}
