use serde::{Deserialize, Serialize};

/// Space between an anchor and the floating element placed next to it, in CSS pixels.
pub const DEFAULT_OVERLAY_GAP: f64 = 8.0;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub left: f64,
    pub top: f64,
}

/// Where a floating element sits relative to its anchor.
///
/// For corners the vertical part picks above or below, the horizontal part names the anchor edge the element's
/// matching edge aligns to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 8] = [
        Position::Top,
        Position::Bottom,
        Position::Left,
        Position::Right,
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    /// Positions to try, in order, when `self` is requested.
    pub const fn fallbacks(self) -> [Position; 8] {
        use Position::*;
        match self {
            Top => [
                Top,
                Bottom,
                Left,
                Right,
                TopLeft,
                TopRight,
                BottomLeft,
                BottomRight,
            ],
            Bottom => [
                Bottom,
                Top,
                Left,
                Right,
                BottomLeft,
                BottomRight,
                TopLeft,
                TopRight,
            ],
            Left => [
                Left,
                Right,
                Top,
                Bottom,
                TopLeft,
                BottomLeft,
                TopRight,
                BottomRight,
            ],
            Right => [
                Right,
                Left,
                Top,
                Bottom,
                TopRight,
                BottomRight,
                TopLeft,
                BottomLeft,
            ],
            TopLeft => [
                TopLeft,
                BottomLeft,
                Top,
                Left,
                TopRight,
                BottomRight,
                Bottom,
                Right,
            ],
            TopRight => [
                TopRight,
                BottomRight,
                Top,
                Right,
                TopLeft,
                BottomLeft,
                Bottom,
                Left,
            ],
            BottomLeft => [
                BottomLeft,
                TopLeft,
                Bottom,
                Left,
                BottomRight,
                TopRight,
                Top,
                Right,
            ],
            BottomRight => [
                BottomRight,
                TopRight,
                Bottom,
                Right,
                BottomLeft,
                TopLeft,
                Top,
                Left,
            ],
        }
    }

    /// Raw coordinates for this position, without any viewport check.
    pub fn offset(self, anchor: &Rect, floating: Size, gap: f64) -> Point {
        use Position::*;

        let centered_left = anchor.left + (anchor.width - floating.width) / 2.0;
        let centered_top = anchor.top + (anchor.height - floating.height) / 2.0;
        let above = anchor.top - floating.height - gap;
        let below = anchor.bottom() + gap;
        let left_aligned = anchor.left;
        let right_aligned = anchor.right() - floating.width;

        let (left, top) = match self {
            Top => (centered_left, above),
            Bottom => (centered_left, below),
            Left => (anchor.left - floating.width - gap, centered_top),
            Right => (anchor.right() + gap, centered_top),
            TopLeft => (left_aligned, above),
            TopRight => (right_aligned, above),
            BottomLeft => (left_aligned, below),
            BottomRight => (right_aligned, below),
        };
        Point { left, top }
    }
}

fn fits(point: Point, floating: Size, viewport: Size) -> bool {
    point.left >= 0.0
        && point.top >= 0.0
        && point.left + floating.width <= viewport.width
        && point.top + floating.height <= viewport.height
}

/// Places a floating element next to `anchor`, trying the fallbacks of `desired` until one fits the viewport.
///
/// When nothing fits the raw coordinates of `desired` come back unclamped.
pub fn place(anchor: &Rect, floating: Size, desired: Position, viewport: Size) -> Point {
    place_with_gap(anchor, floating, desired, viewport, DEFAULT_OVERLAY_GAP)
}

pub fn place_with_gap(
    anchor: &Rect,
    floating: Size,
    desired: Position,
    viewport: Size,
    gap: f64,
) -> Point {
    resolve(anchor, floating, desired, viewport, gap).0
}

/// Like [`place_with_gap`], also reporting which position won, `None` for the unclamped fallback.
pub fn resolve(
    anchor: &Rect,
    floating: Size,
    desired: Position,
    viewport: Size,
    gap: f64,
) -> (Point, Option<Position>) {
    desired
        .fallbacks()
        .into_iter()
        .map(|position| (position.offset(anchor, floating, gap), position))
        .find(|&(point, _)| fits(point, floating, viewport))
        .map_or_else(
            || {
                log::trace!("no position fits the viewport, keeping {:?}", desired);
                (desired.offset(anchor, floating, gap), None)
            },
            |(point, position)| (point, Some(position)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const VIEWPORT: Size = Size::new(1000.0, 800.0);

    fn anchor() -> Rect {
        Rect::new(400.0, 300.0, 40.0, 40.0)
    }

    #[test]
    fn every_fallback_list_is_a_permutation_starting_with_itself() {
        for position in Position::ALL {
            let list = position.fallbacks();
            let unique: HashSet<_> = list.iter().collect();

            assert_eq!(list[0], position);
            assert_eq!(unique.len(), 8);
        }
    }

    #[test]
    fn roomy_anchor_gets_requested_position() {
        for position in Position::ALL {
            let (point, chosen) = resolve(&anchor(), Size::new(100.0, 50.0), position, VIEWPORT, 8.0);

            assert_eq!(chosen, Some(position));
            assert_eq!(point, position.offset(&anchor(), Size::new(100.0, 50.0), 8.0));
        }
    }

    #[test]
    fn top_offsets_center_above_with_gap() {
        let point = place(&anchor(), Size::new(100.0, 50.0), Position::Top, VIEWPORT);

        assert_eq!(point, Point { left: 370.0, top: 242.0 });
    }

    #[test]
    fn anchor_at_top_edge_flips_below() {
        let anchor = Rect::new(400.0, 10.0, 40.0, 40.0);

        let (point, chosen) = resolve(&anchor, Size::new(100.0, 50.0), Position::Top, VIEWPORT, 8.0);

        assert_eq!(chosen, Some(Position::Bottom));
        assert_eq!(point.top, 58.0);
    }

    #[test]
    fn corner_near_right_edge_tries_its_own_fallbacks() {
        let anchor = Rect::new(960.0, 10.0, 40.0, 40.0);

        let (_, chosen) = resolve(&anchor, Size::new(100.0, 50.0), Position::TopLeft, VIEWPORT, 8.0);

        // TopLeft and BottomLeft overflow the right edge, Top overflows the top, Left fits
        assert_eq!(chosen, Some(Position::Left));
    }

    #[test]
    fn oversized_element_keeps_raw_requested_coordinates() {
        let floating = Size::new(2000.0, 2000.0);

        let (point, chosen) = resolve(&anchor(), floating, Position::Right, VIEWPORT, 8.0);

        assert_eq!(chosen, None);
        assert_eq!(point, Position::Right.offset(&anchor(), floating, 8.0));
    }
}
