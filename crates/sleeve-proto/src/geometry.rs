//! Screen rectangles and corner anchoring.
//!
//! A resize changes the window's size around its top-left corner. To keep the
//! overlay visually pinned to the screen edge it sits closest to, the corner
//! nearest that edge is chosen as the anchor and the window is moved so that
//! the same corner of the resized window lands on the old anchor point.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in compositor layout pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl AnchorCorner {
    /// Pick the corner by which quadrant of the monitor the window's center
    /// falls in. A center exactly on the monitor's midline counts as left/top.
    pub fn classify(window: &Rect, monitor: &Rect) -> Self {
        let (wx, wy) = window.center();
        let (mx, my) = monitor.center();
        match (wx > mx, wy > my) {
            (false, false) => AnchorCorner::TopLeft,
            (true, false) => AnchorCorner::TopRight,
            (false, true) => AnchorCorner::BottomLeft,
            (true, true) => AnchorCorner::BottomRight,
        }
    }

    pub fn is_right(self) -> bool {
        matches!(self, AnchorCorner::TopRight | AnchorCorner::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, AnchorCorner::BottomLeft | AnchorCorner::BottomRight)
    }
}

/// The point of `rect` at the given corner.
pub fn anchor_point(rect: &Rect, corner: AnchorCorner) -> (i32, i32) {
    let x = if corner.is_right() {
        rect.x + rect.width
    } else {
        rect.x
    };
    let y = if corner.is_bottom() {
        rect.y + rect.height
    } else {
        rect.y
    };
    (x, y)
}

/// Top-left position that puts `corner` of a `width` x `height` window on the
/// same screen point as `corner` of `before`.
pub fn anchor_target(before: &Rect, width: i32, height: i32, corner: AnchorCorner) -> (i32, i32) {
    let (ax, ay) = anchor_point(before, corner);
    let x = if corner.is_right() { ax - width } else { ax };
    let y = if corner.is_bottom() { ay - height } else { ay };
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_tie_resolves_top_left() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        let window = Rect::new(860, 440, 200, 200);
        assert_eq!(window.center(), monitor.center());
        assert_eq!(
            AnchorCorner::classify(&window, &monitor),
            AnchorCorner::TopLeft
        );
    }

    #[test]
    fn anchor_points_for_each_corner() {
        let r = Rect::new(10, 20, 100, 50);
        assert_eq!(anchor_point(&r, AnchorCorner::TopLeft), (10, 20));
        assert_eq!(anchor_point(&r, AnchorCorner::TopRight), (110, 20));
        assert_eq!(anchor_point(&r, AnchorCorner::BottomLeft), (10, 70));
        assert_eq!(anchor_point(&r, AnchorCorner::BottomRight), (110, 70));
    }
}
