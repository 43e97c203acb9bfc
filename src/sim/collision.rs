//! Axis-aligned collision tests
//!
//! Every gameplay overlap in the game reduces to rectangle vs rectangle.
//! Rectangles use screen coordinates: `y` grows downward, `pos` is the
//! top-left corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::VIEWPORT_WIDTH;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Strict AABB overlap. Touching edges do not collide.
#[inline]
pub fn collides(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Whether a rectangle intersects the horizontal window
/// `[camera_x - margin, camera_x + VIEWPORT_WIDTH + margin]`.
#[inline]
pub fn is_visible(rect: &Rect, camera_x: f32, margin: f32) -> bool {
    rect.right() > camera_x - margin && rect.x < camera_x + VIEWPORT_WIDTH + margin
}

/// Whether `x` lies between `a` and `b` (either order, inclusive)
#[inline]
pub fn between(x: f32, a: f32, b: f32) -> bool {
    x >= a.min(b) && x <= a.max(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(collides(&a, &b));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!collides(&a, &b));
        let c = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!collides(&a, &c));
    }

    #[test]
    fn test_containment() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(40.0, 40.0, 5.0, 5.0);
        assert!(collides(&outer, &inner));
    }

    #[test]
    fn test_visibility_window() {
        let r = Rect::new(1000.0, 0.0, 20.0, 20.0);
        assert!(is_visible(&r, 300.0, 0.0));
        assert!(!is_visible(&r, 0.0, 0.0));
        assert!(is_visible(&r, 0.0, 250.0));
        // Left of the camera
        assert!(!is_visible(&r, 1100.0, 50.0));
        assert!(is_visible(&r, 1100.0, 90.0));
    }

    #[test]
    fn test_between() {
        assert!(between(5.0, 10.0, 0.0));
        assert!(between(0.0, 0.0, 10.0));
        assert!(!between(11.0, 0.0, 10.0));
    }

    proptest! {
        #[test]
        fn prop_collision_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0, aw in 0.0f32..200.0, ah in 0.0f32..200.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0, bw in 0.0f32..200.0, bh in 0.0f32..200.0,
        ) {
            let a = Rect::new(ax, ay, aw, ah);
            let b = Rect::new(bx, by, bw, bh);
            prop_assert_eq!(collides(&a, &b), collides(&b, &a));
        }
    }
}
