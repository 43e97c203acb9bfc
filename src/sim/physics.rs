//! Gravity integration with a hard floor

use crate::consts::GRAVITY;

/// Result of one gravity step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityResult {
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
}

/// Apply one frame of gravity to an entity whose top edge is at `y`.
///
/// The entity never sinks below `ground_y`: on contact it is snapped to
/// `ground_y - height` and its vertical velocity is zeroed.
pub fn apply_gravity(y: f32, vy: f32, height: f32, ground_y: f32) -> GravityResult {
    let vy = vy + GRAVITY;
    let y = y + vy;
    let floor = ground_y - height;
    if y >= floor {
        GravityResult {
            y: floor,
            vy: 0.0,
            on_ground: true,
        }
    } else {
        GravityResult {
            y,
            vy,
            on_ground: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::GROUND_Y;
    use proptest::prelude::*;

    #[test]
    fn test_free_fall_accelerates() {
        let r = apply_gravity(0.0, 0.0, 50.0, GROUND_Y);
        assert!(!r.on_ground);
        assert_eq!(r.vy, GRAVITY);
        let r2 = apply_gravity(r.y, r.vy, 50.0, GROUND_Y);
        assert!(r2.vy > r.vy);
    }

    #[test]
    fn test_resting_stays_put() {
        let r = apply_gravity(GROUND_Y - 50.0, 0.0, 50.0, GROUND_Y);
        assert!(r.on_ground);
        assert_eq!(r.y, GROUND_Y - 50.0);
        assert_eq!(r.vy, 0.0);
    }

    proptest! {
        #[test]
        fn prop_converges_to_ground(
            y in -400.0f32..440.0,
            vy in -20.0f32..20.0,
            height in 10.0f32..60.0,
        ) {
            let floor = GROUND_Y - height;
            let (mut y, mut vy) = (y.min(floor), vy);
            let mut landed = false;
            for _ in 0..500 {
                let r = apply_gravity(y, vy, height, GROUND_Y);
                prop_assert!(r.y <= floor);
                y = r.y;
                vy = r.vy;
                if r.on_ground {
                    landed = true;
                    break;
                }
            }
            prop_assert!(landed);
            prop_assert_eq!(y, floor);
            prop_assert_eq!(vy, 0.0);
        }
    }
}
