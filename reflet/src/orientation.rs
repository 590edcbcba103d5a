//! Pointer-driven smoothing filters.
//!
//! Raw pointer coordinates become a target rotation (and, for some scene
//! variants, a target translation) of the scene container. The current value
//! moves a fixed fraction of the remaining distance toward the target every
//! frame, so motion converges exponentially and never snaps.

use crate::Float;

use nalgebra::{UnitQuaternion, Vector3};

/// Fraction of the remaining arc covered each frame.
pub const SLERP_FACTOR: Float = 0.1;

/// Scale applied to viewport-sized pointer coordinates before they are
/// interpreted as angles (radians) or distances.
const POINTER_SCALE: Float = 0.01;

/// Viewport dimensions in scene units, used to scale pointer input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: Float,
    pub height: Float,
}

/// Smoothly follows a pointer-derived rotation.
///
/// State lives for the duration of one scene; reconstruction resets it to the
/// identity rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct OrientationFilter {
    current: UnitQuaternion<Float>,
    target: UnitQuaternion<Float>,
    yaw_only: bool,
}

impl OrientationFilter {
    /// `yaw_only` restricts the target to rotation about the vertical axis.
    #[inline]
    #[must_use]
    pub fn new(yaw_only: bool) -> Self {
        Self {
            current: UnitQuaternion::identity(),
            target: UnitQuaternion::identity(),
            yaw_only,
        }
    }

    /// Recomputes the target rotation from normalized pointer coordinates in
    /// `[-1, 1]²`. Horizontal movement yaws, vertical movement pitches.
    pub fn set_pointer(&mut self, x: Float, y: Float, viewport: Viewport) {
        let yaw = x * viewport.width * POINTER_SCALE;
        let pitch = if self.yaw_only {
            0.0
        } else {
            y * viewport.height * POINTER_SCALE
        };

        self.target = UnitQuaternion::from_euler_angles(pitch, yaw, 0.0);
    }

    /// Advances the current rotation 10% of the way to the target and returns
    /// it. A stationary pointer makes the rotation converge asymptotically
    /// without ever reaching the target exactly; callers must not rely on
    /// finite-step convergence.
    pub fn advance(&mut self) -> UnitQuaternion<Float> {
        self.current = self
            .current
            .try_slerp(&self.target, SLERP_FACTOR, Float::EPSILON)
            .unwrap_or(self.target);
        self.current
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> UnitQuaternion<Float> {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> UnitQuaternion<Float> {
        self.target
    }

    /// Remaining angular distance to the target, in radians.
    #[inline]
    #[must_use]
    pub fn angle_to_target(&self) -> Float {
        self.current.angle_to(&self.target)
    }
}

/// Same exponential-decay smoothing, for a translation following the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionFilter {
    current: Vector3<Float>,
    target: Vector3<Float>,
}

impl PositionFilter {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Vector3::zeros(),
            target: Vector3::zeros(),
        }
    }

    pub fn set_pointer(&mut self, x: Float, y: Float, viewport: Viewport) {
        self.target = Vector3::new(
            x * viewport.width * POINTER_SCALE,
            y * viewport.height * POINTER_SCALE,
            0.0,
        );
    }

    pub fn advance(&mut self) -> Vector3<Float> {
        self.current += (self.target - self.current) * SLERP_FACTOR;
        self.current
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> Vector3<Float> {
        self.current
    }
}

impl Default for PositionFilter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 16.0,
        height: 9.0,
    };

    #[test]
    fn converges_monotonically_without_overshoot() {
        let mut filter = OrientationFilter::new(false);
        filter.set_pointer(0.8, -0.5, VIEWPORT);

        let mut prev = filter.angle_to_target();
        assert!(prev > 0.0);

        for _ in 0..100 {
            filter.advance();
            let angle = filter.angle_to_target();

            // Each step covers exactly 10% of the remaining arc, so the
            // distance shrinks by a factor of 0.9 and never crosses zero.
            assert!(angle < prev);
            assert!((angle - prev * (1.0 - SLERP_FACTOR)).abs() < 1e-9);
            prev = angle;
        }

        assert!(prev < 1e-3);
    }

    #[test]
    fn stationary_pointer_never_reaches_target() {
        let mut filter = OrientationFilter::new(false);
        filter.set_pointer(1.0, 1.0, VIEWPORT);

        for _ in 0..64 {
            filter.advance();
        }

        // Asymptotic approach is accepted behavior.
        assert!(filter.angle_to_target() > 0.0);
        assert!(filter.angle_to_target() < 1e-2);
    }

    #[test]
    fn yaw_only_ignores_vertical_input() {
        let mut filter = OrientationFilter::new(true);
        filter.set_pointer(0.3, 0.9, VIEWPORT);

        let (pitch, yaw, roll) = filter.target().euler_angles();
        assert!(pitch.abs() < 1e-12);
        assert!(roll.abs() < 1e-12);
        assert!((yaw - 0.3 * VIEWPORT.width * 0.01).abs() < 1e-12);
    }

    #[test]
    fn retargeting_redirects_convergence() {
        let mut filter = OrientationFilter::new(false);
        filter.set_pointer(1.0, 0.0, VIEWPORT);
        for _ in 0..10 {
            filter.advance();
        }

        filter.set_pointer(-1.0, 0.0, VIEWPORT);
        let before = filter.angle_to_target();
        filter.advance();
        assert!(filter.angle_to_target() < before);
    }

    #[test]
    fn position_filter_decays_exponentially() {
        let mut filter = PositionFilter::new();
        filter.set_pointer(1.0, 0.0, VIEWPORT);

        let target_x = VIEWPORT.width * 0.01;
        let mut prev = target_x;
        for _ in 0..100 {
            let p = filter.advance();
            let remaining = target_x - p.x;
            assert!(remaining >= 0.0);
            assert!(remaining < prev);
            prev = remaining;
        }
        assert!(prev < 1e-4);
    }
}
