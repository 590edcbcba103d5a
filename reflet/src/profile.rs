//! Scene profiles.
//!
//! Scene variants differ only in configuration: whether the panels are
//! physics-driven or spin in place, grid dimensions, film parameters,
//! background shell, camera framing. They are all profiles of one core; a
//! profile is plain validated data consumed by the renderer at scene
//! construction.

use crate::film::ThinFilmParams;
use crate::Float;

use nalgebra::Vector3;

/// Initial panel layout: a centered `rows x cols` grid in the XY plane with
/// uniform spacing. This is the initial condition only; once physics is
/// enabled the bodies go wherever the simulation takes them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirrorGrid {
    rows: usize,
    cols: usize,
    spacing: Float,
    origin: Vector3<Float>,
}

impl MirrorGrid {
    /// Returns `None` for an empty grid or non-positive spacing.
    #[must_use]
    pub fn try_new(
        rows: usize,
        cols: usize,
        spacing: Float,
        origin: Vector3<Float>,
    ) -> Option<Self> {
        (rows > 0
            && cols > 0
            && spacing.is_finite()
            && spacing > 0.0
            && origin.iter().all(|c| c.is_finite()))
        .then_some(Self {
            rows,
            cols,
            spacing,
            origin,
        })
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[must_use]
    pub const fn spacing(&self) -> Float {
        self.spacing
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Vector3<Float> {
        self.origin
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Panel centers in row-major order: columns fill left to right (centered
    /// on the origin), rows stack upward.
    #[must_use]
    pub fn positions(&self) -> Vec<Vector3<Float>> {
        let half_width = (self.cols - 1) as Float * self.spacing * 0.5;

        (0..self.len())
            .map(|i| {
                let col = (i % self.cols) as Float;
                let row = (i / self.cols) as Float;
                self.origin
                    + Vector3::new(col * self.spacing - half_width, row * self.spacing, 0.0)
            })
            .collect()
    }
}

/// Rigid-body parameters shared by all panels of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsProfile {
    pub gravity: Vector3<Float>,
    pub mass: Float,
    pub friction: Float,
    pub restitution: Float,
    /// Height of the horizontal ground plane.
    pub ground_height: Float,
    /// Impulse applied to a panel when it is clicked.
    pub click_impulse: Vector3<Float>,
}

/// The offscreen cube-capture configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeProfile {
    /// Face resolution in texels. Allocated once, never resized.
    pub resolution: u32,
    pub position: Vector3<Float>,
    pub near: Float,
    pub far: Float,
}

/// The enclosing background shell, rendered inside-out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundShell {
    pub radius: Float,
    /// Octahedron subdivision level.
    pub detail: u32,
    pub color: [Float; 4],
}

/// Full description of one scene variant.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneProfile {
    pub grid: MirrorGrid,
    pub half_extents: Vector3<Float>,
    /// `None` disables simulation; panels then follow `spin` if set.
    pub physics: Option<PhysicsProfile>,
    /// Per-frame Euler increments applied to every panel when physics is off.
    pub spin: Option<Vector3<Float>>,
    pub film: ThinFilmParams,
    pub probe: ProbeProfile,
    pub background: BackgroundShell,
    /// Vertical field of view of the main camera, radians.
    pub camera_fov: Float,
    pub camera_z: Float,
    /// Restrict the pointer filter to yaw.
    pub yaw_only: bool,
    /// Additionally lerp the scene container toward the pointer position.
    pub pointer_position_lerp: bool,
    /// Enable the free orbit camera (the original's `?ctrl` query flag).
    pub debug_controls: bool,
}

impl SceneProfile {
    /// A wall of slowly spinning panels, no physics.
    #[must_use]
    pub fn mirror_wall() -> Self {
        Self {
            grid: MirrorGrid::try_new(5, 6, 2.0, Vector3::new(0.0, -1.0, 0.0)).unwrap(),
            half_extents: Vector3::new(1.0, 1.0, 1.0),
            physics: None,
            spin: Some(Vector3::new(0.0, 0.001, 0.01)),
            film: ThinFilmParams::default(),
            probe: ProbeProfile {
                resolution: 1024,
                position: Vector3::new(0.0, 0.0, 5.0),
                near: 0.1,
                far: 100.0,
            },
            background: BackgroundShell {
                radius: 20.0,
                detail: 4,
                color: [0.78, 0.82, 0.86, 0.3],
            },
            camera_fov: 70f64.to_radians(),
            camera_z: 10.0,
            yaw_only: false,
            pointer_position_lerp: false,
            debug_controls: false,
        }
    }

    /// The physics variant: panels stacked on a floor, knocked around by
    /// pointer clicks.
    #[must_use]
    pub fn falling_mirrors() -> Self {
        Self {
            grid: MirrorGrid::try_new(5, 6, 2.0, Vector3::new(0.0, -1.0, 0.0)).unwrap(),
            half_extents: Vector3::new(1.0, 1.0, 1.0),
            physics: Some(PhysicsProfile {
                gravity: Vector3::new(0.0, -10.0, 0.0),
                mass: 1.0,
                friction: 1.0,
                restitution: 0.0,
                ground_height: -2.0,
                click_impulse: Vector3::new(0.0, 0.0, -50.0),
            }),
            spin: None,
            film: ThinFilmParams::default(),
            probe: ProbeProfile {
                resolution: 1024,
                position: Vector3::zeros(),
                near: 0.1,
                far: 100.0,
            },
            background: BackgroundShell {
                radius: 100.0,
                detail: 2,
                color: [0.96, 0.11, 0.39, 1.0],
            },
            camera_fov: 70f64.to_radians(),
            camera_z: 10.0,
            yaw_only: true,
            pointer_position_lerp: false,
            debug_controls: false,
        }
    }

    /// Floating panels drifting after the pointer, thick-film tint.
    #[must_use]
    pub fn pointer_drift() -> Self {
        Self {
            grid: MirrorGrid::try_new(3, 3, 2.5, Vector3::new(0.0, -2.5, 0.0)).unwrap(),
            half_extents: Vector3::new(0.5, 0.5, 0.5),
            physics: None,
            spin: Some(Vector3::new(0.0, 0.001, 0.01)),
            film: ThinFilmParams::try_new(410.0, 0.0, core::f64::consts::FRAC_PI_2, 1024)
                .unwrap(),
            probe: ProbeProfile {
                resolution: 1024,
                position: Vector3::new(0.0, 0.0, -12.0),
                near: 0.001,
                far: 100.0,
            },
            background: BackgroundShell {
                radius: 20.0,
                detail: 4,
                color: [0.73, 0.37, 0.73, 1.0],
            },
            camera_fov: 70f64.to_radians(),
            camera_z: 10.0,
            yaw_only: false,
            pointer_position_lerp: true,
            debug_controls: false,
        }
    }

    /// Checks every parameter that would otherwise only fail deep inside
    /// scene construction. Must pass before the first frame renders; there is
    /// no partial-scene fallback.
    pub fn validate(&self) -> Result<(), String> {
        if !self.half_extents.iter().all(|h| h.is_finite() && *h > 0.0) {
            return Err("panel half-extents must be positive".into());
        }

        if let Some(physics) = &self.physics {
            if !(physics.mass.is_finite() && physics.mass > 0.0) {
                return Err("panel mass must be positive".into());
            }
            if !(physics.friction.is_finite() && physics.friction >= 0.0) {
                return Err("friction must be non-negative".into());
            }
            if !(0.0..=1.0).contains(&physics.restitution) {
                return Err("restitution must be within [0, 1]".into());
            }
            if !physics.gravity.iter().all(|c| c.is_finite()) {
                return Err("gravity must be finite".into());
            }
        }

        if self.probe.resolution == 0 {
            return Err("probe resolution must be positive".into());
        }
        if !(self.probe.near > 0.0 && self.probe.far > self.probe.near) {
            return Err("probe planes must satisfy 0 < near < far".into());
        }

        if ThinFilmParams::try_new(
            self.film.thickness_nm,
            self.film.thickness_delta_nm,
            self.film.max_angle,
            self.film.resolution,
        )
        .is_none()
        {
            return Err("invalid thin-film parameters".into());
        }

        if !(self.background.radius > 0.0) {
            return Err("background radius must be positive".into());
        }
        if !(self.camera_fov > 0.0 && self.camera_fov < core::f64::consts::PI) {
            return Err("camera field of view out of range".into());
        }

        Ok(())
    }
}

impl Default for SceneProfile {
    #[inline]
    fn default() -> Self {
        Self::falling_mirrors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_matches_the_wall_layout() {
        // 5 rows x 6 cols, spacing 2: x spans [-5, 5], rows stack from y=-1.
        let grid = MirrorGrid::try_new(5, 6, 2.0, Vector3::new(0.0, -1.0, 0.0)).unwrap();
        let positions = grid.positions();

        assert_eq!(positions.len(), 30);
        assert_eq!(positions[0], Vector3::new(-5.0, -1.0, 0.0));
        assert_eq!(positions[5], Vector3::new(5.0, -1.0, 0.0));
        assert_eq!(positions[6], Vector3::new(-5.0, 1.0, 0.0));
        assert_eq!(positions[29], Vector3::new(5.0, 7.0, 0.0));
    }

    #[test]
    fn grid_rejects_degenerate_parameters() {
        assert!(MirrorGrid::try_new(0, 6, 2.0, Vector3::zeros()).is_none());
        assert!(MirrorGrid::try_new(5, 6, 0.0, Vector3::zeros()).is_none());
        assert!(MirrorGrid::try_new(5, 6, -1.0, Vector3::zeros()).is_none());
    }

    #[test]
    fn presets_validate() {
        assert_eq!(SceneProfile::mirror_wall().validate(), Ok(()));
        assert_eq!(SceneProfile::falling_mirrors().validate(), Ok(()));
        assert_eq!(SceneProfile::pointer_drift().validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_degenerate_planes() {
        let mut profile = SceneProfile::falling_mirrors();
        profile.probe.near = 0.0;
        assert!(profile.validate().is_err());

        profile.probe.near = 5.0;
        profile.probe.far = 1.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_shapes() {
        let mut profile = SceneProfile::falling_mirrors();
        profile.half_extents.x = 0.0;
        assert!(profile.validate().is_err());

        let mut profile = SceneProfile::falling_mirrors();
        profile.physics.as_mut().unwrap().restitution = 1.5;
        assert!(profile.validate().is_err());
    }
}
