use reflet::*;

use core::f64::consts::FRAC_PI_2;

use nalgebra::Vector3;
pub use rand;

pub trait Random: Sized {
    /// Generate a randomized version of this value using the provided `rng`
    ///
    /// This method must not fail. If construction is faillible, keep trying
    /// until success
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self;
}

impl Random for MirrorGrid {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        loop {
            let rows = rng.gen_range(1..=8);
            let cols = rng.gen_range(1..=8);
            let spacing = rng.gen_range(1.5..4.0);
            let origin = Vector3::new(0.0, rng.gen_range(-2.0..0.0), 0.0);

            if let Some(grid) = Self::try_new(rows, cols, spacing, origin) {
                break grid;
            }
        }
    }
}

impl Random for ThinFilmParams {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        loop {
            let thickness = rng.gen_range(200.0..600.0);
            let delta = if rng.gen_bool(0.5) {
                0.0
            } else {
                rng.gen_range(0.0..200.0)
            };

            if let Some(params) = Self::try_new(thickness, delta, FRAC_PI_2, 128) {
                break params;
            }
        }
    }
}

impl Random for SceneProfile {
    /// A randomized variant of the physics scene: grid, film and pointer
    /// behavior vary, the camera framing and probe stay fixed so every
    /// generated scene frames its panels.
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let mut profile = if rng.gen_bool(0.5) {
            Self::falling_mirrors()
        } else {
            Self::mirror_wall()
        };

        profile.grid = MirrorGrid::random(rng);
        profile.film = ThinFilmParams::random(rng);
        profile.yaw_only = rng.gen_bool(0.5);

        if let Some(physics) = &mut profile.physics {
            physics.restitution = rng.gen_range(0.0..0.5);
            physics.click_impulse.z = -rng.gen_range(20.0..80.0);
        } else {
            profile.spin = Some(Vector3::new(
                0.0,
                rng.gen_range(0.0005..0.002),
                rng.gen_range(0.005..0.02),
            ));
        }

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_profiles_always_validate() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);

        for _ in 0..64 {
            let profile = SceneProfile::random(&mut rng);
            assert_eq!(profile.validate(), Ok(()));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let mut a = rand::rngs::StdRng::seed_from_u64(42);
        let mut b = rand::rngs::StdRng::seed_from_u64(42);

        assert_eq!(SceneProfile::random(&mut a), SceneProfile::random(&mut b));
    }
}
