//! Thin-film interference lookup generation.
//!
//! Reflective panels tint their environment reflection with the
//! angle-dependent color of a thin coating. Evaluating the interference
//! per-pixel would be wasteful, so the color is baked once into a small 2D
//! table: one axis spans the incidence angle, the other the film thickness
//! around its base value. The table is generated at scene construction and
//! never mutated afterwards, so a single instance can be shared by every
//! mirror material.

use crate::Float;

use core::f64::consts::{FRAC_PI_2, PI, TAU};

/// Refractive index of the coating. The surrounding medium is air (n = 1).
const N_FILM: Float = 2.0;

/// Wavelengths (nm) sampled for the red, green and blue channels.
const WAVELENGTHS_NM: [Float; 3] = [650.0, 510.0, 440.0];

/// Parameters of a [`ThinFilmLookup`]. Set once, never changed at runtime;
/// regenerating a lookup mid-session is unsupported.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThinFilmParams {
    /// Base optical thickness of the film, in nanometers.
    pub thickness_nm: Float,
    /// Half-range of the thickness variation across table rows. Zero
    /// collapses the thickness axis to the base value.
    pub thickness_delta_nm: Float,
    /// Largest incidence angle covered by the table, in radians.
    pub max_angle: Float,
    /// Number of samples along each axis of the table.
    pub resolution: usize,
}

impl Default for ThinFilmParams {
    #[inline]
    fn default() -> Self {
        Self {
            thickness_nm: 380.0,
            thickness_delta_nm: 0.0,
            max_angle: FRAC_PI_2,
            resolution: 128,
        }
    }
}

impl ThinFilmParams {
    /// Returns `None` if any parameter is outside its documented domain.
    #[inline]
    #[must_use]
    pub fn try_new(
        thickness_nm: Float,
        thickness_delta_nm: Float,
        max_angle: Float,
        resolution: usize,
    ) -> Option<Self> {
        let finite = thickness_nm.is_finite()
            && thickness_delta_nm.is_finite()
            && max_angle.is_finite();

        (finite
            && thickness_nm >= 0.0
            && thickness_delta_nm >= 0.0
            && max_angle > 0.0
            && max_angle <= FRAC_PI_2
            && resolution > 0)
            .then_some(Self {
                thickness_nm,
                thickness_delta_nm,
                max_angle,
                resolution,
            })
    }
}

/// An immutable RGBA8 table of thin-film reflectance colors.
///
/// Columns map the cosine of the incidence angle over `[0, max_angle]`, rows
/// the film thickness over `thickness_nm ± thickness_delta_nm`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThinFilmLookup {
    width: usize,
    height: usize,
    texels: Vec<u8>,
}

impl ThinFilmLookup {
    /// Bakes the table. Deterministic: identical parameters always produce
    /// byte-identical output.
    #[must_use]
    pub fn generate(params: &ThinFilmParams) -> Self {
        let width = params.resolution;
        let height = if params.thickness_delta_nm == 0.0 {
            1
        } else {
            params.resolution
        };

        let mut texels = Vec::with_capacity(width * height * 4);

        for row in 0..height {
            let s = if height == 1 {
                0.5
            } else {
                row as Float / (height - 1) as Float
            };
            let thickness =
                (params.thickness_nm + (2.0 * s - 1.0) * params.thickness_delta_nm).max(0.0);

            for col in 0..width {
                let angle = if width == 1 {
                    0.0
                } else {
                    params.max_angle * col as Float / (width - 1) as Float
                };

                let rgb = reflectance(thickness, angle.cos());

                for c in rgb {
                    texels.push((c.clamp(0.0, 1.0) * 255.0) as u8);
                }
                texels.push(255);
            }
        }

        Self {
            width,
            height,
            texels,
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Row-major RGBA8 texel data, ready for texture upload.
    #[inline]
    #[must_use]
    pub fn rgba8(&self) -> &[u8] {
        &self.texels
    }

    /// Nearest-texel sample by normalized coordinates in `[0, 1]²`.
    /// `u` selects the incidence-angle column, `v` the thickness row.
    #[must_use]
    pub fn sample(&self, u: Float, v: Float) -> [Float; 3] {
        let col = ((u.clamp(0.0, 1.0) * (self.width - 1) as Float).round() as usize)
            .min(self.width - 1);
        let row = ((v.clamp(0.0, 1.0) * (self.height - 1) as Float).round() as usize)
            .min(self.height - 1);

        let i = (row * self.width + col) * 4;
        [
            self.texels[i] as Float / 255.0,
            self.texels[i + 1] as Float / 255.0,
            self.texels[i + 2] as Float / 255.0,
        ]
    }
}

/// Power reflectance of the film at the three channel wavelengths.
fn reflectance(thickness_nm: Float, cos_i: Float) -> [Float; 3] {
    let cos_t = snell_cos_t(cos_i);
    let r = fresnel_unpolarized(cos_i, cos_t);

    // Optical path difference between the two interface reflections, with the
    // usual half-wave shift at the denser interface.
    let path = 2.0 * N_FILM * thickness_nm * cos_t;

    WAVELENGTHS_NM.map(|wavelength| {
        let phase = TAU * path / wavelength + PI;
        airy(phase, r)
    })
}

/// Cosine of the transmission angle, from Snell's law. Total internal
/// reflection cannot occur going into the denser film, so this is total.
#[inline]
fn snell_cos_t(cos_i: Float) -> Float {
    let sin_i2 = (1.0 - cos_i * cos_i).max(0.0);
    let sin_t2 = sin_i2 / (N_FILM * N_FILM);
    (1.0 - sin_t2).max(0.0).sqrt()
}

/// Unpolarized Fresnel power reflectance of the air/film interface. The
/// denominators are bounded away from zero so grazing incidence stays finite.
fn fresnel_unpolarized(cos_i: Float, cos_t: Float) -> Float {
    const MIN_DEN: Float = 1e-4;

    let r_s = (cos_i - N_FILM * cos_t) / (cos_i + N_FILM * cos_t).max(MIN_DEN);
    let r_p = (N_FILM * cos_i - cos_t) / (N_FILM * cos_i + cos_t).max(MIN_DEN);

    (r_s * r_s + r_p * r_p) * 0.5
}

/// Two-beam Airy interference intensity for interface reflectance `r` and
/// round-trip phase `phase`. Wavelength-independent at zero thickness, which
/// is what degenerates the table to a neutral gray.
#[inline]
fn airy(phase: Float, r: Float) -> Float {
    const MIN_DEN: Float = 1e-6;

    let c = phase.cos();
    let num = 2.0 * r * (1.0 - c);
    let den = (1.0 + r * r - 2.0 * r * c).max(MIN_DEN);

    (num / den).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert!(ThinFilmParams::try_new(380.0, 0.0, FRAC_PI_2, 0).is_none());
        assert!(ThinFilmParams::try_new(Float::NAN, 0.0, FRAC_PI_2, 64).is_none());
        assert!(ThinFilmParams::try_new(380.0, -1.0, FRAC_PI_2, 64).is_none());
        assert!(ThinFilmParams::try_new(380.0, 0.0, 0.0, 64).is_none());
        assert!(ThinFilmParams::try_new(380.0, 120.0, FRAC_PI_2, 64).is_some());
    }

    #[test]
    fn samples_are_finite_and_in_range() {
        let params = ThinFilmParams::try_new(410.0, 130.0, FRAC_PI_2, 33).unwrap();
        let lookup = ThinFilmLookup::generate(&params);

        assert_eq!(lookup.width(), 33);
        assert_eq!(lookup.height(), 33);

        for row in 0..lookup.height() {
            for col in 0..lookup.width() {
                let u = col as Float / 32.0;
                let v = row as Float / 32.0;
                for c in lookup.sample(u, v) {
                    assert!(c.is_finite());
                    assert!((0.0..=1.0).contains(&c), "channel out of range: {c}");
                }
            }
        }
    }

    #[test]
    fn extreme_angles_are_defined() {
        // max_angle exactly 90 degrees puts a grazing-incidence texel in the
        // last column; both ends of the range must produce valid colors.
        let params = ThinFilmParams::try_new(380.0, 0.0, FRAC_PI_2, 16).unwrap();
        let lookup = ThinFilmLookup::generate(&params);

        for c in lookup.sample(0.0, 0.0) {
            assert!(c.is_finite());
        }
        for c in lookup.sample(1.0, 0.0) {
            assert!(c.is_finite());
        }
    }

    #[test]
    fn zero_thickness_is_near_neutral() {
        let params = ThinFilmParams::try_new(0.0, 0.0, FRAC_PI_2, 64).unwrap();
        let lookup = ThinFilmLookup::generate(&params);

        for col in 0..64 {
            let [r, g, b] = lookup.sample(col as Float / 63.0, 0.0);
            assert!((r - g).abs() < 0.02, "r={r} g={g}");
            assert!((g - b).abs() < 0.02, "g={g} b={b}");
        }
    }

    #[test]
    fn generation_is_idempotent() {
        let params = ThinFilmParams::try_new(495.0, 80.0, 1.2, 48).unwrap();

        let first = ThinFilmLookup::generate(&params);
        let second = ThinFilmLookup::generate(&params);

        assert_eq!(first.rgba8(), second.rgba8());
    }

    #[test]
    fn thickness_axis_collapses_without_variance() {
        let params = ThinFilmParams::try_new(380.0, 0.0, FRAC_PI_2, 64).unwrap();
        let lookup = ThinFilmLookup::generate(&params);

        assert_eq!(lookup.height(), 1);
        assert_eq!(lookup.rgba8().len(), 64 * 4);
    }
}
