use nalgebra::Vector3;
use reflet::*;
use std::error::Error;

use core::ops::Deref;

pub use serde_json;

/// This is essentially `try_into` then `try_map` but the latter is nightly-only
pub fn json_array_to_float_array<const D: usize>(
    json_array: &[serde_json::Value],
) -> Option<[Float; D]> {
    let array: &[serde_json::Value; D] = json_array.try_into().ok()?;

    let mut coords = [0.; D];
    for (coord, value) in coords.iter_mut().zip(array) {
        *coord = value.as_f64()? as Float;
    }
    Some(coords)
}

pub fn json_array_to_vector3(json_array: &[serde_json::Value]) -> Option<Vector3<Float>> {
    json_array_to_float_array(json_array).map(Vector3::from)
}

fn get_vector3(json: &serde_json::Value, field: &str) -> Result<Vector3<Float>, Box<dyn Error>> {
    json.get(field)
        .and_then(serde_json::Value::as_array)
        .and_then(|a| json_array_to_vector3(a))
        .ok_or_else(|| format!("missing or invalid {field} field").into())
}

fn get_f64(json: &serde_json::Value, field: &str) -> Result<Float, Box<dyn Error>> {
    json.get(field)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| format!("missing or invalid {field} field").into())
}

fn get_u64(json: &serde_json::Value, field: &str) -> Result<u64, Box<dyn Error>> {
    json.get(field)
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| format!("missing or invalid {field} field").into())
}

fn get_bool(json: &serde_json::Value, field: &str) -> Result<bool, Box<dyn Error>> {
    json.get(field)
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| format!("missing or invalid {field} field").into())
}

pub trait JsonSer {
    /// Serialize `self` into a JSON object.
    fn to_json(&self) -> serde_json::Value;
}

// It's clear that these impls use the `Deref` trait, but writing a blanket
// impl over all types implementing `Deref` makes the trait unusable downstream

impl<T: JsonSer + ?Sized> JsonSer for Box<T> {
    fn to_json(&self) -> serde_json::Value {
        self.deref().to_json()
    }
}

impl<'a, T: JsonSer + ?Sized> JsonSer for &'a T {
    fn to_json(&self) -> serde_json::Value {
        (*self).to_json()
    }
}

pub trait JsonDes {
    /// Deserialize from a JSON object.
    ///
    /// Returns an error if `json`'s format or values are invalid.
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>>
    where
        Self: Sized;
}

impl JsonSer for ThinFilmParams {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "thickness_nm": self.thickness_nm,
            "thickness_delta_nm": self.thickness_delta_nm,
            "max_angle": self.max_angle,
            "resolution": self.resolution,
        })
    }
}

impl JsonDes for ThinFilmParams {
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "thickness_nm": 380.0,
    ///     "thickness_delta_nm": 0.0,
    ///     "max_angle": 1.5707, // radians, in (0, pi/2]
    ///     "resolution": 128
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>> {
        Self::try_new(
            get_f64(json, "thickness_nm")?,
            get_f64(json, "thickness_delta_nm")?,
            get_f64(json, "max_angle")?,
            get_u64(json, "resolution")? as usize,
        )
        .ok_or_else(|| "invalid thin-film parameters".into())
    }
}

impl JsonSer for MirrorGrid {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "rows": self.rows(),
            "cols": self.cols(),
            "spacing": self.spacing(),
            "origin": self.origin().as_slice(),
        })
    }
}

impl JsonDes for MirrorGrid {
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "rows": 5,
    ///     "cols": 6,
    ///     "spacing": 2.0, // must be positive
    ///     "origin": [0.0, -1.0, 0.0]
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>> {
        Self::try_new(
            get_u64(json, "rows")? as usize,
            get_u64(json, "cols")? as usize,
            get_f64(json, "spacing")?,
            get_vector3(json, "origin")?,
        )
        .ok_or_else(|| "invalid mirror grid".into())
    }
}

impl JsonSer for PhysicsProfile {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "gravity": self.gravity.as_slice(),
            "mass": self.mass,
            "friction": self.friction,
            "restitution": self.restitution,
            "ground_height": self.ground_height,
            "click_impulse": self.click_impulse.as_slice(),
        })
    }
}

impl JsonDes for PhysicsProfile {
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            gravity: get_vector3(json, "gravity")?,
            mass: get_f64(json, "mass")?,
            friction: get_f64(json, "friction")?,
            restitution: get_f64(json, "restitution")?,
            ground_height: get_f64(json, "ground_height")?,
            click_impulse: get_vector3(json, "click_impulse")?,
        })
    }
}

impl JsonSer for ProbeProfile {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "resolution": self.resolution,
            "position": self.position.as_slice(),
            "near": self.near,
            "far": self.far,
        })
    }
}

impl JsonDes for ProbeProfile {
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            resolution: get_u64(json, "resolution")? as u32,
            position: get_vector3(json, "position")?,
            near: get_f64(json, "near")?,
            far: get_f64(json, "far")?,
        })
    }
}

impl JsonSer for BackgroundShell {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "radius": self.radius,
            "detail": self.detail,
            "color": self.color,
        })
    }
}

impl JsonDes for BackgroundShell {
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>> {
        let color = json
            .get("color")
            .and_then(serde_json::Value::as_array)
            .and_then(|a| json_array_to_float_array::<4>(a))
            .ok_or("missing or invalid color field")?;

        Ok(Self {
            radius: get_f64(json, "radius")?,
            detail: get_u64(json, "detail")? as u32,
            color,
        })
    }
}

impl JsonSer for SceneProfile {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "grid": self.grid.to_json(),
            "half_extents": self.half_extents.as_slice(),
            "physics": self.physics.as_ref().map(JsonSer::to_json),
            "spin": self.spin.as_ref().map(|s| s.as_slice().to_vec()),
            "film": self.film.to_json(),
            "probe": self.probe.to_json(),
            "background": self.background.to_json(),
            "camera_fov": self.camera_fov,
            "camera_z": self.camera_z,
            "yaw_only": self.yaw_only,
            "pointer_position_lerp": self.pointer_position_lerp,
            "debug_controls": self.debug_controls,
        })
    }
}

impl JsonDes for SceneProfile {
    /// Deserialize a scene profile from a JSON object.
    ///
    /// `physics` and `spin` may be `null` or absent; every other field is
    /// required. The deserialized profile is validated before being returned,
    /// so a successful result is always renderable.
    fn from_json(json: &serde_json::Value) -> Result<Self, Box<dyn Error>> {
        let physics = match json.get("physics") {
            None | Some(serde_json::Value::Null) => None,
            Some(j) => Some(PhysicsProfile::from_json(j)?),
        };

        let spin = match json.get("spin") {
            None | Some(serde_json::Value::Null) => None,
            Some(j) => Some(
                j.as_array()
                    .and_then(|a| json_array_to_vector3(a))
                    .ok_or("invalid spin field")?,
            ),
        };

        let profile = Self {
            grid: MirrorGrid::from_json(json.get("grid").ok_or("grid field expected")?)?,
            half_extents: get_vector3(json, "half_extents")?,
            physics,
            spin,
            film: ThinFilmParams::from_json(json.get("film").ok_or("film field expected")?)?,
            probe: ProbeProfile::from_json(json.get("probe").ok_or("probe field expected")?)?,
            background: BackgroundShell::from_json(
                json.get("background").ok_or("background field expected")?,
            )?,
            camera_fov: get_f64(json, "camera_fov")?,
            camera_z: get_f64(json, "camera_z")?,
            yaw_only: get_bool(json, "yaw_only")?,
            pointer_position_lerp: get_bool(json, "pointer_position_lerp")?,
            debug_controls: get_bool(json, "debug_controls")?,
        };

        profile.validate()?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_survive_a_round_trip() {
        for profile in [
            SceneProfile::mirror_wall(),
            SceneProfile::falling_mirrors(),
            SceneProfile::pointer_drift(),
        ] {
            let json = profile.to_json();
            let back = SceneProfile::from_json(&json).unwrap();
            assert_eq!(back, profile);
        }
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let mut json = SceneProfile::falling_mirrors().to_json();
        json.as_object_mut().unwrap().remove("camera_fov");

        let err = SceneProfile::from_json(&json).unwrap_err().to_string();
        assert!(err.contains("camera_fov"), "unexpected error: {err}");
    }

    #[test]
    fn invalid_profiles_are_rejected_on_load() {
        let mut json = SceneProfile::falling_mirrors().to_json();
        json["probe"]["near"] = serde_json::json!(0.0);

        assert!(SceneProfile::from_json(&json).is_err());
    }

    #[test]
    fn absent_physics_and_spin_deserialize_to_none() {
        let mut json = SceneProfile::mirror_wall().to_json();
        json["physics"] = serde_json::Value::Null;
        json["spin"] = serde_json::Value::Null;

        let profile = SceneProfile::from_json(&json).unwrap();
        assert!(profile.physics.is_none());
        assert!(profile.spin.is_none());
    }
}
