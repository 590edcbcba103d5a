use std::{error::Error, fs::File};

use reflet::SceneProfile;
use reflet_json::{serde_json, JsonDes};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut file_path = None;
    let mut debug_controls = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--ctrl" => debug_controls = true,
            _ => {
                if file_path.replace(arg).is_some() {
                    return Err("expected a single scene file path".into());
                }
            }
        }
    }

    let file_path = file_path.ok_or("expected a scene file path as a first argument.")?;

    let json = serde_json::from_reader(File::open(&file_path)?)?;
    let mut profile = SceneProfile::from_json(&json)?;
    profile.debug_controls = debug_controls;

    log::info!(
        "running scene from {file_path}: {} panels, physics: {}",
        profile.grid.len(),
        profile.physics.is_some(),
    );

    reflet_glium::run_scene(profile)
}
