use std::{error::Error, fs::File};

use reflet::SceneProfile;
use reflet_json::{serde_json, JsonSer};
use reflet_random::{rand, Random};

use rand::SeedableRng;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);

    let file_path = args
        .next()
        .ok_or("please provide a path to serialize the scene json data")?;

    let profile = match args.next().and_then(|arg| arg.parse().ok()) {
        Some(seed) => {
            log::info!("generating scene from seed {seed}");
            SceneProfile::random(&mut rand::rngs::StdRng::seed_from_u64(seed))
        }
        None => SceneProfile::random(&mut rand::thread_rng()),
    };

    serde_json::to_writer_pretty(File::create(file_path)?, &profile.to_json())?;

    Ok(())
}
