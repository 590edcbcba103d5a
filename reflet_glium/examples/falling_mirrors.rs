use reflet::SceneProfile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    reflet_glium::run_scene(SceneProfile::falling_mirrors())
}
