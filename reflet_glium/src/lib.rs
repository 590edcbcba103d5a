//! glium front end of the mirror scene.
//!
//! Everything GPU-facing lives here: vertex formats, mesh builders, the
//! cube-face reflection probe, the debug orbit camera and the frame scheduler
//! (`App`) that drives one tick per rendered frame in a fixed order. The
//! simulation state itself comes from the `reflet` core crate.

use std::time;

pub use glium as gl;

use gl::glutin;
use nalgebra as na;
use reflet::{SceneProfile, Float};

mod app;
mod camera;
mod probe;
mod renderable;

pub use probe::{capture_set, mirror_exclusions, CaptureViewpoint, ReflectionProbe};
pub use renderable::*;

use app::App;
use camera::{OrbitCamera, OrbitController, Projection};

/// Index of a node in the scene's draw list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Layer rendered by the main camera.
pub const LAYER_MAIN: u32 = 1;
/// Layer rendered by the reflection probe. Reflection-only content lives
/// here; mirrors stay off it so a capture never samples them.
pub const LAYER_CAPTURE: u32 = 1 << 11;

#[derive(Copy, Clone, Debug)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

gl::implement_vertex!(Vertex, position, normal);

impl Vertex {
    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

#[inline]
pub(crate) fn to_f32(v: na::Vector3<Float>) -> na::Vector3<f32> {
    v.map(|c| c as f32)
}

/// Opens a window and runs the given scene profile until the window closes.
///
/// Fails (before the first frame renders) if the profile does not validate;
/// there is no partial-scene fallback.
pub fn run_scene(profile: SceneProfile) -> Result<(), Box<dyn std::error::Error>> {
    const DEFAULT_WIDTH: u32 = 1280;
    const DEFAULT_HEIGHT: u32 = 720;

    use glutin::{dpi, event_loop, window, ContextBuilder};

    let el = event_loop::EventLoop::default();
    let display = gl::Display::new(
        window::WindowBuilder::new()
            .with_inner_size(dpi::LogicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT))
            .with_title("Reflet"),
        ContextBuilder::new().with_vsync(true).with_depth_buffer(24),
        &el,
    )
    .expect("failed to build display");

    let app = App::new(&display, profile)?;

    app.run(display, el)
}
