//! Core simulation state of an interactive mirror-panel scene.
//!
//! This crate owns everything that does not need a GPU: the thin-film
//! interference lookup table shared by every mirror material, the rigid-body
//! world driving the panel transforms, the pointer-smoothing orientation
//! filter, and the scene profiles describing each variant. Rendering lives in
//! `reflet_glium`, which consumes the state computed here once per frame.

pub use nalgebra;

pub mod film;
pub mod orientation;
pub mod physics;
pub mod profile;

/// Scalar used for all simulation-side math.
pub type Float = f64;

pub use film::{ThinFilmLookup, ThinFilmParams};
pub use orientation::{OrientationFilter, PositionFilter, Viewport};
pub use physics::{BodyDesc, BodyId, GroundPlane, PhysicsWorld};
pub use profile::{BackgroundShell, MirrorGrid, PhysicsProfile, ProbeProfile, SceneProfile};
