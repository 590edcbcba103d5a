use super::*;

use core::f32::consts::FRAC_PI_2;

use gl::framebuffer::{DepthRenderBuffer, SimpleFrameBuffer};
use gl::texture::{Cubemap, CubeLayer, DepthFormat};
use na::{Matrix4, Perspective3, Point3, Vector3};

/// Position and clip planes of the capture point. Clip planes must satisfy
/// `0 < near < far`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureViewpoint {
    position: Vector3<f32>,
    near: f32,
    far: f32,
}

impl CaptureViewpoint {
    #[must_use]
    pub fn try_new(position: Vector3<f32>, near: f32, far: f32) -> Option<Self> {
        (position.iter().all(|c| c.is_finite()) && near > 0.0 && far > near).then_some(Self {
            position,
            near,
            far,
        })
    }

    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// View matrices of the six cube faces, in `CubeLayer` order. Up vectors
    /// follow the GL cubemap convention, so the written texture samples
    /// correctly with `textureCube` and no per-face flip.
    #[must_use]
    pub fn face_views(&self) -> [Matrix4<f32>; 6] {
        let dirs_ups: [(Vector3<f32>, Vector3<f32>); 6] = [
            (Vector3::x(), -Vector3::y()),
            (-Vector3::x(), -Vector3::y()),
            (Vector3::y(), Vector3::z()),
            (-Vector3::y(), -Vector3::z()),
            (Vector3::z(), -Vector3::y()),
            (-Vector3::z(), -Vector3::y()),
        ];

        let eye = Point3::from(self.position);
        dirs_ups.map(|(dir, up)| Matrix4::look_at_rh(&eye, &(eye + dir), &up))
    }

    /// The shared per-face projection: square aspect, 90 degree field of view
    /// so the six frusta tile the full sphere exactly.
    #[must_use]
    pub fn face_projection(&self) -> Matrix4<f32> {
        Perspective3::new(1.0, FRAC_PI_2, self.near, self.far).to_homogeneous()
    }
}

/// Nodes that sample the capture target and therefore must be excluded from
/// every capture pass, whatever layer they are on.
#[must_use]
pub fn mirror_exclusions<'a>(materials: impl IntoIterator<Item = &'a Material>) -> Vec<NodeId> {
    materials
        .into_iter()
        .enumerate()
        .filter_map(|(i, m)| matches!(m, Material::Mirror { .. }).then_some(NodeId(i)))
        .collect()
}

/// Nodes a capture pass draws: capture-layer members minus the call's own
/// exclusion list. The exclusion is an argument, not scene state; the scene's
/// layer masks are left untouched by a capture.
#[must_use]
pub fn capture_set(
    layers: impl IntoIterator<Item = u32>,
    exclude: &[NodeId],
) -> Vec<NodeId> {
    layers
        .into_iter()
        .enumerate()
        .filter_map(|(i, l)| {
            let id = NodeId(i);
            (l & LAYER_CAPTURE != 0 && !exclude.contains(&id)).then_some(id)
        })
        .collect()
}

/// The offscreen cube capture refreshed every frame and sampled by mirror
/// materials. Face textures and the shared depth buffer are allocated once.
pub struct ReflectionProbe {
    cubemap: Cubemap,
    depth: DepthRenderBuffer,
    viewpoint: CaptureViewpoint,
    resolution: u32,
}

impl ReflectionProbe {
    pub fn new(display: &gl::Display, viewpoint: CaptureViewpoint, resolution: u32) -> Self {
        Self {
            cubemap: Cubemap::empty(display, resolution).unwrap(),
            depth: DepthRenderBuffer::new(display, DepthFormat::I24, resolution, resolution)
                .unwrap(),
            viewpoint,
            resolution,
        }
    }

    #[inline]
    #[must_use]
    pub const fn viewpoint(&self) -> CaptureViewpoint {
        self.viewpoint
    }

    #[inline]
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// The capture target, bindable as a sampler once a capture has run.
    #[inline]
    #[must_use]
    pub fn environment(&self) -> &Cubemap {
        &self.cubemap
    }

    /// Renders all six faces through `draw_face`, which receives the face
    /// framebuffer and the face's view and projection matrices.
    pub fn update(
        &self,
        display: &gl::Display,
        mut draw_face: impl FnMut(&mut SimpleFrameBuffer, &Matrix4<f32>, &Matrix4<f32>),
    ) {
        const FACES: [CubeLayer; 6] = [
            CubeLayer::PositiveX,
            CubeLayer::NegativeX,
            CubeLayer::PositiveY,
            CubeLayer::NegativeY,
            CubeLayer::PositiveZ,
            CubeLayer::NegativeZ,
        ];

        let projection = self.viewpoint.face_projection();
        let views = self.viewpoint.face_views();

        for (layer, view) in FACES.into_iter().zip(views) {
            let image = self.cubemap.main_level().image(layer);
            let mut target =
                SimpleFrameBuffer::with_depth_buffer(display, image, &self.depth).unwrap();
            draw_face(&mut target, &view, &projection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewpoint_rejects_degenerate_planes() {
        let p = Vector3::zeros();
        assert!(CaptureViewpoint::try_new(p, 0.0, 100.0).is_none());
        assert!(CaptureViewpoint::try_new(p, 5.0, 1.0).is_none());
        assert!(CaptureViewpoint::try_new(p, 0.1, 100.0).is_some());
    }

    #[test]
    fn face_views_look_down_their_axes() {
        let vp = CaptureViewpoint::try_new(Vector3::new(1.0, 2.0, 3.0), 0.1, 100.0).unwrap();
        let axes = [
            Vector3::x(),
            -Vector3::x(),
            Vector3::y(),
            -Vector3::y(),
            Vector3::z(),
            -Vector3::z(),
        ];

        for (view, axis) in vp.face_views().into_iter().zip(axes) {
            // View space looks down -z; the face axis must land there.
            let v = view.transform_vector(&axis);
            assert!((v - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-6);

            // The eye maps to the view-space origin.
            let eye = view.transform_point(&Point3::new(1.0, 2.0, 3.0));
            assert!(eye.coords.norm() < 1e-5);
        }
    }

    #[test]
    fn capture_set_respects_layers_and_exclusions() {
        let layers = [LAYER_MAIN, LAYER_CAPTURE, LAYER_MAIN | LAYER_CAPTURE, 0];

        assert_eq!(capture_set(layers, &[]), vec![NodeId(1), NodeId(2)]);
        assert_eq!(capture_set(layers, &[NodeId(1)]), vec![NodeId(2)]);

        // Excluding a node that was never in the set is a no-op.
        assert_eq!(
            capture_set(layers, &[NodeId(0), NodeId(3)]),
            vec![NodeId(1), NodeId(2)]
        );
    }

    #[test]
    fn mirrors_are_excluded_from_their_own_capture() {
        let materials = [
            Material::Mirror { film_v: 0.5 },
            Material::Film {
                tint: [1.0; 4],
                film_v: 0.5,
            },
            Material::Mirror { film_v: 0.5 },
            Material::Flat { color: [1.0; 4] },
        ];
        let layers = [LAYER_MAIN | LAYER_CAPTURE; 4];

        let exclude = mirror_exclusions(materials.iter());
        assert_eq!(exclude, vec![NodeId(0), NodeId(2)]);

        // A capture of this scene draws the matte nodes only.
        assert_eq!(
            capture_set(layers, &exclude),
            vec![NodeId(1), NodeId(3)]
        );
    }
}
