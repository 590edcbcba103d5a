use super::*;

use core::ops::Deref;

use na::{UnitQuaternion, Vector3};
use reflet::BodyId;

/// A shape that can be handed to a draw call.
pub trait RenderData {
    fn vertices(&self) -> gl::vertex::VerticesSource;
    fn indices(&self) -> gl::index::IndicesSource;
}

/// An indexed triangle mesh.
pub struct TriangleMesh {
    vertices: gl::VertexBuffer<Vertex>,
    indices: gl::IndexBuffer<u32>,
}

impl TriangleMesh {
    pub fn new(display: &gl::Display, vertices: &[Vertex], indices: &[u32]) -> Self {
        Self {
            vertices: gl::VertexBuffer::immutable(display, vertices).unwrap(),
            indices: gl::IndexBuffer::immutable(
                display,
                gl::index::PrimitiveType::TrianglesList,
                indices,
            )
            .unwrap(),
        }
    }
}

impl RenderData for TriangleMesh {
    fn vertices(&self) -> gl::vertex::VerticesSource {
        (&self.vertices).into()
    }

    fn indices(&self) -> gl::index::IndicesSource {
        (&self.indices).into()
    }
}

/// How a node is shaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    /// Environment cubemap modulated by the thin-film lookup. Mirror nodes
    /// sample the capture target, so every capture pass must exclude them.
    Mirror { film_v: f32 },
    /// Thin-film lookup times a tint, no environment term.
    Film { tint: [f32; 4], film_v: f32 },
    /// Unlit constant color.
    Flat { color: [f32; 4] },
}

/// One drawable object of the composed scene. Transforms are written every
/// frame from the physics world or the spin animation; the mesh and material
/// are fixed at scene construction.
pub struct SceneNode {
    pub mesh: Box<dyn RenderData>,
    pub material: Material,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub layers: u32,
    /// Body driving this node's transform, if the scene is physics-enabled.
    pub body: Option<BodyId>,
}

impl SceneNode {
    pub fn model_matrix(&self) -> na::Matrix4<f32> {
        na::Isometry3::from_parts(self.position.into(), self.rotation).to_homogeneous()
    }
}

/// An append-only list of scene nodes, handed to [`ScenePiece`]s during
/// composition. Node ids are the final indices, in append order.
pub struct List<T>(Vec<T>);

impl<T> List<T> {
    #[inline]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    #[inline]
    pub fn push(&mut self, v: T) {
        self.0.push(v);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Extend<T> for List<T> {
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<T> From<Vec<T>> for List<T> {
    #[inline]
    fn from(value: Vec<T>) -> Self {
        Self(value)
    }
}

/// A piece of the scene that knows how to contribute draw-list nodes.
#[impl_trait_for_tuples::impl_for_tuples(1, 8)]
pub trait ScenePiece {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>);
}

// Deref impls, so pieces can be boxed or borrowed when composing. A blanket
// impl over `Deref` would make the trait unusable downstream.

impl<T: ScenePiece + ?Sized> ScenePiece for Box<T> {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>) {
        self.deref().append_nodes(display, list);
    }
}

impl<T: ScenePiece> ScenePiece for Vec<T> {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>) {
        self.iter().for_each(|p| p.append_nodes(display, list));
    }
}

impl<'a, T: ScenePiece + ?Sized> ScenePiece for &'a T {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>) {
        (*self).append_nodes(display, list);
    }
}

/// Builds the four axis faces (±x, ±y) of a box, the matte sides of a panel.
pub fn box_side_faces(half: [f32; 3]) -> (Vec<Vertex>, Vec<u32>) {
    box_faces(half, &[0, 1])
}

/// Builds the two z faces of a box, the reflective front/back of a panel.
pub fn box_z_faces(half: [f32; 3]) -> (Vec<Vertex>, Vec<u32>) {
    box_faces(half, &[2])
}

/// Quad faces of an origin-centered box along the given axes, both signs,
/// wound counter-clockwise seen from outside.
fn box_faces(half: [f32; 3], axes: &[usize]) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(axes.len() * 8);
    let mut indices = Vec::with_capacity(axes.len() * 12);

    for &axis in axes {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;

        for sign in [1.0f32, -1.0] {
            let mut normal = [0.0f32; 3];
            normal[axis] = sign;

            let base = vertices.len() as u32;
            for (du, dv) in [(-1.0f32, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let mut p = [0.0f32; 3];
                p[axis] = sign * half[axis];
                p[u] = du * half[u] * sign;
                p[v] = dv * half[v];
                vertices.push(Vertex::new(p, normal));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    (vertices, indices)
}

/// A subdivided octahedron projected onto a sphere, the geometry of the
/// enclosing background shell.
pub fn octahedron_sphere(radius: f32, detail: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut positions: Vec<Vector3<f32>> = vec![
        Vector3::x(),
        -Vector3::x(),
        Vector3::y(),
        -Vector3::y(),
        Vector3::z(),
        -Vector3::z(),
    ];

    // The eight octants, wound counter-clockwise seen from outside.
    let mut faces: Vec<[u32; 3]> = vec![
        [0, 2, 4],
        [4, 2, 1],
        [1, 2, 5],
        [5, 2, 0],
        [0, 4, 3],
        [4, 1, 3],
        [1, 5, 3],
        [5, 0, 3],
    ];

    for _ in 0..detail {
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint_on_sphere(&mut positions, a, b);
            let bc = midpoint_on_sphere(&mut positions, b, c);
            let ca = midpoint_on_sphere(&mut positions, c, a);
            next.extend_from_slice(&[[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
        }
        faces = next;
    }

    let vertices = positions
        .iter()
        .map(|p| Vertex::new((p * radius).into(), (*p).into()))
        .collect();
    let indices = faces.iter().flatten().copied().collect();

    (vertices, indices)
}

fn midpoint_on_sphere(positions: &mut Vec<Vector3<f32>>, a: u32, b: u32) -> u32 {
    let m = ((positions[a as usize] + positions[b as usize]) * 0.5).normalize();
    positions.push(m);
    (positions.len() - 1) as u32
}

/// A horizontal quad of the given half-size, normal up.
pub fn floor_quad(half_size: f32) -> (Vec<Vertex>, Vec<u32>) {
    let n = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex::new([-half_size, 0.0, -half_size], n),
        Vertex::new([-half_size, 0.0, half_size], n),
        Vertex::new([half_size, 0.0, half_size], n),
        Vertex::new([half_size, 0.0, -half_size], n),
    ];

    (vertices, vec![0, 1, 2, 0, 2, 3])
}

/// The wall of mirror panels. Two nodes per panel: reflective z faces and
/// matte sides, both driven by the same body when physics is on. Panels sit
/// on the capture layer so they show up in each other's reflections; the
/// reflective faces themselves are kept out per capture through the probe's
/// exclusion list.
pub struct PanelWall {
    pub half_extents: [f32; 3],
    pub panels: Vec<(Vector3<f32>, Option<BodyId>)>,
    pub film_v: f32,
}

impl ScenePiece for PanelWall {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>) {
        let (face_v, face_i) = box_z_faces(self.half_extents);
        let (side_v, side_i) = box_side_faces(self.half_extents);

        for &(position, body) in &self.panels {
            list.push(SceneNode {
                mesh: Box::new(TriangleMesh::new(display, &face_v, &face_i)),
                material: Material::Mirror { film_v: self.film_v },
                position,
                rotation: UnitQuaternion::identity(),
                layers: LAYER_MAIN | LAYER_CAPTURE,
                body,
            });
            list.push(SceneNode {
                mesh: Box::new(TriangleMesh::new(display, &side_v, &side_i)),
                material: Material::Film {
                    tint: [0.67, 0.67, 0.67, 1.0],
                    film_v: self.film_v,
                },
                position,
                rotation: UnitQuaternion::identity(),
                layers: LAYER_MAIN | LAYER_CAPTURE,
                body,
            });
        }
    }
}

/// The enclosing shell. Visible to the main camera and to the probe, so
/// reflections are never empty.
pub struct Backdrop {
    pub radius: f32,
    pub detail: u32,
    pub color: [f32; 4],
}

impl ScenePiece for Backdrop {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>) {
        let (vertices, indices) = octahedron_sphere(self.radius, self.detail);

        list.push(SceneNode {
            mesh: Box::new(TriangleMesh::new(display, &vertices, &indices)),
            material: Material::Flat { color: self.color },
            position: Vector3::new(0.0, 0.0, -5.0),
            rotation: UnitQuaternion::identity(),
            layers: LAYER_MAIN | LAYER_CAPTURE,
            body: None,
        });
    }
}

/// Visual stand-in for the ground plane of physics-enabled scenes.
pub struct Floor {
    pub height: f32,
    pub half_size: f32,
}

impl ScenePiece for Floor {
    fn append_nodes(&self, display: &gl::Display, list: &mut List<SceneNode>) {
        let (vertices, indices) = floor_quad(self.half_size);

        list.push(SceneNode {
            mesh: Box::new(TriangleMesh::new(display, &vertices, &indices)),
            material: Material::Flat {
                color: [0.02, 0.02, 0.02, 0.2],
            },
            position: Vector3::new(0.0, self.height, 0.0),
            rotation: UnitQuaternion::identity(),
            layers: LAYER_MAIN,
            body: None,
        });
    }
}

/// Per-frame spin applied to panels when physics is off.
pub fn spin_rotation(accumulated: Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(accumulated.x, accumulated.y, accumulated.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_faces_have_outward_normals() {
        let (vertices, indices) = box_z_faces([1.0, 1.0, 1.0]);
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 12);

        for v in &vertices {
            // Each vertex of a z face sits on the plane its normal points out of.
            assert_eq!(v.position[2].signum(), v.normal[2].signum());
            assert_eq!(v.normal[2].abs(), 1.0);
        }

        let (vertices, indices) = box_side_faces([1.0, 2.0, 3.0]);
        assert_eq!(vertices.len(), 16);
        assert_eq!(indices.len(), 24);
    }

    #[test]
    fn octahedron_sphere_lies_on_the_sphere() {
        let (vertices, indices) = octahedron_sphere(20.0, 2);

        // Each subdivision splits every triangle in four.
        assert_eq!(indices.len(), 8 * 4 * 4 * 3);

        for v in &vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            assert!((r - 20.0).abs() < 1e-3, "vertex off the sphere: r={r}");
        }
    }

}
