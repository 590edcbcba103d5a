//! Rigid-body world driving the mirror panels.
//!
//! One box-shaped body per visual panel, plus static ground planes. The world
//! is stepped once per frame with a clamped timestep: integrate gravity,
//! generate contacts, resolve them with sequential impulses (restitution and
//! Coulomb friction), correct residual penetration, integrate poses. Body
//! handles are opaque indices; all per-body state is owned here and read back
//! by the renderer after each step.
//!
//! Everything is deterministic: identical construction and an identical
//! sequence of `step`/`apply_impulse` calls reproduce identical transforms.

use crate::Float;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};

/// Longest timestep the integrator will accept; larger frame gaps are clamped.
pub const MAX_STEP_DT: Float = 1.0 / 30.0;

const SOLVER_ITERATIONS: usize = 8;

/// Penetration below this depth is left to the velocity solver.
const PENETRATION_SLOP: Float = 0.005;

/// Fraction of the remaining penetration removed per step.
const CORRECTION_FACTOR: Float = 0.2;

/// Approach speeds below this produce no bounce regardless of restitution,
/// so resting contacts bleed energy instead of jittering.
const RESTITUTION_THRESHOLD: Float = 1.0;

const LINEAR_DAMPING: Float = 0.01;
const ANGULAR_DAMPING: Float = 0.05;

/// Opaque handle to a body owned by a [`PhysicsWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

/// Construction-time description of one mirror body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    pub half_extents: Vector3<Float>,
    pub mass: Float,
    pub friction: Float,
    pub restitution: Float,
    pub position: Vector3<Float>,
    pub orientation: UnitQuaternion<Float>,
}

impl BodyDesc {
    /// Returns `None` for non-positive half-extents or mass.
    #[must_use]
    pub fn try_new(half_extents: Vector3<Float>, mass: Float) -> Option<Self> {
        (half_extents.iter().all(|h| h.is_finite() && *h > 0.0) && mass.is_finite() && mass > 0.0)
            .then_some(Self {
                half_extents,
                mass,
                friction: 0.5,
                restitution: 0.0,
                position: Vector3::zeros(),
                orientation: UnitQuaternion::identity(),
            })
    }

    #[inline]
    #[must_use]
    pub fn at(mut self, position: Vector3<Float>) -> Self {
        self.position = position;
        self
    }

    #[inline]
    #[must_use]
    pub fn material(mut self, friction: Float, restitution: Float) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.half_extents.iter().all(|h| h.is_finite() && *h > 0.0)
            && self.mass.is_finite()
            && self.mass > 0.0
            && self.friction.is_finite()
            && self.friction >= 0.0
            && (0.0..=1.0).contains(&self.restitution)
            && self.position.iter().all(|c| c.is_finite())
    }
}

/// A static, infinite collision plane `normal · x = offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundPlane {
    normal: Unit<Vector3<Float>>,
    offset: Float,
    friction: Float,
    restitution: Float,
}

impl GroundPlane {
    /// Returns `None` if the normal cannot be normalized or any parameter is
    /// non-finite.
    #[must_use]
    pub fn try_new(
        normal: Vector3<Float>,
        offset: Float,
        friction: Float,
        restitution: Float,
    ) -> Option<Self> {
        let normal = Unit::try_new(normal, 1e-9)?;

        (offset.is_finite() && friction.is_finite() && friction >= 0.0
            && (0.0..=1.0).contains(&restitution))
            .then_some(Self {
                normal,
                offset,
                friction,
                restitution,
            })
    }

    /// A horizontal floor at the given height.
    #[inline]
    #[must_use]
    pub fn horizontal(height: Float, friction: Float, restitution: Float) -> Self {
        Self {
            normal: Vector3::y_axis(),
            offset: height,
            friction,
            restitution,
        }
    }

    #[inline]
    #[must_use]
    pub fn normal(&self) -> Unit<Vector3<Float>> {
        self.normal
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> Float {
        self.offset
    }
}

struct Body {
    half: Vector3<Float>,
    inv_mass: Float,
    /// Inverse inertia tensor diagonal, in the body frame.
    inv_inertia: Vector3<Float>,
    friction: Float,
    restitution: Float,
    pos: Vector3<Float>,
    rot: UnitQuaternion<Float>,
    vel: Vector3<Float>,
    ang: Vector3<Float>,
    /// Last pose known to be finite, restored if the solver blows up.
    last_finite: (Vector3<Float>, UnitQuaternion<Float>),
}

impl Body {
    fn from_desc(desc: &BodyDesc) -> Self {
        let h = desc.half_extents;
        // Solid cuboid inertia: m/3 * (h_j² + h_k²) per axis.
        let inertia = Vector3::new(
            desc.mass / 3.0 * (h.y * h.y + h.z * h.z),
            desc.mass / 3.0 * (h.x * h.x + h.z * h.z),
            desc.mass / 3.0 * (h.x * h.x + h.y * h.y),
        );

        Self {
            half: h,
            inv_mass: 1.0 / desc.mass,
            inv_inertia: inertia.map(|i| 1.0 / i),
            friction: desc.friction,
            restitution: desc.restitution,
            pos: desc.position,
            rot: desc.orientation,
            vel: Vector3::zeros(),
            ang: Vector3::zeros(),
            last_finite: (desc.position, desc.orientation),
        }
    }

    /// Applies the world-frame inverse inertia tensor to `v`.
    #[inline]
    fn inv_inertia_world(&self, v: &Vector3<Float>) -> Vector3<Float> {
        let local = self.rot.inverse_transform_vector(v);
        self.rot * local.component_mul(&self.inv_inertia)
    }

    /// Velocity of the body-fixed point currently at world position `p`.
    #[inline]
    fn velocity_at(&self, p: &Vector3<Float>) -> Vector3<Float> {
        self.vel + self.ang.cross(&(p - self.pos))
    }

    /// World-frame half-extents of the axis-aligned bounding box.
    fn aabb_half(&self) -> Vector3<Float> {
        self.rot.to_rotation_matrix().matrix().abs() * self.half
    }

    fn corners(&self) -> [Vector3<Float>; 8] {
        let h = self.half;
        [
            Vector3::new(-h.x, -h.y, -h.z),
            Vector3::new(h.x, -h.y, -h.z),
            Vector3::new(-h.x, h.y, -h.z),
            Vector3::new(h.x, h.y, -h.z),
            Vector3::new(-h.x, -h.y, h.z),
            Vector3::new(h.x, -h.y, h.z),
            Vector3::new(-h.x, h.y, h.z),
            Vector3::new(h.x, h.y, h.z),
        ]
        .map(|c| self.pos + self.rot * c)
    }

    fn is_finite(&self) -> bool {
        self.pos.iter().all(|c| c.is_finite())
            && self.vel.iter().all(|c| c.is_finite())
            && self.ang.iter().all(|c| c.is_finite())
            && self.rot.as_vector().iter().all(|c| c.is_finite())
    }
}

/// One contact point. `normal` points toward body `a` (the direction that
/// separates it from `b`, or from the plane when `b` is `None`).
struct Contact {
    a: usize,
    b: Option<usize>,
    point: Vector3<Float>,
    normal: Unit<Vector3<Float>>,
    depth: Float,
    friction: Float,
    restitution: Float,
}

/// The rigid-body simulation. Body count is fixed for the scene's lifetime.
pub struct PhysicsWorld {
    gravity: Vector3<Float>,
    bodies: Vec<Body>,
    planes: Vec<GroundPlane>,
}

impl PhysicsWorld {
    /// Builds a world from validated body descriptions. Returns `None` if
    /// gravity is non-finite or any description fails validation (shape
    /// parameters are a construction-time input error, never a runtime one).
    #[must_use]
    pub fn try_new(
        gravity: Vector3<Float>,
        descs: &[BodyDesc],
        planes: Vec<GroundPlane>,
    ) -> Option<Self> {
        if !gravity.iter().all(|c| c.is_finite()) || !descs.iter().all(BodyDesc::is_valid) {
            return None;
        }

        Some(Self {
            gravity,
            bodies: descs.iter().map(Body::from_desc).collect(),
            planes,
        })
    }

    #[inline]
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Handles of all bodies, in construction order.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = BodyId> {
        (0..self.bodies.len()).map(BodyId)
    }

    #[inline]
    #[must_use]
    pub fn position(&self, id: BodyId) -> Vector3<Float> {
        self.bodies[id.0].pos
    }

    #[inline]
    #[must_use]
    pub fn orientation(&self, id: BodyId) -> UnitQuaternion<Float> {
        self.bodies[id.0].rot
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self, id: BodyId) -> Vector3<Float> {
        self.bodies[id.0].vel
    }

    #[inline]
    #[must_use]
    pub fn angular_velocity(&self, id: BodyId) -> Vector3<Float> {
        self.bodies[id.0].ang
    }

    #[inline]
    #[must_use]
    pub fn half_extents(&self, id: BodyId) -> Vector3<Float> {
        self.bodies[id.0].half
    }

    /// Instantaneous velocity change from an impulse applied at a world-space
    /// point. Safe to call between steps; the change is consumed immediately
    /// and has no further effect on later steps.
    pub fn apply_impulse(
        &mut self,
        id: BodyId,
        impulse: Vector3<Float>,
        point: Vector3<Float>,
    ) {
        let body = &mut self.bodies[id.0];
        let r = point - body.pos;

        body.vel += impulse * body.inv_mass;
        let delta_ang = body.inv_inertia_world(&r.cross(&impulse));
        body.ang += delta_ang;
    }

    /// Advances the simulation by `dt` seconds (clamped to [`MAX_STEP_DT`]).
    pub fn step(&mut self, dt: Float) {
        let dt = dt.clamp(0.0, MAX_STEP_DT);
        if dt <= 0.0 || self.bodies.is_empty() {
            return;
        }

        for body in &mut self.bodies {
            body.vel += self.gravity * dt;
            body.vel /= 1.0 + dt * LINEAR_DAMPING;
            body.ang /= 1.0 + dt * ANGULAR_DAMPING;
        }

        let contacts = self.generate_contacts();
        self.solve_velocities(&contacts);
        self.correct_positions(&contacts);

        for body in &mut self.bodies {
            body.pos += body.vel * dt;
            body.rot = UnitQuaternion::from_scaled_axis(body.ang * dt) * body.rot;

            // A body whose state went non-finite is reset to its last good
            // pose with zeroed velocities instead of poisoning the renderer.
            if body.is_finite() {
                body.last_finite = (body.pos, body.rot);
            } else {
                (body.pos, body.rot) = body.last_finite;
                body.vel = Vector3::zeros();
                body.ang = Vector3::zeros();
            }
        }
    }

    /// Nearest body hit by a world-space ray, if any.
    #[must_use]
    pub fn pick(
        &self,
        origin: &Point3<Float>,
        direction: &Unit<Vector3<Float>>,
    ) -> Option<BodyId> {
        let mut best: Option<(Float, usize)> = None;

        for (i, body) in self.bodies.iter().enumerate() {
            let local_origin = body.rot.inverse_transform_vector(&(origin.coords - body.pos));
            let local_dir = body.rot.inverse_transform_vector(direction.as_ref());

            if let Some(t) = ray_box(&local_origin, &local_dir, &body.half) {
                if best.map(|(bt, _)| t < bt).unwrap_or(true) {
                    best = Some((t, i));
                }
            }
        }

        best.map(|(_, i)| BodyId(i))
    }

    fn generate_contacts(&self) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for (i, body) in self.bodies.iter().enumerate() {
            for plane in &self.planes {
                for corner in body.corners() {
                    let sep = plane.normal.dot(&corner) - plane.offset;
                    if sep < 0.0 {
                        contacts.push(Contact {
                            a: i,
                            b: None,
                            point: corner,
                            normal: plane.normal,
                            depth: -sep,
                            friction: (body.friction * plane.friction).sqrt(),
                            restitution: body.restitution.max(plane.restitution),
                        });
                    }
                }
            }
        }

        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                if let Some(contact) = box_box_contact(&self.bodies, i, j) {
                    contacts.push(contact);
                }
            }
        }

        contacts
    }

    fn solve_velocities(&mut self, contacts: &[Contact]) {
        // Bounces are decided from the pre-solve approach speed so stacked
        // resting contacts don't keep re-injecting energy.
        let bounces: Vec<Float> = contacts
            .iter()
            .map(|c| {
                let vn = self.relative_velocity(c).dot(&c.normal);
                if vn < -RESTITUTION_THRESHOLD {
                    c.restitution
                } else {
                    0.0
                }
            })
            .collect();

        for _ in 0..SOLVER_ITERATIONS {
            for (contact, &bounce) in contacts.iter().zip(&bounces) {
                self.solve_contact(contact, bounce);
            }
        }
    }

    fn relative_velocity(&self, c: &Contact) -> Vector3<Float> {
        let va = self.bodies[c.a].velocity_at(&c.point);
        match c.b {
            Some(b) => va - self.bodies[b].velocity_at(&c.point),
            None => va,
        }
    }

    /// Effective mass of the contact along direction `dir`.
    fn effective_mass(&self, c: &Contact, dir: &Vector3<Float>) -> Float {
        let a = &self.bodies[c.a];
        let ra = c.point - a.pos;
        let mut k = a.inv_mass + dir.dot(&a.inv_inertia_world(&ra.cross(dir)).cross(&ra));

        if let Some(b) = c.b {
            let b = &self.bodies[b];
            let rb = c.point - b.pos;
            k += b.inv_mass + dir.dot(&b.inv_inertia_world(&rb.cross(dir)).cross(&rb));
        }

        k
    }

    fn apply_pair_impulse(&mut self, c: &Contact, impulse: Vector3<Float>) {
        let a = &mut self.bodies[c.a];
        let ra = c.point - a.pos;
        a.vel += impulse * a.inv_mass;
        let da = a.inv_inertia_world(&ra.cross(&impulse));
        a.ang += da;

        if let Some(bi) = c.b {
            let b = &mut self.bodies[bi];
            let rb = c.point - b.pos;
            b.vel -= impulse * b.inv_mass;
            let db = b.inv_inertia_world(&rb.cross(&impulse));
            b.ang -= db;
        }
    }

    fn solve_contact(&mut self, c: &Contact, bounce: Float) {
        let v_rel = self.relative_velocity(c);
        let vn = v_rel.dot(&c.normal);

        if vn < 0.0 {
            let k = self.effective_mass(c, &c.normal);
            if k > 0.0 {
                let jn = -(1.0 + bounce) * vn / k;
                self.apply_pair_impulse(c, c.normal.into_inner() * jn);

                // Coulomb friction, clamped by the normal impulse.
                let v_rel = self.relative_velocity(c);
                let vt = v_rel - c.normal.into_inner() * v_rel.dot(&c.normal);
                let speed = vt.norm();
                if speed > 1e-9 {
                    let tangent = vt / speed;
                    let kt = self.effective_mass(c, &tangent);
                    if kt > 0.0 {
                        let jt = (speed / kt).min(c.friction * jn);
                        self.apply_pair_impulse(c, -tangent * jt);
                    }
                }
            }
        }
    }

    fn correct_positions(&mut self, contacts: &[Contact]) {
        for c in contacts {
            let inv_mass_sum = self.bodies[c.a].inv_mass
                + c.b.map(|b| self.bodies[b].inv_mass).unwrap_or(0.0);
            if inv_mass_sum <= 0.0 {
                continue;
            }

            let magnitude =
                (c.depth - PENETRATION_SLOP).max(0.0) * CORRECTION_FACTOR / inv_mass_sum;
            let correction = c.normal.into_inner() * magnitude;

            let inv_mass_a = self.bodies[c.a].inv_mass;
            self.bodies[c.a].pos += correction * inv_mass_a;
            if let Some(b) = c.b {
                let inv_mass_b = self.bodies[b].inv_mass;
                self.bodies[b].pos -= correction * inv_mass_b;
            }
        }
    }
}

/// Box-box narrowphase on world-space AABBs: the contact normal is the axis
/// of least overlap, the contact point the center of the overlap region.
/// Coarse for strongly rotated boxes, exact for the axis-aligned panel grid.
fn box_box_contact(bodies: &[Body], i: usize, j: usize) -> Option<Contact> {
    let (a, b) = (&bodies[i], &bodies[j]);
    let ea = a.aabb_half();
    let eb = b.aabb_half();
    let d = a.pos - b.pos;

    let overlap = Vector3::new(
        ea.x + eb.x - d.x.abs(),
        ea.y + eb.y - d.y.abs(),
        ea.z + eb.z - d.z.abs(),
    );

    if overlap.iter().any(|o| *o <= 0.0) {
        return None;
    }

    let axis = overlap.imin();
    let mut normal = Vector3::zeros();
    normal[axis] = if d[axis] >= 0.0 { 1.0 } else { -1.0 };

    let point = Vector3::from_fn(|k, _| {
        let lo = (a.pos[k] - ea[k]).max(b.pos[k] - eb[k]);
        let hi = (a.pos[k] + ea[k]).min(b.pos[k] + eb[k]);
        (lo + hi) * 0.5
    });

    Some(Contact {
        a: i,
        b: Some(j),
        point,
        normal: Unit::new_unchecked(normal),
        depth: overlap[axis],
        friction: (a.friction * b.friction).sqrt(),
        restitution: a.restitution.max(b.restitution),
    })
}

/// Slab test of a ray against an origin-centered box; returns the nearest
/// non-negative hit distance.
fn ray_box(
    origin: &Vector3<Float>,
    dir: &Vector3<Float>,
    half: &Vector3<Float>,
) -> Option<Float> {
    let mut t_min: Float = 0.0;
    let mut t_max = Float::INFINITY;

    for k in 0..3 {
        if dir[k].abs() < 1e-12 {
            if origin[k].abs() > half[k] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir[k];
        let mut t0 = (-half[k] - origin[k]) * inv;
        let mut t1 = (half[k] - origin[k]) * inv;
        if t0 > t1 {
            core::mem::swap(&mut t0, &mut t1);
        }

        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::MirrorGrid;

    const GRAVITY: Vector3<Float> = Vector3::new(0.0, -10.0, 0.0);
    const DT: Float = 1.0 / 60.0;

    fn unit_box() -> BodyDesc {
        BodyDesc::try_new(Vector3::new(1.0, 1.0, 1.0), 1.0).unwrap()
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert!(BodyDesc::try_new(Vector3::new(1.0, 0.0, 1.0), 1.0).is_none());
        assert!(BodyDesc::try_new(Vector3::new(1.0, 1.0, 1.0), -2.0).is_none());

        let mut bad = unit_box();
        bad.half_extents.y = -1.0;
        assert!(PhysicsWorld::try_new(GRAVITY, &[bad], vec![]).is_none());
        assert!(GroundPlane::try_new(Vector3::zeros(), 0.0, 1.0, 0.0).is_none());
    }

    #[test]
    fn dropped_box_comes_to_rest_on_the_floor() {
        let desc = unit_box()
            .at(Vector3::new(0.0, 0.0, 0.0))
            .material(1.0, 0.0);
        let floor = GroundPlane::horizontal(-2.0, 1.0, 0.0);
        let mut world = PhysicsWorld::try_new(GRAVITY, &[desc], vec![floor]).unwrap();
        let id = world.ids().next().unwrap();

        for _ in 0..240 {
            world.step(DT);
        }

        let pos = world.position(id);
        assert!(world.velocity(id).norm() < 0.05, "still moving");
        assert!((pos.y + 1.0).abs() < 0.05, "not resting at y=-1: {}", pos.y);
        assert!(pos.y >= -1.02, "sank through the floor");
    }

    #[test]
    fn impulse_changes_velocity_immediately_and_only_once() {
        let mut world =
            PhysicsWorld::try_new(Vector3::zeros(), &[unit_box()], vec![]).unwrap();
        let id = world.ids().next().unwrap();

        let impulse = Vector3::new(0.0, 0.0, -50.0);
        world.apply_impulse(id, impulse, world.position(id));

        // Unit mass: the velocity change equals the impulse.
        assert!((world.velocity(id) - impulse).norm() < 1e-12);

        world.step(DT);
        let after_one = world.velocity(id);
        world.step(DT);
        let after_two = world.velocity(id);

        // No gravity and no contacts: only damping acts, the impulse is not
        // re-applied on later steps.
        assert!((after_one.z + 50.0).abs() < 0.1);
        assert!((after_two - after_one).norm() < 0.01);
    }

    #[test]
    fn off_center_impulse_spins_the_body() {
        let mut world =
            PhysicsWorld::try_new(Vector3::zeros(), &[unit_box()], vec![]).unwrap();
        let id = world.ids().next().unwrap();

        let corner = world.position(id) + Vector3::new(1.0, 1.0, 0.0);
        world.apply_impulse(id, Vector3::new(0.0, 0.0, -50.0), corner);

        assert!(world.angular_velocity(id).norm() > 1.0);
    }

    #[test]
    fn panel_grid_settles_without_sinking() {
        // The full-scene layout: 30 panels on a 5x6 grid, spacing 2, resting
        // on a floor at y = -2, simulated for five seconds at 60 Hz.
        let grid = MirrorGrid::try_new(5, 6, 2.0, Vector3::new(0.0, -1.0, 0.0)).unwrap();
        let descs: Vec<BodyDesc> = grid
            .positions()
            .into_iter()
            .map(|p| unit_box().at(p).material(1.0, 0.0))
            .collect();
        let initial: Vec<Float> = descs.iter().map(|d| d.position.y).collect();

        let floor = GroundPlane::horizontal(-2.0, 1.0, 0.0);
        let mut world = PhysicsWorld::try_new(GRAVITY, &descs, vec![floor]).unwrap();

        for _ in 0..300 {
            world.step(DT);
        }

        for (id, y0) in world.ids().zip(initial) {
            let pos = world.position(id);
            assert!(pos.iter().all(|c| c.is_finite()));
            assert!(pos.y <= y0 + 1e-3, "body rose above its start: {} > {y0}", pos.y);

            // Vertical half-extent of the (possibly rotated) box.
            let corner_low = world
                .orientation(id)
                .to_rotation_matrix()
                .matrix()
                .abs()
                .row(1)
                .transpose()
                .dot(&world.half_extents(id));
            assert!(
                pos.y - corner_low >= -2.0 - 0.05,
                "sank below the floor: {}",
                pos.y - corner_low
            );
        }
    }

    #[test]
    fn ids_pair_with_construction_order() {
        // The renderer pairs grid positions with bodies by zipping them with
        // `ids()`, so handles must come out in construction order.
        let grid = MirrorGrid::try_new(5, 6, 2.0, Vector3::new(0.0, -1.0, 0.0)).unwrap();
        let descs: Vec<BodyDesc> = grid
            .positions()
            .into_iter()
            .map(|p| unit_box().at(p))
            .collect();
        let world = PhysicsWorld::try_new(GRAVITY, &descs, vec![]).unwrap();

        assert_eq!(world.body_count(), descs.len());
        for (id, desc) in world.ids().zip(&descs) {
            assert_eq!(world.position(id), desc.position);
        }
    }

    #[test]
    fn identical_call_sequences_reproduce_identical_transforms() {
        let run = || {
            let descs = [
                unit_box().at(Vector3::new(0.0, 2.0, 0.0)).material(0.8, 0.2),
                unit_box().at(Vector3::new(0.5, 5.0, 0.1)).material(0.8, 0.2),
            ];
            let floor = GroundPlane::horizontal(-2.0, 1.0, 0.0);
            let mut world = PhysicsWorld::try_new(GRAVITY, &descs, vec![floor]).unwrap();

            for i in 0..120 {
                if i == 30 {
                    let id = world.ids().next().unwrap();
                    world.apply_impulse(id, Vector3::new(0.0, 0.0, -50.0), world.position(id));
                }
                world.step(DT);
            }

            world
                .ids()
                .map(|id| (world.position(id), world.orientation(id)))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn pick_returns_the_nearest_body_along_the_ray() {
        let descs = [
            unit_box().at(Vector3::new(0.0, 0.0, -5.0)),
            unit_box().at(Vector3::new(0.0, 0.0, -12.0)),
        ];
        let world = PhysicsWorld::try_new(Vector3::zeros(), &descs, vec![]).unwrap();
        let ids: Vec<BodyId> = world.ids().collect();

        let hit = world.pick(&Point3::origin(), &-Vector3::z_axis());
        assert_eq!(hit, Some(ids[0]));

        let miss = world.pick(&Point3::origin(), &Vector3::z_axis());
        assert_eq!(miss, None);
    }
}
