use super::*;

use core::{f32::consts::FRAC_PI_2, time::Duration};
use glium::glutin::event::{ElementState, VirtualKeyCode};
use na::{Matrix4, Perspective3, Point3, Vector3};

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Main-camera projection. Aspect follows window resizes; field of view and
/// clip planes are fixed by the scene profile.
pub struct Projection {
    perspective: Perspective3<f32>,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: f32, near: f32, far: f32) -> Self {
        Self {
            perspective: Perspective3::new(width as f32 / height as f32, fovy, near, far),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.perspective.set_aspect(width as f32 / height as f32);
    }

    #[inline]
    pub fn matrix(&self) -> Matrix4<f32> {
        self.perspective.to_homogeneous()
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.perspective.aspect()
    }

    #[inline]
    pub fn fovy(&self) -> f32 {
        self.perspective.fovy()
    }
}

/// Free camera enabled by the debug-controls flag, replacing the
/// pointer-driven scene orientation while active.
pub struct OrbitCamera {
    pos: Point3<f32>,
    yaw: f32,
    pitch: f32,
}

impl OrbitCamera {
    pub fn new(position: impl Into<Point3<f32>>, yaw: f32, pitch: f32) -> Self {
        Self {
            pos: position.into(),
            yaw,
            pitch,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        let target = Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw);

        Matrix4::look_at_rh(&self.pos, &(self.pos + target), &Vector3::y())
    }
}

/// One held-key axis. Both directions are tracked separately so releasing one
/// key never cancels its still-held opposite.
#[derive(Debug, Default)]
struct KeyAxis {
    positive: bool,
    negative: bool,
}

impl KeyAxis {
    #[inline]
    fn set(&mut self, positive: bool, pressed: bool) {
        if positive {
            self.positive = pressed;
        } else {
            self.negative = pressed;
        }
    }

    #[inline]
    fn value(&self) -> f32 {
        self.positive as u32 as f32 - self.negative as u32 as f32
    }
}

#[derive(Debug, Default)]
pub struct OrbitController {
    walk: KeyAxis,
    strafe: KeyAxis,
    lift: KeyAxis,
    rotate_h: f32,
    rotate_v: f32,
    speed: f32,
    sensitivity: f32,
}

impl OrbitController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            ..Default::default()
        }
    }

    pub fn process_keyboard(&mut self, key: VirtualKeyCode, state: ElementState) {
        use VirtualKeyCode::*;

        let pressed = state == ElementState::Pressed;

        match key {
            Z | W => self.walk.set(true, pressed),
            S => self.walk.set(false, pressed),
            D => self.strafe.set(true, pressed),
            Q | A => self.strafe.set(false, pressed),
            Space => self.lift.set(true, pressed),
            LShift => self.lift.set(false, pressed),
            _ => {}
        }
    }

    pub fn set_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.rotate_h = dx as f32;
        self.rotate_v = -dy as f32;
    }

    /// Moves and rotates the camera from the buffered input. The mouse delta
    /// is consumed; held keys keep applying until released.
    pub fn update_camera(&mut self, camera: &mut OrbitCamera, dt: Duration) {
        let dt = dt.as_secs_f32();

        let (yaw_sin, yaw_cos) = camera.yaw.sin_cos();
        let forward = Vector3::new(yaw_cos, 0., yaw_sin);
        let right = Vector3::new(-yaw_sin, 0., yaw_cos);

        let speed = self.speed * dt;
        camera.pos += forward * self.walk.value() * speed;
        camera.pos += right * self.strafe.value() * speed;
        camera.pos.y += self.lift.value() * speed;

        let sens = self.sensitivity * dt;
        camera.yaw += self.rotate_h * sens;
        camera.pitch = (camera.pitch + self.rotate_v * sens).clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2);

        self.rotate_h = 0.;
        self.rotate_v = 0.;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_do_not_cancel_on_release() {
        let mut controller = OrbitController::new(1.0, 1.0);

        controller.process_keyboard(VirtualKeyCode::W, ElementState::Pressed);
        controller.process_keyboard(VirtualKeyCode::S, ElementState::Pressed);
        assert_eq!(controller.walk.value(), 0.0);

        controller.process_keyboard(VirtualKeyCode::S, ElementState::Released);
        assert_eq!(controller.walk.value(), 1.0);

        controller.process_keyboard(VirtualKeyCode::W, ElementState::Released);
        assert_eq!(controller.walk.value(), 0.0);
    }

    #[test]
    fn mouse_delta_is_consumed_by_one_update() {
        let mut controller = OrbitController::new(0.0, 1.0);
        let mut camera = OrbitCamera::new([0.0, 0.0, 0.0], 0.0, 0.0);

        controller.set_mouse_delta(1.0, 0.0);
        controller.update_camera(&mut camera, Duration::from_secs(1));
        let yaw = camera.yaw;
        assert!(yaw > 0.0);

        controller.update_camera(&mut camera, Duration::from_secs(1));
        assert_eq!(camera.yaw, yaw);
    }
}
