use super::*;

use gl::Surface;
use na::{Matrix4, Point3, Unit, UnitQuaternion, Vector3, Vector4};
use reflet::{
    BodyDesc, GroundPlane, OrientationFilter, PhysicsWorld, PositionFilter, ThinFilmLookup,
    Viewport,
};

const VERTEX_SHADER_SRC: &str = r"
    #version 140

    in vec3 position;
    in vec3 normal;

    uniform mat4 perspective;
    uniform mat4 view;
    uniform mat4 model;

    out vec3 v_normal;
    out vec3 v_world;

    void main() {
        vec4 world = model * vec4(position, 1.0);
        v_world = world.xyz;
        v_normal = mat3(model) * normal;
        gl_Position = perspective * view * world;
    }
";

const FLAT_FRAGMENT_SHADER_SRC: &str = r"
    #version 140

    uniform vec4 color_vec;

    out vec4 color;

    void main() {
        color = color_vec;
    }
";

const FILM_FRAGMENT_SHADER_SRC: &str = r"
    #version 140

    uniform vec4 tint;
    uniform sampler2D film_map;
    uniform float film_v;
    uniform float inv_max_angle;
    uniform vec3 eye_pos;

    in vec3 v_normal;
    in vec3 v_world;

    out vec4 color;

    void main() {
        vec3 n = normalize(v_normal);
        vec3 e = normalize(eye_pos - v_world);

        float cos_i = clamp(abs(dot(n, e)), 0.0, 1.0);
        float u = clamp(acos(cos_i) * inv_max_angle, 0.0, 1.0);

        vec3 film = texture(film_map, vec2(u, film_v)).rgb;
        color = vec4(film, 1.0) * tint;
    }
";

const MIRROR_FRAGMENT_SHADER_SRC: &str = r"
    #version 140

    uniform samplerCube env_map;
    uniform sampler2D film_map;
    uniform float film_v;
    uniform float inv_max_angle;
    uniform vec3 eye_pos;

    in vec3 v_normal;
    in vec3 v_world;

    out vec4 color;

    void main() {
        vec3 n = normalize(v_normal);
        vec3 i = normalize(v_world - eye_pos);

        vec3 r = reflect(i, n);
        float cos_i = clamp(abs(dot(n, i)), 0.0, 1.0);
        float u = clamp(acos(cos_i) * inv_max_angle, 0.0, 1.0);

        vec3 film = texture(film_map, vec2(u, film_v)).rgb;
        color = vec4(texture(env_map, r).rgb * film, 1.0);
    }
";

pub struct App {
    nodes: Vec<SceneNode>,
    /// Nodes at indices below this belong to panels and spin when physics is
    /// off. Panel nodes carry their body id when physics is on.
    panel_node_count: usize,

    flat_program: gl::Program,
    film_program: gl::Program,
    mirror_program: gl::Program,

    probe: ReflectionProbe,
    film_texture: gl::texture::Texture2d,
    film_max_angle: f32,

    world: Option<PhysicsWorld>,
    orientation: OrientationFilter,
    drift: Option<PositionFilter>,

    container_rotation: UnitQuaternion<f32>,
    container_position: Vector3<f32>,
    spin: Option<Vector3<f32>>,
    spin_accumulated: Vector3<f32>,

    profile: SceneProfile,
}

impl App {
    pub(crate) fn new(
        display: &gl::Display,
        profile: SceneProfile,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        profile.validate()?;

        let lookup = ThinFilmLookup::generate(&profile.film);
        let film_texture = gl::texture::Texture2d::new(
            display,
            gl::texture::RawImage2d::from_raw_rgba(
                lookup.rgba8().to_vec(),
                (lookup.width() as u32, lookup.height() as u32),
            ),
        )?;

        let positions = profile.grid.positions();

        let world = match &profile.physics {
            Some(physics) => {
                let descs: Vec<_> = positions
                    .iter()
                    .map(|p| {
                        BodyDesc::try_new(profile.half_extents, physics.mass)
                            .ok_or("invalid panel body shape")
                            .map(|d| d.at(*p).material(physics.friction, physics.restitution))
                    })
                    .collect::<Result<_, _>>()?;

                let planes = vec![GroundPlane::horizontal(
                    physics.ground_height,
                    physics.friction,
                    physics.restitution,
                )];

                Some(
                    PhysicsWorld::try_new(physics.gravity, &descs, planes)
                        .ok_or("invalid physics configuration")?,
                )
            }
            None => None,
        };

        // Bodies are issued in construction order, so the world's own handles
        // pair with the grid positions one to one.
        let mut body_ids = world.as_ref().map(PhysicsWorld::ids);

        let wall = PanelWall {
            half_extents: [
                profile.half_extents.x as f32,
                profile.half_extents.y as f32,
                profile.half_extents.z as f32,
            ],
            panels: positions
                .iter()
                .map(|p| (to_f32(*p), body_ids.as_mut().and_then(Iterator::next)))
                .collect(),
            film_v: 0.5,
        };

        let backdrop = Backdrop {
            radius: profile.background.radius as f32,
            detail: profile.background.detail,
            color: profile.background.color.map(|c| c as f32),
        };

        let mut list = List::from(vec![]);
        wall.append_nodes(display, &mut list);
        let panel_node_count = list.len();

        backdrop.append_nodes(display, &mut list);

        if let Some(physics) = &profile.physics {
            Floor {
                height: physics.ground_height as f32,
                half_size: 50.0,
            }
            .append_nodes(display, &mut list);
        }

        let mut nodes = list.into_inner();
        nodes.shrink_to_fit();

        let viewpoint = CaptureViewpoint::try_new(
            to_f32(profile.probe.position),
            profile.probe.near as f32,
            profile.probe.far as f32,
        )
        .ok_or("invalid probe viewpoint")?;

        let probe = ReflectionProbe::new(display, viewpoint, profile.probe.resolution);

        let flat_program =
            gl::Program::from_source(display, VERTEX_SHADER_SRC, FLAT_FRAGMENT_SHADER_SRC, None)?;
        let film_program =
            gl::Program::from_source(display, VERTEX_SHADER_SRC, FILM_FRAGMENT_SHADER_SRC, None)?;
        let mirror_program = gl::Program::from_source(
            display,
            VERTEX_SHADER_SRC,
            MIRROR_FRAGMENT_SHADER_SRC,
            None,
        )?;

        Ok(Self {
            nodes,
            panel_node_count,
            flat_program,
            film_program,
            mirror_program,
            probe,
            film_texture,
            film_max_angle: profile.film.max_angle as f32,
            world,
            orientation: OrientationFilter::new(profile.yaw_only),
            drift: profile.pointer_position_lerp.then(PositionFilter::new),
            container_rotation: UnitQuaternion::identity(),
            container_position: Vector3::zeros(),
            spin: profile.spin.map(to_f32),
            spin_accumulated: Vector3::zeros(),
            profile,
        })
    }

    /// Viewport dimensions in scene units at the panel plane, used to scale
    /// pointer input the way the main camera sees it.
    fn scene_viewport(&self, aspect: f32) -> Viewport {
        let height = 2.0 * self.profile.camera_z * (self.profile.camera_fov * 0.5).tan();
        Viewport {
            width: height * aspect as Float,
            height,
        }
    }

    fn eye(&self) -> Point3<f32> {
        Point3::new(0.0, 0.0, self.profile.camera_z as f32)
    }

    /// One simulation tick: smoothing filters first, then physics, then the
    /// node transforms everything downstream renders from.
    fn tick(&mut self, dt: Float) {
        self.container_rotation = self.orientation.advance().cast();
        if let Some(drift) = &mut self.drift {
            self.container_position = to_f32(drift.advance());
        }

        if let Some(world) = &mut self.world {
            world.step(dt);

            for node in &mut self.nodes {
                if let Some(id) = node.body {
                    node.position = to_f32(world.position(id));
                    node.rotation = world.orientation(id).cast();
                }
            }
        } else if let Some(spin) = self.spin {
            self.spin_accumulated += spin;
            let rotation = spin_rotation(self.spin_accumulated);

            for node in &mut self.nodes[..self.panel_node_count] {
                node.rotation = rotation;
            }
        }
    }

    /// Applies the profile's click impulse to the body under the pointer.
    fn click(&mut self, ndc_x: f32, ndc_y: f32, perspective: &Matrix4<f32>, view: &Matrix4<f32>) {
        let Some(physics) = &self.profile.physics else {
            return;
        };
        let Some(inverse) = (perspective * view).try_inverse() else {
            return;
        };

        let unproject = |z: f32| {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            p.xyz() / p.w
        };

        let near = unproject(-1.0);
        let far = unproject(1.0);

        // Bodies live in container space; undo the pointer-driven container
        // transform before casting the ray.
        let rot_inv = self.container_rotation.inverse();
        let origin = rot_inv * (near - self.container_position);
        let direction = rot_inv * (far - near);

        let Some(direction) = Unit::try_new(direction.map(Float::from), 1e-9) else {
            return;
        };
        let origin = Point3::from(origin.map(Float::from));

        let impulse = physics.click_impulse;
        if let Some(world) = &mut self.world {
            if let Some(id) = world.pick(&origin, &direction) {
                let at = world.position(id);
                world.apply_impulse(id, impulse, at);
            }
        }
    }

    /// Refreshes the six probe faces, then draws the window. Capture happens
    /// strictly after the tick and before the main pass, so reflections are
    /// exactly one frame old at most.
    fn render(&self, display: &gl::Display, view: &Matrix4<f32>, projection: &Projection) {
        let exclude = mirror_exclusions(self.nodes.iter().map(|n| &n.material));
        let capture = capture_set(self.nodes.iter().map(|n| n.layers), &exclude);

        self.probe.update(display, |target, face_view, face_projection| {
            target.clear_color_and_depth((0.01, 0.01, 0.05, 1.0), 1.0);

            for &id in &capture {
                let node = &self.nodes[id.0];
                self.draw_node(
                    target,
                    node,
                    node.material,
                    face_view,
                    face_projection,
                    self.probe.viewpoint().position(),
                );
            }
        });

        let mut target = display.draw();
        target.clear_color_and_depth((0.01, 0.01, 0.05, 1.0), 1.0);

        let perspective = projection.matrix();
        let eye = self.eye().coords;

        for node in &self.nodes {
            if node.layers & LAYER_MAIN != 0 {
                self.draw_node(&mut target, node, node.material, view, &perspective, eye);
            }
        }

        target.finish().unwrap();

        display.gl_window().window().request_redraw();
    }

    fn draw_node(
        &self,
        target: &mut impl Surface,
        node: &SceneNode,
        material: Material,
        view: &Matrix4<f32>,
        perspective: &Matrix4<f32>,
        eye: Vector3<f32>,
    ) {
        let container = na::Isometry3::from_parts(
            self.container_position.into(),
            self.container_rotation,
        )
        .to_homogeneous();

        let model: [[f32; 4]; 4] = (container * node.model_matrix()).into();
        let view: [[f32; 4]; 4] = (*view).into();
        let perspective: [[f32; 4]; 4] = (*perspective).into();
        let eye: [f32; 3] = eye.into();

        let params = gl::DrawParameters {
            depth: gl::Depth {
                test: gl::draw_parameters::DepthTest::IfLess,
                write: true,
                ..Default::default()
            },
            blend: gl::Blend::alpha_blending(),
            ..Default::default()
        };

        let film_sampler = self
            .film_texture
            .sampled()
            .wrap_function(gl::uniforms::SamplerWrapFunction::Clamp)
            .magnify_filter(gl::uniforms::MagnifySamplerFilter::Linear);

        let inv_max_angle = 1.0 / self.film_max_angle;

        match material {
            Material::Flat { color } => target
                .draw(
                    node.mesh.vertices(),
                    node.mesh.indices(),
                    &self.flat_program,
                    &gl::uniform! {
                        perspective: perspective,
                        view: view,
                        model: model,
                        color_vec: color,
                    },
                    &params,
                )
                .unwrap(),

            Material::Film { tint, film_v } => target
                .draw(
                    node.mesh.vertices(),
                    node.mesh.indices(),
                    &self.film_program,
                    &gl::uniform! {
                        perspective: perspective,
                        view: view,
                        model: model,
                        tint: tint,
                        film_map: film_sampler,
                        film_v: film_v,
                        inv_max_angle: inv_max_angle,
                        eye_pos: eye,
                    },
                    &params,
                )
                .unwrap(),

            Material::Mirror { film_v } => target
                .draw(
                    node.mesh.vertices(),
                    node.mesh.indices(),
                    &self.mirror_program,
                    &gl::uniform! {
                        perspective: perspective,
                        view: view,
                        model: model,
                        env_map: self.probe.environment(),
                        film_map: film_sampler,
                        film_v: film_v,
                        inv_max_angle: inv_max_angle,
                        eye_pos: eye,
                    },
                    &params,
                )
                .unwrap(),
        }
    }

    pub(crate) fn run(
        mut self,
        display: gl::Display,
        events_loop: glutin::event_loop::EventLoop<()>,
    ) -> ! {
        const ORBIT_SPEED: f32 = 5.0;
        const ORBIT_SENSITIVITY: f32 = 1.0;

        use glutin::{dpi, event, event_loop, window};

        let dpi::PhysicalSize { width, height } = display.gl_window().window().inner_size();

        const NEAR_PLANE: f32 = 0.1;
        const FAR_PLANE: f32 = 1000.0;

        let mut projection = Projection::new(
            width,
            height,
            self.profile.camera_fov as f32,
            NEAR_PLANE,
            FAR_PLANE,
        );

        let mut orbit_camera = OrbitCamera::new(self.eye(), -core::f32::consts::FRAC_PI_2, 0.0);
        let mut orbit_controller = OrbitController::new(ORBIT_SPEED, ORBIT_SENSITIVITY);
        let debug_controls = self.profile.debug_controls;

        let mut window_size = (width, height);
        let mut pointer_ndc = (0.0f32, 0.0f32);
        let mut last_render_time = time::Instant::now();
        let mut mouse_pressed = false;

        events_loop.run(move |ev, _, control_flow| match ev {
            event::Event::WindowEvent { event, .. } => match event {
                event::WindowEvent::CloseRequested => *control_flow = event_loop::ControlFlow::Exit,

                event::WindowEvent::Resized(physical_size) => {
                    if physical_size.width > 0 && physical_size.height > 0 {
                        projection.resize(physical_size.width, physical_size.height);
                        window_size = (physical_size.width, physical_size.height);
                    }

                    display.gl_window().resize(physical_size);
                }

                event::WindowEvent::CursorMoved { position, .. } => {
                    let (w, h) = window_size;
                    pointer_ndc = (
                        (2.0 * position.x / w as f64 - 1.0) as f32,
                        (1.0 - 2.0 * position.y / h as f64) as f32,
                    );

                    if !debug_controls {
                        let viewport = self.scene_viewport(projection.aspect());
                        self.orientation.set_pointer(
                            pointer_ndc.0 as Float,
                            pointer_ndc.1 as Float,
                            viewport,
                        );
                        if let Some(drift) = &mut self.drift {
                            drift.set_pointer(
                                pointer_ndc.0 as Float,
                                pointer_ndc.1 as Float,
                                viewport,
                            );
                        }
                    }
                }

                event::WindowEvent::KeyboardInput { input, .. } => {
                    if debug_controls {
                        if let Some(keycode) = input.virtual_keycode {
                            orbit_controller.process_keyboard(keycode, input.state);
                        }
                    }
                }

                event::WindowEvent::MouseInput { button, state, .. } => {
                    if button == event::MouseButton::Left {
                        let pressed = state == event::ElementState::Pressed;

                        if debug_controls {
                            mouse_pressed = pressed;
                            let gl_window = display.gl_window();
                            let w = gl_window.window();

                            if pressed {
                                w.set_cursor_grab(window::CursorGrabMode::Locked)
                                    .or_else(|_| {
                                        w.set_cursor_grab(window::CursorGrabMode::Confined)
                                    })
                                    .unwrap();
                                w.set_cursor_visible(false);
                            } else {
                                w.set_cursor_grab(window::CursorGrabMode::None).unwrap();
                                w.set_cursor_visible(true);
                            }
                        } else if pressed {
                            let view = Matrix4::look_at_rh(
                                &self.eye(),
                                &Point3::origin(),
                                &Vector3::y(),
                            );
                            let perspective = projection.matrix();
                            self.click(pointer_ndc.0, pointer_ndc.1, &perspective, &view);
                        }
                    }
                }
                _ => {}
            },

            event::Event::RedrawRequested(_) => {
                let now = time::Instant::now();
                let dt = now - last_render_time;
                last_render_time = now;

                if debug_controls {
                    orbit_controller.update_camera(&mut orbit_camera, dt);
                }

                self.tick(dt.as_secs_f64());

                let view = if debug_controls {
                    orbit_camera.view_matrix()
                } else {
                    Matrix4::look_at_rh(&self.eye(), &Point3::origin(), &Vector3::y())
                };

                self.render(&display, &view, &projection);
            }

            event::Event::MainEventsCleared => display.gl_window().window().request_redraw(),

            event::Event::DeviceEvent {
                event: event::DeviceEvent::MouseMotion { delta, .. },
                ..
            } => {
                if debug_controls && mouse_pressed {
                    let inner_window_size = display.gl_window().window().inner_size();

                    display
                        .gl_window()
                        .window()
                        .set_cursor_position(dpi::PhysicalPosition {
                            x: inner_window_size.width / 2,
                            y: inner_window_size.height / 2,
                        })
                        .unwrap();
                    orbit_controller.set_mouse_delta(delta.0, delta.1);
                }
            }
            _ => (),
        });
    }
}
