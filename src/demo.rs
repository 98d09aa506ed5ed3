use std::f32::consts::{FRAC_PI_2, PI};

use anyhow::Context;
use glam::Vec3;
use winit::dpi::PhysicalSize;

use crate::{
    camera::Camera,
    color::Color,
    config::DemoConfig,
    controls::OrbitControls,
    debug_panel::DebugPanel,
    geometry::Geometry,
    material::{MaterialId, StandardMaterial},
    scene_graph::{
        light::{
            AmbientLight, DirectionalLight, HemisphereLight, Light, LightProperty, PointLight,
            RectAreaLight, SpotLight,
        },
        object3d::ObjectId,
        scene::Scene,
    },
    viewport::Viewport,
};

/// Radians per second around X and Y for the spinning meshes.
pub const SPIN_RATE_X: f32 = 0.15;
pub const SPIN_RATE_Y: f32 = 0.1;

pub struct DebugColors {
    pub sky_color: u32,
    pub ground_color: u32,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            sky_color: 0xff0000,
            ground_color: 0x0000ff,
        }
    }
}

pub struct LightRig {
    pub group: ObjectId,
    pub ambient: ObjectId,
    pub directional: ObjectId,
    pub hemisphere: ObjectId,
    pub point: ObjectId,
    pub rect_area: ObjectId,
    pub spot: ObjectId,
}

impl LightRig {
    pub fn build(scene: &mut Scene, colors: &DebugColors) -> Self {
        let ambient = scene.add_light(
            "Ambient Light",
            Light::Ambient(AmbientLight {
                color: Color::from_hex(0xffffff),
                intensity: 0.5,
            }),
            Vec3::ZERO,
        );

        let directional = scene.add_light(
            "Directional Light",
            Light::Directional(DirectionalLight {
                color: Color::from_rgb8(255, 243, 70),
                intensity: 0.3,
                target: Vec3::ZERO,
            }),
            Vec3::Y,
        );

        let hemisphere = scene.add_light(
            "Hemisphere Light",
            Light::Hemisphere(HemisphereLight {
                sky_color: Color::from_hex(colors.sky_color),
                ground_color: Color::from_hex(colors.ground_color),
                intensity: 0.3,
            }),
            Vec3::Y,
        );

        let point = scene.add_light(
            "Point Light",
            Light::Point(PointLight {
                color: Color::from_hex(0xff9000),
                intensity: 0.5,
                distance: 10.0,
                decay: 2.0,
            }),
            Vec3::new(1.0, -0.5, 1.0),
        );

        let rect_area = scene.add_light(
            "RectArea Light",
            Light::RectArea(RectAreaLight {
                color: Color::from_hex(0x4e00ff),
                intensity: 2.0,
                width: 1.0,
                height: 1.0,
            }),
            Vec3::new(-1.5, 0.0, 1.5),
        );
        if let Some(object) = scene.get_object_mut(rect_area) {
            object.transform.look_at(Vec3::ZERO, Vec3::Y);
        }

        let spot = scene.add_light(
            "Spot Light",
            Light::Spot(SpotLight {
                color: Color::from_hex(0x78ff00),
                intensity: 0.5,
                distance: 10.0,
                angle: PI * 0.1,
                penumbra: 0.25,
                decay: 1.0,
                target: Vec3::ZERO,
            }),
            Vec3::new(0.0, 2.0, 3.0),
        );

        let group = scene.add_group("Lights");
        for light in [ambient, directional, hemisphere, point, rect_area, spot] {
            scene.set_object_parent(light, Some(group));
        }

        Self {
            group,
            ambient,
            directional,
            hemisphere,
            point,
            rect_area,
            spot,
        }
    }
}

pub struct MeshSet {
    pub group: ObjectId,
    pub material: MaterialId,
    pub sphere: ObjectId,
    pub cube: ObjectId,
    pub torus: ObjectId,
    pub plane: ObjectId,
}

impl MeshSet {
    pub fn build(scene: &mut Scene) -> Self {
        let material = scene.add_material(StandardMaterial {
            roughness: 0.4,
            ..Default::default()
        });

        let sphere_geometry = scene.add_geometry(Geometry::sphere(0.5, 32, 32));
        let sphere = scene.add_mesh("Sphere", sphere_geometry, material);
        scene.set_object_translation(sphere, Vec3::new(-1.5, 0.0, 0.0));

        let cube_geometry = scene.add_geometry(Geometry::cuboid(0.75, 0.75, 0.75));
        let cube = scene.add_mesh("Cube", cube_geometry, material);

        let torus_geometry = scene.add_geometry(Geometry::torus(0.3, 0.2, 32, 64));
        let torus = scene.add_mesh("Torus", torus_geometry, material);
        scene.set_object_translation(torus, Vec3::new(1.5, 0.0, 0.0));

        let plane_geometry = scene.add_geometry(Geometry::plane(5.0, 5.0));
        let plane = scene.add_mesh("Plane", plane_geometry, material);
        scene.set_object_rotation_euler(plane, -FRAC_PI_2, 0.0, 0.0);
        scene.set_object_translation(plane, Vec3::new(0.0, -0.65, 0.0));

        let group = scene.add_group("Meshes");
        for mesh in [sphere, cube, torus, plane] {
            scene.set_object_parent(mesh, Some(group));
        }

        Self {
            group,
            material,
            sphere,
            cube,
            torus,
            plane,
        }
    }

    pub fn spinning(&self) -> [ObjectId; 3] {
        [self.sphere, self.cube, self.torus]
    }
}

pub fn build_debug_panel(
    scene: &Scene,
    lights: &LightRig,
    width: f32,
) -> anyhow::Result<DebugPanel> {
    use LightProperty::*;

    let mut panel = DebugPanel::new("Debug", width);

    panel
        .add(scene, lights.ambient, Intensity, 0.0, 1.0, 0.001)?
        .name("Ambient Light intensity");
    panel
        .add(scene, lights.directional, Intensity, 0.0, 1.0, 0.001)?
        .name("directional Light intensity");
    panel
        .add(scene, lights.hemisphere, Intensity, 0.0, 1.0, 0.001)?
        .name("hemisphere Light intensity");

    let point = panel.add_folder("Point Light");
    point.add(scene, lights.point, Intensity, 0.0, 1.0, 0.001)?;
    point.add(scene, lights.point, Distance, 1.0, 10.0, 0.01)?;
    point.add(scene, lights.point, Decay, 0.0, 10.0, 0.001)?;

    let rect_area = panel.add_folder("RectArea Light");
    rect_area.add(scene, lights.rect_area, Intensity, 0.0, 10.0, 0.001)?;
    rect_area.add(scene, lights.rect_area, Width, 1.0, 10.0, 0.001)?;
    rect_area.add(scene, lights.rect_area, Height, 1.0, 10.0, 0.001)?;

    let spot = panel.add_folder("Spot Light");
    spot.add(scene, lights.spot, Intensity, 0.0, 1.0, 0.001)?;
    spot.add(scene, lights.spot, Distance, 1.0, 100.0, 1.0)?;
    spot.add(scene, lights.spot, Angle, 0.0, FRAC_PI_2, 0.001)?;
    spot.add(scene, lights.spot, Penumbra, 0.0, 1.0, 0.001)?;
    spot.add(scene, lights.spot, Decay, 0.0, 4.0, 0.01)?;

    Ok(panel)
}

pub struct DemoState {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub viewport: Viewport,
    pub debug_panel: DebugPanel,
    pub lights: LightRig,
    pub meshes: MeshSet,
    pub start_time: std::time::Instant,
}

impl DemoState {
    pub fn new(config: &DemoConfig) -> anyhow::Result<Self> {
        let mut scene = Scene::new();

        let lights = LightRig::build(&mut scene, &DebugColors::default());
        let debug_panel = build_debug_panel(&scene, &lights, config.debug_panel_width)
            .context("Failed to register debug panel controls")?;
        let meshes = MeshSet::build(&mut scene);

        let viewport = Viewport {
            width: config.initial_size.width as f32,
            height: config.initial_size.height as f32,
            scale_factor: 1.0,
        };

        let mut camera = Camera::perspective(75.0, viewport.aspect(), 0.1, 100.0);
        camera.eye = Vec3::new(1.0, 1.0, 2.0);

        let mut controls = OrbitControls::with_target(Vec3::ZERO);
        controls.enable_damping = true;
        controls.update(&mut camera);

        scene.late_update();

        log::info!(
            "Scene ready: {} lights, {} meshes",
            scene.lights().count(),
            scene.meshes().count()
        );

        Ok(Self {
            scene,
            camera,
            controls,
            viewport,
            debug_panel,
            lights,
            meshes,
            start_time: std::time::Instant::now(),
        })
    }

    /// Returns false for sizes that were ignored.
    pub fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
        if !self.viewport.resize(size, scale_factor) {
            return false;
        }

        let (width, height) = self.viewport.size();
        self.camera.set_aspect(width, height);
        log::debug!("Viewport resized to {}x{} @ {}x", width, height, scale_factor);
        true
    }

    pub fn elapsed(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    pub fn update(&mut self, elapsed: f32) {
        for object in self.meshes.spinning() {
            self.scene.set_object_rotation_euler(
                object,
                SPIN_RATE_X * elapsed,
                SPIN_RATE_Y * elapsed,
                0.0,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> DemoState {
        DemoState::new(&DemoConfig::default()).unwrap()
    }

    fn position(state: &DemoState, id: ObjectId) -> Vec3 {
        state.scene.get_object(id).unwrap().transform.translation()
    }

    #[test]
    fn lights_match_their_literal_setup() {
        let state = demo();
        let scene = &state.scene;
        let rig = &state.lights;

        let expected = [
            (rig.ambient, 0xffffff, 0.5),
            (rig.directional, 0xfff346, 0.3),
            (rig.hemisphere, 0xff0000, 0.3),
            (rig.point, 0xff9000, 0.5),
            (rig.rect_area, 0x4e00ff, 2.0),
            (rig.spot, 0x78ff00, 0.5),
        ];
        for (id, color, intensity) in expected {
            let light = scene.light(id).unwrap();
            assert_eq!(light.color().to_hex(), color, "{}", light.kind_name());
            assert_eq!(light.intensity(), intensity, "{}", light.kind_name());
        }

        assert_eq!(position(&state, rig.point), Vec3::new(1.0, -0.5, 1.0));
        assert_eq!(position(&state, rig.rect_area), Vec3::new(-1.5, 0.0, 1.5));
        assert_eq!(position(&state, rig.spot), Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(position(&state, rig.directional), Vec3::Y);
        assert_eq!(position(&state, rig.hemisphere), Vec3::Y);

        let Some(Light::Hemisphere(hemisphere)) = scene.light(rig.hemisphere) else {
            panic!("hemisphere light missing");
        };
        assert_eq!(hemisphere.ground_color.to_hex(), 0x0000ff);

        let Some(Light::Point(point)) = scene.light(rig.point) else {
            panic!("point light missing");
        };
        assert_eq!((point.distance, point.decay), (10.0, 2.0));

        let Some(Light::RectArea(rect)) = scene.light(rig.rect_area) else {
            panic!("rect area light missing");
        };
        assert_eq!((rect.width, rect.height), (1.0, 1.0));

        let Some(Light::Spot(spot)) = scene.light(rig.spot) else {
            panic!("spot light missing");
        };
        assert_eq!(spot.distance, 10.0);
        assert_eq!(spot.angle, PI * 0.1);
        assert_eq!(spot.penumbra, 0.25);
        assert_eq!(spot.decay, 1.0);
    }

    #[test]
    fn rect_area_light_faces_the_origin() {
        let state = demo();
        let transform = &state.scene.get_object(state.lights.rect_area).unwrap().transform;

        let facing = transform.rotation() * Vec3::NEG_Z;
        let to_origin = (-transform.translation()).normalize();
        assert!(facing.abs_diff_eq(to_origin, 1e-5));
    }

    #[test]
    fn debug_panel_uses_the_configured_ranges() {
        let state = demo();
        let panel = &state.debug_panel;
        let rig = &state.lights;

        let triple = |id, property| {
            let binding = panel.find(id, property).unwrap();
            (binding.min, binding.max, binding.step)
        };

        use LightProperty::*;
        let expected = [
            (rig.ambient, Intensity, (0.0, 1.0, 0.001)),
            (rig.directional, Intensity, (0.0, 1.0, 0.001)),
            (rig.hemisphere, Intensity, (0.0, 1.0, 0.001)),
            (rig.point, Intensity, (0.0, 1.0, 0.001)),
            (rig.point, Distance, (1.0, 10.0, 0.01)),
            (rig.point, Decay, (0.0, 10.0, 0.001)),
            (rig.rect_area, Intensity, (0.0, 10.0, 0.001)),
            (rig.rect_area, Width, (1.0, 10.0, 0.001)),
            (rig.rect_area, Height, (1.0, 10.0, 0.001)),
            (rig.spot, Intensity, (0.0, 1.0, 0.001)),
            (rig.spot, Distance, (1.0, 100.0, 1.0)),
            (rig.spot, Angle, (0.0, FRAC_PI_2, 0.001)),
            (rig.spot, Penumbra, (0.0, 1.0, 0.001)),
            (rig.spot, Decay, (0.0, 4.0, 0.01)),
        ];
        for (id, property, range) in expected {
            assert_eq!(triple(id, property), range, "{:?}", property);
        }

        assert_eq!(panel.bindings().count(), 14);
        assert_eq!(
            panel.find(rig.directional, LightProperty::Intensity).unwrap().label,
            "directional Light intensity"
        );

        let folders: Vec<_> = panel.folders().filter_map(|f| f.name.clone()).collect();
        assert_eq!(folders, ["Point Light", "RectArea Light", "Spot Light"]);
    }

    #[test]
    fn debug_panel_has_the_configured_width() {
        let config = DemoConfig::default();
        let state = DemoState::new(&config).unwrap();

        assert_eq!(config.debug_panel_width, 300.0);
        assert_eq!(state.debug_panel.width(), 300.0);
        assert_eq!(state.debug_panel.title(), "Debug");
    }

    #[test]
    fn lights_and_meshes_hang_under_their_groups() {
        let state = demo();
        let scene = &state.scene;

        let children = |group| scene.get_object(group).unwrap().child_ids.clone();
        let rig = &state.lights;
        assert_eq!(
            children(rig.group),
            [rig.ambient, rig.directional, rig.hemisphere, rig.point, rig.rect_area, rig.spot]
        );
        let meshes = &state.meshes;
        assert_eq!(
            children(meshes.group),
            [meshes.sphere, meshes.cube, meshes.torus, meshes.plane]
        );

        // Groups sit at the origin, so world positions equal local ones
        for id in [rig.point, rig.spot, meshes.sphere, meshes.plane] {
            let transform = &scene.get_object(id).unwrap().transform;
            assert!(transform
                .world_position()
                .abs_diff_eq(transform.translation(), 1e-6));
        }
    }

    #[test]
    fn meshes_are_placed_at_their_offsets() {
        let state = demo();
        let meshes = &state.meshes;

        assert_eq!(position(&state, meshes.sphere), Vec3::new(-1.5, 0.0, 0.0));
        assert_eq!(position(&state, meshes.cube), Vec3::ZERO);
        assert_eq!(position(&state, meshes.torus), Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(position(&state, meshes.plane), Vec3::new(0.0, -0.65, 0.0));

        let plane_rotation = state
            .scene
            .get_object(meshes.plane)
            .unwrap()
            .transform
            .rotation_euler();
        assert!(plane_rotation.abs_diff_eq(Vec3::new(-FRAC_PI_2, 0.0, 0.0), 1e-5));

        let shared: Vec<_> = state.scene.meshes().map(|(_, _, mesh)| mesh.material).collect();
        assert_eq!(shared.len(), 4);
        assert!(shared.iter().all(|&material| material == meshes.material));
        assert_eq!(state.scene.materials[meshes.material].roughness, 0.4);
    }

    #[test]
    fn resize_updates_camera_aspect_and_viewport() {
        let mut state = demo();

        assert!(state.resize(PhysicalSize::new(1000, 400), 1.0));
        assert_eq!(state.camera.aspect, 1000.0 / 400.0);
        assert_eq!(state.viewport.size(), (1000.0, 400.0));

        assert!(!state.resize(PhysicalSize::new(0, 0), 1.0));
        assert_eq!(state.viewport.size(), (1000.0, 400.0));
    }

    #[test]
    fn camera_starts_at_its_literal_position() {
        let state = demo();
        assert!(state.camera.eye.abs_diff_eq(Vec3::new(1.0, 1.0, 2.0), 1e-5));
        assert_eq!(state.camera.fov_y, 75.0);
        assert_eq!((state.camera.near, state.camera.far), (0.1, 100.0));
        assert!(state.controls.enable_damping);
    }

    #[test]
    fn spinning_meshes_rotate_linearly_with_time() {
        let mut state = demo();

        for t in [0.0, 1.0, 7.5] {
            state.update(t);

            for id in state.meshes.spinning() {
                let rotation = state.scene.get_object(id).unwrap().transform.rotation_euler();
                let expected = Vec3::new(SPIN_RATE_X * t, SPIN_RATE_Y * t, 0.0);
                assert!(rotation.abs_diff_eq(expected, 1e-4), "t = {}: {}", t, rotation);
            }
        }

        let plane = state.scene.get_object(state.meshes.plane).unwrap();
        assert!(plane
            .transform
            .rotation_euler()
            .abs_diff_eq(Vec3::new(-FRAC_PI_2, 0.0, 0.0), 1e-5));
    }
}
