use approx::assert_relative_eq;
use core::f32::consts::PI;
use ditherscape::{
    config::VariantConfig,
    dithering::{BayerDither, Dithering},
    extra::driver::FrameDriver,
    framebuffer::Rgba,
    scene::{compose_scene, Animation, Group, Layout, SceneParameters, Step},
    Camera, Renderer, Vector2, Vector4,
};

fn surface() -> Vector4 {
    Vector4::new(0.0, 0.0, 800.0, 600.0)
}

#[test]
fn hero_end_to_end() {
    let mut driver = FrameDriver::new(VariantConfig::hero());
    driver.start();
    driver.resize(800, 600);
    driver.set_params(SceneParameters {
        intensity: 0.5,
        ..Default::default()
    });
    driver.pointer_move(Vector2::new(400.0, 300.0), surface());

    let frame = driver.tick(0.0).expect("running driver produces a frame");

    assert_eq!(frame.dims(), (400, 300));
    assert!(frame
        .pixels()
        .iter()
        .all(|p| *p == Rgba::gray(0) || *p == Rgba::gray(255)));

    assert_eq!(driver.stats().boxes, 2);

    let state = driver.orientation();
    assert_relative_eq!(state.target_yaw, PI);
    assert_relative_eq!(state.target_pitch, 0.0);
}

#[test]
fn pipeline_is_deterministic() {
    let run = || {
        let params = SceneParameters {
            intensity: 0.8,
            ..Default::default()
        };
        let anim = Animation {
            time: 1.25,
            ..Default::default()
        };
        let boxes = compose_scene(Layout::Hero, &params, &anim);

        let camera = Camera {
            yaw: 0.8,
            pitch: 0.5,
            ..Camera::new(400.0, 400.0)
        };
        let mut buf = Renderer::default().rasterize(&camera, &boxes, 160, 120);
        BayerDither::default().dither(&mut buf);
        buf.to_rgba_bytes()
    };

    assert_eq!(run(), run());
}

#[test]
fn intensity_thresholds() {
    let count = |intensity| {
        let params = SceneParameters {
            intensity,
            ..Default::default()
        };
        compose_scene(Layout::Hero, &params, &Animation::default()).len()
    };

    assert_eq!(count(0.29), 1);
    assert_eq!(count(0.31), 2);
    assert_eq!(count(0.61), 4);
}

#[test]
fn hidden_layers_leave_background() {
    let mut driver = FrameDriver::new(VariantConfig::workflow());
    driver.start();
    driver.resize(200, 200);

    let mut params = SceneParameters {
        intensity: 1.0,
        step: Step::Layers,
        ..Default::default()
    };
    params.visibility.set(Group::Core, false);
    params.visibility.set(Group::Facade, false);
    driver.set_params(params);

    let frame = driver.tick(0.0).unwrap();
    assert!(frame.pixels().iter().all(|p| *p == Rgba::TRANSPARENT));
    assert_eq!(driver.stats().boxes, 0);

    params.visibility.set(Group::Core, true);
    driver.set_params(params);
    let frame = driver.tick(0.1).unwrap();
    assert!(frame.pixels().iter().any(|p| p.a == 255));
    assert_eq!(driver.stats().boxes, 2);
}

#[test]
fn early_workflow_steps_are_wireframes() {
    let pixels_at = |step| {
        let mut driver = FrameDriver::new(VariantConfig::workflow());
        driver.start();
        driver.resize(400, 400);
        driver.set_params(SceneParameters {
            intensity: 0.5,
            step,
            ..Default::default()
        });
        driver.tick(0.0);
        driver.stats().pixels
    };

    assert!(pixels_at(Step::Abstract) < pixels_at(Step::Complete));
}

#[test]
fn orientation_converges_to_pointer() {
    let mut driver = FrameDriver::new(VariantConfig::hero());
    driver.start();
    driver.resize(80, 60);
    driver.pointer_move(Vector2::new(600.0, 300.0), surface());

    for i in 0..400 {
        driver.tick(i as f32 / 60.0);
    }

    let state = driver.orientation();
    assert_relative_eq!(state.yaw, 1.5 * PI, epsilon = 1e-3);
    assert_relative_eq!(state.pitch, 0.0, epsilon = 1e-3);
}
