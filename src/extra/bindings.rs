//! Flat function interface over [`global_state`](crate::extra::global_state).
//!
//! Every function takes a renderer handle and silently does nothing when the handle is not live.

use crate::{
    config::VariantConfig,
    extra::{driver::FrameDriver, global_state as gs},
    scene::{Group, Layout, Step},
    Vector2, Vector4,
};
#[cfg(all(not(target_os = "wasi"), feature = "wasm-bindgen"))]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

pub fn set_panic_hook() {
    // Panics are otherwise invisible in the browser console.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn update_params(id: usize, f: impl FnOnce(&mut crate::scene::SceneParameters)) {
    gs::with_renderer(id, |d| {
        let mut params = d.params();
        f(&mut params);
        d.set_params(params);
    });
}

/// Creates a renderer with the preset of the given layout.
#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn new_renderer(layout: Layout) -> usize {
    gs::new_renderer(VariantConfig::for_layout(layout))
}

/// Creates a renderer from a JSON [`VariantConfig`]. Returns `!0` on parse failure.
#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub fn renderer_from_json(config: &str) -> usize {
    match VariantConfig::from_json(config) {
        Ok(config) => gs::new_renderer(config),
        Err(e) => {
            log::warn!("invalid renderer config: {e}");
            !0usize
        }
    }
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub fn renderer_config_json(id: usize) -> Option<String> {
    gs::with_renderer(id, |d| d.config().to_json().ok()).flatten()
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn remove_renderer(id: usize) -> bool {
    gs::remove_renderer(id)
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn set_intensity(id: usize, intensity: f32) {
    update_params(id, |p| p.intensity = intensity);
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn set_studio_params(id: usize, height: f32, density: f32, generating: bool) {
    update_params(id, |p| {
        p.height = height;
        p.density = density;
        p.generating = generating;
    });
}

/// Sets the workflow step. Indices past the last step map to the last step.
#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn set_step(id: usize, step: u8) {
    update_params(id, |p| p.step = Step::from_index(step));
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn set_layer_visible(id: usize, group: Group, visible: bool) {
    update_params(id, |p| p.visibility.set(group, visible));
}

/// Pointer moved to `(x, y)` over a surface at `(rect_x, rect_y)` sized `rect_w` x `rect_h`.
#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn event_pointer_move(
    id: usize,
    x: f32,
    y: f32,
    rect_x: f32,
    rect_y: f32,
    rect_w: f32,
    rect_h: f32,
) {
    gs::with_renderer(id, |d| {
        d.pointer_move(
            Vector2::new(x, y),
            Vector4::new(rect_x, rect_y, rect_w, rect_h),
        )
    });
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn event_resize(id: usize, width: u32, height: u32) {
    gs::with_renderer(id, |d| d.resize(width, height));
}

/// Renders the next frame into RGBA bytes.
///
/// The result is empty if the handle is not live. Its dimensions are given by [`frame_width`]
/// and [`frame_height`].
#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub fn render(id: usize, elapsed: f64) -> Vec<u8> {
    let mut out = vec![];
    gs::render(id, elapsed, &mut out);
    out
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn frame_width(id: usize) -> usize {
    gs::with_renderer(id, |d: &mut FrameDriver| d.frame().width()).unwrap_or(0)
}

#[cfg_attr(all(not(target_os = "wasi"), feature = "wasm-bindgen"), wasm_bindgen)]
#[no_mangle]
pub extern "C" fn frame_height(id: usize) -> usize {
    gs::with_renderer(id, |d: &mut FrameDriver| d.frame().height()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_json_is_rejected() {
        assert_eq!(renderer_from_json("not json"), !0usize);

        let id = renderer_from_json(r#"{ "layout": "Studio" }"#);
        assert_ne!(id, !0usize);
        let json = renderer_config_json(id).unwrap();
        assert!(json.contains("Studio"));
        assert!(remove_renderer(id));
        assert!(renderer_config_json(id).is_none());
    }

    #[test]
    fn setters_reach_the_driver() {
        let id = new_renderer(Layout::Workflow);

        set_intensity(id, 2.0);
        set_step(id, 42);
        set_layer_visible(id, Group::Facade, false);
        set_studio_params(id, 80.0, 10.0, true);

        let params = gs::with_renderer(id, |d| d.params()).unwrap();
        assert_eq!(params.intensity, 1.0);
        assert_eq!(params.step, Step::Complete);
        assert!(!params.visibility.facade);
        assert_eq!((params.height, params.density), (80.0, 10.0));
        assert!(params.generating);

        remove_renderer(id);
        // Dead handles are ignored
        set_intensity(id, 0.5);
        event_resize(id, 10, 10);
    }

    #[test]
    fn render_follows_resize() {
        let id = new_renderer(Layout::Hero);
        // No surface size yet
        assert!(render(id, 0.0).is_empty());
        assert_eq!(frame_width(id), 0);

        event_resize(id, 120, 80);
        event_pointer_move(id, 60.0, 40.0, 0.0, 0.0, 120.0, 80.0);
        let bytes = render(id, 0.5);

        assert_eq!((frame_width(id), frame_height(id)), (60, 40));
        assert_eq!(bytes.len(), 60 * 40 * 4);

        remove_renderer(id);
        assert!(render(id, 1.0).is_empty());
        assert_eq!(frame_width(id), 0);
    }
}
