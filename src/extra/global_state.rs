//! Global state for multiple renderer instances.
//!
//! This module enables opaque management of renderers by numeric handle. This is primarily
//! focused around exposing functionality over wasm. See [`bindings`](crate::extra::bindings)
//! module for more.

use crate::config::VariantConfig;
use crate::extra::driver::FrameDriver;
use core::cell::RefCell;
use std::rc::Rc;

struct Instance {
    driver: FrameDriver,
    /// Host clock value of the first rendered frame.
    start: Option<f64>,
}

thread_local! {
    static RENDERERS: Rc<RefCell<Renderers>> = {
        #[cfg(feature = "wasm")]
        crate::extra::bindings::set_panic_hook();
        Default::default()
    };
}

#[derive(Default)]
struct Renderers {
    slots: Vec<Option<Rc<RefCell<Instance>>>>,
    free_slots: Vec<usize>,
}

fn get_renderers() -> Rc<RefCell<Renderers>> {
    RENDERERS.with(Clone::clone)
}

fn get_instance(id: usize) -> Option<Rc<RefCell<Instance>>> {
    get_renderers().borrow().slots.get(id).and_then(|v| v.clone())
}

/// Creates and starts a renderer. Returns its handle.
///
/// Handles of removed renderers get reused.
pub fn new_renderer(config: VariantConfig) -> usize {
    let renderers = get_renderers();
    let mut renderers = renderers.borrow_mut();

    let id = match renderers.free_slots.pop() {
        Some(id) => id,
        None => {
            renderers.slots.push(None);
            renderers.slots.len() - 1
        }
    };

    let mut driver = FrameDriver::new(config);
    driver.start();

    renderers.slots[id] = Some(Rc::new(RefCell::new(Instance {
        driver,
        start: None,
    })));

    log::debug!("created renderer {id}");

    id
}

/// Tears down and removes a renderer. Returns `false` if the handle was not live.
pub fn remove_renderer(id: usize) -> bool {
    let renderers = get_renderers();
    let mut renderers = renderers.borrow_mut();

    let Some(instance) = renderers.slots.get_mut(id).and_then(Option::take) else {
        log::warn!("removing unknown renderer {id}");
        return false;
    };

    instance.borrow_mut().driver.teardown();
    renderers.free_slots.push(id);

    true
}

pub fn with_renderer<T>(id: usize, f: impl FnOnce(&mut FrameDriver) -> T) -> Option<T> {
    get_instance(id).map(|v| f(&mut v.borrow_mut().driver))
}

/// Number of live renderers.
pub fn renderer_count() -> usize {
    get_renderers()
        .borrow()
        .slots
        .iter()
        .filter(|v| v.is_some())
        .count()
}

/// Advances a renderer and writes its frame as RGBA bytes into `out`.
///
/// `elapsed` is the host clock in seconds. It is made relative to the first rendered frame of the
/// instance. Returns `false` if the handle is not live or the renderer produced no frame, in which
/// case `out` is left empty.
pub fn render(id: usize, elapsed: f64, out: &mut Vec<u8>) -> bool {
    out.clear();

    let Some(instance) = get_instance(id) else {
        return false;
    };
    let instance = &mut *instance.borrow_mut();

    let start = *instance.start.get_or_insert(elapsed);
    let elapsed = (elapsed - start) as f32;

    match instance.driver.tick(elapsed) {
        Some(frame) => {
            frame.write_rgba_bytes(out);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_reused() {
        let a = new_renderer(VariantConfig::hero());
        let b = new_renderer(VariantConfig::studio());
        assert_ne!(a, b);
        assert_eq!(renderer_count(), 2);

        assert!(remove_renderer(a));
        assert!(!remove_renderer(a));
        assert!(with_renderer(a, |_| ()).is_none());

        let c = new_renderer(VariantConfig::workflow());
        assert_eq!(c, a);
        assert_eq!(
            with_renderer(c, |d| d.config().layout),
            Some(crate::scene::Layout::Workflow)
        );

        assert!(remove_renderer(b));
        assert!(remove_renderer(c));
        assert_eq!(renderer_count(), 0);
    }

    #[test]
    fn render_writes_rgba() {
        let id = new_renderer(VariantConfig::hero());
        let mut out = vec![];

        with_renderer(id, |d| d.resize(64, 32));
        assert!(render(id, 1000.0, &mut out));
        assert_eq!(out.len(), 32 * 16 * 4);
        assert!(out.chunks(4).all(|p| p[3] == 255));

        remove_renderer(id);
        assert!(!render(id, 1000.1, &mut out));
        assert!(out.is_empty());
    }
}
