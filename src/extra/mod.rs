//! Extra misceleneous structures.

#[cfg(feature = "bindings")]
pub mod bindings;
#[cfg(feature = "global-state")]
pub mod global_state;

pub mod driver;
pub mod orientation;

use super::*;

#[derive(Default, Debug, Clone)]
pub struct Pointer {
    pub primary_down: bool,
    /// Last known pointer position, in screen coordinates.
    pub interact_pos: Option<Vector2>,
}

#[derive(Default, Debug, Clone)]
pub struct Input {
    pub pointer: Pointer,
    /// `x, y, w, h` of the surface the pointer moves over.
    pub screen_rect: Vector4,
    /// New surface dimensions, if the surface was resized since the last frame.
    pub resized: Option<(u16, u16)>,
}

/// Defines a context state.
///
/// This state is used by other systems, such as
/// [`OrientationController`](orientation::OrientationController) to perform frame update changes.
/// It is up to the user to decide how to fill the data of `Ctx`, however, with `crossterm`
/// feature enabled, there are specific functions [`Ctx::new_frame`] and [`Ctx::event`] that help
/// with processing raw terminal input.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub focused: bool,
    pub input: Input,
    pub should_stop: bool,
}

impl Default for Ctx {
    fn default() -> Self {
        Self {
            focused: true,
            input: Default::default(),
            should_stop: false,
        }
    }
}

impl Ctx {
    /// Prepares a new frame with given screen dimensions.
    pub fn new_frame(&mut self, x: u16, y: u16, w: u16, h: u16) {
        self.input.resized = None;
        self.input.screen_rect = Vector4::new(x as f32, y as f32, w as f32, h as f32);
    }
}

#[cfg(feature = "crossterm")]
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

#[cfg(feature = "crossterm")]
impl Ctx {
    /// Processes a crossterm event.
    pub fn event(&mut self, e: Event) {
        match e {
            Event::FocusGained => self.focused = true,
            Event::FocusLost => self.focused = false,
            Event::Resize(w, h) => self.input.resized = Some((w, h)),
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => {
                if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                    self.should_stop = true;
                }
            }
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => match kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    self.input.pointer.interact_pos =
                        Some(Vector2::new(column as f32, row as f32));
                }
                MouseEventKind::Down(_) => {
                    self.input.pointer.primary_down = true;
                    self.input.pointer.interact_pos =
                        Some(Vector2::new(column as f32, row as f32));
                }
                MouseEventKind::Up(_) => self.input.pointer.primary_down = false,
                _ => (),
            },
            _ => (),
        }
    }
}

#[cfg(all(test, feature = "crossterm"))]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, MouseButton};

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn crossterm_events() {
        let mut ctx = Ctx::default();
        ctx.new_frame(0, 0, 80, 24);

        ctx.event(mouse(MouseEventKind::Moved, 10, 5));
        assert_eq!(ctx.input.pointer.interact_pos, Some(Vector2::new(10.0, 5.0)));

        ctx.event(mouse(MouseEventKind::Drag(MouseButton::Left), 11, 6));
        assert_eq!(ctx.input.pointer.interact_pos, Some(Vector2::new(11.0, 6.0)));

        ctx.event(Event::Resize(100, 30));
        assert_eq!(ctx.input.resized, Some((100, 30)));
        ctx.new_frame(0, 0, 100, 30);
        assert_eq!(ctx.input.resized, None);

        ctx.event(Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }));
        assert!(ctx.should_stop);
    }
}
