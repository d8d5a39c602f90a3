use crate::value::Value;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A terminal event translated into the shape templates listen for.
///
/// The runtime raises every `DomEvent` on the `window` and `document` global
/// targets, so a template reacts to keys with an output such as
/// `output_on("window", "keydown")`.
///
/// | Terminal event | `name` | `payload` |
/// |----------------|--------|-----------|
/// | key press / repeat | `keydown` | `{ key, ctrl, alt, shift }` |
/// | resize | `resize` | `{ width, height }` |
/// | bracketed paste | `paste` | `{ text }` |
/// | focus gained / lost | `focus` / `blur` | `null` |
///
/// Mouse events and key releases are not translated.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// Event name.
    pub name: &'static str,
    /// Event object handed to the view's event handler.
    pub payload: Value,
}

impl DomEvent {
    /// Translate a crossterm event.
    pub fn from_terminal(event: &Event) -> Option<DomEvent> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(DomEvent {
                name: "keydown",
                payload: key_payload(key)?,
            }),
            Event::Resize(w, h) => Some(DomEvent {
                name: "resize",
                payload: Value::map([("width", Value::from(u32::from(*w))), ("height", Value::from(u32::from(*h)))]),
            }),
            Event::Paste(text) => Some(DomEvent {
                name: "paste",
                payload: Value::map([("text", text.as_str())]),
            }),
            Event::FocusGained => Some(DomEvent {
                name: "focus",
                payload: Value::Null,
            }),
            Event::FocusLost => Some(DomEvent {
                name: "blur",
                payload: Value::Null,
            }),
            _ => None,
        }
    }
}

/// Browser-style key name (`"a"`, `"Enter"`, `"ArrowUp"`, `"F5"`).
pub fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => " ",
        KeyCode::Char(c) => return Some(c.to_string()),
        KeyCode::F(n) => return Some(format!("F{n}")),
        KeyCode::Enter => "Enter",
        KeyCode::Esc => "Escape",
        KeyCode::Backspace => "Backspace",
        KeyCode::Tab | KeyCode::BackTab => "Tab",
        KeyCode::Delete => "Delete",
        KeyCode::Insert => "Insert",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        _ => return None,
    };
    Some(name.to_string())
}

fn key_payload(key: &KeyEvent) -> Option<Value> {
    let name = key_name(key.code)?;
    let shift = key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab;
    Some(Value::map([
        ("key", Value::from(name)),
        ("ctrl", Value::from(key.modifiers.contains(KeyModifiers::CONTROL))),
        ("alt", Value::from(key.modifiers.contains(KeyModifiers::ALT))),
        ("shift", Value::from(shift)),
    ]))
}
