use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Click { col: u16, row: u16 },
    Resize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    Restart,
    NextFlower,
    NextColor,
    ShowShareLine,
    HelpToggle,
    Plant { col: u16, row: u16 },
    Resized,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => out.push(InputEvent::Key {
                key: k.code,
                mods: k.modifiers,
            }),
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                out.push(InputEvent::Click {
                    col: m.column,
                    row: m.row,
                })
            }
            Event::Resize(_, _) => out.push(InputEvent::Resize),
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(ev: InputEvent) -> Option<Action> {
    let (key, mods) = match ev {
        InputEvent::Click { col, row } => return Some(Action::Plant { col, row }),
        InputEvent::Resize => return Some(Action::Resized),
        InputEvent::Key { key, mods } => (key, mods),
    };

    if matches!(key, KeyCode::Char('c')) && mods.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Restart),
        KeyCode::Tab | KeyCode::Char('n') | KeyCode::Char('N') => Some(Action::NextFlower),
        KeyCode::Char('k') | KeyCode::Char('K') => Some(Action::NextColor),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::ShowShareLine),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::HelpToggle),
        _ => None,
    }
}
