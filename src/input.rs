use crate::error::Result;
use crate::keymap::HostKey;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent};
use crossterm::terminal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEdge {
    Down(HostKey),
    Up(HostKey),
}

/// everything the host can ask of the frontend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Key(KeyEdge),
    Halt,
    Resume,
    Step,
    NextProgram,
    PrevProgram,
    ToggleDebug,
    Quit,
}

/// reads host events
pub trait Input {
    /// everything that happened since the last call
    fn poll_events(&mut self, now: Instant) -> Result<Vec<HostEvent>>;
}

/// control keys; everything else goes to the keypad router
fn control_event(code: KeyCode) -> Option<HostEvent> {
    match code {
        KeyCode::F(5) => Some(HostEvent::Halt),
        KeyCode::F(6) => Some(HostEvent::Resume),
        KeyCode::F(7) => Some(HostEvent::Step),
        KeyCode::F(8) => Some(HostEvent::ToggleDebug),
        KeyCode::PageDown => Some(HostEvent::NextProgram),
        KeyCode::PageUp => Some(HostEvent::PrevProgram),
        KeyCode::Esc => Some(HostEvent::Quit),
        _ => None,
    }
}

/// terminal key to DOM-style key code, so catalogs written for a browser
/// work unchanged
pub fn host_key(code: KeyCode) -> Option<HostKey> {
    let n = match code {
        KeyCode::Char(c) if c.is_ascii_alphanumeric() => c.to_ascii_uppercase() as u32,
        KeyCode::Char(' ') => 32,
        KeyCode::Enter => 13,
        KeyCode::Left => 37,
        KeyCode::Up => 38,
        KeyCode::Right => 39,
        KeyCode::Down => 40,
        _ => return None,
    };
    Some(HostKey(n))
}

/// tracks which keys are held, given only presses. a key is let go once it
/// hasn't been reported for `hold`
pub struct HeldKeys {
    hold: Duration,
    deadlines: HashMap<HostKey, Instant>,
}

impl HeldKeys {
    pub fn new(hold: Duration) -> Self {
        HeldKeys {
            hold,
            deadlines: HashMap::new(),
        }
    }

    /// repeats are passed on as presses too
    pub fn press(&mut self, key: HostKey, now: Instant) -> KeyEdge {
        self.deadlines.insert(key, now + self.hold);
        KeyEdge::Down(key)
    }

    pub fn expire(&mut self, now: Instant) -> Vec<KeyEdge> {
        let mut released: Vec<HostKey> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        released.sort_by_key(|k| k.0);
        for key in &released {
            self.deadlines.remove(key);
        }
        released.into_iter().map(KeyEdge::Up).collect()
    }

    pub fn is_held(&self, key: HostKey) -> bool {
        self.deadlines.contains_key(&key)
    }
}

/// keyboard input from the terminal, via crossterm
pub struct TermKeys {
    held: HeldKeys,
}

impl TermKeys {
    pub fn new(hold: Duration) -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(TermKeys {
            held: HeldKeys::new(hold),
        })
    }

    fn translate(&mut self, event: KeyEvent, now: Instant) -> Option<HostEvent> {
        if let Some(control) = control_event(event.code) {
            return Some(control);
        }
        match host_key(event.code) {
            Some(key) => Some(HostEvent::Key(self.held.press(key, now))),
            None => {
                log::debug!("unmapped terminal key {:?}", event.code);
                None
            }
        }
    }
}

impl Drop for TermKeys {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("could not leave raw mode: {}", e);
        }
    }
}

impl Input for TermKeys {
    fn poll_events(&mut self, now: Instant) -> Result<Vec<HostEvent>> {
        let mut events: Vec<HostEvent> = self
            .held
            .expire(now)
            .into_iter()
            .map(HostEvent::Key)
            .collect();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(key) = read()? {
                events.extend(self.translate(key, now));
            }
        }
        Ok(events)
    }
}

/// dummy Input implementation for testing; hands out one batch per poll
pub struct DummyInput {
    batches: Vec<Vec<HostEvent>>,
}

impl DummyInput {
    pub fn new(mut batches: Vec<Vec<HostEvent>>) -> Self {
        batches.reverse();
        DummyInput { batches }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self, _now: Instant) -> Result<Vec<HostEvent>> {
        Ok(self.batches.pop().unwrap_or_default())
    }
}
