use crate::error::Error;
use crate::vm::{Vm, KEY_LINE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// a physical key code as the host reports it. numbering follows DOM key
/// codes, so 'Q' is 81 and the left arrow is 37
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostKey(pub u32);

/// one of the sixteen keypad lines the VM understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct KeyLine(u8);

impl KeyLine {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for KeyLine {
    type Error = Error;

    fn try_from(line: u8) -> Result<Self, Self::Error> {
        match line < KEY_LINE_COUNT {
            true => Ok(KeyLine(line)),
            false => Err(Error::KeyLine(line)),
        }
    }
}

impl From<KeyLine> for u8 {
    fn from(line: KeyLine) -> u8 {
        line.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapping {
    pub key: HostKey,
    pub line: KeyLine,
    /// shown to the player, e.g. "Q - Shoot left"
    pub description: String,
}

impl KeyMapping {
    /// panics if `line` is off the keypad; meant for tables written in code
    pub fn new(key: u32, line: u8, description: &str) -> Self {
        KeyMapping {
            key: HostKey(key),
            line: KeyLine::try_from(line).expect("key line must be 0-15"),
            description: description.to_string(),
        }
    }
}

/// forwards host key edges to the VM through whichever program's table is
/// installed right now
#[derive(Default)]
pub struct InputRouter {
    table: HashMap<HostKey, KeyLine>,
}

impl InputRouter {
    pub fn new() -> Self {
        InputRouter::default()
    }

    /// replace the whole table. where a key appears twice the first entry
    /// wins
    pub fn install(&mut self, mappings: &[KeyMapping]) {
        self.table.clear();
        for m in mappings {
            if let Some(line) = self.table.get(&m.key) {
                log::warn!(
                    "key {} mapped twice; keeping line {:#x}, ignoring {:#x} ({})",
                    m.key.0,
                    line.get(),
                    m.line.get(),
                    m.description
                );
                continue;
            }
            self.table.insert(m.key, m.line);
        }
    }

    pub fn lookup(&self, key: HostKey) -> Option<KeyLine> {
        self.table.get(&key).copied()
    }

    /// true if the key was mapped and forwarded
    pub fn key_down(&self, key: HostKey, vm: &mut dyn Vm) -> bool {
        match self.lookup(key) {
            Some(line) => {
                vm.press_key(line.get());
                true
            }
            None => false,
        }
    }

    pub fn key_up(&self, key: HostKey, vm: &mut dyn Vm) -> bool {
        match self.lookup(key) {
            Some(line) => {
                vm.release_key(line.get());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{DummyVm, VmCall};

    fn router(mappings: &[KeyMapping]) -> InputRouter {
        let mut r = InputRouter::new();
        r.install(mappings);
        r
    }

    #[test]
    fn test_press_and_release_forwarded_once() {
        let r = router(&[KeyMapping::new(81, 4, "Q - Shoot left")]);
        let mut vm = DummyVm::new();

        assert!(r.key_down(HostKey(81), &mut vm));
        assert_eq!(vm.calls, vec![VmCall::Press(4)]);

        assert!(r.key_up(HostKey(81), &mut vm));
        assert_eq!(vm.calls, vec![VmCall::Press(4), VmCall::Release(4)]);
    }

    #[test]
    fn test_unmapped_key_ignored() {
        let r = router(&[KeyMapping::new(81, 4, "Q - Shoot left")]);
        let mut vm = DummyVm::new();
        assert!(!r.key_down(HostKey(82), &mut vm));
        assert!(!r.key_up(HostKey(80), &mut vm));
        assert!(vm.calls.is_empty());
    }

    #[test]
    fn test_auto_repeat_forwarded() {
        let r = router(&[KeyMapping::new(32, 4, "Space - Rotate")]);
        let mut vm = DummyVm::new();
        r.key_down(HostKey(32), &mut vm);
        r.key_down(HostKey(32), &mut vm);
        assert_eq!(vm.count(&VmCall::Press(4)), 2);
    }

    #[test]
    fn test_swap_table() {
        let mut r = router(&[KeyMapping::new(81, 4, "Q - Shoot left")]);
        r.install(&[KeyMapping::new(65, 1, "A - Left paddle up")]);
        let mut vm = DummyVm::new();

        assert!(!r.key_down(HostKey(81), &mut vm));
        assert!(r.key_down(HostKey(65), &mut vm));
        assert_eq!(vm.calls, vec![VmCall::Press(1)]);
    }

    #[test]
    fn test_duplicate_key_first_wins() {
        let r = router(&[
            KeyMapping::new(37, 4, "Arrow Left - Move left"),
            KeyMapping::new(37, 5, "Arrow Left - also"),
        ]);
        assert_eq!(r.lookup(HostKey(37)).map(KeyLine::get), Some(4));
    }

    #[test]
    fn test_key_line_range() {
        assert!(KeyLine::try_from(15).is_ok());
        assert!(matches!(KeyLine::try_from(16), Err(Error::KeyLine(16))));
    }

    #[test]
    #[should_panic]
    fn test_mapping_rejects_bad_line() {
        KeyMapping::new(81, 0x10, "nope");
    }

    #[test]
    fn test_mapping_json() {
        let m: KeyMapping =
            serde_json::from_str(r#"{"key": 81, "line": 4, "description": "Q"}"#).unwrap();
        assert_eq!(m, KeyMapping::new(81, 4, "Q"));
        let bad = serde_json::from_str::<KeyMapping>(r#"{"key": 81, "line": 16, "description": "Q"}"#);
        assert!(bad.is_err());
    }
}
