use crate::error::{Error, Result};
use crate::keymap::KeyMapping;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDescriptor {
    /// label shown while the program is active
    pub name: String,
    /// handed to the fetcher as-is; for files, a path relative to the ROM dir
    pub locator: String,
    #[serde(default)]
    pub key_mappings: Vec<KeyMapping>,
}

impl ProgramDescriptor {
    pub fn new(name: &str, locator: &str, key_mappings: Vec<KeyMapping>) -> Self {
        ProgramDescriptor {
            name: name.to_string(),
            locator: locator.to_string(),
            key_mappings,
        }
    }
}

/// the fixed, ordered set of programs to cycle through. never empty
#[derive(Clone, Debug)]
pub struct Catalog {
    programs: Vec<ProgramDescriptor>,
}

impl Catalog {
    pub fn new(programs: Vec<ProgramDescriptor>) -> Result<Self> {
        if programs.is_empty() {
            return Err(Error::Config("program catalog is empty".into()));
        }
        Ok(Catalog { programs })
    }

    /// a JSON array of programs
    pub fn from_json(json: &str) -> Result<Self> {
        Catalog::new(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Catalog::from_json(&fs::read_to_string(path)?)
    }

    /// the four games that ship by default
    pub fn builtin() -> Self {
        Catalog {
            programs: vec![
                ProgramDescriptor::new(
                    "Ufo",
                    "UFO.ch8",
                    vec![
                        KeyMapping::new(81, 0x4, "Q - Shoot left"),
                        KeyMapping::new(87, 0x5, "W - Shoot up"),
                        KeyMapping::new(69, 0x6, "E - Shoot right"),
                    ],
                ),
                ProgramDescriptor::new(
                    "Pong",
                    "PONG2.ch8",
                    vec![
                        KeyMapping::new(65, 0x1, "A - Left paddle up"),
                        KeyMapping::new(90, 0x4, "Z - Left paddle down"),
                        KeyMapping::new(75, 0xc, "K - Right paddle up"),
                        KeyMapping::new(77, 0xd, "M - Right paddle down"),
                    ],
                ),
                ProgramDescriptor::new(
                    "Brix",
                    "BRIX.ch8",
                    vec![
                        KeyMapping::new(37, 0x4, "Arrow Left - Move left"),
                        KeyMapping::new(39, 0x6, "Arrow Right - Move right"),
                    ],
                ),
                ProgramDescriptor::new(
                    "Tetris",
                    "TETRIS.ch8",
                    vec![
                        KeyMapping::new(37, 0x5, "Arrow Left - Move left"),
                        KeyMapping::new(39, 0x6, "Arrow Right - Move right"),
                        KeyMapping::new(40, 0x7, "Arrow Down - Drop"),
                        KeyMapping::new(32, 0x4, "Space - Rotate"),
                    ],
                ),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProgramDescriptor> {
        self.programs.get(index)
    }

    pub fn programs(&self) -> &[ProgramDescriptor] {
        &self.programs
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgramDescriptor> {
        self.programs.iter()
    }

    /// wraps from the last program to the first
    pub fn next_index(&self, index: usize) -> usize {
        match index + 1 >= self.len() {
            true => 0,
            false => index + 1,
        }
    }

    /// wraps from the first program to the last
    pub fn prev_index(&self, index: usize) -> usize {
        match index == 0 || index > self.len() {
            true => self.len() - 1,
            false => index - 1,
        }
    }
}
