//! # vm
//!
//! The CHIP-8 interpreter itself lives outside this crate. Everything here
//! talks to it through the `Vm` trait, which is the whole contract:
//!
//!  * reset / load_content -- used by the loader only
//!  * execute_cycle / execute_next_op_code -- used by the scheduler only
//!  * press_key / release_key -- used by the key router only
//!  * contents / registers -- read after every executed cycle for display
//!
//! NB. the pixel buffer is one byte per pixel (0 or 1), row-major, 64x32.

use crate::error::Result;

/// number of general purpose registers, V0 to VF
pub const V_REGISTER_COUNT: usize = 16;

/// number of lines on the hex keypad
pub const KEY_LINE_COUNT: u8 = 16;

/// registers as they stood after a completed cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugSnapshot {
    pub program_counter: u16,
    pub i_register: u16,
    pub v_registers: [u8; V_REGISTER_COUNT],
}

pub trait Vm {
    /// clear registers and memory; program counter back to the entry point
    fn reset(&mut self);

    /// install a program image at the standard load address
    fn load_content(&mut self, bytes: &[u8]);

    /// one logical frame's worth of execution
    fn execute_cycle(&mut self) -> Result<()>;

    /// exactly one instruction
    fn execute_next_op_code(&mut self) -> Result<()>;

    /// idempotent while held
    fn press_key(&mut self, line: u8);

    fn release_key(&mut self, line: u8);

    fn release_all_keys(&mut self) {
        for line in 0..KEY_LINE_COUNT {
            self.release_key(line);
        }
    }

    /// the display, one byte per pixel
    fn contents(&self) -> Vec<u8>;

    fn program_counter(&self) -> u16;

    fn i_register(&self) -> u16;

    fn v_registers(&self) -> [u8; V_REGISTER_COUNT];

    fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            program_counter: self.program_counter(),
            i_register: self.i_register(),
            v_registers: self.v_registers(),
        }
    }

    /// whether the sound timer is running; VMs without sound needn't bother
    fn sound_active(&self) -> bool {
        false
    }
}

/// everything a `DummyVm` was asked to do, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmCall {
    Reset,
    Load(Vec<u8>),
    Cycle,
    OpCode,
    Press(u8),
    Release(u8),
}

/// records calls instead of interpreting anything; useful for testing the
/// scheduling and routing layers
#[derive(Default)]
pub struct DummyVm {
    pub calls: Vec<VmCall>,
    pub pixels: Vec<u8>,
    pub snapshot: DebugSnapshot,
    pub sound: bool,
    /// when set, every cycle and op code reports a fault
    pub faulty: bool,
}

impl DummyVm {
    pub fn new() -> Self {
        DummyVm {
            pixels: vec![0; crate::display::DISPLAY_WIDTH * crate::display::DISPLAY_HEIGHT],
            ..Default::default()
        }
    }

    pub fn count(&self, call: &VmCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn cycles(&self) -> usize {
        self.count(&VmCall::Cycle)
    }

    pub fn loads(&self) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                VmCall::Load(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    fn fault(&self) -> Result<()> {
        match self.faulty {
            true => Err(crate::error::Error::Vm("unknown op code 0xffff".into())),
            false => Ok(()),
        }
    }
}

impl Vm for DummyVm {
    fn reset(&mut self) {
        self.calls.push(VmCall::Reset);
        self.snapshot = DebugSnapshot::default();
    }

    fn load_content(&mut self, bytes: &[u8]) {
        self.calls.push(VmCall::Load(bytes.to_vec()));
    }

    fn execute_cycle(&mut self) -> Result<()> {
        self.calls.push(VmCall::Cycle);
        self.snapshot.program_counter = self.snapshot.program_counter.wrapping_add(2);
        self.fault()
    }

    fn execute_next_op_code(&mut self) -> Result<()> {
        self.calls.push(VmCall::OpCode);
        self.snapshot.program_counter = self.snapshot.program_counter.wrapping_add(2);
        self.fault()
    }

    fn press_key(&mut self, line: u8) {
        self.calls.push(VmCall::Press(line));
    }

    fn release_key(&mut self, line: u8) {
        self.calls.push(VmCall::Release(line));
    }

    fn contents(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    fn program_counter(&self) -> u16 {
        self.snapshot.program_counter
    }

    fn i_register(&self) -> u16 {
        self.snapshot.i_register
    }

    fn v_registers(&self) -> [u8; V_REGISTER_COUNT] {
        self.snapshot.v_registers
    }

    fn sound_active(&self) -> bool {
        self.sound
    }
}
