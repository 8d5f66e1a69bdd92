//! Drives an external CHIP-8 interpreter at a steady 60 frames a second,
//! whatever rate the host refreshes at, and keeps the screen, the status
//! panel and the keypad in step with whichever program is loaded.
//!
//! ## Design
//!
//! * the interpreter is somebody else's; it's reached only through `vm::Vm`
//! * everything runs on one thread, the host loop. the only thing that
//!   happens elsewhere is fetching program bytes
//! * the host calls `Frontend::tick` once per refresh; the scheduler decides
//!   whether a logical frame is due and carries the remainder over
//! * program switches are reset -> fetch -> load -> run, and at most one is
//!   in flight; requests made meanwhile are dropped
//! * key tables are per program and swapped wholesale on load
//! * display, input and sound are traits so a variety of hosts would work;
//!   the terminal host in `term` is the one provided
//!
//! Model
//!
//! Frontend
//!  |-- vm (external)
//!  |-- loader(catalog, fetcher)  -- resets/loads vm, installs key table
//!  |-- scheduler                 -- cycles vm, refreshes screen
//!  |-- router                    -- presses/releases vm keys
//!  |-- screen(renderer, raster, status)
//!  `-- tone gate(sound)
//!
//! term::run
//!  |-- input.poll_events() -> frontend.handle()
//!  |-- frontend.tick(now)
//!  |-- host.present(raster, status)
//!  `-- sleep until the next refresh
pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod frontend;
pub mod input;
pub mod keymap;
pub mod loader;
pub mod scheduler;
pub mod sound;
pub mod status;
pub mod term;
pub mod vm;

pub use error::{Error, Result};
