//! # loader
//!
//! Switching programs is a two-phase affair:
//!
//!  1. `select_program` -- guard, reset the VM, publish the label, start the
//!     fetch. returns straight away
//!  2. `poll`, called from the host loop every tick -- once the bytes arrive,
//!     load them, start the scheduler, swap the key table
//!
//! Only one load can be in flight. Asking for another one meanwhile is
//! dropped on the floor rather than queued; the first request wins.
//!
//! NB. the guard is a plain check-then-set. that is only sound because both
//! phases run on the host loop thread; the fetch itself is the only thing
//! that happens elsewhere.

use crate::catalog::{Catalog, ProgramDescriptor};
use crate::error::{Error, Result};
use crate::keymap::InputRouter;
use crate::scheduler::Scheduler;
use crate::status::Status;
use crate::vm::Vm;
use crossbeam_channel::{Receiver, TryRecvError};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
}

/// the answer to a selection request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// the fetch for this catalog index has started
    Loading(usize),
    /// another load was already in flight
    Dropped,
}

/// what `poll` found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Nothing,
    Loaded(usize),
    Failed(usize),
}

/// a fetch that may not have finished yet
pub struct PendingFetch {
    rx: Receiver<Result<Vec<u8>>>,
}

impl PendingFetch {
    pub fn new(rx: Receiver<Result<Vec<u8>>>) -> Self {
        PendingFetch { rx }
    }

    /// a fetch that finished before anyone asked
    pub fn ready(result: Result<Vec<u8>>) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        // can't fail; the receiver is right here
        let _ = tx.send(result);
        PendingFetch { rx }
    }

    /// `None` while still in flight
    fn try_complete(&self, locator: &str) -> Option<Result<Vec<u8>>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(Error::transport(locator, "fetch abandoned")))
            }
        }
    }
}

/// turns a content locator into program bytes, eventually
pub trait Fetcher {
    fn fetch(&self, locator: &str) -> PendingFetch;
}

/// reads programs from a directory on a worker thread
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileFetcher { root: root.into() }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, locator: &str) -> PendingFetch {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let path = self.root.join(locator);
        let locator = locator.to_string();
        thread::spawn(move || {
            let result = match fs::read(&path) {
                Ok(bytes) if bytes.is_empty() => {
                    Err(Error::transport(&locator, "empty program image"))
                }
                Ok(bytes) => Ok(bytes),
                Err(e) => Err(Error::transport(&locator, e)),
            };
            // the loader may have gone away; nothing to do about it
            let _ = tx.send(result);
        });
        PendingFetch::new(rx)
    }
}

/// serves programs from memory, e.g. ROMs baked in with `include_bytes!`
#[derive(Default)]
pub struct MemoryFetcher {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        MemoryFetcher::default()
    }

    pub fn with(mut self, locator: &str, bytes: &[u8]) -> Self {
        self.images.insert(locator.to_string(), bytes.to_vec());
        self
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, locator: &str) -> PendingFetch {
        PendingFetch::ready(
            self.images
                .get(locator)
                .cloned()
                .ok_or_else(|| Error::transport(locator, "no such program")),
        )
    }
}

pub struct LoadCoordinator<F: Fetcher> {
    fetcher: F,
    catalog: Catalog,
    current: usize,
    state: LoadState,
    pending: Option<PendingFetch>,
}

impl<F: Fetcher> LoadCoordinator<F> {
    pub fn new(catalog: Catalog, fetcher: F) -> Self {
        LoadCoordinator {
            fetcher,
            catalog,
            current: 0,
            state: LoadState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_program(&self) -> &ProgramDescriptor {
        // current only ever holds an index checked against the catalog
        &self.catalog.programs()[self.current]
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn select_program(
        &mut self,
        index: usize,
        vm: &mut dyn Vm,
        status: &mut Status,
    ) -> Result<Selection> {
        if self.state == LoadState::Loading {
            log::debug!("load of program {} dropped; another load is in flight", index);
            return Ok(Selection::Dropped);
        }
        let program = self.catalog.get(index).ok_or(Error::NoSuchProgram(index))?;
        self.state = LoadState::Loading;

        // the old program must not keep running while the new one downloads
        vm.reset();

        self.current = index;
        status.set_label(&program.name);
        status.clear_error();

        log::debug!("fetching {} from {}", program.name, program.locator);
        self.pending = Some(self.fetcher.fetch(&program.locator));
        Ok(Selection::Loading(index))
    }

    pub fn select_next(&mut self, vm: &mut dyn Vm, status: &mut Status) -> Result<Selection> {
        let index = self.catalog.next_index(self.current);
        self.select_program(index, vm, status)
    }

    pub fn select_prev(&mut self, vm: &mut dyn Vm, status: &mut Status) -> Result<Selection> {
        let index = self.catalog.prev_index(self.current);
        self.select_program(index, vm, status)
    }

    /// finish the in-flight load, if its bytes have arrived
    pub fn poll(
        &mut self,
        vm: &mut dyn Vm,
        scheduler: &mut Scheduler,
        router: &mut InputRouter,
        status: &mut Status,
    ) -> Completion {
        let program = &self.catalog.programs()[self.current];
        let result = match &self.pending {
            Some(pending) => match pending.try_complete(&program.locator) {
                Some(result) => result,
                None => return Completion::Nothing,
            },
            None => return Completion::Nothing,
        };
        self.pending = None;
        self.state = LoadState::Idle;

        match result {
            Ok(bytes) => {
                vm.load_content(&bytes);
                scheduler.start();
                vm.release_all_keys();
                router.install(&program.key_mappings);
                status.set_controls(&program.key_mappings);
                log::info!("loaded {} ({} bytes)", program.name, bytes.len());
                Completion::Loaded(self.current)
            }
            Err(e) => {
                log::error!("{}", e);
                status.show_error(e.to_string());
                Completion::Failed(self.current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::HostKey;
    use crate::scheduler::SchedulerState;
    use crate::vm::{DummyVm, VmCall};
    use crossbeam_channel::Sender;
    use std::cell::RefCell;
    use std::io::Write;

    /// hands out fetches that the test completes by hand
    #[derive(Default)]
    struct ManualFetcher {
        requests: RefCell<Vec<(String, Sender<Result<Vec<u8>>>)>>,
    }

    impl ManualFetcher {
        fn complete(&self, n: usize, result: Result<Vec<u8>>) {
            self.requests.borrow()[n].1.send(result).unwrap();
        }

        fn locators(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|(l, _)| l.clone()).collect()
        }
    }

    impl Fetcher for &ManualFetcher {
        fn fetch(&self, locator: &str) -> PendingFetch {
            let (tx, rx) = crossbeam_channel::bounded(1);
            self.requests.borrow_mut().push((locator.to_string(), tx));
            PendingFetch::new(rx)
        }
    }

    struct Rig {
        vm: DummyVm,
        scheduler: Scheduler,
        router: InputRouter,
        status: Status,
    }

    impl Rig {
        fn new() -> Self {
            Rig {
                vm: DummyVm::new(),
                scheduler: Scheduler::default(),
                router: InputRouter::new(),
                status: Status::new(),
            }
        }

        fn select<F: Fetcher>(&mut self, l: &mut LoadCoordinator<F>, index: usize) -> Selection {
            l.select_program(index, &mut self.vm, &mut self.status).unwrap()
        }

        fn poll<F: Fetcher>(&mut self, l: &mut LoadCoordinator<F>) -> Completion {
            l.poll(
                &mut self.vm,
                &mut self.scheduler,
                &mut self.router,
                &mut self.status,
            )
        }
    }

    #[test]
    fn test_load_sequence() {
        let fetcher = ManualFetcher::default();
        let mut l = LoadCoordinator::new(Catalog::builtin(), &fetcher);
        let mut rig = Rig::new();

        assert_eq!(rig.select(&mut l, 1), Selection::Loading(1));
        // reset and label happen before the bytes arrive
        assert_eq!(rig.vm.calls, vec![VmCall::Reset]);
        assert_eq!(rig.status.label(), "Pong");
        assert_eq!(l.state(), LoadState::Loading);
        assert_eq!(fetcher.locators(), ["PONG2.ch8"]);
        assert_eq!(rig.poll(&mut l), Completion::Nothing);
        assert_eq!(rig.scheduler.state(), SchedulerState::Stopped);

        fetcher.complete(0, Ok(vec![0x00, 0xe0]));
        assert_eq!(rig.poll(&mut l), Completion::Loaded(1));
        assert_eq!(l.state(), LoadState::Idle);
        assert_eq!(rig.vm.loads(), vec![&[0x00u8, 0xe0][..]]);
        assert_eq!(rig.vm.calls[1], VmCall::Load(vec![0x00, 0xe0]));
        assert_eq!(rig.scheduler.state(), SchedulerState::Running);
        assert_eq!(rig.router.lookup(HostKey(65)).map(|l| l.get()), Some(0x1));
        assert_eq!(rig.status.controls().len(), 4);

        // nothing more to finish
        assert_eq!(rig.poll(&mut l), Completion::Nothing);
    }

    #[test]
    fn test_second_request_dropped_while_loading() {
        let fetcher = ManualFetcher::default();
        let mut l = LoadCoordinator::new(Catalog::builtin(), &fetcher);
        let mut rig = Rig::new();

        assert_eq!(rig.select(&mut l, 1), Selection::Loading(1));
        assert_eq!(rig.select(&mut l, 2), Selection::Dropped);
        assert_eq!(rig.vm.count(&VmCall::Reset), 1);
        assert_eq!(fetcher.locators().len(), 1);
        assert_eq!(rig.status.label(), "Pong");

        fetcher.complete(0, Ok(vec![1, 2, 3]));
        assert_eq!(rig.poll(&mut l), Completion::Loaded(1));
        assert_eq!(rig.vm.loads().len(), 1);
        assert_eq!(l.current_index(), 1);
        assert_eq!(l.current_program().name, "Pong");

        // idle again, so the next request goes through
        assert_eq!(rig.select(&mut l, 2), Selection::Loading(2));
    }

    #[test]
    fn test_failed_fetch_leaves_vm_reset() {
        let fetcher = ManualFetcher::default();
        let mut l = LoadCoordinator::new(Catalog::builtin(), &fetcher);
        let mut rig = Rig::new();
        rig.router.install(&l.current_program().key_mappings.clone());

        rig.select(&mut l, 3);
        fetcher.complete(0, Err(Error::transport("TETRIS.ch8", "404")));
        assert_eq!(rig.poll(&mut l), Completion::Failed(3));

        assert_eq!(l.state(), LoadState::Idle);
        assert_eq!(rig.vm.calls, vec![VmCall::Reset]);
        assert_eq!(rig.scheduler.state(), SchedulerState::Stopped);
        // Ufo's table is still in place
        assert!(rig.router.lookup(HostKey(81)).is_some());
        assert!(rig.router.lookup(HostKey(40)).is_none());
        assert!(rig.status.error().unwrap().contains("404"));
        assert_eq!(rig.status.label(), "Tetris");
        assert_eq!(fetcher.locators().len(), 1);
    }

    #[test]
    fn test_abandoned_fetch_fails() {
        let mut l = LoadCoordinator::new(Catalog::builtin(), DroppingFetcher);
        let mut rig = Rig::new();
        rig.select(&mut l, 0);
        assert_eq!(rig.poll(&mut l), Completion::Failed(0));
        assert!(rig.status.error().unwrap().contains("abandoned"));
    }

    struct DroppingFetcher;

    impl Fetcher for DroppingFetcher {
        fn fetch(&self, _locator: &str) -> PendingFetch {
            let (_, rx) = crossbeam_channel::bounded(1);
            PendingFetch::new(rx)
        }
    }

    #[test]
    fn test_cyclic_navigation() {
        let fetcher = MemoryFetcher::new()
            .with("UFO.ch8", &[1])
            .with("PONG2.ch8", &[2])
            .with("BRIX.ch8", &[3])
            .with("TETRIS.ch8", &[4]);
        let mut l = LoadCoordinator::new(Catalog::builtin(), fetcher);
        let mut rig = Rig::new();

        rig.select(&mut l, 3);
        rig.poll(&mut l);
        assert_eq!(
            l.select_next(&mut rig.vm, &mut rig.status).unwrap(),
            Selection::Loading(0)
        );
        rig.poll(&mut l);
        assert_eq!(
            l.select_prev(&mut rig.vm, &mut rig.status).unwrap(),
            Selection::Loading(3)
        );
        assert_eq!(rig.poll(&mut l), Completion::Loaded(3));
        assert_eq!(rig.vm.loads(), vec![&[4u8][..], &[1], &[4]]);
    }

    #[test]
    fn test_out_of_range_selection() {
        let mut l = LoadCoordinator::new(Catalog::builtin(), MemoryFetcher::new());
        let mut rig = Rig::new();
        let r = l.select_program(4, &mut rig.vm, &mut rig.status);
        assert!(matches!(r, Err(Error::NoSuchProgram(4))));
        assert_eq!(l.state(), LoadState::Idle);
        assert!(rig.vm.calls.is_empty());
    }

    #[test]
    fn test_memory_fetcher_unknown_locator() {
        let mut l = LoadCoordinator::new(Catalog::builtin(), MemoryFetcher::new());
        let mut rig = Rig::new();
        rig.select(&mut l, 0);
        assert_eq!(rig.poll(&mut l), Completion::Failed(0));
    }

    #[test]
    fn test_file_fetcher() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("chip8-host-{}", std::process::id()));
        fs::create_dir_all(&dir)?;
        fs::File::create(dir.join("UFO.ch8"))?.write_all(&[0xa2, 0xcd])?;

        let fetcher = FileFetcher::new(&dir);
        let mut l = LoadCoordinator::new(Catalog::builtin(), fetcher);
        let mut rig = Rig::new();
        rig.select(&mut l, 0);

        let mut outcome = Completion::Nothing;
        for _ in 0..500 {
            outcome = rig.poll(&mut l);
            if outcome != Completion::Nothing {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(outcome, Completion::Loaded(0));
        assert_eq!(rig.vm.loads(), vec![&[0xa2u8, 0xcd][..]]);

        // PONG2.ch8 isn't there
        rig.select(&mut l, 1);
        let mut outcome = Completion::Nothing;
        for _ in 0..500 {
            outcome = rig.poll(&mut l);
            if outcome != Completion::Nothing {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(outcome, Completion::Failed(1));

        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
