//! # frontend
//!
//! Owns the VM and everything that touches it. Each component gets the VM
//! lent to it in turn:
//!
//!  * loader -- reset on selection, load once the bytes arrive
//!  * scheduler -- cycles on tick, single op codes on step
//!  * router -- key presses and releases, between ticks
//!
//! and since all of that happens on the host loop thread, nothing ever sees
//! the VM half-way through someone else's change.

use crate::catalog::{Catalog, ProgramDescriptor};
use crate::config::Config;
use crate::display::{FrameRenderer, Raster};
use crate::error::Result;
use crate::input::{HostEvent, KeyEdge};
use crate::keymap::InputRouter;
use crate::loader::{Completion, Fetcher, FileFetcher, LoadCoordinator, LoadState, Selection};
use crate::scheduler::{Scheduler, SchedulerState, Tick, View};
use crate::sound::{SimpleBeep, ToneGate};
use crate::status::Status;
use crate::vm::Vm;

/// whether the host loop should keep going
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// the renderer plus everything it draws into
pub struct Screen {
    renderer: FrameRenderer,
    raster: Raster,
    status: Status,
    frames: u64,
}

impl Screen {
    pub fn new(renderer: FrameRenderer) -> Self {
        let raster = Raster::new(renderer.resolution());
        Screen {
            renderer,
            raster,
            status: Status::new(),
            frames: 0,
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// frames actually drawn
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl View for Screen {
    fn refresh(&mut self, vm: &dyn Vm) {
        match self.renderer.render(&vm.contents(), &mut self.raster) {
            Ok(()) => self.frames += 1,
            Err(e) => log::error!("frame skipped: {}", e),
        }
        self.status.update_debug(vm.debug_snapshot());
    }
}

pub struct Frontend<V: Vm, F: Fetcher> {
    vm: V,
    scheduler: Scheduler,
    router: InputRouter,
    loader: LoadCoordinator<F>,
    screen: Screen,
    tone: ToneGate,
}

impl<V: Vm, F: Fetcher> Frontend<V, F> {
    pub fn new(vm: V, fetcher: F, catalog: Catalog, config: &Config) -> Result<Self> {
        config.validate()?;
        let renderer = FrameRenderer::new(config.resolution(), config.foreground()?);
        let tone = match config.sound {
            true => ToneGate::new(Box::new(SimpleBeep::new())),
            false => ToneGate::muted(),
        };
        Ok(Frontend {
            vm,
            scheduler: Scheduler::new(config.frame_rate),
            router: InputRouter::new(),
            loader: LoadCoordinator::new(catalog, fetcher),
            screen: Screen::new(renderer),
            tone,
        })
    }

    /// swap in another sound device
    pub fn with_tone(mut self, tone: ToneGate) -> Self {
        self.tone = tone;
        self
    }

    /// load the first program in the catalog
    pub fn boot(&mut self) -> Result<Selection> {
        let selection = self.loader.select_program(0, &mut self.vm, &mut self.screen.status);
        self.selected(selection)
    }

    /// the VM was reset if a load started, so whatever tone it had is gone
    fn selected(&mut self, selection: Result<Selection>) -> Result<Selection> {
        if let Ok(Selection::Loading(_)) = selection {
            self.tone.update(false);
        }
        selection
    }

    /// called once per host refresh with a monotonic millisecond clock
    pub fn tick(&mut self, now: f64) -> Tick {
        if let Completion::Failed(index) = self.loader.poll(
            &mut self.vm,
            &mut self.scheduler,
            &mut self.router,
            &mut self.screen.status,
        ) {
            log::debug!("program {} left unloaded", index);
        }
        let tick = self.scheduler.tick(now, &mut self.vm, &mut self.screen);
        if tick == Tick::Executed {
            self.tone.update(self.vm.sound_active());
        }
        tick
    }

    pub fn handle(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::Key(KeyEdge::Down(key)) => {
                self.router.key_down(key, &mut self.vm);
            }
            HostEvent::Key(KeyEdge::Up(key)) => {
                self.router.key_up(key, &mut self.vm);
            }
            HostEvent::Halt => self.halt(),
            HostEvent::Resume => self.resume(),
            HostEvent::Step => self.step(),
            HostEvent::NextProgram => self.next_program(),
            HostEvent::PrevProgram => self.prev_program(),
            HostEvent::ToggleDebug => self.toggle_debug(),
            HostEvent::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub fn halt(&mut self) {
        self.scheduler.stop();
        self.tone.update(false);
    }

    pub fn resume(&mut self) {
        self.scheduler.start();
    }

    pub fn step(&mut self) {
        self.scheduler.step(&mut self.vm, &mut self.screen);
        self.tone.update(self.vm.sound_active());
    }

    pub fn next_program(&mut self) {
        let selection = self.loader.select_next(&mut self.vm, &mut self.screen.status);
        if let Err(e) = self.selected(selection) {
            log::error!("{}", e);
        }
    }

    pub fn prev_program(&mut self) {
        let selection = self.loader.select_prev(&mut self.vm, &mut self.screen.status);
        if let Err(e) = self.selected(selection) {
            log::error!("{}", e);
        }
    }

    pub fn toggle_debug(&mut self) {
        self.screen.status.toggle_debug();
        // show something straight away rather than on the next frame
        self.screen.status.update_debug(self.vm.debug_snapshot());
    }

    pub fn vm(&self) -> &V {
        &self.vm
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn current_program(&self) -> &ProgramDescriptor {
        self.loader.current_program()
    }
}

impl<V: Vm> Frontend<V, FileFetcher> {
    /// programs are read from `config.rom_dir`, listed by `config.catalog`
    pub fn from_config(vm: V, config: &Config) -> Result<Self> {
        let fetcher = FileFetcher::new(config.rom_dir());
        Frontend::new(vm, fetcher, config.catalog()?, config)
    }
}
