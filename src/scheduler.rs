//! # scheduler
//!
//! The host calls `tick` once per refresh, at whatever rate it manages. The
//! VM wants a steady 60 logical frames a second. So:
//!
//!  * remember `then`, the reference time of the last executed frame
//!  * once `now - then` exceeds the interval, run one cycle and move `then`
//!    up to `now - (delta % interval)`
//!
//! keeping the remainder means `then` advances by whole intervals and the
//! frame count can't drift from wall clock time, as long as the host calls
//! more often than the logical rate. a slower host still gets one cycle per
//! tick at most, so it drops frames but keeps phase.

use crate::vm::Vm;

pub const DEFAULT_FRAME_RATE: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// what a tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// not enough time has gone by
    Waiting,
    /// a frame was due but the scheduler is stopped
    Skipped,
    Executed,
}

/// gets told after every executed cycle or step
pub trait View {
    fn refresh(&mut self, vm: &dyn Vm);
}

pub struct Scheduler {
    state: SchedulerState,
    interval: f64,
    then: Option<f64>,
    cycles: u64,
    steps: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(DEFAULT_FRAME_RATE)
    }
}

impl Scheduler {
    /// starts out stopped; `frame_rate` is validated by the config
    pub fn new(frame_rate: f64) -> Self {
        Scheduler {
            state: SchedulerState::Stopped,
            interval: 1000.0 / frame_rate,
            then: None,
            cycles: 0,
            steps: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// milliseconds per logical frame
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// cycles executed by `tick` so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// instructions executed by `step` so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn start(&mut self) {
        if self.state != SchedulerState::Running {
            log::debug!("scheduler running");
        }
        self.state = SchedulerState::Running;
    }

    /// NB. the carry is kept, so resuming doesn't bunch frames up
    pub fn stop(&mut self) {
        if self.state != SchedulerState::Stopped {
            log::debug!("scheduler stopped");
        }
        self.state = SchedulerState::Stopped;
    }

    pub fn tick(&mut self, now: f64, vm: &mut dyn Vm, view: &mut dyn View) -> Tick {
        let then = *self.then.get_or_insert(now);
        let delta = now - then;
        if delta <= self.interval {
            return Tick::Waiting;
        }
        // timing moves on before the VM runs, so a faulting cycle can't
        // upset it
        self.then = Some(now - (delta % self.interval));

        if self.state == SchedulerState::Stopped {
            return Tick::Skipped;
        }
        if let Err(e) = vm.execute_cycle() {
            log::warn!("cycle {} failed: {}", self.cycles, e);
        }
        self.cycles += 1;
        view.refresh(vm);
        Tick::Executed
    }

    /// one instruction and one refresh, running or not
    pub fn step(&mut self, vm: &mut dyn Vm, view: &mut dyn View) {
        if let Err(e) = vm.execute_next_op_code() {
            log::warn!("step failed: {}", e);
        }
        self.steps += 1;
        view.refresh(vm);
    }
}
