use crate::error::{Error, Result};
use beep::beep;

pub trait Sound {
    fn beep(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// PC speaker beeper
pub struct SimpleBeep;

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<()> {
        beep(SIMPLEBEEP_PITCH).map_err(|e| Error::Sound(e.to_string()))
    }

    fn stop(&mut self) -> Result<()> {
        beep(0).map_err(|e| Error::Sound(e.to_string()))
    }
}

pub struct Mute;

impl Sound for Mute {
    fn beep(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// follows the VM's tone flag and only bothers the device on a change
pub struct ToneGate {
    device: Box<dyn Sound>,
    sounding: bool,
}

impl ToneGate {
    pub fn new(device: Box<dyn Sound>) -> Self {
        ToneGate {
            device,
            sounding: false,
        }
    }

    pub fn muted() -> Self {
        ToneGate::new(Box::new(Mute))
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub fn update(&mut self, active: bool) {
        if active == self.sounding {
            return;
        }
        let result = match active {
            true => self.device.beep(),
            false => self.device.stop(),
        };
        if let Err(e) = result {
            log::warn!("{}", e);
        }
        self.sounding = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// logs what it was asked to do
    struct Recorder(Rc<RefCell<Vec<&'static str>>>, bool);

    impl Sound for Recorder {
        fn beep(&mut self) -> Result<()> {
            self.0.borrow_mut().push("beep");
            match self.1 {
                true => Err(Error::Sound("no console".into())),
                false => Ok(()),
            }
        }

        fn stop(&mut self) -> Result<()> {
            self.0.borrow_mut().push("stop");
            Ok(())
        }
    }

    #[test]
    fn test_edges_only() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut gate = ToneGate::new(Box::new(Recorder(log.clone(), false)));
        for active in [false, true, true, true, false, false, true] {
            gate.update(active);
        }
        assert_eq!(*log.borrow(), ["beep", "stop", "beep"]);
        assert!(gate.is_sounding());
    }

    #[test]
    fn test_device_error_not_fatal() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut gate = ToneGate::new(Box::new(Recorder(log.clone(), true)));
        gate.update(true);
        gate.update(false);
        assert_eq!(*log.borrow(), ["beep", "stop"]);
    }
}
