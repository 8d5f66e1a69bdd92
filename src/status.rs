use crate::keymap::KeyMapping;
use crate::vm::DebugSnapshot;

/// what the player sees next to the screen: the game label, its controls,
/// the last load error, and (when switched on) the registers
#[derive(Default)]
pub struct Status {
    label: String,
    controls: Vec<String>,
    error: Option<String>,
    debug_visible: bool,
    debug: Option<DebugSnapshot>,
}

impl Status {
    pub fn new() -> Self {
        Status::default()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, name: &str) {
        self.label = name.to_string();
    }

    pub fn controls(&self) -> &[String] {
        &self.controls
    }

    pub fn set_controls(&mut self, mappings: &[KeyMapping]) {
        self.controls = mappings.iter().map(|m| m.description.clone()).collect();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn debug_visible(&self) -> bool {
        self.debug_visible
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
    }

    pub fn debug(&self) -> Option<&DebugSnapshot> {
        self.debug.as_ref()
    }

    /// ignored while the debug panel is hidden
    pub fn update_debug(&mut self, snapshot: DebugSnapshot) {
        if self.debug_visible {
            self.debug = Some(snapshot);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.label.clone()];
        if let Some(e) = &self.error {
            lines.push(format!("error: {}", e));
        }
        lines.push(String::new());
        lines.extend(self.controls.iter().cloned());

        if let (true, Some(d)) = (self.debug_visible, &self.debug) {
            lines.push(String::new());
            lines.push(format!("PC: {}", d.program_counter));
            lines.push(format!("I: {}", d.i_register));
            lines.extend(
                d.v_registers
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!("V{}: {}", i, v)),
            );
        }
        lines
    }
}
