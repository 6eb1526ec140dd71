use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShellDiagnostics {
    pub phase: String,
    pub detail: String,
    pub embedded: bool,
    pub shell_booted: bool,
    pub open_tabs: usize,
    pub active_tab: Option<String>,
    pub frame_messages_accepted: u64,
    pub frame_messages_rejected: u64,
    pub bridge_messages_posted: u64,
    pub last_error: Option<String>,
}

impl ShellDiagnostics {
    pub fn set_phase(&mut self, phase: &str, detail: &str) {
        self.phase = phase.to_string();
        self.detail = detail.to_string();
        if phase != "error" {
            self.last_error = None;
        }
    }

    pub fn set_error(&mut self, message: &str) {
        self.phase = "error".to_string();
        self.last_error = Some(message.to_string());
    }

    pub fn record_tabs(&mut self, open_tabs: usize, active_tab: Option<&str>) {
        self.open_tabs = open_tabs;
        self.active_tab = active_tab.map(ToString::to_string);
    }

    pub fn record_frame_message(&mut self, accepted: bool) {
        if accepted {
            self.frame_messages_accepted += 1;
        } else {
            self.frame_messages_rejected += 1;
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| "{\"phase\":\"error\",\"detail\":\"diagnostics unavailable\"}".to_string())
    }
}
