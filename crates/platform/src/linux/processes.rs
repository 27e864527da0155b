use sysinfo::{ProcessesToUpdate, System};

/// Detects running processes that should force the performance profile.
pub struct ForceProcessDetector {
    names: Vec<String>,
    system: System,
}

impl ForceProcessDetector {
    pub fn new(names: &[String]) -> Self {
        Self {
            names: names
                .iter()
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
            system: System::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.names.is_empty()
    }

    /// Returns true when any configured process name is running.
    pub fn detect(&mut self) -> bool {
        if self.names.is_empty() {
            return false;
        }

        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.system
            .processes()
            .values()
            .any(|process| self.matches(&process.name().to_string_lossy()))
    }

    fn matches(&self, process_name: &str) -> bool {
        let process_name = process_name.to_lowercase();
        self.names.iter().any(|name| *name == process_name)
    }
}
