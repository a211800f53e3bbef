//! Per-tick persistence of agent state for later inspection.

use mimic_core::{Action, AgentSnapshot, Observation, Persona, Result, Tick};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one snapshot, memory dump and raw page per tick under a run directory.
///
/// Layout:
/// - `persona.txt`, `intent.txt`
/// - `agent_{tick}.json`, `memory_trace_{tick}.txt`, `page_{tick}.html`
/// - `action_trace.txt`, one line per tick
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    dir: PathBuf,
}

impl TraceRecorder {
    /// Create the directory and write the persona files.
    pub fn create(dir: impl Into<PathBuf>, persona: &Persona) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("persona.txt"), serde_json::to_string_pretty(persona)?)?;
        fs::write(dir.join("intent.txt"), &persona.intent)?;
        debug!(dir = %dir.display(), "trace recorder ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_tick(
        &self,
        tick: Tick,
        snapshot: &AgentSnapshot,
        memory_trace: &str,
        observation: &Observation,
        action: &Action,
    ) -> Result<()> {
        fs::write(
            self.dir.join(format!("agent_{tick}.json")),
            serde_json::to_string_pretty(snapshot)?,
        )?;
        fs::write(self.dir.join(format!("memory_trace_{tick}.txt")), memory_trace)?;
        fs::write(self.dir.join(format!("page_{tick}.html")), &observation.page_content)?;

        let mut trace = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("action_trace.txt"))?;
        writeln!(trace, "{tick}: {}", serde_json::to_string(action)?)?;
        Ok(())
    }
}
