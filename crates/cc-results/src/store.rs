//! Run storage API.
//!
//! One directory per run id:
//! - `manifest.json`
//! - `summary.json`
//! - `trace.jsonl`, one tick record per line

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};
use cc_sim::{RunSummary, TickRecord};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store kept next to a scenario file, under `.ccsim/runs`.
    pub fn for_scenario_file(scenario_path: &Path) -> ResultsResult<Self> {
        let dir = scenario_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "scenario path has no parent directory".to_string(),
            })?;
        Self::new(dir.join(".ccsim").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        let dir = self.run_dir(run_id);
        dir.join("manifest.json").exists() && dir.join("summary.json").exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[TickRecord],
        summary: &RunSummary,
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let mut trace = String::new();
        for record in records {
            trace.push_str(&serde_json::to_string(record)?);
            trace.push('\n');
        }
        fs::write(run_dir.join("trace.jsonl"), trace)?;
        fs::write(
            run_dir.join("summary.json"),
            serde_json::to_string_pretty(summary)?,
        )?;
        // Written last: its presence marks a complete run.
        fs::write(
            run_dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;
        Ok(())
    }

    fn read_file(&self, run_id: &str, name: &str) -> ResultsResult<String> {
        let path = self.run_dir(run_id).join(name);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let content = self.read_file(run_id, "manifest.json")?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_summary(&self, run_id: &str) -> ResultsResult<RunSummary> {
        let content = self.read_file(run_id, "summary.json")?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_trace(&self, run_id: &str) -> ResultsResult<Vec<TickRecord>> {
        let content = self.read_file(run_id, "trace.jsonl")?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ResultsError::from))
            .collect()
    }

    /// Stored runs, oldest first, optionally restricted to one scenario.
    pub fn list_runs(&self, scenario: Option<&str>) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&run_id)
                && scenario.is_none_or(|name| manifest.scenario == name)
            {
                runs.push(manifest);
            }
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
