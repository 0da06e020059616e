//! Scenario report records.
//!
//! The scenario runner collects one [`ScenarioResult`] per check and writes
//! the whole [`ScenarioReport`] as JSON for CI to archive.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { reason: String },
    Skipped,
}

impl Outcome {
    pub fn icon(&self) -> &'static str {
        match self {
            Outcome::Passed => "✓",
            Outcome::Failed { .. } => "✗",
            Outcome::Skipped => "○",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Short id, e.g. "FUEL-001".
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration: Duration,
    /// Simulation ticks the scenario ran for.
    pub ticks: u32,
}

impl ScenarioResult {
    /// A skipped result; [`finish`](Self::finish) records the real outcome.
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            description: String::new(),
            outcome: Outcome::Skipped,
            duration: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Records a run that returned the number of ticks simulated or a failure reason.
    pub fn finish(mut self, duration: Duration, result: Result<u32, String>) -> Self {
        self.duration = duration;
        match result {
            Ok(ticks) => {
                self.ticks = ticks;
                self.outcome = Outcome::Passed;
            }
            Err(reason) => self.outcome = Outcome::Failed { reason },
        }
        self
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

/// Outcome counts over a set of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }

    /// Percentage of all results that passed.
    pub fn pass_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => f64::from(self.passed) * 100.0 / f64::from(total),
        }
    }

    fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    /// Seed used by randomized scenarios, so a failure can be replayed.
    pub seed: u64,
    pub results: Vec<ScenarioResult>,
}

impl ScenarioReport {
    pub fn new(title: &str, seed: u64) -> Self {
        Self {
            title: title.to_string(),
            generated_at: Utc::now(),
            seed,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for result in &self.results {
            tally.count(&result.outcome);
        }
        tally
    }

    pub fn tally_by_category(&self) -> BTreeMap<&str, Tally> {
        let mut by_category: BTreeMap<&str, Tally> = BTreeMap::new();
        for result in &self.results {
            by_category
                .entry(result.category.as_str())
                .or_default()
                .count(&result.outcome);
        }
        by_category
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| r.failed())
    }

    /// Skipped results do not count as failures.
    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize report")?;
        std::fs::write(path, json).with_context(|| format!("write report {}", path.display()))
    }
}
