//! Run command implementation.

use crate::error::{CliError, CliResult};
use crate::script::{Command, Script, Step};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use txmap_core::{MapConfig, MapError, StatsSnapshot, Transaction, TransactionalMap};

type Map = TransactionalMap<String, String>;

/// Outcome of one script step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    /// Source line.
    pub line: usize,
    /// Session that issued the step.
    pub session: String,
    /// The command as written.
    pub command: String,
    /// Whether the session owned the active transaction when the step ran.
    pub owner: bool,
    /// Rendered result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of running a whole script.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Per-step outcomes.
    pub steps: Vec<StepReport>,
    /// Sessions whose transactions were still open when the script ended
    /// (they are aborted).
    pub unfinished: Vec<String>,
    /// Committed entries after the script.
    pub committed: BTreeMap<String, String>,
    /// Operation counters, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsSnapshot>,
}

impl RunReport {
    /// Returns the number of failed steps.
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Executes script steps against one map, tracking which session owns the
/// active transaction.
pub struct Runner {
    map: Map,
    sessions: BTreeMap<String, Transaction<String, String>>,
}

impl Runner {
    /// Creates a runner over an empty map.
    pub fn new() -> Self {
        Self {
            map: TransactionalMap::with_config(MapConfig::new().name("script")),
            sessions: BTreeMap::new(),
        }
    }

    /// Executes one step. Map errors are reported, never propagated.
    pub fn execute(&mut self, step: &Step) -> StepReport {
        let owner = self.sessions.contains_key(&step.session);
        debug!(line = step.line, session = %step.session, command = %step.command, owner, "executing step");

        let outcome = if owner {
            self.as_owner(&step.session, &step.command)
        } else {
            self.as_caller(&step.session, &step.command)
        };

        let (result, error) = match outcome {
            Ok(rendered) => (Some(rendered), None),
            Err(err) => (None, Some(err.to_string())),
        };
        StepReport {
            line: step.line,
            session: step.session.clone(),
            command: step.command.to_string(),
            owner,
            result,
            error,
        }
    }

    fn as_owner(&mut self, session: &str, command: &Command) -> Result<String, MapError> {
        let Self { map, sessions } = self;
        let txn = sessions
            .get_mut(session)
            .ok_or(MapError::NoActiveTransaction)?;

        let rendered = match command {
            // Transactions don't nest: this reports the conflict.
            Command::Begin => map.begin_transaction().map(|t| t.id().to_string()),
            Command::Commit => txn.commit().map(|summary| {
                format!(
                    "committed {} (cleared: {}, removed: {}, upserted: {})",
                    txn.id(),
                    summary.cleared,
                    summary.removed,
                    summary.upserted
                )
            }),
            Command::Abort => txn.abort().map(|()| format!("aborted {}", txn.id())),
            Command::Get(key) => txn.get(key.as_str()).map(render_value),
            Command::Put(key, value) => txn.put(key.clone(), value.clone()).map(render_value),
            Command::Remove(key) => txn.remove(key.as_str()).map(render_value),
            Command::Contains(key) => txn.contains_key(key.as_str()).map(|b| b.to_string()),
            Command::Len => txn.len().map(|n| n.to_string()),
            Command::Clear => txn.clear().map(|()| "ok".to_string()),
            Command::Keys => txn.entries().map(|view| render_keys(view.keys())),
            Command::Dump => txn.entries().map(|view| render_entries(view.iter())),
        };

        if !txn.is_active() {
            sessions.remove(session);
        }
        rendered
    }

    fn as_caller(&mut self, session: &str, command: &Command) -> Result<String, MapError> {
        match command {
            Command::Begin => {
                let txn = self.map.begin_transaction()?;
                let id = txn.id();
                self.sessions.insert(session.to_string(), txn);
                Ok(format!("began {id}"))
            }
            Command::Commit | Command::Abort => Err(MapError::NoActiveTransaction),
            Command::Get(key) => Ok(render_value(self.map.get(key.as_str()))),
            Command::Put(key, value) => self.map.put(key.clone(), value.clone()).map(render_value),
            Command::Remove(key) => self.map.remove(key.as_str()).map(render_value),
            Command::Contains(key) => Ok(self.map.contains_key(key.as_str()).to_string()),
            Command::Len => Ok(self.map.len().to_string()),
            Command::Clear => self.map.clear().map(|()| "ok".to_string()),
            Command::Keys => Ok(render_keys(self.map.entries().keys())),
            Command::Dump => Ok(render_entries(self.map.entries().iter())),
        }
    }

    /// Aborts every open transaction and returns the owning sessions.
    pub fn finish(&mut self) -> Vec<String> {
        let open: Vec<String> = self.sessions.keys().cloned().collect();
        for (session, mut txn) in std::mem::take(&mut self.sessions) {
            if txn.abort().is_ok() {
                info!(session = %session, txn = %txn.id(), "aborted transaction left open by script");
            }
        }
        open
    }

    /// Returns the map.
    pub fn map(&self) -> &Map {
        &self.map
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

fn render_value(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(none)".to_string())
}

fn render_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    let keys: Vec<&str> = keys.map(String::as_str).collect();
    format!("[{}]", keys.join(", "))
}

fn render_entries<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    let pairs: Vec<String> = entries.map(|(k, v)| format!("{k}={v}")).collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Runs every step of `script` and builds the report.
pub fn execute_script(script: &Script, with_stats: bool) -> RunReport {
    let mut runner = Runner::new();
    let steps = script.steps.iter().map(|step| runner.execute(step)).collect();
    let unfinished = runner.finish();

    RunReport {
        steps,
        unfinished,
        committed: runner.map().snapshot(),
        stats: with_stats.then(|| runner.map().stats()),
    }
}

/// Runs the run command.
pub fn run(path: &Path, format: &str, show_stats: bool) -> Result<(), Box<dyn std::error::Error>> {
    let script = Script::load(path)?;
    let report = execute_script(&script, show_stats);
    println!("{}", render(&report, format)?);
    Ok(())
}

/// Renders a report in the requested format.
pub fn render(report: &RunReport, format: &str) -> CliResult<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(report)?),
        "text" => Ok(render_text(report)),
        other => Err(CliError::Format(other.to_string())),
    }
}

fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        let marker = if step.owner { "*" } else { " " };
        let outcome = match (&step.result, &step.error) {
            (_, Some(error)) => format!("error: {error}"),
            (Some(result), None) => result.clone(),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "{:>4} {marker}{:<10} {:<24} -> {outcome}\n",
            step.line, step.session, step.command
        ));
    }

    if !report.unfinished.is_empty() {
        out.push_str(&format!("\nAborted at end of script: {}\n", report.unfinished.join(", ")));
    }

    out.push_str(&format!("\nCommitted ({} entries):\n", report.committed.len()));
    for (key, value) in &report.committed {
        out.push_str(&format!("  {key} = {value}\n"));
    }

    if let Some(stats) = &report.stats {
        out.push_str("\nStatistics:\n");
        out.push_str(&format!("  Reads:          {}\n", stats.reads));
        out.push_str(&format!("  Writes:         {}\n", stats.writes));
        out.push_str(&format!("  Deletes:        {}\n", stats.deletes));
        out.push_str(&format!("  Clears:         {}\n", stats.clears));
        out.push_str(&format!("  Scans:          {}\n", stats.scans));
        out.push_str(&format!(
            "  Transactions:   {} started, {} committed, {} aborted\n",
            stats.transactions_started, stats.transactions_committed, stats.transactions_aborted
        ));
        out.push_str(&format!("  Conflicts:      {}\n", stats.conflicts));
        out.push_str(&format!("  Rejected writes: {}\n", stats.rejected_writes));
    }

    out.push_str(&format!(
        "\n{} steps, {} failed\n",
        report.steps.len(),
        report.failures()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_source(source: &str) -> RunReport {
        execute_script(&Script::parse(source).unwrap(), true)
    }

    #[test]
    fn owner_and_caller_see_different_states() {
        let report = run_source(
            "alice begin\n\
             alice put color blue\n\
             bob get color\n\
             bob put color red\n\
             alice get color\n\
             alice commit\n\
             bob get color\n",
        );

        let results: Vec<_> = report
            .steps
            .iter()
            .map(|s| s.result.clone().or_else(|| s.error.clone()).unwrap())
            .collect();
        assert!(results[0].starts_with("began txn:"));
        assert_eq!(results[1], "(none)");
        assert_eq!(results[2], "(none)");
        assert!(results[3].starts_with("write rejected"));
        assert_eq!(results[4], "blue");
        assert!(results[5].starts_with("committed txn:"));
        assert_eq!(results[6], "blue");

        assert!(!report.steps[2].owner);
        assert!(report.steps[4].owner);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.committed.get("color").map(String::as_str), Some("blue"));
    }

    #[test]
    fn conflicts_and_misuse_are_reported() {
        let report = run_source(
            "alice begin\n\
             bob begin\n\
             alice begin\n\
             bob commit\n\
             alice abort\n\
             alice abort\n",
        );

        let errors: Vec<_> = report.steps.iter().map(|s| s.error.clone()).collect();
        assert_eq!(errors[0], None);
        assert!(errors[1].as_deref().unwrap().contains("transaction conflict"));
        assert!(errors[2].as_deref().unwrap().contains("transaction conflict"));
        assert_eq!(errors[3].as_deref(), Some("no active transaction"));
        assert_eq!(errors[4], None);
        assert_eq!(errors[5].as_deref(), Some("no active transaction"));
    }

    #[test]
    fn open_transactions_are_aborted_at_end() {
        let report = run_source(
            "setup put a 1\n\
             alice begin\n\
             alice clear\n\
             alice put b 2\n\
             alice dump\n",
        );

        assert_eq!(report.steps[4].result.as_deref(), Some("{b=2}"));
        assert_eq!(report.unfinished, vec!["alice".to_string()]);
        assert_eq!(report.committed.len(), 1);
        assert_eq!(report.committed.get("a").map(String::as_str), Some("1"));
        assert_eq!(report.stats.as_ref().map(|s| s.transactions_aborted), Some(1));
    }

    #[test]
    fn keys_and_len_for_callers() {
        let report = run_source(
            "bob put x 1\n\
             bob put y 2\n\
             bob keys\n\
             bob len\n\
             bob remove x\n\
             bob contains x\n",
        );

        assert_eq!(report.steps[2].result.as_deref(), Some("[x, y]"));
        assert_eq!(report.steps[3].result.as_deref(), Some("2"));
        assert_eq!(report.steps[4].result.as_deref(), Some("1"));
        assert_eq!(report.steps[5].result.as_deref(), Some("false"));
    }

    #[test]
    fn json_and_text_rendering() {
        let report = run_source("alice begin\nalice put k v\nalice commit\n");

        let json = render(&report, "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["committed"]["k"], "v");
        assert_eq!(value["steps"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["stats"]["transactions_committed"], 1);

        let text = render(&report, "text").unwrap();
        assert!(text.contains("Committed (1 entries)"));
        assert!(text.contains("3 steps, 0 failed"));

        assert!(matches!(render(&report, "yaml"), Err(CliError::Format(_))));
    }
}
