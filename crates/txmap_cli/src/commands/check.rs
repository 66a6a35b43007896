//! Check command implementation.

use crate::script::Script;
use std::path::Path;

/// Runs the check command: parses the script without executing it.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let script = Script::load(path)?;
    println!("{}", summarize(&script));
    Ok(())
}

/// Describes a parsed script in one line.
pub fn summarize(script: &Script) -> String {
    let sessions = script.sessions();
    format!(
        "ok: {} steps, {} sessions ({})",
        script.steps.len(),
        sessions.len(),
        sessions.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn summarizes_valid_script() {
        let script = Script::parse("alice begin\nbob len\nalice commit\n").unwrap();
        assert_eq!(summarize(&script), "ok: 3 steps, 2 sessions (alice, bob)");
    }

    #[test]
    fn check_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "alice put k v").unwrap();

        assert!(run(file.path()).is_ok());
    }

    #[test]
    fn check_reports_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alice begin").unwrap();
        writeln!(file, "alice put k").unwrap();

        let err = run(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }
}
