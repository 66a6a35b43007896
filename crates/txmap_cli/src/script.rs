//! Script parsing.
//!
//! A script is a list of lines of the form `<session> <op> [args]`. Blank
//! lines and lines starting with `#` are ignored. Sessions are arbitrary
//! names; each names one caller of the map.
//!
//! ```text
//! # alice stages a change, bob cannot see or overwrite it
//! alice begin
//! alice put color blue
//! bob   get color
//! bob   put color red
//! alice commit
//! bob   get color
//! ```

use crate::error::{CliError, CliResult};
use std::fmt;
use std::path::Path;

/// One operation a session can perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a transaction owned by the session.
    Begin,
    /// Commit the session's transaction.
    Commit,
    /// Abort the session's transaction.
    Abort,
    /// Read a key.
    Get(String),
    /// Write a key.
    Put(String, String),
    /// Remove a key.
    Remove(String),
    /// Check a key.
    Contains(String),
    /// Count the visible entries.
    Len,
    /// Remove every visible entry.
    Clear,
    /// List the visible keys.
    Keys,
    /// List the visible entries.
    Dump,
}

impl Command {
    /// Returns the op name as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Abort => "abort",
            Self::Get(_) => "get",
            Self::Put(..) => "put",
            Self::Remove(_) => "remove",
            Self::Contains(_) => "contains",
            Self::Len => "len",
            Self::Clear => "clear",
            Self::Keys => "keys",
            Self::Dump => "dump",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get(key) | Self::Remove(key) | Self::Contains(key) => {
                write!(f, "{} {key}", self.name())
            }
            Self::Put(key, value) => write!(f, "put {key} {value}"),
            _ => f.write_str(self.name()),
        }
    }
}

/// A parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-based source line.
    pub line: usize,
    /// Session issuing the command.
    pub session: String,
    /// The command.
    pub command: Command,
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    /// Steps in source order.
    pub steps: Vec<Step>,
}

impl Script {
    /// Reads and parses a script file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    /// Parses script source, stopping at the first malformed line.
    pub fn parse(source: &str) -> CliResult<Self> {
        let mut steps = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            steps.push(parse_line(line, text)?);
        }
        Ok(Self { steps })
    }

    /// Returns the distinct session names, in order of first appearance.
    pub fn sessions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !seen.contains(&step.session.as_str()) {
                seen.push(&step.session);
            }
        }
        seen
    }
}

fn parse_line(line: usize, text: &str) -> CliResult<Step> {
    let mut tokens = text.split_whitespace();
    let session = tokens
        .next()
        .ok_or_else(|| CliError::parse(line, "missing session"))?
        .to_string();
    let op = tokens
        .next()
        .ok_or_else(|| CliError::parse(line, format!("missing op after session `{session}`")))?;
    let args: Vec<&str> = tokens.collect();

    let expect = |count: usize| -> CliResult<()> {
        if args.len() == count {
            Ok(())
        } else {
            Err(CliError::parse(
                line,
                format!("`{op}` takes {count} argument(s), got {}", args.len()),
            ))
        }
    };

    let command = match op {
        "begin" => expect(0).map(|()| Command::Begin)?,
        "commit" => expect(0).map(|()| Command::Commit)?,
        "abort" => expect(0).map(|()| Command::Abort)?,
        "len" => expect(0).map(|()| Command::Len)?,
        "clear" => expect(0).map(|()| Command::Clear)?,
        "keys" => expect(0).map(|()| Command::Keys)?,
        "dump" => expect(0).map(|()| Command::Dump)?,
        "get" => expect(1).map(|()| Command::Get(args[0].to_string()))?,
        "remove" => expect(1).map(|()| Command::Remove(args[0].to_string()))?,
        "contains" => expect(1).map(|()| Command::Contains(args[0].to_string()))?,
        "put" => expect(2).map(|()| Command::Put(args[0].to_string(), args[1].to_string()))?,
        other => return Err(CliError::parse(line, format!("unknown op `{other}`"))),
    };

    Ok(Step {
        line,
        session,
        command,
    })
}
