//! Platform CLI command execution.

use crate::error::{TopologyError, TopologyResult};
use colored::Colorize;
use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;

/// Largest stdout accepted from a single command.
const MAX_OUTPUT_BYTES: usize = 500_000;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|"([^"]*)"\s*|([^'\s]+)\s*"#).expect("Invalid Regex")
    })
}

/// Run a command line and return its stdout.
///
/// The command string is split on spaces, with quoted substrings kept whole.
pub fn run(cmd: &str) -> TopologyResult<String> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let cmds = split_and_strip(cmd);
    log::trace!("split cmds={:?}", cmds);
    let (program, args) = cmds
        .split_first()
        .ok_or_else(|| TopologyError::Command("empty command".to_string()))?;

    let output = Command::new(program).args(args).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        TopologyError::Command(format!("failed to execute {program}: {e}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!(
            "{failed} to run {cmd} code={code:?}",
            failed = "failed".on_red(),
            cmd = cmd.on_blue(),
            code = output.status.code()
        );
        return Err(TopologyError::Command(stderr.trim().to_string()));
    }

    if output.stdout.len() > MAX_OUTPUT_BYTES {
        return Err(TopologyError::Command(format!(
            "response too large: {} bytes for command: {:?}",
            output.stdout.len(),
            cmds
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| TopologyError::Command(format!("invalid UTF-8 output: {e}")))
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .captures_iter(input)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str())
        .collect()
}
