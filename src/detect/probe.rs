//! Candidate-executable validation.
//!
//! A candidate may be a saved path, an environment hint, a bare name or a
//! conventional install location. Validation runs it with the tool's
//! version argument and accepts it only if it produces output on either
//! stream; the exit code is deliberately ignored because some builds of
//! wkhtmltopdf report their version on stderr and exit non-zero.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::tool::ToolKind;

/// A validated external executable. Created only by [`validate`]; the
/// caller either displays it or persists its path into the settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredExecutable {
    /// Where the tool was found. Absolute unless a bare name ran on the
    /// search path but could not be resolved afterwards.
    pub path: PathBuf,
    /// First non-empty line of the tool's version output.
    pub version: String,
}

impl std::fmt::Display for DiscoveredExecutable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.version, self.path.display())
    }
}

/// Validate a candidate path or bare name as a runnable instance of `tool`.
///
/// A directory candidate is joined with the platform executable name. An
/// absolute candidate that does not exist on disk is rejected without
/// spawning anything; bare and relative names are handed straight to the
/// OS so its own search-path lookup applies.
///
/// Returns `None` on every failure, including cancellation — nothing
/// propagates past this boundary. The locator consults the token itself
/// to tell a cancelled probe apart from a failed one.
pub async fn validate(
    tool: ToolKind,
    candidate: &str,
    cancel: &CancellationToken,
) -> Option<DiscoveredExecutable> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let mut target = PathBuf::from(candidate);
    if target.is_dir() {
        target = target.join(tool.executable_name());
    }

    // Fast reject: a rooted path that is not there can never launch, so
    // skip the spawn. Bare names are never existence-checked on disk.
    if target.is_absolute() && !target.is_file() {
        debug!(tool = %tool, path = %target.display(), "Candidate does not exist");
        return None;
    }

    let version = query_version(tool, &target, cancel).await?;

    let path = if target.is_absolute() {
        target
    } else {
        // Resolve the bare name to its on-disk location; keep the original
        // candidate if the lookup fails.
        which::which(&target).unwrap_or(target)
    };

    debug!(tool = %tool, path = %path.display(), %version, "Validated executable");
    Some(DiscoveredExecutable { path, version })
}

/// Run `target <version-arg>` with both streams captured and return the
/// first non-empty line of stdout, or failing that of stderr.
async fn query_version(
    tool: ToolKind,
    target: &Path,
    cancel: &CancellationToken,
) -> Option<String> {
    let mut cmd = Command::new(target);
    cmd.arg(tool.version_arg())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::select! {
        output = cmd.output() => output,
        () = cancel.cancelled() => {
            // Dropping the output future reaps the child via kill_on_drop.
            debug!(tool = %tool, path = %target.display(), "Version query cancelled");
            return None;
        }
    };

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            debug!(tool = %tool, path = %target.display(), %err, "Failed to launch candidate");
            return None;
        }
    };

    first_line(&output.stdout).or_else(|| first_line(&output.stderr))
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
