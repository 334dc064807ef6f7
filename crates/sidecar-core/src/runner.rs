//! [`CommandRunner`] backed by real OS processes.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::capability::CommandRunner;
use crate::context::RequestContext;
use crate::error::ExecError;

/// Spawns programs with `tokio::process`, killing them when the request scope
/// is cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        ctx: &RequestContext,
        program: &str,
        args: &[String],
    ) -> Result<Vec<u8>, ExecError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|source| ExecError::Wait {
                program: program.to_string(),
                source,
            })?,
            () = ctx.cancelled() => {
                debug!(program, "command canceled, killing child");
                return Err(ExecError::Canceled { program: program.to_string() });
            }
        };

        if !output.status.success() {
            return Err(ExecError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
