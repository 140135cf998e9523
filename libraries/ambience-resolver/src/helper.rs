//! External helper process resolver
//!
//! Invokes `<program> -f <format> --get-url <locator>` and reads the stream
//! URI from its standard output.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::Resolver;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolver backed by an external helper such as `yt-dlp`
#[derive(Debug, Clone, Default)]
pub struct HelperResolver {
    config: ResolverConfig,
}

impl HelperResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    fn command(&self, locator: &str) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(self.config.resolve_args(locator))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the resolve future must never leave the helper running
            .kill_on_drop(true);
        // Own process group, so anything the helper forks can be killed with it
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

#[async_trait]
impl Resolver for HelperResolver {
    async fn resolve(&self, locator: &str, cancel: CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let program = self.config.program.display().to_string();
        debug!("Resolving {} with {}", locator, program);

        let mut child = self.command(locator).spawn().map_err(|e| {
            warn!("Failed to launch {}: {}", program, e);
            ResolveError::failed(format!("failed to launch {}: {}", program, e))
        })?;

        // Gone from `child` once it has been reaped
        let pid = child.id();
        let mut stdout = collect(child.stdout.take());
        let mut stderr = collect(child.stderr.take());

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        // Exit alone is not completion: a forked descendant can keep the pipes open
        let (status, stdout_bytes, stderr_bytes) = tokio::select! {
            outcome = async { tokio::join!(child.wait(), &mut stdout, &mut stderr) } => outcome,
            () = cancel.cancelled() => {
                terminate(&mut child, pid, &program).await;
                stdout.abort();
                stderr.abort();
                debug!("Resolution of {} cancelled", locator);
                return Err(ResolveError::Cancelled);
            }
            () = deadline => {
                terminate(&mut child, pid, &program).await;
                stdout.abort();
                stderr.abort();
                warn!("{} did not finish within {:?}", program, timeout);
                return Err(ResolveError::failed(format!(
                    "{} timed out after {:?}",
                    program, timeout
                )));
            }
        };

        let status = status
            .map_err(|e| ResolveError::failed(format!("waiting for {} failed: {}", program, e)))?;
        let stdout = decode(stdout_bytes, "stdout")?;
        let stderr = decode(stderr_bytes, "stderr")?;

        if !status.success() {
            warn!("{} exited with {}: {}", program, status, stderr.trim());
            return Err(ResolveError::failed(stderr.trim()));
        }

        let uri = stdout.trim();
        if uri.is_empty() {
            warn!("{} succeeded without printing a URI", program);
            return Err(ResolveError::failed(format!(
                "{} produced no output{}",
                program,
                if stderr.trim().is_empty() {
                    String::new()
                } else {
                    format!(": {}", stderr.trim())
                }
            )));
        }

        info!("Resolved {}", locator);
        Ok(uri.to_string())
    }

    async fn check_available(&self) -> bool {
        let status = Command::new(&self.config.locate_program)
            .arg(&self.config.program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) => {
                debug!(
                    "{} {} -> {}",
                    self.config.locate_program.display(),
                    self.config.program.display(),
                    status
                );
                status.success()
            }
            Err(e) => {
                warn!(
                    "Could not run {}: {}",
                    self.config.locate_program.display(),
                    e
                );
                false
            }
        }
    }
}

/// Drain a child pipe on its own task so a full pipe never stalls the child
fn collect<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

fn decode(
    joined: std::result::Result<std::io::Result<Vec<u8>>, tokio::task::JoinError>,
    stream: &str,
) -> Result<String> {
    let bytes = joined
        .map_err(|e| ResolveError::failed(format!("reading {} failed: {}", stream, e)))?
        .map_err(|e| ResolveError::failed(format!("reading {} failed: {}", stream, e)))?;

    String::from_utf8(bytes)
        .map_err(|e| ResolveError::failed(format!("{} is not valid UTF-8: {}", stream, e)))
}

async fn terminate(child: &mut Child, pid: Option<u32>, program: &str) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        kill_group(pid, program).await;
    }
    #[cfg(not(unix))]
    let _ = pid;

    // Also reaps the child; fails harmlessly if it already exited
    if let Err(e) = child.kill().await {
        debug!("{} already gone: {}", program, e);
    }
}

/// SIGKILL every process in the helper's group
#[cfg(unix)]
async fn kill_group(pgid: u32, program: &str) {
    let group = format!("-{pgid}");
    let status = Command::new("kill")
        .args(["-s", "KILL", "--", group.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => debug!("Killed process group of {}", program),
        Ok(status) => debug!("kill for {} process group exited with {}", program, status),
        Err(e) => warn!("Failed to kill process group of {}: {}", program, e),
    }
}
