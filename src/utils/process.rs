use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Run `program` with `input` on stdin and return its stdout.
pub async fn pipe_through(
    program: &str,
    args: &[&str],
    input: &[u8],
) -> Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    let mut stdin = child.stdin.take().context("stdin is not piped")?;
    let input = input.to_vec();
    // Written concurrently so a full stdout pipe can't block the child.
    let writer = tokio::spawn(async move {
        stdin.write_all(&input).await?;
        stdin.shutdown().await
    });

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("failed to wait for {program}"))?;

    if let Err(e) = writer.await? {
        log::debug!("{program} closed stdin early: {e}");
    }

    if !output.status.success() {
        bail!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output.stdout)
}
