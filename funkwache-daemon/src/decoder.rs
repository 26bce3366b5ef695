//! Decoder subprocess chain -- rtl_fm piped into multimon-ng.
//!
//! The daemon does not demodulate anything itself. It spawns
//! `rtl_fm` tuned to the configured channel, feeds its raw audio into
//! `multimon-ng` with the configured demodulators enabled, and hands
//! multimon-ng's stdout (one telegram dump per line) to the line
//! collector. Both children are killed on drop so a panic or abort
//! never leaves an orphaned SDR process holding the device.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

use funkwache_core::config::ReceiverConfig;

/// Maps a configured demodulator name to the multimon-ng `-a` flag.
fn demodulator_flag(name: &str) -> Option<&'static str> {
    match name {
        "fms" => Some("FMSFSK"),
        "zvei" => Some("ZVEI2"),
        "poc512" => Some("POCSAG512"),
        "poc1200" => Some("POCSAG1200"),
        "poc2400" => Some("POCSAG2400"),
        _ => None,
    }
}

/// The running decoder chain.
pub struct DecoderChain {
    rtl_fm: Child,
    multimon: Child,
}

impl DecoderChain {
    /// Spawn `rtl_fm | multimon-ng` and return the chain together with
    /// multimon-ng's stdout for line collection.
    pub fn spawn(receiver: &ReceiverConfig) -> Result<(Self, ChildStdout)> {
        let mut rtl_fm = Command::new("rtl_fm")
            .args([
                "-d",
                &receiver.device_index.to_string(),
                "-f",
                &receiver.frequency_hz.to_string(),
                "-M",
                "fm",
                "-s",
                "22050",
                "-p",
                &receiver.error_ppm.to_string(),
                "-E",
                "dc",
                "-F",
                "0",
                "-l",
                &receiver.squelch.to_string(),
                "-g",
                "100",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("failed to start rtl_fm")?;

        let rtl_stdout = rtl_fm
            .stdout
            .take()
            .context("rtl_fm stdout was not captured")?;
        let rtl_stderr = rtl_fm.stderr.take();

        let mut multimon_cmd = Command::new("multimon-ng");
        for name in &receiver.demodulators {
            // Unknown names are rejected at config validation.
            if let Some(flag) = demodulator_flag(name) {
                multimon_cmd.args(["-a", flag]);
            }
        }
        let mut multimon = multimon_cmd
            .args(["-f", "alpha", "-t", "raw", "/dev/stdin"])
            .stdin(
                TryInto::<std::process::Stdio>::try_into(rtl_stdout)
                    .context("failed to wire rtl_fm stdout into multimon-ng")?,
            )
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("failed to start multimon-ng")?;

        let stdout = multimon
            .stdout
            .take()
            .context("multimon-ng stdout was not captured")?;

        if let Some(stderr) = rtl_stderr {
            spawn_stderr_logger("rtl_fm", stderr);
        }
        if let Some(stderr) = multimon.stderr.take() {
            spawn_stderr_logger("multimon-ng", stderr);
        }

        tracing::info!(
            frequency_hz = receiver.frequency_hz,
            device = receiver.device_index,
            demodulators = ?receiver.demodulators,
            "decoder chain started"
        );

        Ok((Self { rtl_fm, multimon }, stdout))
    }

    /// Kill both children and wait for them to exit.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.rtl_fm.kill().await {
            tracing::warn!(error = %e, "failed to kill rtl_fm");
        }
        if let Err(e) = self.multimon.kill().await {
            tracing::warn!(error = %e, "failed to kill multimon-ng");
        }
        tracing::info!("decoder chain terminated");
    }
}

/// Forward a child's stderr lines into the tracing log.
fn spawn_stderr_logger(name: &'static str, stderr: impl tokio::io::AsyncRead + Unpin + Send + 'static) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if !line.trim().is_empty() {
                tracing::debug!(process = name, "{line}");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demodulator_flags_map_to_multimon_names() {
        assert_eq!(demodulator_flag("fms"), Some("FMSFSK"));
        assert_eq!(demodulator_flag("zvei"), Some("ZVEI2"));
        assert_eq!(demodulator_flag("poc512"), Some("POCSAG512"));
        assert_eq!(demodulator_flag("poc1200"), Some("POCSAG1200"));
        assert_eq!(demodulator_flag("poc2400"), Some("POCSAG2400"));
        assert_eq!(demodulator_flag("dmr"), None);
    }
}
