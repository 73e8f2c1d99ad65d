use crate::{
    base_filename, build_args, expected_output_path, DownloadError, DownloadEvent, DownloadJob,
    EngineConfig, JobSlot, JobTicket, ProgressScanner, ScanEvent,
};
use futures_lite::future::zip;
use futures_lite::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinaryStatus {
    pub ytdlp: bool,
    pub ffmpeg: bool,
}

/// Runs one yt-dlp process at a time and turns its output into
/// [`DownloadEvent`]s.
pub struct DownloadEngine {
    config: EngineConfig,
    slot: JobSlot,
}

impl DownloadEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            slot: JobSlot::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    pub async fn run(
        &self,
        job: &DownloadJob,
        events: &UnboundedSender<DownloadEvent>,
    ) -> Result<PathBuf, DownloadError> {
        let ticket = match self.slot.try_acquire() {
            Some(ticket) => ticket,
            None => {
                warn!(track_key = %job.track_key, "Download rejected: engine is busy");
                return Err(DownloadError::EngineBusy);
            }
        };

        let result = self.execute(ticket, job, events).await;

        self.slot.release(ticket);

        let final_event = match &result {
            Ok(path) => {
                info!(track_key = %job.track_key, path = ?path, "Download completed");
                DownloadEvent::completed(&job.track_key, path.clone())
            }
            Err(error) => {
                error!(track_key = %job.track_key, ?error, "Download failed");
                DownloadEvent::error(&job.track_key, error.to_string())
            }
        };
        let _ = events.send(final_event);

        result
    }

    /// Asks the running process to terminate and frees the slot right away.
    /// The pending [`DownloadEngine::run`] settles once the process exits.
    pub fn cancel(&self) -> bool {
        match self.slot.take() {
            Some(Some(pid)) => {
                info!(pid, "Cancelling running download");
                send_terminate(pid);
                true
            }
            Some(None) => {
                info!("Cancelling download before the process has started");
                true
            }
            None => false,
        }
    }

    pub async fn check_binaries(&self) -> BinaryStatus {
        let (ytdlp, ffmpeg) = zip(
            probe_binary(&self.config.ytdlp_path, "--version"),
            probe_binary(&self.config.ffmpeg_path, "-version"),
        )
        .await;

        BinaryStatus { ytdlp, ffmpeg }
    }

    async fn execute(
        &self,
        ticket: JobTicket,
        job: &DownloadJob,
        events: &UnboundedSender<DownloadEvent>,
    ) -> Result<PathBuf, DownloadError> {
        tokio::fs::create_dir_all(&job.options.output_dir)
            .await
            .map_err(DownloadError::CreateOutputDir)?;

        let base_name = base_filename(&job.artist, &job.title);
        let expected_path = expected_output_path(&job.options.output_dir, &base_name, job.options.format);
        let args = build_args(job, &base_name, &self.config);

        let _ = events.send(DownloadEvent::downloading(&job.track_key, 0.0));

        debug!(track_key = %job.track_key, ?args, "Spawning yt-dlp");

        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(DownloadError::Spawn)?;

        if let Some(pid) = child.id() {
            if !self.slot.attach(ticket, pid) {
                send_terminate(pid);
            }
        }

        let mut scanner = ProgressScanner::new();
        let (scanned, _) = zip(
            scan_stdout(child.stdout.take(), &mut scanner, &job.track_key, events),
            log_stderr(child.stderr.take(), &job.track_key),
        )
        .await;

        let status = child.wait().await?;
        scanned?;

        match status.code() {
            Some(0) => Ok(resolve_output_path(scanner.output_path(), expected_path).await),
            Some(code) => Err(DownloadError::ExitCode(code)),
            None => Err(DownloadError::Terminated),
        }
    }
}

async fn scan_stdout(
    stdout: Option<ChildStdout>,
    scanner: &mut ProgressScanner,
    track_key: &str,
    events: &UnboundedSender<DownloadEvent>,
) -> std::io::Result<()> {
    let mut stream = match stdout {
        Some(stdout) => ReaderStream::new(stdout),
        None => return Ok(()),
    };

    let forward = |scan_events: Vec<ScanEvent>| {
        for ScanEvent::Progress(percent) in scan_events {
            let _ = events.send(DownloadEvent::downloading(track_key, percent));
        }
    };

    while let Some(chunk) = stream.next().await {
        forward(scanner.feed(&chunk?));
    }
    forward(scanner.finish());

    Ok(())
}

async fn log_stderr(stderr: Option<ChildStderr>, track_key: &str) {
    let mut lines = match stderr {
        Some(stderr) => BufReader::new(stderr).lines(),
        None => return,
    };

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.starts_with("ERROR") => warn!(track_key, %line, "yt-dlp"),
            Ok(Some(line)) => debug!(track_key, %line, "yt-dlp"),
            Ok(None) => break,
            Err(error) => {
                warn!(track_key, ?error, "Unable to read yt-dlp stderr");
                break;
            }
        }
    }
}

/// Picks the file the process reported when it exists on disk, then the
/// path derived from the output template, then whatever was reported.
async fn resolve_output_path(captured: Option<&str>, expected: PathBuf) -> PathBuf {
    let captured = captured.map(PathBuf::from);

    if let Some(path) = &captured {
        if file_exists(path).await {
            return path.clone();
        }
    }

    if file_exists(&expected).await {
        return expected;
    }

    captured.unwrap_or(expected)
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

async fn probe_binary(path: &Path, version_flag: &str) -> bool {
    let status = Command::new(path)
        .arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) => status.success(),
        Err(error) => {
            debug!(path = ?path, ?error, "Binary is not available");
            false
        }
    }
}

#[cfg(unix)]
fn terminate_command(pid: u32) -> Command {
    let mut command = Command::new("kill");
    command.arg("-TERM").arg(pid.to_string());
    command
}

#[cfg(windows)]
fn terminate_command(pid: u32) -> Command {
    let mut command = Command::new("taskkill");
    command.arg("/PID").arg(pid.to_string());
    command
}

fn send_terminate(pid: u32) {
    let spawned = terminate_command(pid)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(error) = spawned {
        error!(pid, ?error, "Unable to signal yt-dlp process");
    }
}
