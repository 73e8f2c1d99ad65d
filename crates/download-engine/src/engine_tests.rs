use crate::{
    DownloadEngine, DownloadError, DownloadEvent, DownloadJob, DownloadOptions, DownloadStatus,
    EngineConfig, OutputFormat,
};
use futures_lite::future::zip;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

// Fake converters are plain shell scripts. The engine is pointed at `sh` and the
// script path travels in the source URL slot, which is the first argument.
fn make_engine() -> DownloadEngine {
    DownloadEngine::new(EngineConfig {
        ytdlp_path: PathBuf::from("sh"),
        ..EngineConfig::default()
    })
}

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-yt-dlp.sh");
    std::fs::write(&path, body).unwrap();
    path
}

fn make_job(script: &Path, output_dir: &Path) -> DownloadJob {
    DownloadJob {
        track_key: "3135556".into(),
        artist: "Daft Punk".into(),
        title: "Around the World".into(),
        source_url: script.to_string_lossy().to_string(),
        options: DownloadOptions {
            output_dir: output_dir.to_path_buf(),
            format: OutputFormat::Mp4,
            quality: "0".into(),
        },
    }
}

fn drain(rx: &mut UnboundedReceiver<DownloadEvent>) -> Vec<DownloadEvent> {
    let mut events = vec![];
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_until_busy(engine: &DownloadEngine) {
    while !engine.is_busy() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[actix_rt::test]
async fn should_report_progress_and_resolve_merged_output() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("out");
    let merged = output_dir.join("a.mkv");
    let script = write_script(
        dir.path(),
        &format!(
            "printf '[download]  12.3%% of 3.50MiB at 1.2MiB/s\\n'\n\
             echo '[download] Destination: {dir}/a.mp4'\n\
             echo '[Merger] Merging formats into \"{dir}/a.mkv\"'\n\
             touch '{dir}/a.mkv'\n\
             exit 0\n",
            dir = output_dir.display()
        ),
    );
    let engine = make_engine();
    let (tx, mut rx) = unbounded_channel();

    let path = engine
        .run(&make_job(&script, &output_dir), &tx)
        .await
        .unwrap();

    assert_eq!(path, merged);
    assert_eq!(
        drain(&mut rx),
        vec![
            DownloadEvent::downloading("3135556", 0.0),
            DownloadEvent::downloading("3135556", 12.3),
            DownloadEvent::completed("3135556", merged),
        ]
    );
    assert!(!engine.is_busy());
}

#[actix_rt::test]
async fn should_fall_back_to_expected_path_without_report() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("nested").join("out");
    let script = write_script(dir.path(), "exit 0\n");
    let engine = make_engine();
    let (tx, _rx) = unbounded_channel();

    let path = engine
        .run(&make_job(&script, &output_dir), &tx)
        .await
        .unwrap();

    assert!(output_dir.is_dir());
    assert_eq!(path, output_dir.join("Daft Punk - Around the World.mp4"));
}

#[actix_rt::test]
async fn should_fail_on_non_zero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "echo 'ERROR: Video unavailable' >&2\nexit 2\n");
    let engine = make_engine();
    let (tx, mut rx) = unbounded_channel();

    let result = engine.run(&make_job(&script, dir.path()), &tx).await;

    assert!(matches!(result, Err(DownloadError::ExitCode(2))));

    let events = drain(&mut rx);
    let last = events.last().unwrap();
    assert_eq!(last.status, DownloadStatus::Error);
    assert_eq!(last.error.as_deref(), Some("yt-dlp exited with code 2"));
    assert!(!engine.is_busy());
}

#[actix_rt::test]
async fn should_report_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let engine = DownloadEngine::new(EngineConfig {
        ytdlp_path: PathBuf::from("/nonexistent/yt-dlp"),
        ..EngineConfig::default()
    });
    let (tx, mut rx) = unbounded_channel();

    let result = engine
        .run(&make_job(Path::new("unused"), dir.path()), &tx)
        .await;

    assert!(matches!(result, Err(DownloadError::Spawn(_))));

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].status, DownloadStatus::Downloading);
    assert_eq!(events[1].status, DownloadStatus::Error);
    assert!(!engine.is_busy());
}

#[actix_rt::test]
async fn should_ignore_cancel_when_idle() {
    let engine = make_engine();

    assert!(!engine.cancel());
    assert!(!engine.is_busy());
}

#[actix_rt::test]
async fn should_settle_after_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "echo '[download]   1.0% of 3.50MiB'\nexec sleep 30\n",
    );
    let engine = make_engine();
    let job = make_job(&script, dir.path());
    let (tx, _rx) = unbounded_channel();

    let (result, cancelled) = tokio::time::timeout(
        Duration::from_secs(10),
        zip(engine.run(&job, &tx), async {
            wait_until_busy(&engine).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            let cancelled = engine.cancel();
            assert!(!engine.is_busy());
            cancelled
        }),
    )
    .await
    .unwrap();

    assert!(cancelled);
    assert!(matches!(result, Err(DownloadError::Terminated)));
}

#[actix_rt::test]
async fn should_reject_second_job_while_busy() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "exec sleep 30\n");
    let engine = make_engine();
    let job = make_job(&script, dir.path());
    let (tx, _rx) = unbounded_channel();

    let (first, second) = tokio::time::timeout(
        Duration::from_secs(10),
        zip(engine.run(&job, &tx), async {
            wait_until_busy(&engine).await;
            let second = engine.run(&job, &tx).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            engine.cancel();
            second
        }),
    )
    .await
    .unwrap();

    assert!(matches!(second, Err(DownloadError::EngineBusy)));
    assert!(matches!(first, Err(DownloadError::Terminated)));
}

#[actix_rt::test]
async fn should_check_binaries() {
    let engine = DownloadEngine::new(EngineConfig {
        ytdlp_path: PathBuf::from("true"),
        ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
    });

    let status = engine.check_binaries().await;

    assert!(status.ytdlp);
    assert!(!status.ffmpeg);
}
