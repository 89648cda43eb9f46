use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageError, ImageFormat};
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::CaptureSink;
use crate::error::{PanoramaError, Result};
use crate::events::{RawFrame, SessionId, StageOutcome, WriteStage};
use crate::layout::{session_dir, stage_path};
use crate::processing::crop::crop_to_square;

/// Crops `frame` and writes it as `panorama_<stage>.png` under the session directory.
///
/// The image is encoded to a sibling temp file and renamed into place, so a
/// stage file either exists whole or not at all.
pub fn write_stage(
    root: &Path,
    frame: RawFrame,
    session: SessionId,
    stage: usize,
) -> Result<PathBuf> {
    let dir = session_dir(root, session);
    // create_dir_all tolerates a concurrent writer creating the same directory.
    fs::create_dir_all(&dir).map_err(|source| PanoramaError::DirectoryCreate {
        path: dir.clone(),
        source,
    })?;

    let square = crop_to_square(frame.image());
    drop(frame);

    let path = stage_path(&dir, stage);
    let partial = path.with_extension("png.partial");
    info!(session = %session, stage, path = %path.display(), "writing panorama stage");
    if let Err(source) = square.save_with_format(&partial, ImageFormat::Png) {
        let _ = fs::remove_file(&partial);
        return Err(PanoramaError::Encode { path, source });
    }
    if let Err(err) = fs::rename(&partial, &path) {
        let _ = fs::remove_file(&partial);
        return Err(PanoramaError::Encode {
            path,
            source: ImageError::IoError(err),
        });
    }
    Ok(path)
}

fn persist(root: &Path, request: WriteStage) -> StageOutcome {
    let WriteStage {
        frame,
        session,
        stage,
    } = request;
    match write_stage(root, frame, session, stage) {
        Ok(path) => StageOutcome::Written {
            session,
            stage,
            path,
        },
        Err(err) => {
            let reason = format!("{:#}", anyhow::Error::new(err));
            error!(session = %session, stage, %reason, "failed to save panorama stage");
            StageOutcome::Failed {
                session,
                stage,
                reason,
            }
        }
    }
}

/// Submit-and-forget handle the render thread uses to hand frames to [`run`].
#[derive(Debug, Clone)]
pub struct WriteQueue {
    tx: UnboundedSender<WriteStage>,
}

impl WriteQueue {
    pub fn channel() -> (Self, UnboundedReceiver<WriteStage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CaptureSink for WriteQueue {
    fn submit(&self, request: WriteStage) {
        let (session, stage) = (request.session, request.stage);
        if self.tx.send(request).is_err() {
            warn!(session = %session, stage, "writer task gone; dropping frame");
        }
    }
}

/// Background writer:
/// - Persists each queued stage on the blocking pool, at most `max_in_flight` at once.
/// - Reports every result on `outcomes` when a listener is attached.
/// - On cancel, stops accepting new work but finishes everything already queued.
#[instrument(skip_all, fields(root = %root.display(), max_in_flight = max_in_flight))]
pub async fn run(
    root: PathBuf,
    mut requests: UnboundedReceiver<WriteStage>,
    outcomes: Option<UnboundedSender<StageOutcome>>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> anyhow::Result<()> {
    let max_in_flight = max_in_flight.max(1);
    let mut tasks: JoinSet<StageOutcome> = JoinSet::new();
    let mut open = true;
    let mut draining = false;

    loop {
        if !open && tasks.is_empty() {
            break;
        }
        select! {
            _ = cancel.cancelled(), if !draining => {
                info!(in_flight = tasks.len(), "cancel received; draining queued writes");
                requests.close();
                draining = true;
            }

            req = requests.recv(), if open && tasks.len() < max_in_flight => {
                match req {
                    Some(request) => {
                        debug!(session = %request.session, stage = request.stage, "queued stage write");
                        let root = root.clone();
                        tasks.spawn_blocking(move || persist(&root, request));
                    }
                    None => open = false,
                }
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                match joined {
                    Ok(outcome) => {
                        if let Some(tx) = &outcomes {
                            let _ = tx.send(outcome);
                        }
                    }
                    Err(err) => error!("stage write task failed: {err}"),
                }
            }
        }
    }
    debug!("writer task finished");
    Ok(())
}
