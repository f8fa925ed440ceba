//! Sequential bulk import on a background thread.

use super::ImportJob;
use crate::core::fetch::CancellationToken;
use crate::core::library::{MediaId, MediaStore};
use crate::error::ImportError;
use crate::events::{null_sender, Event, EventSender, ImportEvent, ImportProgressUpdate};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Largest fraction an unfinished import reports
const BELOW_COMPLETE: f64 = 1.0 - f64::EPSILON;

#[derive(Debug, Default)]
struct ProgressState {
    completed: usize,
    total: usize,
    fraction: f64,
}

/// Shared, monotonic progress of a bulk import
#[derive(Debug, Clone, Default)]
pub struct ImportProgress {
    state: Arc<Mutex<ProgressState>>,
}

impl ImportProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overall fraction in [0, 1]
    pub fn fraction(&self) -> f64 {
        self.lock().fraction
    }

    pub fn completed(&self) -> usize {
        self.lock().completed
    }

    pub fn total(&self) -> usize {
        self.lock().total
    }

    fn start(&self, total: usize) -> ImportProgressUpdate {
        let mut state = self.lock();
        *state = ProgressState {
            completed: 0,
            total,
            fraction: if total == 0 { 1.0 } else { 0.0 },
        };
        snapshot(&state)
    }

    /// Record progress of the job at index `completed`
    ///
    /// Only `complete_job` may reach 1.0; a running job can still fail.
    fn report(&self, completed: usize, job_fraction: f64) -> ImportProgressUpdate {
        let mut state = self.lock();
        if state.total > 0 {
            let value = (completed as f64 + job_fraction.clamp(0.0, 1.0)) / state.total as f64;
            state.fraction = state.fraction.max(value.min(BELOW_COMPLETE));
        }
        snapshot(&state)
    }

    fn complete_job(&self, completed: usize) -> ImportProgressUpdate {
        let mut state = self.lock();
        state.completed = completed;
        if completed >= state.total {
            state.fraction = 1.0;
        }
        snapshot(&state)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot(state: &ProgressState) -> ImportProgressUpdate {
    ImportProgressUpdate {
        completed: state.completed,
        total: state.total,
        fraction: state.fraction,
    }
}

/// Result of a finished bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<MediaId>,
}

/// Ordered list of jobs waiting to run
#[derive(Default)]
pub struct ImportQueue {
    jobs: Vec<Box<dyn ImportJob>>,
}

impl ImportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: impl ImportJob + 'static) {
        self.jobs.push(Box::new(job));
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job on the calling thread
    pub fn run(self, store: &dyn MediaStore) -> Result<ImportSummary, ImportError> {
        self.run_with_events(
            store,
            &null_sender(),
            &ImportProgress::new(),
            &CancellationToken::new(),
        )
    }

    /// Run every job on the calling thread, reporting events
    pub fn run_with_events(
        self,
        store: &dyn MediaStore,
        events: &EventSender<Event>,
        progress: &ImportProgress,
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        let total = self.jobs.len();
        let mut imported = Vec::with_capacity(total);

        info!(total, "starting import");
        events.send(Event::Import(ImportEvent::Started { total }));
        events.send(Event::Import(ImportEvent::Progress(progress.start(total))));

        for (index, mut job) in self.jobs.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(imported = imported.len(), "import cancelled");
                events.send(Event::Import(ImportEvent::Cancelled {
                    imported: imported.len(),
                }));
                return Err(ImportError::Cancelled);
            }

            let label = job.label();
            let mut on_progress = |fraction: f64| {
                let update = progress.report(index, fraction);
                events.send(Event::Import(ImportEvent::Progress(update)));
            };

            match job.run(store, &mut on_progress) {
                Ok(id) => {
                    imported.push(id);
                    events.send(Event::Import(ImportEvent::ItemImported { id, label }));
                    let update = progress.complete_job(index + 1);
                    events.send(Event::Import(ImportEvent::Progress(update)));
                }
                Err(e) => {
                    warn!(%label, error = %e, "import failed, stopping");
                    events.send(Event::Import(ImportEvent::Failed {
                        label,
                        message: e.to_string(),
                    }));
                    return Err(e);
                }
            }
        }

        info!(imported = imported.len(), "import complete");
        events.send(Event::Import(ImportEvent::Completed {
            imported: imported.len(),
        }));
        Ok(ImportSummary { imported })
    }

    /// Run the queue on a background thread
    pub fn start(
        self,
        store: Arc<dyn MediaStore>,
        events: EventSender<Event>,
    ) -> Result<ImportSession, ImportError> {
        let progress = ImportProgress::new();
        let cancel = CancellationToken::new();
        let worker_progress = progress.clone();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("photoflow-import".to_string())
            .spawn(move || {
                self.run_with_events(store.as_ref(), &events, &worker_progress, &worker_cancel)
            })
            .map_err(|e| ImportError::Worker(e.to_string()))?;

        Ok(ImportSession {
            handle,
            progress,
            cancel,
        })
    }
}

/// A bulk import running in the background
pub struct ImportSession {
    handle: JoinHandle<Result<ImportSummary, ImportError>>,
    progress: ImportProgress,
    cancel: CancellationToken,
}

impl ImportSession {
    pub fn progress(&self) -> &ImportProgress {
        &self.progress
    }

    /// Stop before the next job starts; the running job finishes
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker is done
    pub fn wait(self) -> Result<ImportSummary, ImportError> {
        self.handle
            .join()
            .map_err(|_| ImportError::Worker("import worker panicked".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ImageHash;
    use crate::core::library::{InMemoryStore, NewMediaItem};
    use crate::events::EventChannel;
    use chrono::Utc;
    use crossbeam_channel::{bounded, Receiver, Sender};

    /// Inserts an empty item, reporting the given fractions on the way
    struct StubJob {
        name: &'static str,
        steps: Vec<f64>,
        fail: bool,
    }

    impl StubJob {
        fn ok(name: &'static str) -> Self {
            Self {
                name,
                steps: vec![0.3, 0.6, 1.0],
                fail: false,
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                steps: vec![0.5],
                fail: true,
            }
        }
    }

    impl ImportJob for StubJob {
        fn label(&self) -> String {
            self.name.to_string()
        }

        fn run(
            &mut self,
            store: &dyn MediaStore,
            progress: &mut dyn FnMut(f64),
        ) -> Result<MediaId, ImportError> {
            for &step in &self.steps {
                progress(step);
            }
            if self.fail {
                return Err(ImportError::Decode {
                    path: self.name.into(),
                    reason: "corrupt".to_string(),
                });
            }
            Ok(store.insert(NewMediaItem::imported(Utc::now(), ImageHash::new(0), None, None))?)
        }
    }

    /// Blocks until released, so a test can cancel mid-queue
    struct GateJob {
        started: Sender<()>,
        release: Receiver<()>,
    }

    impl ImportJob for GateJob {
        fn label(&self) -> String {
            "gate".to_string()
        }

        fn run(
            &mut self,
            store: &dyn MediaStore,
            _progress: &mut dyn FnMut(f64),
        ) -> Result<MediaId, ImportError> {
            let _ = self.started.send(());
            let _ = self.release.recv();
            Ok(store.insert(NewMediaItem::imported(Utc::now(), ImageHash::new(0), None, None))?)
        }
    }

    fn fractions(events: &[Event]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Import(ImportEvent::Progress(p)) => Some(p.fraction),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_one() {
        let store = InMemoryStore::new();
        let (tx, rx) = EventChannel::new();
        let mut queue = ImportQueue::new();
        for name in ["a", "b", "c", "d"] {
            queue.push(StubJob::ok(name));
        }
        let progress = ImportProgress::new();

        let summary = queue
            .run_with_events(&store, &tx, &progress, &CancellationToken::new())
            .unwrap();

        let seen = fractions(&rx.drain());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", seen);
        assert_eq!(seen.last().copied(), Some(1.0));
        assert_eq!(progress.fraction(), 1.0);
        assert_eq!(progress.completed(), 4);
        assert_eq!(summary.imported.len(), 4);
    }

    #[test]
    fn empty_queue_is_immediately_complete() {
        let progress = ImportProgress::new();
        let summary = ImportQueue::new()
            .run_with_events(
                &InMemoryStore::new(),
                &null_sender(),
                &progress,
                &CancellationToken::new(),
            )
            .unwrap();

        assert!(summary.imported.is_empty());
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn failed_last_job_never_reports_complete() {
        let (tx, rx) = EventChannel::new();
        let mut queue = ImportQueue::new();
        queue.push(StubJob {
            name: "late",
            steps: vec![0.5, 1.0],
            fail: true,
        });
        let progress = ImportProgress::new();

        let result = queue.run_with_events(
            &InMemoryStore::new(),
            &tx,
            &progress,
            &CancellationToken::new(),
        );

        assert!(result.is_err());
        assert!(progress.fraction() < 1.0);
        assert_eq!(progress.completed(), 0);
        assert!(fractions(&rx.drain()).iter().all(|&f| f < 1.0));
    }

    #[test]
    fn first_failure_stops_the_queue() {
        let store = InMemoryStore::new();
        let (tx, rx) = EventChannel::new();
        let mut queue = ImportQueue::new();
        queue.push(StubJob::ok("a"));
        queue.push(StubJob::failing("b"));
        queue.push(StubJob::ok("c"));

        let result =
            queue.run_with_events(&store, &tx, &ImportProgress::new(), &CancellationToken::new());

        assert!(matches!(result, Err(ImportError::Decode { .. })));
        assert_eq!(store.list().unwrap().len(), 1);
        let failed: Vec<String> = rx
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                Event::Import(ImportEvent::Failed { label, .. }) => Some(label),
                _ => None,
            })
            .collect();
        assert_eq!(failed, vec!["b".to_string()]);
    }

    #[test]
    fn background_session_can_be_cancelled_between_jobs() {
        let store = Arc::new(InMemoryStore::new());
        let (started_tx, started_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let mut queue = ImportQueue::new();
        queue.push(GateJob {
            started: started_tx,
            release: release_rx,
        });
        queue.push(StubJob::ok("never"));

        let session = queue.start(store.clone(), null_sender()).unwrap();
        started_rx.recv().unwrap();
        session.cancel();
        release_tx.send(()).unwrap();

        assert!(matches!(session.wait(), Err(ImportError::Cancelled)));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn background_session_reports_summary() {
        let store = Arc::new(InMemoryStore::new());
        let mut queue = ImportQueue::new();
        queue.push(StubJob::ok("a"));
        queue.push(StubJob::ok("b"));

        let session = queue.start(store, null_sender()).unwrap();
        let progress = session.progress().clone();
        let summary = session.wait().unwrap();

        assert_eq!(summary.imported.len(), 2);
        assert_eq!(progress.fraction(), 1.0);
    }
}
