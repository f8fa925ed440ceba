//! Worker pool and fetch operations.

use super::opportunistic::{lock_state, SharedState};
use super::{
    CancellationToken, DecodedImage, Delivery, FetchHandle, FetchState, OpportunisticFetch,
};
use crate::config::Config;
use crate::core::library::{MediaId, MediaStore, StoreReader, Tier};
use crate::core::metadata::{
    ExifMetadataExtractor, Histogram, MediaMetadata, MetadataExtractor,
};
use crate::error::FetchError;
use crossbeam_channel::{bounded, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Serves fetch requests against a store
pub struct FetchPipeline {
    store: Arc<dyn MediaStore>,
    extractor: Arc<dyn MetadataExtractor>,
    pool: ThreadPool,
}

impl FetchPipeline {
    /// Start the worker pool sized by `config.fetch_workers`
    pub fn new(store: Arc<dyn MediaStore>, config: &Config) -> Result<Self, FetchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.fetch_workers)
            .thread_name(|i| format!("photoflow-fetch-{}", i))
            .build()
            .map_err(|e| FetchError::WorkerPool(e.to_string()))?;

        Ok(Self {
            store,
            extractor: Arc::new(ExifMetadataExtractor::new()),
            pool,
        })
    }

    /// Use a different metadata extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn fetch_payload(&self, id: MediaId, tier: Tier) -> FetchHandle<Vec<u8>> {
        self.spawn_one_shot(id, move |reader| read_payload(reader, id, tier))
    }

    pub fn fetch_decoded_image(&self, id: MediaId, tier: Tier) -> FetchHandle<DecodedImage> {
        self.spawn_one_shot(id, move |reader| load_image(reader, id, tier))
    }

    /// EXIF metadata of the original payload
    pub fn fetch_metadata(&self, id: MediaId) -> FetchHandle<MediaMetadata> {
        let extractor = Arc::clone(&self.extractor);
        self.spawn_one_shot(id, move |reader| {
            let decoded = load_image(reader, id, Tier::Original)?;
            Ok(extractor.extract(&decoded))
        })
    }

    /// Per-channel histogram of one tier's raster
    pub fn fetch_histogram(&self, id: MediaId, tier: Tier) -> FetchHandle<Histogram> {
        self.spawn_one_shot(id, move |reader| {
            let decoded = load_image(reader, id, tier)?;
            Ok(Histogram::from_image(&decoded.image))
        })
    }

    /// Preview bytes, then original bytes
    pub fn fetch_opportunistic(&self, id: MediaId) -> OpportunisticFetch<Vec<u8>> {
        self.spawn_cascade(id, read_payload)
    }

    /// Decoded preview, then decoded original
    pub fn fetch_opportunistic_image(&self, id: MediaId) -> OpportunisticFetch<DecodedImage> {
        self.spawn_cascade(id, load_image)
    }

    fn spawn_one_shot<T, F>(&self, id: MediaId, job: F) -> FetchHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StoreReader) -> Result<T, FetchError> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let store = Arc::clone(&self.store);

        self.pool.spawn(move || {
            if worker_token.is_cancelled() {
                return;
            }
            let result = store
                .read_context()
                .map_err(FetchError::from)
                .and_then(|reader| job(reader.as_ref()));

            if let Err(e) = &result {
                debug!(%id, error = %e, "fetch failed");
            }
            if !worker_token.is_cancelled() {
                let _ = tx.send(result);
            }
        });

        FetchHandle::new(id, rx, token)
    }

    fn spawn_cascade<T, F>(&self, id: MediaId, load: F) -> OpportunisticFetch<T>
    where
        T: Send + 'static,
        F: Fn(&dyn StoreReader, MediaId, Tier) -> Result<T, FetchError> + Send + 'static,
    {
        let (tx, rx) = bounded(2);
        let state: SharedState = Arc::new(Mutex::new(FetchState::Idle));
        let token = CancellationToken::new();
        let worker_state = Arc::clone(&state);
        let worker_token = token.clone();
        let store = Arc::clone(&self.store);

        self.pool.spawn(move || {
            run_cascade(store.as_ref(), id, &worker_state, &worker_token, &tx, load);
        });

        OpportunisticFetch::new(id, rx, state, token)
    }
}

/// Drive one cascade to a terminal state
///
/// Each stage checks the state and delivers under the state lock, so a
/// concurrent cancel either happens before the delivery or after it.
fn run_cascade<T, F>(
    store: &dyn MediaStore,
    id: MediaId,
    state: &Mutex<FetchState>,
    token: &CancellationToken,
    tx: &Sender<Result<Delivery<T>, FetchError>>,
    load: F,
) where
    F: Fn(&dyn StoreReader, MediaId, Tier) -> Result<T, FetchError>,
{
    if !advance(state, FetchState::Idle, FetchState::PreviewPending) {
        return;
    }
    let reader = match store.read_context() {
        Ok(reader) => reader,
        Err(e) => {
            deliver(state, tx, Err(e.into()), FetchState::Failed);
            return;
        }
    };

    let preview = load(reader.as_ref(), id, Tier::Preview);
    let preview_failed = preview.is_err();
    let delivered = match preview {
        Ok(value) => deliver(
            state,
            tx,
            Ok(Delivery {
                tier: Tier::Preview,
                value,
            }),
            FetchState::PreviewDelivered,
        ),
        Err(e) => {
            debug!(%id, error = %e, "preview stage failed");
            deliver(state, tx, Err(e), FetchState::Failed)
        }
    };
    if !delivered || preview_failed || token.is_cancelled() {
        return;
    }

    if !advance(state, FetchState::PreviewDelivered, FetchState::OriginalPending) {
        return;
    }

    match load(reader.as_ref(), id, Tier::Original) {
        Ok(value) => {
            deliver(
                state,
                tx,
                Ok(Delivery {
                    tier: Tier::Original,
                    value,
                }),
                FetchState::Done,
            );
        }
        Err(e) => {
            warn!(%id, error = %e, "original stage failed after preview");
            deliver(state, tx, Err(e), FetchState::Failed);
        }
    }
}

fn advance(state: &Mutex<FetchState>, from: FetchState, to: FetchState) -> bool {
    let mut current = lock_state(state);
    if *current != from {
        return false;
    }
    *current = to;
    true
}

/// Send unless cancelled, then move to `next`; false if nothing was sent
fn deliver<T>(
    state: &Mutex<FetchState>,
    tx: &Sender<Result<Delivery<T>, FetchError>>,
    item: Result<Delivery<T>, FetchError>,
    next: FetchState,
) -> bool {
    let mut current = lock_state(state);
    if *current == FetchState::Cancelled {
        return false;
    }
    *current = next;
    let _ = tx.send(item);
    true
}

fn read_payload(reader: &dyn StoreReader, id: MediaId, tier: Tier) -> Result<Vec<u8>, FetchError> {
    if !reader.contains(id)? {
        return Err(FetchError::ItemNotFound { id });
    }
    reader
        .payload(id, tier)?
        .ok_or_else(|| FetchError::UnreadablePayload {
            id,
            tier,
            reason: "no data stored for this tier".to_string(),
        })
}

fn load_image(
    reader: &dyn StoreReader,
    id: MediaId,
    tier: Tier,
) -> Result<DecodedImage, FetchError> {
    let encoded = read_payload(reader, id, tier)?;
    let image = image::load_from_memory(&encoded).map_err(|e| FetchError::UnreadablePayload {
        id,
        tier,
        reason: e.to_string(),
    })?;

    Ok(DecodedImage {
        tier,
        image,
        encoded,
    })
}
