use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use rkyv::{AlignedVec, Deserialize};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::context::RequestContext;
use crate::error::StoreError;
use crate::filter;
use crate::model::{Filter, Laptop};

// Scratch space for the archive serializer; a laptop image is well under this.
const ARCHIVE_SCRATCH: usize = 1024;

/// Receives the records produced by [`LaptopStore::search`], one at a time.
pub trait LaptopSink: Send {
    /// Accept one qualifying laptop. An error stops the search.
    fn found(&mut self, laptop: Laptop) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T> LaptopSink for mpsc::Sender<T>
where
    T: From<Laptop> + Send,
{
    async fn found(&mut self, laptop: Laptop) -> Result<(), StoreError> {
        self.send(T::from(laptop)).await.map_err(|_| StoreError::Disconnected)
    }
}

impl LaptopSink for Vec<Laptop> {
    async fn found(&mut self, laptop: Laptop) -> Result<(), StoreError> {
        self.push(laptop);
        Ok(())
    }
}

/// Storage backend for laptops.
///
/// Implementations own the canonical copy of every record: `save` keeps its
/// own duplicate of the input, and `find`/`search` hand out fresh duplicates,
/// so callers can never observe or cause aliasing. Identifiers are unique for
/// the lifetime of the store.
pub trait LaptopStore: Send + Sync {
    /// Store a duplicate of `laptop` under its id.
    /// Fails with [`StoreError::AlreadyExists`] and leaves the store untouched
    /// if the id is taken.
    fn save(&self, laptop: &Laptop) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Look up a laptop by id. A missing id is `Ok(None)`, not an error.
    fn find(&self, id: &str) -> impl Future<Output = Result<Option<Laptop>, StoreError>> + Send;

    /// Hand every laptop that satisfies `filter` to `sink`, in no particular
    /// order. Returns `Ok(())` early once `ctx` is done.
    fn search<S: LaptopSink>(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sink: &mut S,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Volatile store keeping each laptop as a validated rkyv archive.
#[derive(Default)]
pub struct InMemoryLaptopStore {
    // laptop.id -> archived laptop
    data: RwLock<HashMap<String, AlignedVec>>,
}

impl fmt::Debug for InMemoryLaptopStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryLaptopStore")
        .field("record_count", &self.data.try_read().map(|d| d.len()).ok())
        .finish()
    }
}

impl InMemoryLaptopStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

impl LaptopStore for InMemoryLaptopStore {
    async fn save(&self, laptop: &Laptop) -> Result<(), StoreError> {
        let mut data = self.data.write().await;

        if data.contains_key(&laptop.id) {
            return Err(StoreError::AlreadyExists(laptop.id.clone()));
        }

        let bytes = archive(laptop)?;
        data.insert(laptop.id.clone(), bytes);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Laptop>, StoreError> {
        let data = self.data.read().await;
        data.get(id).map(|bytes| unarchive(bytes)).transpose()
    }

    async fn search<S: LaptopSink>(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sink: &mut S,
    ) -> Result<(), StoreError> {
        let data = tokio::select! {
            biased;
            _ = ctx.done() => {
                debug!("search context done while waiting for the store lock");
                return Ok(());
            }
            guard = self.data.read() => guard,
        };

        // The read guard stays held until enumeration ends, sink hand-offs included.
        for bytes in data.values() {
            if ctx.is_done() {
                debug!("search context done, stopping enumeration");
                return Ok(());
            }

            let Some(laptop) = qualify(filter, bytes)? else {
                continue;
            };

            tokio::select! {
                biased;
                _ = ctx.done() => {
                    debug!("search context done while handing off a result");
                    return Ok(());
                }
                res = sink.found(laptop) => res?,
            }
        }

        Ok(())
    }
}

fn archive(laptop: &Laptop) -> Result<AlignedVec, StoreError> {
    rkyv::to_bytes::<_, ARCHIVE_SCRATCH>(laptop)
    .map_err(|e| StoreError::Copy(format!("laptop {}: {}", laptop.id, e)))
}

fn unarchive(bytes: &[u8]) -> Result<Laptop, StoreError> {
    let archived = rkyv::check_archived_root::<Laptop>(bytes)
    .map_err(|e| StoreError::Copy(e.to_string()))?;

    archived
    .deserialize(&mut rkyv::Infallible)
    .map_err(|_| StoreError::Copy(format!("laptop {}", archived.id.as_str())))
}

/// Match against the archived image and only deserialize on a hit.
fn qualify(filter: &Filter, bytes: &[u8]) -> Result<Option<Laptop>, StoreError> {
    let archived = rkyv::check_archived_root::<Laptop>(bytes)
    .map_err(|e| StoreError::Copy(e.to_string()))?;

    if !filter::matches(filter, archived) {
        return Ok(None);
    }

    archived
    .deserialize(&mut rkyv::Infallible)
    .map(Some)
    .map_err(|_| StoreError::Copy(format!("laptop {}", archived.id.as_str())))
}
