use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::{Uuid, Version};

use crate::context::RequestContext;
use crate::error::{ServiceError, StoreError};
use crate::model::{
    CreateLaptopRequest, CreateLaptopResponse, Laptop, SearchLaptopRequest, SearchLaptopResponse,
};
use crate::protocol::MAX_PAYLOAD;
use crate::storage::{LaptopSink, LaptopStore};

/// Request handlers for the laptop catalog.
///
/// Holds no per-call state; all shared state lives in the store it was built
/// with.
#[derive(Debug)]
pub struct LaptopService<S> {
    store: Arc<S>,
}

impl<S> Clone for LaptopService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: LaptopStore> LaptopService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Store a new laptop, assigning an id when the request carries none.
    pub async fn create_laptop(
        &self,
        req: CreateLaptopRequest,
    ) -> Result<CreateLaptopResponse, ServiceError> {
        let mut laptop = req.laptop;
        info!(id = %laptop.id, "receive a create-laptop request");

        laptop.id = if laptop.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            normalize_id(&laptop.id)?
        };
        if let Err(e) = check_encoded_size(&laptop) {
            warn!(id = %laptop.id, error = %e, "refusing laptop");
            return Err(e);
        }

        if let Err(e) = self.store.save(&laptop).await {
            warn!(id = %laptop.id, error = %e, "cannot save laptop");
            return Err(match e {
                StoreError::AlreadyExists(_) => ServiceError::AlreadyExists { id: laptop.id, source: e },
                _ => ServiceError::Internal { op: "cannot save laptop to the store", source: e },
            });
        }

        info!(id = %laptop.id, "saved laptop");
        Ok(CreateLaptopResponse { id: laptop.id })
    }

    pub async fn find_laptop(&self, id: &str) -> Result<Option<Laptop>, ServiceError> {
        debug!(id, "receive a find-laptop request");
        self.store
        .find(id)
        .await
        .map_err(|source| ServiceError::Internal { op: "cannot find laptop", source })
    }

    /// Stream every laptop matching the request filter into `results`.
    ///
    /// Stops quietly once `ctx` is done. A closed `results` channel ends the
    /// search with an error.
    pub async fn search_laptop(
        &self,
        ctx: &RequestContext,
        req: SearchLaptopRequest,
        results: mpsc::Sender<SearchLaptopResponse>,
    ) -> Result<(), ServiceError> {
        let filter = req.filter;
        info!(?filter, "receive a search-laptop request");

        let mut sink = Counting { inner: results, count: 0 };
        let outcome = self.store.search(ctx, &filter, &mut sink).await;

        if let Err(e) = outcome {
            warn!(sent = sink.count, error = %e, "search aborted");
            return Err(ServiceError::Internal { op: "cannot search laptops", source: e });
        }

        if ctx.is_done() {
            info!(sent = sink.count, "search context is done, results truncated");
        } else {
            info!(sent = sink.count, "search finished");
        }
        Ok(())
    }
}

/// Parse a client id and return its canonical lowercase hyphenated spelling,
/// so one uuid cannot be stored twice under different spellings.
fn normalize_id(id: &str) -> Result<String, ServiceError> {
    let parsed = Uuid::parse_str(id).map_err(|e| ServiceError::InvalidArgument {
        id: id.to_string(),
        reason: format!("not a valid uuid: {e}"),
    })?;

    match parsed.get_version() {
        Some(Version::Random) => Ok(parsed.hyphenated().to_string()),
        _ => Err(ServiceError::InvalidArgument {
            id: id.to_string(),
            reason: format!("expected a version 4 uuid, got version {}", parsed.get_version_num()),
        }),
    }
}

/// Every find and search response carries the whole laptop in one frame, so
/// a record that cannot fit one must never be stored.
fn check_encoded_size(laptop: &Laptop) -> Result<(), ServiceError> {
    let encoded = serde_json::to_vec(&SearchLaptopResponse::from(laptop.clone())).map_err(|e| {
        ServiceError::InvalidArgument { id: laptop.id.clone(), reason: format!("cannot encode laptop: {e}") }
    })?;

    if encoded.len() > MAX_PAYLOAD {
        return Err(ServiceError::InvalidArgument {
            id: laptop.id.clone(),
            reason: format!("encoded laptop is {} bytes, limit is {MAX_PAYLOAD}", encoded.len()),
        });
    }
    Ok(())
}

struct Counting<S> {
    inner: S,
    count: usize,
}

impl<S: LaptopSink> LaptopSink for Counting<S> {
    async fn found(&mut self, laptop: Laptop) -> Result<(), StoreError> {
        self.inner.found(laptop).await?;
        self.count += 1;
        Ok(())
    }
}
