//! Load/save operations over the toast store.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::domain::error::DomainError;
use crate::domain::toasts::{self, Toast, ToastCollection};
use crate::infra::store::{StoreError, ToastStore};

#[derive(Debug, Error)]
pub enum ToastServiceError {
    #[error(transparent)]
    Validation(DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Receipt for an accepted save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub timestamp: i64,
    pub count: usize,
}

/// Stateless per request; the store owns all durable state.
pub struct ToastService {
    store: Arc<dyn ToastStore>,
}

impl ToastService {
    pub fn new(store: Arc<dyn ToastStore>) -> Self {
        Self { store }
    }

    /// Current collection, verbatim. An absent document is the empty default;
    /// only unparseable stored bytes are an error.
    pub async fn load(&self) -> Result<ToastCollection, ToastServiceError> {
        Ok(self.store.read().await?)
    }

    /// Validate the incoming toasts, stamp the revision marker and replace
    /// the stored collection atomically. Any incoming timestamp was already
    /// discarded by the caller; the stamp is taken here, at save time.
    pub async fn save(&self, toasts: Vec<Toast>) -> Result<SaveOutcome, ToastServiceError> {
        toasts::validate_stored(&toasts).map_err(ToastServiceError::Validation)?;

        let timestamp = toasts::epoch_ms(OffsetDateTime::now_utc());
        let count = toasts.len();
        let collection = ToastCollection {
            timestamp: Some(timestamp),
            toasts,
        };
        self.store.replace(&collection).await?;
        info!(
            target = "toastdeck::toasts",
            count, timestamp, "Replaced stored toast collection"
        );
        Ok(SaveOutcome { timestamp, count })
    }
}
