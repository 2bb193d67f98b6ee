//! # History Archive
//!
//! The dispatch core forgets an order once its terminal history is cleaned up. Anything
//! that must outlive the process goes through a [`HistoryArchive`], which in production
//! fronts the relational store.

use async_trait::async_trait;
use dispatch_core::{OrderId, StateRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Archive unavailable: {0}")]
    Unavailable(String),
}

/// Durable home for the final histories of delivered and cancelled orders.
#[async_trait]
pub trait HistoryArchive: Send + Sync + 'static {
    async fn archive(&self, order_id: &OrderId, history: &[StateRecord]) -> Result<(), ArchiveError>;
}

/// Keeps archived histories in memory. Useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchive {
    histories: Arc<Mutex<HashMap<OrderId, Vec<StateRecord>>>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_id: &OrderId) -> Option<Vec<StateRecord>> {
        self.histories.lock().get(order_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.histories.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.lock().is_empty()
    }
}

#[async_trait]
impl HistoryArchive for InMemoryArchive {
    async fn archive(&self, order_id: &OrderId, history: &[StateRecord]) -> Result<(), ArchiveError> {
        self.histories.lock().insert(order_id.clone(), history.to_vec());
        Ok(())
    }
}
