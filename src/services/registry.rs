// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participation registry: "is user U registered for event E, and since when".

use crate::db::Database;
use crate::models::{EventId, UserId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

/// Registry lookup failures. Never means "not registered".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Participation registry unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookup over stored participation records.
///
/// Lookups must be side-effect free and reflect the latest committed
/// registration state.
pub trait ParticipationRegistry: Send + Sync {
    /// True iff the user holds a registration for the event.
    fn exists(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> impl Future<Output = Result<bool, RegistryError>> + Send;

    /// Registration time, if registered.
    fn registered_at(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, RegistryError>> + Send;
}

impl ParticipationRegistry for Database {
    async fn exists(&self, user_id: UserId, event_id: EventId) -> Result<bool, RegistryError> {
        Ok(self.registered_at(user_id, event_id).await?.is_some())
    }

    async fn registered_at(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<DateTime<Utc>>, RegistryError> {
        let record = self
            .find_participation(user_id, event_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = user_id.0,
                    event_id = event_id.0,
                    error = %e,
                    "Participation lookup failed"
                );
                RegistryError::Unavailable(e.to_string())
            })?;
        Ok(record.map(|r| r.registered_at))
    }
}

/// In-memory registry, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    entries: Arc<DashMap<(UserId, EventId), DateTime<Utc>>>,
    /// When set, every lookup fails with this reason.
    outage: Option<String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose storage is down.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            entries: Arc::default(),
            outage: Some(reason.into()),
        }
    }

    /// Record a registration. Keeps the first time if already registered.
    pub fn register(&self, user_id: UserId, event_id: EventId, registered_at: DateTime<Utc>) {
        self.entries
            .entry((user_id, event_id))
            .or_insert(registered_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        match &self.outage {
            Some(reason) => Err(RegistryError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl ParticipationRegistry for InMemoryRegistry {
    async fn exists(&self, user_id: UserId, event_id: EventId) -> Result<bool, RegistryError> {
        self.check_available()?;
        Ok(self.entries.contains_key(&(user_id, event_id)))
    }

    async fn registered_at(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<DateTime<Utc>>, RegistryError> {
        self.check_available()?;
        Ok(self.entries.get(&(user_id, event_id)).map(|e| *e.value()))
    }
}
