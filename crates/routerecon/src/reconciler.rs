//! The Reconciler: route-set reconciliation over a route source.
//!
//! Wraps an [`AdvertSource`] with the filter operations a router performs
//! per neighbor, for callers that move payloads themselves instead of
//! going through a [`PushSession`].

use std::sync::Arc;

use routerecon_core::{
    decode, decode_filter, difference, encode, filter_bytes, Decoded, Filter, Name, RouteEntry,
};
use routerecon_sync::{AdvertSource, PushSession, SessionConfig, Transport};

use crate::error::Result;

/// Configuration for the Reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// Push session configuration; its cell count is used everywhere.
    pub session: SessionConfig,
}

/// The main Reconciler struct.
///
/// Provides a unified API for:
/// - Building the filter advertised to a neighbor
/// - Reconciling a neighbor's filter against what was learned from it
/// - Writing decoded changes back to the source
/// - Starting a push session
pub struct Reconciler<S: AdvertSource> {
    /// The routing table.
    source: Arc<S>,
    /// Configuration.
    config: ReconcilerConfig,
}

impl<S: AdvertSource> Reconciler<S> {
    /// Create a new reconciler.
    pub fn new(source: S, config: ReconcilerConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    /// Get the source reference.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cells per filter.
    pub fn cell_count(&self) -> usize {
        self.config.session.cell_count
    }

    /// The filter of what we advertise to `neighbor`.
    pub async fn advert_filter(&self, neighbor: &Name) -> Result<Filter> {
        let advert = self.source.advert_for_neighbor(neighbor).await?;
        Ok(encode(&advert, self.cell_count()))
    }

    /// Wire bytes of [`Reconciler::advert_filter`].
    pub async fn advert_payload(&self, neighbor: &Name) -> Result<Vec<u8>> {
        let filter = self.advert_filter(neighbor).await?;
        let payload = filter_bytes(&filter);
        tracing::info!(neighbor = %neighbor, bytes = payload.len(), "advert size");
        Ok(payload)
    }

    /// Decode the difference between `neighbor`'s filter and what we
    /// learned from it.
    ///
    /// Nothing is written back; see [`Reconciler::apply`].
    pub async fn reconcile(&self, neighbor: &Name, sender: &Filter) -> Result<Decoded> {
        let learned = self.source.advert_learned_from(neighbor).await?;
        let local = encode(&learned, sender.cell_count());
        let mut diff = difference(sender, &local)?;
        let decoded = decode(&mut diff)?;

        tracing::info!(
            neighbor = %neighbor,
            added = decoded.added.len(),
            withdrawn = decoded.withdrawn.len(),
            "reconciled"
        );
        Ok(decoded)
    }

    /// [`Reconciler::reconcile`] over wire bytes.
    pub async fn reconcile_payload(&self, neighbor: &Name, payload: &[u8]) -> Result<Decoded> {
        let sender = decode_filter(payload)?;
        self.reconcile(neighbor, &sender).await
    }

    /// Install added entries and drop withdrawn ones.
    pub async fn apply(&self, neighbor: &Name, decoded: &Decoded) -> Result<usize> {
        Ok(self
            .source
            .apply(neighbor, &decoded.added, &decoded.withdrawn)
            .await?)
    }

    /// Start a push session over `transport` with the given neighbors.
    ///
    /// The session shares this reconciler's source.
    pub fn session<T: Transport>(
        &self,
        transport: T,
        neighbors: impl IntoIterator<Item = Name>,
    ) -> PushSession<SharedSource<S>, T> {
        PushSession::new(
            SharedSource(Arc::clone(&self.source)),
            transport,
            self.config.session.clone(),
        )
        .with_neighbors(neighbors)
    }
}

/// A source shared between a [`Reconciler`] and its push sessions.
pub struct SharedSource<S: AdvertSource>(Arc<S>);

#[async_trait::async_trait]
impl<S: AdvertSource> AdvertSource for SharedSource<S> {
    async fn advert_for_neighbor(&self, neighbor: &Name) -> routerecon_sync::Result<Vec<RouteEntry>> {
        self.0.advert_for_neighbor(neighbor).await
    }

    async fn advert_learned_from(&self, neighbor: &Name) -> routerecon_sync::Result<Vec<RouteEntry>> {
        self.0.advert_learned_from(neighbor).await
    }

    async fn apply(
        &self,
        neighbor: &Name,
        added: &[RouteEntry],
        withdrawn: &[RouteEntry],
    ) -> routerecon_sync::Result<usize> {
        self.0.apply(neighbor, added, withdrawn).await
    }
}

impl<S: AdvertSource> std::ops::Deref for SharedSource<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}
