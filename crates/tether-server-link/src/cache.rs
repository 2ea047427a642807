// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! Cached-link invalidation seam.
//!
//! After an update (including the conflict-recovery path) the caller
//! redirects immediately, so any cached view of the link must be gone
//! before the operation is declared complete. The service awaits the
//! invalidation; an invalidation failure is logged but does not fail the
//! operation, because the durable write already succeeded.

use async_trait::async_trait;

use tether_link_core::ExternalAccountId;

/// Invalidation failure. Carries the collaborator's message for logs.
#[derive(Debug, thiserror::Error)]
#[error("cache invalidation failed: {0}")]
pub struct CacheError(pub String);

/// Invalidates any cached view of a link.
#[async_trait]
pub trait LinkCacheInvalidator: Send + Sync {
	async fn invalidate_link(&self, id: &ExternalAccountId) -> Result<(), CacheError>;
}

/// No-op invalidator for deployments without a link cache.
pub struct NoopLinkCache;

#[async_trait]
impl LinkCacheInvalidator for NoopLinkCache {
	async fn invalidate_link(&self, _id: &ExternalAccountId) -> Result<(), CacheError> {
		Ok(())
	}
}
