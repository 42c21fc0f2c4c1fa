//! Error Types
//!
//! This module defines the error types used by the skinning synchronization layer.
//!
//! # Overview
//!
//! The main error type [`SkinError`] covers the failure modes of id-addressed
//! operations on [`SkinnedInstances`](crate::renderer::skinning::SkinnedInstances):
//! - Addressing an instance that was never attached (or already detached)
//! - Attaching the same renderer twice
//! - Sending into a sync queue whose consumer is gone
//!
//! Missing bones, root bones and proxy targets are *not* errors. Applying a
//! snapshot degrades to a no-op for the affected slot instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_skin::errors::{SkinError, Result};
//!
//! fn sync(instances: &mut SkinnedInstances, id: RendererId, snapshot: ChangeSnapshot) -> Result<()> {
//!     instances.apply(id, snapshot)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::scene::RendererId;

/// The main error type for skinned-mesh synchronization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkinError {
    // ========================================================================
    // Instance Registry Errors
    // ========================================================================
    /// No render-side instance exists for the renderer.
    #[error("Skinned mesh instance not found: {0}")]
    InstanceNotFound(RendererId),

    /// A render-side instance already exists for the renderer.
    #[error("Skinned mesh instance already attached: {0}")]
    InstanceAlreadyAttached(RendererId),

    // ========================================================================
    // Sync Queue Errors
    // ========================================================================
    /// The consuming side of the sync queue has been dropped.
    #[error("Skin sync queue disconnected")]
    QueueDisconnected,
}

/// Alias for `Result<T, SkinError>`.
pub type Result<T> = std::result::Result<T, SkinError>;
