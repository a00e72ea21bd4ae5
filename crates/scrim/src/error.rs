#![forbid(unsafe_code)]

//! Public error type.
//!
//! Concurrency rejection is the only failure a caller sees from a
//! successful API call sequence; everything else degrades to inline
//! messages or cancel-equivalent resolutions. Handle misuse (acting
//! on a surface that is gone or not yet rendered) gets its own
//! variants so callers can tell the cases apart.

use thiserror::Error;

/// Errors surfaced by the public API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A modal was requested while one is active under the `Reject`
    /// concurrency policy. Raised synchronously from `open`.
    #[error("a modal surface is already active and the concurrency policy is reject")]
    ModalRejected,

    /// The surface behind this handle has been torn down.
    #[error("surface has been closed")]
    SurfaceClosed,

    /// The surface behind this handle is still queued and has not
    /// rendered yet.
    #[error("surface has not rendered yet")]
    SurfaceNotReady,
}
