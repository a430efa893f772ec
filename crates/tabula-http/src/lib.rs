//! tabula-http - REST surface for tabula entity services.
//!
//! Each mounted [`EntityService`](tabula_core::EntityService) gets the
//! usual collection and item routes under `/<resource>`. Responses use a
//! JSON envelope: `{"success": true, "data": .., "message": ..}` on
//! success, `{"success": false, "error": .., "message": ..}` on failure.

mod envelope;
mod error;
mod handlers;
mod router;

pub use envelope::Envelope;
pub use error::ApiError;
pub use router::{Api, RunMode, serve};
