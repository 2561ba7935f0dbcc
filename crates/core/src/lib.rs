//! Beacon Core — client identity and session tracking for the Beacon
//! analytics instrumentation library.
//!
//! The engine assigns and persists a durable per-visitor identifier, tracks
//! session boundaries and session sequence numbers, regenerates a
//! per-page-view identifier, and enforces anonymization policies that
//! suppress user/session/network identifiers before an event payload is
//! handed to an [`Emitter`].
//!
//! Nothing in here is fatal to the embedding application: blocked or
//! refused storage degrades to in-memory identity and tracking continues.

pub mod anonymize;
pub mod config;
pub mod emitter;
pub mod error;
pub mod ids;
pub mod page;
pub mod payload;
pub mod session;
pub mod storage;
pub mod tracker;

pub use anonymize::FilteredIdentity;
pub use config::{AnonymizationMode, SameSite, StorageStrategy, TrackerConfig};
pub use emitter::{CollectingEmitter, Emitter};
pub use error::{BeaconError, Result};
pub use payload::Payload;
pub use session::IdentityRecord;
pub use storage::{PageOrigin, StorageBackend, StorageEnvironment};
pub use tracker::Tracker;
