//! Asynchronous audit trail: a bounded worker pool that persists decision
//! and admin-mutation events without blocking the caller, plus query/export/
//! retention operations (§4.6).

mod export;
mod ports;
mod service;

pub use export::{to_csv_document, CSV_HEADER};
pub use ports::{AuditLogQuery, AuditRepository};
pub use service::{AuditRecorder, AuditRecorderStats, DEFAULT_QUEUE_CAPACITY};
