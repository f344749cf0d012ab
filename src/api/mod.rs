//! Typed client for the ADR prediction API.
//!
//! `ApiClient` wraps every backend endpoint; `error` turns failed
//! responses into one readable message with the HTTP status attached.

pub mod client;
pub mod error;

pub use client::{ApiClient, ReportImage, ReportImageState, RequestBody};
pub use error::{ApiError, ClientError, ErrorPayload, ValidationIssue};
