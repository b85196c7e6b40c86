//! # lumen-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **REST-ish JSON API** for programmatic access
//!   (`/api/devices`, `/api/schedules`, `/api/notifications`, …)
//! - Stream core events over **SSE** (`/api/events/stream`) so collaborators
//!   can choose push over polling
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application results into HTTP responses
//!
//! ## Collaborator identity
//! The caller is identified by the `x-user-id` header (a UUID). This is a
//! collaborator seam, not an authentication system.
//!
//! ## Dependency rule
//! Depends on `lumen-app` (for port traits and services) and `lumen-domain`
//! (for domain types used in request/response mapping). Never leaks axum
//! types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
