//! # lumen-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceRepository` — canonical device state
//!   - `AuditLogRepository` — append-only transition history
//!   - `ScheduleRepository` — CRUD for schedules
//!   - `NotificationRepository` — per-user notifications
//! - Define **driving/inbound ports** as use-case structs:
//!   - `DeviceRegistry` — register, get, list
//!   - `TransitionEngine` — validate, serialize per device, log then apply
//!   - `ScheduleEvaluator` — tick, match, fire at most once per minute
//!   - `ScheduleService` / `NotificationService` — configuration CRUD
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `lumen-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod schedule_evaluator;
pub mod services;
pub mod transition_engine;

#[cfg(test)]
pub(crate) mod fakes;
