//! # lumen-domain
//!
//! Pure domain model for the lumen smart-lighting engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (addressable lighting fixtures with mutable state)
//! - Define **Audit records** (immutable, append-only transition history)
//! - Define **Schedules** (recurring time-of-day transition rules)
//! - Define **Notifications** (user-facing messages derived from transitions)
//! - Define **Events** (in-process state-change broadcasts)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod audit;
pub mod device;
pub mod event;
pub mod notification;
pub mod schedule;
