//! Outbound adapters implementing the domain's driven ports.
//!
//! - **hosted**: the hosted backend's data, auth and realtime APIs.
//! - **memory**: an in-process stand-in used when no hosted project is
//!   configured and by the integration tests.
//!
//! Adapters translate between wire payloads and domain types. They contain
//! no business logic.

pub mod hosted;
pub mod memory;
