//! Inbound adapters translating browser traffic into domain port calls.
//!
//! [`http`] serves the dashboard, forms and JSON API; [`ws`] streams the
//! live bookmark list. Framework types stay inside these modules.

pub mod http;
pub mod ws;
