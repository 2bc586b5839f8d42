//! Calendar sync engine
//!
//! One tenant's sync run is strictly sequential: token resolution, windowed
//! fetch, reconciliation, appointment push, checkpoint. Runs for different
//! tenants are independent. There is no run-level lock; re-entrancy safety
//! comes from idempotency (upsert by external id, single-use push).

pub mod fetch;
pub mod ports;
pub mod push;
pub mod reconcile;
pub mod service;
pub mod token;

#[cfg(test)]
pub(crate) mod testkit;
