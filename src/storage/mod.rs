//! Scan report persistence.
//!
//! The scanning engine never stores anything itself; front ends hand finished
//! reports to the store.

mod json_store;

pub use json_store::{ScanRecord, ScanStore};
