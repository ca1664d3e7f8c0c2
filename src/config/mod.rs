//! Configuration management for Trawl.
//!
//! Provides XDG-compliant configuration storage, application settings and
//! saved scan profiles.

mod profiles;
mod settings;

pub use profiles::{Profile, ProfileManager};
pub use settings::{AppSettings, Paths};
