//! Layered configuration store.
//!
//! Keys resolve through four tiers in fixed precedence order: the typed
//! slots, the dynamic JSON blob, environment variables, and the read-only
//! bundled resources. Writes land in the first tier among the first three
//! that can hold the key; the resource tier is never written.

pub(crate) mod env;
mod resources;
mod store;
mod typed;

pub use env::EnvScope;
pub use store::SettingsStore;
pub use typed::keys;
