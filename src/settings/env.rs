//! Environment-variable tier.

use tracing::debug;

/// Scope of an environment write.
///
/// The original Win32 store distinguished process, user and machine
/// targets. Portable Rust has no user or machine store, so every scope
/// resolves through the process environment, which the OS seeds from the
/// user and machine tables at launch. The scope stays in the API so
/// callers can state intent; a platform backend could honor it later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvScope {
    Process,
    #[default]
    User,
    Machine,
}

/// Read `key` from the environment, sweeping process, then user, then
/// machine scope. Empty values count as absent.
pub(crate) fn lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Whether the environment can hold this key and value at all.
/// `std::env` panics on `=`, NUL or empty keys, so the tier must reject
/// them up front.
pub(crate) fn storable(key: &str, value: Option<&str>) -> bool {
    !key.is_empty()
        && !key.contains('=')
        && !key.contains('\0')
        && !value.is_some_and(|v| v.contains('\0'))
}

/// Write or clear `key` in the environment. Callers check [`storable`]
/// first.
pub(crate) fn write(key: &str, value: Option<&str>, scope: EnvScope) {
    debug!(key, ?scope, set = value.is_some(), "Environment tier write");
    match value {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }
}
