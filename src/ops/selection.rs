//! Backend selection from the environment.
//!
//! Names are not validated here; an unsupported name fails later, in
//! [`BackendRegistry::resolve`](crate::builder::BackendRegistry::resolve).

use crate::builder::BackendId;

/// Environment variable listing the backends to build, comma-delimited.
pub const BACKEND_ENV: &str = "STAN_BACKEND";

/// Read the selection list from `STAN_BACKEND`.
pub fn select() -> Vec<String> {
    let value = std::env::var_os(BACKEND_ENV).map(|v| v.to_string_lossy().into_owned());
    select_from(value.as_deref())
}

/// Build the selection list from a configuration value.
///
/// `None` selects the default backend. Any present value is split on `,`
/// with order and duplicates kept and nothing trimmed, so `""` yields one
/// empty name.
pub fn select_from(value: Option<&str>) -> Vec<String> {
    match value {
        None => vec![BackendId::DEFAULT.as_str().to_string()],
        Some(value) => value.split(',').map(str::to_string).collect(),
    }
}
