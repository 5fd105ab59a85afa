pub(crate) const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_LOG_FILE: &str = "volley.log";

pub(crate) const DEFAULT_REFRESH_MS: &str = "25";
