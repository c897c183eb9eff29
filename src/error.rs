use thiserror::Error;

/// Errors raised when a configuration or CLI string does not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unknown name policy `{0}`, expected one of: drop, placeholder")]
    NamePolicy(String),
    #[error("unsupported locale `{0}`, expected one of: en-US, en-GB, de, fr, es")]
    Locale(String),
    #[error("unknown library format `{0}`, expected one of: csv, vcard")]
    Format(String),
}
