use orca_error::RegistryError;

/// Failures of the server itself, as opposed to request-level errors,
/// which become JSON replies.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid argument `{arg}`: {reason}")]
    InvalidArg { arg: String, reason: String },

    #[error("code table rejected: {0}")]
    Registry(#[from] RegistryError),

    #[error("demo menus rejected: {0}")]
    Seed(#[from] orca_error::Error),

    #[error("cannot bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("request exceeds {0} bytes")]
    TooLarge(usize),
}
