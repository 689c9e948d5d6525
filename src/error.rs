//! Failures surfaced by the compiler passes and the encoding model.
//!
//! Malformed keyword shapes are deliberately absent: rules simply decline to
//! match them. Everything here aborts the current call.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Only JSON Schema 2020-12 is supported (base dialect is {0})")]
    UnsupportedDialect(String),

    #[error("could not determine the dialect of the schema")]
    UnknownDialect,

    #[error("could not resolve the metaschema {0}")]
    UnresolvedMetaschema(String),

    #[error("resolver failed for {id}: {message}")]
    Resolver { id: String, message: String },

    #[error("Unrecognized encoding: {0}")]
    UnrecognizedEncoding(String),

    #[error("invalid encoding at {path}: {message}")]
    InvalidEncoding { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
