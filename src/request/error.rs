use thiserror::Error;

/// Error returned while turning command-line flags into a build-run request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A `KEY=VALUE` flag without `=` or with an empty key.
    #[error("invalid key-value pair {input:?}: expected KEY=VALUE")]
    InvalidKeyValue {
        /// The raw flag value.
        input: String,
    },
}
