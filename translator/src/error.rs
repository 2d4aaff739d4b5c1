use crate::rewrite::RewriteUriError;
use thiserror::Error;

/// A failure scoped to a single source resource. Other resources in the pass are unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Malformed rewrite template: {0}")]
    MalformedTemplate(#[from] RewriteUriError),

    #[error("{annotation} annotation not supported when rewrite uris disabled")]
    FeatureDisabled { annotation: &'static str },
}

/// Why a fragment of a resource was left out of the translated configuration.
///
/// Skips are logged and never reported as resource failures; admission is expected to have
/// rejected such input before it reaches the translator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("backend does not reference a Service")]
    MissingServiceBackend,

    #[error("unsupported path type {0:?}")]
    UnknownPathType(String),

    #[error("rule has no HTTP paths")]
    NoPaths,
}

/// Reasons an L4 route rule cannot be translated. Reported as per-resource failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum L4RouteError {
    #[error("rule {rule} has no backendRefs")]
    NoBackendRefs { rule: usize },

    #[error("rule {rule} backendRef {backend} has no port")]
    MissingBackendPort { rule: usize, backend: String },
}
