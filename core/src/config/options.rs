use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use typed_builder::TypedBuilder;

/// Regex path prefix used when a resource does not override it.
pub const DEFAULT_REGEX_PREFIX: &str = "/~";

fn default_regex_prefix() -> String {
    DEFAULT_REGEX_PREFIX.to_string()
}

/// Feature toggles for a single translation run.
#[derive(
    Validate,
    TypedBuilder,
    Getters,
    CopyGetters,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TranslationOptions {
    /// Emit expression based routes instead of path/host lists.
    #[getset(get_copy = "pub")]
    #[serde(default)]
    #[builder(default)]
    expression_routes: bool,

    /// Allow resources to request upstream URI rewrites.
    #[getset(get_copy = "pub")]
    #[serde(default)]
    #[builder(default)]
    rewrite_uris: bool,

    /// Treat paths that would not pass as plain paths as regular expressions.
    #[getset(get_copy = "pub")]
    #[serde(default)]
    #[builder(default)]
    legacy_regex_detection: bool,

    #[getset(get = "pub")]
    #[serde(default = "default_regex_prefix")]
    #[builder(default = default_regex_prefix(), setter(into))]
    #[validate(min_length = 1)]
    regex_prefix: String,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}
