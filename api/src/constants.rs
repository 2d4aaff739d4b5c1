/// Per-resource override of the controller regex path prefix.
pub const REGEX_PREFIX_ANNOTATION: &str = "konghq.com/regex-prefix";

/// Upstream URI rewrite template, compiled into a request-transformer plugin.
pub const REWRITE_ANNOTATION: &str = "konghq.com/rewrite";

/// Marker the gateway itself uses for regex paths.
pub const GATEWAY_PATH_REGEX_PREFIX: &str = "~";

pub const REQUEST_TRANSFORMER_PLUGIN: &str = "request-transformer";
