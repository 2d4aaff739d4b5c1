//! Compilation of Ingress paths into gateway path patterns.
//!
//! Plain prefix patterns are emitted before regex patterns for the same input because the
//! gateway evaluates them in that order when priorities tie.

use getset::{CopyGetters, Getters};
use k8s_openapi::api::networking::v1::Ingress;
use kongress_api::constants::{GATEWAY_PATH_REGEX_PREFIX, REGEX_PREFIX_ANNOTATION};
use kube::ResourceExt;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use strum::EnumString;
use typed_builder::TypedBuilder;

/// Characters the gateway's legacy router accepted in a plain, non-regex path.
// The pattern is a constant; failing to compile it is a programming error.
#[allow(clippy::expect_used)]
static LEGACY_PLAIN_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.\-_~/%]*$").expect("Legacy plain path pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString)]
pub enum PathType {
    Prefix,
    Exact,
    ImplementationSpecific,
    #[strum(default)]
    Unknown(String),
}

impl PathType {
    /// Parses a Kubernetes path type, treating an unset value as `ImplementationSpecific`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::ImplementationSpecific,
            Some(value) => {
                Self::from_str(value).unwrap_or_else(|_| Self::Unknown(value.to_string()))
            }
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Compiles one path and path type into the gateway patterns that satisfy it.
///
/// Unknown path types produce no patterns. Kubernetes admission rejects them already, so
/// callers only need to tolerate the empty result.
pub fn compile_paths(path: &str, path_type: &PathType) -> Vec<String> {
    let mut route_paths = vec![];
    let mut route_regex_paths = vec![];

    match path_type {
        PathType::Prefix => {
            let base = path.trim_matches('/');
            if base.is_empty() {
                route_paths.push("/".to_string());
            } else {
                route_paths.push(format!("/{base}/"));
                route_regex_paths.push(format!("{GATEWAY_PATH_REGEX_PREFIX}/{base}$"));
            }
        }
        PathType::Exact => {
            let relative = path.trim_start_matches('/');
            route_regex_paths.push(format!("{GATEWAY_PATH_REGEX_PREFIX}/{relative}$"));
        }
        PathType::ImplementationSpecific => {
            if path.is_empty() {
                route_paths.push("/".to_string());
            } else {
                route_paths.push(path.to_string());
            }
        }
        PathType::Unknown(_) => return vec![],
    }

    route_paths.extend(route_regex_paths);
    route_paths
}

/// Collapses runs of `/` into a single separator.
pub fn flatten_multiple_slashes(path: &str) -> String {
    let mut flattened = String::with_capacity(path.len());
    let mut previous_was_slash = false;
    for c in path.chars() {
        if c == '/' && previous_was_slash {
            continue;
        }
        previous_was_slash = c == '/';
        flattened.push(c);
    }
    flattened
}

/// Rewrites a path into the gateway regex form when it is marked (or detected) as a regex.
///
/// A path beginning with `controller_prefix` has that prefix swapped for the gateway marker.
/// Otherwise, with the legacy heuristic on, any path containing characters outside the
/// plain path set gets the marker prepended unless it already carries it.
pub fn maybe_prepend_regex_prefix(
    path: &str,
    controller_prefix: &str,
    apply_legacy_heuristic: bool,
) -> String {
    if let Some(rest) = path.strip_prefix(controller_prefix) {
        return format!("{GATEWAY_PATH_REGEX_PREFIX}{rest}");
    }

    if apply_legacy_heuristic
        && !LEGACY_PLAIN_PATH.is_match(path)
        && !path.starts_with(GATEWAY_PATH_REGEX_PREFIX)
    {
        return format!("{GATEWAY_PATH_REGEX_PREFIX}{path}");
    }

    path.to_string()
}

/// Regex prefix handling in effect for every path of one source resource.
#[derive(TypedBuilder, Getters, CopyGetters, Debug, Clone, PartialEq, Eq)]
pub struct RegexPrefixPolicy {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    prefix: String,

    #[getset(get_copy = "pub")]
    #[builder(default)]
    legacy_heuristic: bool,
}

impl RegexPrefixPolicy {
    /// Uses the Ingress regex prefix annotation when present and non-empty, else `default_prefix`.
    pub fn for_ingress(ingress: &Ingress, default_prefix: &str, legacy_heuristic: bool) -> Self {
        let prefix = ingress
            .annotations()
            .get(REGEX_PREFIX_ANNOTATION)
            .filter(|prefix| !prefix.is_empty())
            .map_or(default_prefix, String::as_str);

        Self::builder()
            .prefix(prefix)
            .legacy_heuristic(legacy_heuristic)
            .build()
    }

    pub fn apply(&self, path: &str) -> String {
        maybe_prepend_regex_prefix(path, &self.prefix, self.legacy_heuristic)
    }
}
