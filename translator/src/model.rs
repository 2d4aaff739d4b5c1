use crate::source::SourceRef;
use getset::{CopyGetters, Getters, MutGetters};
use k8s_openapi::api::networking::v1::ServiceBackendPort;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use typed_builder::TypedBuilder;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_RETRIES: u32 = 5;

/// Milliseconds the gateway waits on upstream connect, read and write by default.
pub const DEFAULT_SERVICE_TIMEOUT_MS: u32 = 60_000;

const IMPLICIT_PORT_NAME: &str = "default";

/// How a backend port was referenced by the source resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "camelCase")]
pub enum PortDef {
    ByNumber(i32),
    ByName(String),
    Implicit,
}

impl PortDef {
    pub fn from_service_backend_port(port: Option<&ServiceBackendPort>) -> Self {
        match port {
            Some(ServiceBackendPort {
                name: Some(name), ..
            }) if !name.is_empty() => Self::ByName(name.clone()),
            Some(ServiceBackendPort {
                number: Some(number),
                ..
            }) if *number != 0 => Self::ByNumber(*number),
            _ => Self::Implicit,
        }
    }

    /// Stable textual form used in aggregation keys and derived object names.
    pub fn canonical_string(&self) -> String {
        match self {
            Self::ByNumber(number) => number.to_string(),
            Self::ByName(name) => name.clone(),
            Self::Implicit => IMPLICIT_PORT_NAME.to_string(),
        }
    }
}

impl Display for PortDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

#[derive(TypedBuilder, Getters, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBackend {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    name: String,

    #[getset(get = "pub")]
    #[builder(setter(into))]
    namespace: String,

    #[getset(get = "pub")]
    port: PortDef,
}

#[derive(TypedBuilder, Getters, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPlugin {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    name: String,

    #[getset(get = "pub")]
    config: serde_json::Value,
}

/// A port the gateway listens on for an L4 route in the legacy route shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
pub struct RouteDestination {
    #[getset(get_copy = "pub")]
    port: i32,
}

impl RouteDestination {
    pub fn new(port: i32) -> Self {
        Self { port }
    }
}

#[derive(TypedBuilder, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRoute {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    name: String,

    #[getset(get = "pub")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    paths: Vec<String>,

    #[getset(get = "pub")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    hosts: Vec<String>,

    #[getset(get = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    expression: Option<String>,

    #[getset(get = "pub")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    destinations: Vec<RouteDestination>,

    #[getset(get = "pub")]
    protocols: Vec<String>,

    #[getset(get_copy = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    strip_path: Option<bool>,

    #[getset(get_copy = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    preserve_host: Option<bool>,

    #[getset(get_copy = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    regex_priority: Option<i32>,

    #[getset(get_copy = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    request_buffering: Option<bool>,

    #[getset(get_copy = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    response_buffering: Option<bool>,

    #[getset(get = "pub")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    tags: Vec<String>,

    #[getset(get = "pub")]
    #[serde(skip)]
    #[builder(default, setter(strip_option))]
    source: Option<SourceRef>,
}

#[derive(
    TypedBuilder,
    Getters,
    MutGetters,
    CopyGetters,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub struct GatewayService {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    name: String,

    #[getset(get = "pub")]
    #[serde(skip)]
    #[builder(setter(into))]
    namespace: String,

    #[getset(get = "pub")]
    #[builder(setter(into))]
    host: String,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_HTTP_PORT)]
    port: u16,

    #[getset(get = "pub")]
    #[builder(setter(into))]
    protocol: String,

    #[getset(get = "pub")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    path: Option<String>,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_SERVICE_TIMEOUT_MS)]
    connect_timeout: u32,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_SERVICE_TIMEOUT_MS)]
    read_timeout: u32,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_SERVICE_TIMEOUT_MS)]
    write_timeout: u32,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_RETRIES)]
    retries: u32,

    #[getset(get = "pub")]
    #[serde(default)]
    #[builder(default)]
    backends: Vec<ServiceBackend>,

    #[getset(get = "pub", get_mut = "pub")]
    #[serde(default)]
    #[builder(default)]
    routes: Vec<GatewayRoute>,

    #[getset(get = "pub", get_mut = "pub")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    plugins: Vec<GatewayPlugin>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, PortDef::Implicit, "default")]
    #[case(Some(ServiceBackendPort { name: None, number: Some(80) }), PortDef::ByNumber(80), "80")]
    #[case(
        Some(ServiceBackendPort { name: Some("http".to_string()), number: None }),
        PortDef::ByName("http".to_string()),
        "http"
    )]
    #[case(
        Some(ServiceBackendPort { name: Some(String::new()), number: Some(0) }),
        PortDef::Implicit,
        "default"
    )]
    fn test_port_def_from_service_backend_port(
        #[case] port: Option<ServiceBackendPort>,
        #[case] expected: PortDef,
        #[case] canonical: &str,
    ) {
        let port_def = PortDef::from_service_backend_port(port.as_ref());
        assert_eq!(port_def, expected);
        assert_eq!(port_def.canonical_string(), canonical);
        assert_eq!(port_def.to_string(), canonical);
    }

    #[test]
    fn test_gateway_service_defaults() {
        let service = GatewayService::builder()
            .name("default.foo-svc.80")
            .namespace("default")
            .host("foo-svc.default.80.svc")
            .protocol("http")
            .path("/")
            .build();

        assert_eq!(service.port(), 80);
        assert_eq!(service.connect_timeout(), 60_000);
        assert_eq!(service.read_timeout(), 60_000);
        assert_eq!(service.write_timeout(), 60_000);
        assert_eq!(service.retries(), 5);
        assert!(service.routes().is_empty());
    }

    #[test]
    fn test_gateway_route_serialization_omits_unset_fields() {
        let route = GatewayRoute::builder()
            .name("tcproute.default.tcproute-1.0.0")
            .expression("net.dst.port == 80")
            .protocols(vec!["tcp".to_string()])
            .preserve_host(true)
            .build();

        let value = serde_json::to_value(&route).expect("route should serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "name": "tcproute.default.tcproute-1.0.0",
                "expression": "net.dst.port == 80",
                "protocols": ["tcp"],
                "preserve_host": true,
            })
        );
    }
}
