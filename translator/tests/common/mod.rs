//! Shared fixtures for translator integration tests

#![allow(dead_code)]

use k8s_openapi::api::networking::v1::Ingress;
use kongress_api::v1alpha2::TCPRoute;
use kongress_core::instrumentation::init_instrumentation;

pub const INGRESSES: &str = r#"
- apiVersion: networking.k8s.io/v1
  kind: Ingress
  metadata:
    name: storefront
    namespace: shop
    uid: 0b1c2d3e
  spec:
    rules:
    - host: shop.example.com
      http:
        paths:
        - path: /cart
          pathType: Prefix
          backend:
            service:
              name: cart
              port:
                number: 8080
        - path: /checkout
          pathType: Exact
          backend:
            service:
              name: cart
              port:
                number: 8080
        - path: /catalog
          pathType: Prefix
          backend:
            service:
              name: catalog
              port:
                name: http
    - host: "*.shop.example.com"
      http:
        paths:
        - path: /
          pathType: Prefix
          backend:
            service:
              name: catalog
              port:
                name: http
- apiVersion: networking.k8s.io/v1
  kind: Ingress
  metadata:
    name: api
    namespace: shop
    annotations:
      konghq.com/regex-prefix: /re
      konghq.com/rewrite: /v2/$1
  spec:
    rules:
    - host: api.example.com
      http:
        paths:
        - path: /re/users/([0-9]+)
          pathType: ImplementationSpecific
          backend:
            service:
              name: users
              port:
                number: 80
"#;

pub const TCP_ROUTES: &str = r"
- apiVersion: gateway.networking.k8s.io/v1alpha2
  kind: TCPRoute
  metadata:
    name: tcproute-1
    namespace: default
  spec:
    rules:
    - backendRefs:
      - name: service1
        port: 80
      - name: service2
        port: 443
    - backendRefs:
      - name: service3
        port: 8080
      - name: service4
        port: 8443
";

/// Routes translator logs through the crate subscriber for suites not using `test_log`.
pub fn init_tracing() {
    init_instrumentation("kongress_translator=debug");
}

pub fn ingresses() -> Vec<Ingress> {
    serde_yaml::from_str(INGRESSES).expect("ingress fixtures should deserialize")
}

pub fn tcp_routes() -> Vec<TCPRoute> {
    serde_yaml::from_str(TCP_ROUTES).expect("TCPRoute fixtures should deserialize")
}

/// Builds an Ingress with one rule routing `path` to `service:80`.
pub fn simple_ingress(name: &str, host: &str, path: &str, service: &str) -> Ingress {
    let yaml = format!(
        r"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: {name}
  namespace: default
spec:
  rules:
  - host: {host:?}
    http:
      paths:
      - path: {path:?}
        pathType: Prefix
        backend:
          service:
            name: {service}
            port:
              number: 80
"
    );
    serde_yaml::from_str(&yaml).expect("ingress should deserialize")
}

pub fn with_annotation(mut ingress: Ingress, key: &str, value: &str) -> Ingress {
    ingress
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value.to_string());
    ingress
}
