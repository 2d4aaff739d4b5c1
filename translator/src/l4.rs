//! Translation of Gateway API L4 routes (`TCPRoute`, `UDPRoute`).
//!
//! Every rule becomes its own gateway service with a single route. The route matches on the
//! destination ports of the rule's backends, either as an expression or as legacy destinations.

use crate::error::L4RouteError;
use crate::expressions::compile_port_expression;
use crate::failures::FailureReporter;
use crate::model::{GatewayRoute, GatewayService, PortDef, RouteDestination, ServiceBackend};
use crate::source::ServiceParent;
use crate::tags::TagGenerator;
use itertools::Itertools;
use kongress_api::v1alpha2::{L4RouteRule, TCPRoute, UDPRoute};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum L4Protocol {
    Tcp,
    Udp,
}

/// A route kind whose rules forward raw connections to backends.
pub trait L4Route: Resource<DynamicType = ()> + ResourceExt {
    const PROTOCOL: L4Protocol;

    fn rules(&self) -> &[L4RouteRule];
}

impl L4Route for TCPRoute {
    const PROTOCOL: L4Protocol = L4Protocol::Tcp;

    fn rules(&self) -> &[L4RouteRule] {
        &self.spec.rules
    }
}

impl L4Route for UDPRoute {
    const PROTOCOL: L4Protocol = L4Protocol::Udp;

    fn rules(&self) -> &[L4RouteRule] {
        &self.spec.rules
    }
}

struct RuleBackend {
    name: String,
    namespace: String,
    port: i32,
}

fn rule_backends(
    rule_idx: usize,
    rule: &L4RouteRule,
    route_namespace: &str,
) -> Result<Vec<RuleBackend>, L4RouteError> {
    let backend_refs = rule
        .backend_refs
        .as_deref()
        .filter(|refs| !refs.is_empty())
        .ok_or(L4RouteError::NoBackendRefs { rule: rule_idx })?;

    backend_refs
        .iter()
        .map(|backend_ref| {
            let port = backend_ref
                .port
                .ok_or_else(|| L4RouteError::MissingBackendPort {
                    rule: rule_idx,
                    backend: backend_ref.name.clone(),
                })?;
            Ok(RuleBackend {
                name: backend_ref.name.clone(),
                namespace: backend_ref
                    .namespace
                    .clone()
                    .unwrap_or_else(|| route_namespace.to_string()),
                port,
            })
        })
        .collect()
}

fn gateway_service_name<R: L4Route>(route: &R, rule_idx: usize) -> String {
    format!(
        "{}.{}.{}.{}",
        R::kind(&()).to_lowercase(),
        route.namespace().unwrap_or_default(),
        route.name_any(),
        rule_idx
    )
}

fn translate_rule<R: L4Route>(
    route: &R,
    parent: &ServiceParent,
    tags: &[String],
    rule_idx: usize,
    backends: &[RuleBackend],
    expression_routes: bool,
) -> GatewayService {
    let service_name = gateway_service_name(route, rule_idx);
    let protocols = vec![R::PROTOCOL.to_string()];

    let route_builder = GatewayRoute::builder()
        .name(format!("{service_name}.0"))
        .protocols(protocols)
        .preserve_host(true)
        .tags(tags.to_vec())
        .source(parent.source().clone());
    let gateway_route = if expression_routes {
        route_builder
            .expression(compile_port_expression(backends.iter().map(|b| b.port)))
            .build()
    } else {
        route_builder
            .destinations(
                backends
                    .iter()
                    .map(|b| RouteDestination::new(b.port))
                    .collect_vec(),
            )
            .build()
    };

    // The upstream host targets the first backend; the rest are carried as additional targets.
    let host = backends
        .first()
        .map(|b| format!("{}.{}.{}.svc", b.name, b.namespace, b.port))
        .unwrap_or_default();

    GatewayService::builder()
        .name(service_name)
        .namespace(parent.source().namespace().clone())
        .host(host)
        .protocol(R::PROTOCOL.as_ref())
        .backends(
            backends
                .iter()
                .map(|b| {
                    ServiceBackend::builder()
                        .name(b.name.clone())
                        .namespace(b.namespace.clone())
                        .port(PortDef::ByNumber(b.port))
                        .build()
                })
                .collect(),
        )
        .routes(vec![gateway_route])
        .build()
}

/// Translates L4 routes of one kind. Rules that cannot be translated are reported and skipped.
pub fn translate_l4_routes<R: L4Route>(
    routes: &[R],
    expression_routes: bool,
    tag_generator: &dyn TagGenerator,
    failures: &mut dyn FailureReporter,
) -> BTreeMap<String, GatewayService> {
    let mut services = BTreeMap::new();

    for route in routes {
        let parent = match ServiceParent::for_object(route) {
            Ok(parent) => parent,
            Err(err) => {
                warn!("Skipping {} that cannot be identified: {err}", R::kind(&()));
                continue;
            }
        };
        let tags = tag_generator.generate_tags(parent.source());

        for (rule_idx, rule) in route.rules().iter().enumerate() {
            let namespace = parent.source().namespace();
            let backends = match rule_backends(rule_idx, rule, namespace) {
                Ok(backends) => backends,
                Err(err) => {
                    failures.report(parent.source(), &err.to_string());
                    continue;
                }
            };

            let service = translate_rule(
                route,
                &parent,
                &tags,
                rule_idx,
                &backends,
                expression_routes,
            );
            debug!(
                "Translated {} rule: object.ref={} service={}",
                R::PROTOCOL,
                parent.source(),
                service.name()
            );
            services.insert(service.name().clone(), service);
        }
    }

    services
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failures::ResourceFailuresCollector;
    use crate::tags::{MockTagGenerator, ObjectTagGenerator};
    use kongress_api::v1alpha2::{BackendRef, TCPRouteSpec, UDPRouteSpec};
    use rstest::rstest;

    fn tcp_route(name: &str, rules: Vec<Vec<BackendRef>>) -> TCPRoute {
        let mut route = TCPRoute::new(
            name,
            TCPRouteSpec {
                parent_refs: None,
                rules: rules
                    .into_iter()
                    .map(|backend_refs| L4RouteRule {
                        backend_refs: Some(backend_refs),
                    })
                    .collect(),
            },
        );
        route.metadata.namespace = Some("default".to_string());
        route
    }

    fn expression_of(service: &GatewayService) -> Option<&str> {
        service.routes()[0].expression().as_deref()
    }

    fn backend_names(service: &GatewayService) -> Vec<(&str, &PortDef)> {
        service
            .backends()
            .iter()
            .map(|b| (b.name().as_str(), b.port()))
            .collect()
    }

    #[test]
    fn test_single_rule_single_backend() {
        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route("tcproute-1", vec![vec![BackendRef::service("service1", 80)]])],
            true,
            &ObjectTagGenerator,
            &mut failures,
        );

        assert_eq!(services.len(), 1);
        let service = &services["tcproute.default.tcproute-1.0"];
        assert_eq!(service.protocol(), "tcp");
        assert_eq!(service.host(), "service1.default.80.svc");
        assert_eq!(backend_names(service), vec![("service1", &PortDef::ByNumber(80))]);

        let route = &service.routes()[0];
        assert_eq!(route.name(), "tcproute.default.tcproute-1.0.0");
        assert_eq!(route.protocols(), &["tcp"]);
        assert_eq!(route.preserve_host(), Some(true));
        assert_eq!(expression_of(service), Some("net.dst.port == 80"));
        assert!(failures.is_empty());
    }

    #[test]
    fn test_single_rule_multiple_backends() {
        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route(
                "tcproute-1",
                vec![vec![
                    BackendRef::service("service1", 80),
                    BackendRef::service("service2", 443),
                ]],
            )],
            true,
            &ObjectTagGenerator,
            &mut failures,
        );

        let service = &services["tcproute.default.tcproute-1.0"];
        assert_eq!(
            backend_names(service),
            vec![
                ("service1", &PortDef::ByNumber(80)),
                ("service2", &PortDef::ByNumber(443))
            ]
        );
        assert_eq!(
            expression_of(service),
            Some("(net.dst.port == 80) || (net.dst.port == 443)")
        );
    }

    #[test]
    fn test_multiple_rules() {
        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route(
                "tcproute-1",
                vec![
                    vec![
                        BackendRef::service("service1", 80),
                        BackendRef::service("service2", 443),
                    ],
                    vec![
                        BackendRef::service("service3", 8080),
                        BackendRef::service("service4", 8443),
                    ],
                ],
            )],
            true,
            &ObjectTagGenerator,
            &mut failures,
        );

        assert_eq!(
            services.keys().collect_vec(),
            vec!["tcproute.default.tcproute-1.0", "tcproute.default.tcproute-1.1"]
        );
        let second = &services["tcproute.default.tcproute-1.1"];
        assert_eq!(second.routes()[0].name(), "tcproute.default.tcproute-1.1.0");
        assert_eq!(
            expression_of(second),
            Some("(net.dst.port == 8080) || (net.dst.port == 8443)")
        );
    }

    #[test]
    fn test_legacy_destinations() {
        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route(
                "tcproute-1",
                vec![vec![
                    BackendRef::service("service1", 80),
                    BackendRef::service("service2", 443),
                ]],
            )],
            false,
            &ObjectTagGenerator,
            &mut failures,
        );

        let route = &services["tcproute.default.tcproute-1.0"].routes()[0];
        assert!(route.expression().is_none());
        assert_eq!(
            route.destinations(),
            &[RouteDestination::new(80), RouteDestination::new(443)]
        );
    }

    #[test]
    fn test_udp_route() {
        let mut route = UDPRoute::new(
            "dns",
            UDPRouteSpec {
                parent_refs: None,
                rules: vec![L4RouteRule {
                    backend_refs: Some(vec![BackendRef::service("coredns", 53)]),
                }],
            },
        );
        route.metadata.namespace = Some("kube-system".to_string());

        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(&[route], true, &ObjectTagGenerator, &mut failures);

        let service = &services["udproute.kube-system.dns.0"];
        assert_eq!(service.protocol(), "udp");
        assert_eq!(service.routes()[0].protocols(), &["udp"]);
        assert_eq!(expression_of(service), Some("net.dst.port == 53"));
    }

    #[rstest]
    #[case(vec![], "rule 0 has no backendRefs")]
    #[case(
        vec![BackendRef { name: "service1".to_string(), ..BackendRef::default() }],
        "rule 0 backendRef service1 has no port"
    )]
    fn test_invalid_rule_is_reported(#[case] backend_refs: Vec<BackendRef>, #[case] message: &str) {
        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route(
                "tcproute-1",
                vec![backend_refs, vec![BackendRef::service("service2", 443)]],
            )],
            true,
            &ObjectTagGenerator,
            &mut failures,
        );

        assert_eq!(
            services.keys().collect_vec(),
            vec!["tcproute.default.tcproute-1.1"]
        );
        let failures = failures.pop_resource_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message(), message);
        assert_eq!(failures[0].causing_object().name(), "tcproute-1");
    }

    #[test]
    fn test_backend_namespace_override() {
        let mut backend = BackendRef::service("service1", 80);
        backend.namespace = Some("other".to_string());

        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route("tcproute-1", vec![vec![backend]])],
            true,
            &ObjectTagGenerator,
            &mut failures,
        );

        let service = &services["tcproute.default.tcproute-1.0"];
        assert_eq!(service.host(), "service1.other.80.svc");
        assert_eq!(service.backends()[0].namespace(), "other");
    }

    #[test]
    fn test_tags_are_attached_to_routes() {
        let mut tag_generator = MockTagGenerator::new();
        tag_generator
            .expect_generate_tags()
            .once()
            .returning(|source| vec![format!("k8s-kind:{}", source.kind())]);

        let mut failures = ResourceFailuresCollector::default();
        let services = translate_l4_routes(
            &[tcp_route(
                "tcproute-1",
                vec![
                    vec![BackendRef::service("service1", 80)],
                    vec![BackendRef::service("service2", 81)],
                ],
            )],
            true,
            &tag_generator,
            &mut failures,
        );

        for service in services.values() {
            assert_eq!(service.routes()[0].tags(), &["k8s-kind:TCPRoute"]);
        }
    }
}
