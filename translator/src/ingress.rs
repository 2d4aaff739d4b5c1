//! Translation of Kubernetes Ingress resources into gateway services and routes.
//!
//! Ingress rules are decomposed into (host, path, backend) fragments and merged so that every
//! unique combination of
//!
//! - Ingress namespace
//! - Ingress name
//! - rule host
//! - backend Service name
//! - backend Service port
//!
//! yields exactly one gateway route, carrying all the paths of the fragments that share it.
//! Routes are grouped into gateway services by (namespace, Service, port) so Ingresses pointing
//! at the same backend share one gateway service. An Ingress requesting a URI rewrite gets its
//! own gateway service for that backend, since the rewrite plugin applies service-wide.

use crate::error::SkipReason;
use crate::expressions::compile_http_expression;
use crate::failures::FailureReporter;
use crate::model::{GatewayPlugin, GatewayRoute, GatewayService, PortDef, ServiceBackend};
use crate::paths::{PathType, RegexPrefixPolicy, compile_paths, flatten_multiple_slashes};
use crate::rewrite::rewrite_uri_plugin;
use crate::source::{ServiceParent, SourceRef};
use crate::tags::TagGenerator;
use getset::Getters;
use itertools::Itertools;
use k8s_openapi::api::networking::v1::{HTTPIngressPath, Ingress};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

const HTTP_PROTOCOLS: [&str; 2] = ["http", "https"];

/// Identifies the translation record a fragment merges into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranslationKey {
    namespace: String,
    name: String,
    host: String,
    service_name: String,
    service_port: String,
}

#[derive(Getters, Debug, Clone, PartialEq, Eq)]
pub struct IngressPath {
    #[getset(get = "pub")]
    path: String,

    #[getset(get = "pub")]
    path_type: PathType,
}

/// Everything needed to emit one gateway route and, if not yet present, its gateway service.
#[derive(Getters, Debug, Clone)]
pub struct IngressTranslationMeta {
    #[getset(get = "pub")]
    parent: ServiceParent,

    #[getset(get = "pub")]
    host: String,

    #[getset(get = "pub")]
    tags: Vec<String>,

    #[getset(get = "pub")]
    service_name: String,

    #[getset(get = "pub")]
    service_port: PortDef,

    #[getset(get = "pub")]
    paths: Vec<IngressPath>,

    #[getset(get = "pub")]
    regex_prefix_policy: RegexPrefixPolicy,
}

impl IngressTranslationMeta {
    fn source(&self) -> &SourceRef {
        self.parent.source()
    }

    pub fn gateway_service_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.source().namespace(),
            self.service_name,
            self.service_port.canonical_string()
        )
    }

    /// Name of the gateway service owned by this Ingress alone, used when it rewrites URIs.
    pub fn rewriting_gateway_service_name(&self) -> String {
        format!("{}.{}", self.gateway_service_name(), self.source().name())
    }

    pub fn gateway_route_name(&self) -> String {
        // The gateway forbids `*` in route names.
        let host = self.host.replace('*', "_");
        format!(
            "{}.{}.{}.{}.{}",
            self.source().namespace(),
            self.source().name(),
            self.service_name,
            host,
            self.service_port.canonical_string()
        )
    }

    fn translate_into_gateway_service(
        &self,
        name: String,
        plugin: Option<GatewayPlugin>,
    ) -> GatewayService {
        let namespace = self.source().namespace().clone();
        GatewayService::builder()
            .host(format!(
                "{}.{}.{}.svc",
                self.service_name,
                namespace,
                self.service_port.canonical_string()
            ))
            .name(name)
            .protocol("http")
            .path("/")
            .backends(vec![
                ServiceBackend::builder()
                    .name(self.service_name.clone())
                    .namespace(namespace.clone())
                    .port(self.service_port.clone())
                    .build(),
            ])
            .plugins(plugin.into_iter().collect())
            .namespace(namespace)
            .build()
    }

    fn compiled_paths(&self) -> Vec<String> {
        self.paths
            .iter()
            .flat_map(|path| compile_paths(path.path(), path.path_type()))
            .map(|path| self.regex_prefix_policy.apply(&path))
            .collect_vec()
    }

    fn protocols() -> Vec<String> {
        HTTP_PROTOCOLS.iter().map(ToString::to_string).collect()
    }

    pub fn translate_into_gateway_route(&self) -> GatewayRoute {
        let hosts = if self.host.is_empty() {
            vec![]
        } else {
            vec![self.host.clone()]
        };

        GatewayRoute::builder()
            .name(self.gateway_route_name())
            .paths(self.compiled_paths())
            .hosts(hosts)
            .protocols(Self::protocols())
            .strip_path(false)
            .preserve_host(true)
            .regex_priority(0)
            .request_buffering(true)
            .response_buffering(true)
            .tags(self.tags.clone())
            .source(self.source().clone())
            .build()
    }

    pub fn translate_into_gateway_expression_route(&self) -> GatewayRoute {
        let protocols = Self::protocols();
        let expression = compile_http_expression(
            &protocols,
            Some(self.host.as_str()),
            &self.compiled_paths(),
        );

        GatewayRoute::builder()
            .name(self.gateway_route_name())
            .expression(expression)
            .protocols(protocols)
            .strip_path(false)
            .preserve_host(true)
            .request_buffering(true)
            .response_buffering(true)
            .tags(self.tags.clone())
            .source(self.source().clone())
            .build()
    }
}

/// De-duplicating index of Ingress fragments for a single translation pass.
pub struct IngressTranslationIndex<'a> {
    cache: BTreeMap<TranslationKey, IngressTranslationMeta>,
    expression_routes: bool,
    rewrite_uris: bool,
    tag_generator: &'a dyn TagGenerator,
}

impl<'a> IngressTranslationIndex<'a> {
    pub fn new(
        expression_routes: bool,
        rewrite_uris: bool,
        tag_generator: &'a dyn TagGenerator,
    ) -> Self {
        Self {
            cache: BTreeMap::new(),
            expression_routes,
            rewrite_uris,
            tag_generator,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn add(&mut self, ingress: &Ingress, regex_prefix_policy: &RegexPrefixPolicy) {
        let parent = match ServiceParent::for_object(ingress) {
            Ok(parent) => parent,
            Err(err) => {
                warn!("Skipping Ingress that cannot be identified: {err}");
                return;
            }
        };
        let source = parent.source().clone();
        let tags = self.tag_generator.generate_tags(&source);

        let rules = ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_ref())
            .into_iter()
            .flatten();

        for (rule_idx, rule) in rules.enumerate() {
            let paths = rule
                .http
                .as_ref()
                .map(|http| http.paths.as_slice())
                .unwrap_or_default();
            if paths.is_empty() {
                debug!(
                    "Skipping rule: object.ref={} rule={} reason={}",
                    source,
                    rule_idx,
                    SkipReason::NoPaths
                );
                continue;
            }

            let host = rule.host.clone().unwrap_or_default();

            for (path_idx, http_path) in paths.iter().enumerate() {
                let (service_name, service_port, ingress_path) =
                    match Self::decompose_path(http_path) {
                        Ok(fragment) => fragment,
                        Err(reason) => {
                            debug!(
                                "Skipping path: object.ref={} rule={} path={} reason={}",
                                source, rule_idx, path_idx, reason
                            );
                            continue;
                        }
                    };

                let key = TranslationKey {
                    namespace: source.namespace().clone(),
                    name: source.name().clone(),
                    host: host.clone(),
                    service_name: service_name.clone(),
                    service_port: service_port.canonical_string(),
                };

                match self.cache.entry(key) {
                    Entry::Occupied(mut entry) => {
                        let meta = entry.get_mut();
                        meta.parent = parent.clone();
                        meta.paths.push(ingress_path);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(IngressTranslationMeta {
                            parent: parent.clone(),
                            host: host.clone(),
                            tags: tags.clone(),
                            service_name,
                            service_port,
                            paths: vec![ingress_path],
                            regex_prefix_policy: regex_prefix_policy.clone(),
                        });
                    }
                }
            }
        }
    }

    fn decompose_path(
        http_path: &HTTPIngressPath,
    ) -> Result<(String, PortDef, IngressPath), SkipReason> {
        let service = http_path
            .backend
            .service
            .as_ref()
            .ok_or(SkipReason::MissingServiceBackend)?;

        let path_type = PathType::parse(Some(http_path.path_type.as_str()));
        if let PathType::Unknown(path_type) = path_type {
            return Err(SkipReason::UnknownPathType(path_type));
        }

        let mut path = flatten_multiple_slashes(http_path.path.as_deref().unwrap_or_default());
        if path.is_empty() {
            path = "/".to_string();
        }

        Ok((
            service.name.clone(),
            PortDef::from_service_backend_port(service.port.as_ref()),
            IngressPath { path, path_type },
        ))
    }

    /// Consumes the index, emitting one gateway service per (namespace, Service, port).
    ///
    /// An Ingress whose rewrite cannot be honored contributes no routes and is reported once.
    pub fn translate(self, failures: &mut dyn FailureReporter) -> BTreeMap<String, GatewayService> {
        let mut services: BTreeMap<String, GatewayService> = BTreeMap::new();
        let mut failed = BTreeSet::new();

        for meta in self.cache.values() {
            let plugin = match rewrite_uri_plugin(meta.parent(), self.rewrite_uris) {
                Ok(plugin) => plugin,
                Err(err) => {
                    if failed.insert(meta.source().clone()) {
                        failures.report(meta.source(), &err.to_string());
                    }
                    continue;
                }
            };

            let service_name = if plugin.is_some() {
                meta.rewriting_gateway_service_name()
            } else {
                meta.gateway_service_name()
            };
            let route = if self.expression_routes {
                meta.translate_into_gateway_expression_route()
            } else {
                meta.translate_into_gateway_route()
            };

            services
                .entry(service_name)
                .or_insert_with_key(|name| {
                    meta.translate_into_gateway_service(name.clone(), plugin)
                })
                .routes_mut()
                .push(route);
        }

        services
    }
}

/// Translates a snapshot of Ingresses into gateway services keyed by service name.
pub fn translate_ingresses(
    ingresses: &[Ingress],
    default_regex_prefix: &str,
    legacy_regex_detection: bool,
    expression_routes: bool,
    rewrite_uris: bool,
    tag_generator: &dyn TagGenerator,
    failures: &mut dyn FailureReporter,
) -> BTreeMap<String, GatewayService> {
    let mut index = IngressTranslationIndex::new(expression_routes, rewrite_uris, tag_generator);
    for ingress in ingresses {
        let policy =
            RegexPrefixPolicy::for_ingress(ingress, default_regex_prefix, legacy_regex_detection);
        index.add(ingress, &policy);
    }

    let records = index.len();
    let services = index.translate(failures);
    info!(
        "Translated Ingresses: ingresses={} records={} services={}",
        ingresses.len(),
        records,
        services.len()
    );
    services
}
