use crate::failures::{ResourceFailure, ResourceFailuresCollector};
use crate::ingress::translate_ingresses;
use crate::l4::translate_l4_routes;
use crate::model::GatewayService;
use crate::tags::{ObjectTagGenerator, TagGenerator};
use getset::Getters;
use k8s_openapi::api::networking::v1::Ingress;
use kongress_api::v1alpha1::IngressClassParametersSpec;
use kongress_api::v1alpha2::{TCPRoute, UDPRoute};
use kongress_core::config::TranslationOptions;
use std::collections::BTreeMap;
use tracing::{info, instrument};
use typed_builder::TypedBuilder;

/// A consistent snapshot of the resources to translate in one pass.
#[derive(TypedBuilder, Getters, Debug, Clone, Default)]
pub struct TranslationInput {
    #[getset(get = "pub")]
    #[builder(default)]
    ingresses: Vec<Ingress>,

    #[getset(get = "pub")]
    #[builder(default)]
    tcp_routes: Vec<TCPRoute>,

    #[getset(get = "pub")]
    #[builder(default)]
    udp_routes: Vec<UDPRoute>,

    #[getset(get = "pub")]
    #[builder(default, setter(strip_option))]
    ingress_class_parameters: Option<IngressClassParametersSpec>,
}

#[derive(Getters, Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationResult {
    /// Gateway services keyed by their name.
    #[getset(get = "pub")]
    services: BTreeMap<String, GatewayService>,

    #[getset(get = "pub")]
    failures: Vec<ResourceFailure>,
}

impl TranslationResult {
    pub fn into_parts(self) -> (BTreeMap<String, GatewayService>, Vec<ResourceFailure>) {
        (self.services, self.failures)
    }
}

#[derive(Getters, Debug, Clone)]
pub struct Translator<T: TagGenerator = ObjectTagGenerator> {
    #[getset(get = "pub")]
    options: TranslationOptions,

    tag_generator: T,
}

impl Translator {
    pub fn new(options: TranslationOptions) -> Self {
        Self::with_tag_generator(options, ObjectTagGenerator)
    }
}

impl<T: TagGenerator> Translator<T> {
    pub fn with_tag_generator(options: TranslationOptions, tag_generator: T) -> Self {
        Self {
            options,
            tag_generator,
        }
    }

    /// Translates one snapshot. A resource that fails never prevents others from translating.
    #[instrument(skip_all, name = "translate")]
    pub fn translate(&self, input: &TranslationInput) -> TranslationResult {
        let mut failures = ResourceFailuresCollector::default();

        let legacy_regex_detection = input.ingress_class_parameters.as_ref().map_or(
            self.options.legacy_regex_detection(),
            |params| params.enable_legacy_regex_detection,
        );

        let mut services = translate_ingresses(
            &input.ingresses,
            self.options.regex_prefix(),
            legacy_regex_detection,
            self.options.expression_routes(),
            self.options.rewrite_uris(),
            &self.tag_generator,
            &mut failures,
        );

        services.extend(translate_l4_routes(
            &input.tcp_routes,
            self.options.expression_routes(),
            &self.tag_generator,
            &mut failures,
        ));
        services.extend(translate_l4_routes(
            &input.udp_routes,
            self.options.expression_routes(),
            &self.tag_generator,
            &mut failures,
        ));

        let failures = failures.pop_resource_failures();
        info!(
            "Translation pass complete: services={} routes={} failures={}",
            services.len(),
            services
                .values()
                .map(|service: &GatewayService| service.routes().len())
                .sum::<usize>(),
            failures.len()
        );

        TranslationResult { services, failures }
    }
}
