use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Default, CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    kind = "IngressClassParameters",
    group = "configuration.konghq.com",
    version = "v1alpha1",
    namespaced,
    singular = "ingressclassparameters",
    plural = "ingressclassparameters"
)]
#[kube(derive = "Default")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct IngressClassParametersSpec {
    /// Treat Ingress paths that do not look like plain paths as regular expressions.
    #[serde(default)]
    pub enable_legacy_regex_detection: bool,
}
