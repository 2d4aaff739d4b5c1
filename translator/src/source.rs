use getset::Getters;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use typed_builder::TypedBuilder;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceRefError {
    #[error("Object is missing a name")]
    MissingName,
}

/// Identity of the Kubernetes object a piece of gateway configuration was derived from.
#[derive(TypedBuilder, Getters, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRef {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    kind: String,

    #[getset(get = "pub")]
    #[builder(default, setter(into))]
    group: Option<String>,

    #[getset(get = "pub")]
    #[builder(default, setter(into))]
    version: Option<String>,

    #[getset(get = "pub")]
    #[builder(default, setter(into))]
    namespace: String,

    #[getset(get = "pub")]
    #[builder(setter(into))]
    name: String,

    #[getset(get = "pub")]
    #[builder(default, setter(into))]
    uid: Option<String>,
}

impl Display for SourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

impl SourceRef {
    pub fn for_object<K: Resource + ResourceExt>(object: &K) -> Result<Self, SourceRefError>
    where
        K::DynamicType: 'static + Default,
    {
        let dynamic_type = K::DynamicType::default();
        let group = K::group(&dynamic_type);
        let name = object
            .meta()
            .name
            .clone()
            .ok_or(SourceRefError::MissingName)?;

        Ok(Self::builder()
            .kind(K::kind(&dynamic_type))
            .group((!group.is_empty()).then(|| group.to_string()))
            .version(Some(K::version(&dynamic_type).to_string()))
            .namespace(object.namespace().unwrap_or_default())
            .name(name)
            .uid(object.uid())
            .build())
    }
}

/// The owning object of a gateway service, carried so later stages can read its annotations.
#[derive(TypedBuilder, Getters, Clone, Debug, PartialEq, Eq)]
pub struct ServiceParent {
    #[getset(get = "pub")]
    source: SourceRef,

    #[getset(get = "pub")]
    #[builder(default)]
    annotations: BTreeMap<String, String>,
}

impl ServiceParent {
    pub fn for_object<K: Resource + ResourceExt>(object: &K) -> Result<Self, SourceRefError>
    where
        K::DynamicType: 'static + Default,
    {
        Ok(Self {
            source: SourceRef::for_object(object)?,
            annotations: object.annotations().clone(),
        })
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}
