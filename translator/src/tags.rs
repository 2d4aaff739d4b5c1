use crate::source::SourceRef;

/// Produces the tags attached to gateway objects derived from a source object.
#[cfg_attr(test, mockall::automock)]
pub trait TagGenerator {
    fn generate_tags(&self, source: &SourceRef) -> Vec<String>;
}

/// Tags gateway objects with the identity of the Kubernetes object they came from.
#[derive(Default, Debug, Clone, Copy)]
pub struct ObjectTagGenerator;

impl TagGenerator for ObjectTagGenerator {
    fn generate_tags(&self, source: &SourceRef) -> Vec<String> {
        [
            ("k8s-name", Some(source.name().as_str())),
            ("k8s-namespace", Some(source.namespace().as_str())),
            ("k8s-kind", Some(source.kind().as_str())),
            ("k8s-uid", source.uid().as_deref()),
            ("k8s-group", source.group().as_deref()),
            ("k8s-version", source.version().as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|value| !value.is_empty())
                .map(|value| format!("{key}:{value}"))
        })
        .collect()
    }
}
