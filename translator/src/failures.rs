use crate::source::SourceRef;
use getset::Getters;
use std::mem;
use tracing::warn;

/// Why a resource produced no (or only partial) gateway configuration.
#[derive(Getters, Debug, Clone, PartialEq, Eq)]
pub struct ResourceFailure {
    #[getset(get = "pub")]
    causing_object: SourceRef,

    #[getset(get = "pub")]
    message: String,
}

impl ResourceFailure {
    pub fn new<S: Into<String>>(causing_object: SourceRef, message: S) -> Self {
        Self {
            causing_object,
            message: message.into(),
        }
    }
}

pub trait FailureReporter {
    fn report(&mut self, causing_object: &SourceRef, message: &str);
}

#[derive(Default, Debug)]
pub struct ResourceFailuresCollector {
    failures: Vec<ResourceFailure>,
}

impl ResourceFailuresCollector {
    pub fn push_resource_failure<S: Into<String>>(
        &mut self,
        message: S,
        causing_object: SourceRef,
    ) {
        let failure = ResourceFailure::new(causing_object, message);
        warn!(
            "Resource failed to translate: object.ref={} message={}",
            failure.causing_object(),
            failure.message()
        );
        self.failures.push(failure);
    }

    /// Returns the collected failures, leaving the collector empty.
    pub fn pop_resource_failures(&mut self) -> Vec<ResourceFailure> {
        mem::take(&mut self.failures)
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl FailureReporter for ResourceFailuresCollector {
    fn report(&mut self, causing_object: &SourceRef, message: &str) {
        self.push_resource_failure(message, causing_object.clone());
    }
}
