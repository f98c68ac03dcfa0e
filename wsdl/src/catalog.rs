use tracing::warn;

use super::types::{Definition, Namespaces};

/// One parsed root document together with everything it imports.
#[derive(Debug, Clone)]
pub struct WsdlEntry {
    pub filename: String,
    pub definition: Definition,
    pub namespaces: Namespaces,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceDescriptor {
    pub service: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<WsdlEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<WsdlEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[WsdlEntry] {
        &self.entries
    }

    /// Every service of every entry, in load order.
    pub fn services(&self) -> Vec<ServiceDescriptor> {
        let services: Vec<_> = self
            .entries
            .iter()
            .flat_map(|entry| {
                entry
                    .definition
                    .services
                    .iter()
                    .map(move |service| ServiceDescriptor {
                        service: service.name.name.clone(),
                        filename: entry.filename.clone(),
                    })
            })
            .collect();

        for (index, descriptor) in services.iter().enumerate() {
            if let Some(first) = services[..index]
                .iter()
                .find(|other| other.service == descriptor.service)
            {
                warn!(
                    service = %descriptor.service,
                    first = %first.filename,
                    duplicate = %descriptor.filename,
                    "service defined more than once"
                );
            }
        }

        services
    }

    /// Entry a descriptor was enumerated from, falling back to the first entry
    /// defining the service when no entry carries the descriptor's filename.
    pub fn find_entry(&self, descriptor: &ServiceDescriptor) -> Option<&WsdlEntry> {
        self.entries
            .iter()
            .find(|entry| {
                entry.filename == descriptor.filename
                    && entry.definition.find_service(&descriptor.service).is_some()
            })
            .or_else(|| self.find_wsdl_for_service(&descriptor.service))
    }

    /// First entry that defines a service called `name`.
    pub fn find_wsdl_for_service(&self, name: &str) -> Option<&WsdlEntry> {
        self.entries
            .iter()
            .find(|entry| entry.definition.find_service(name).is_some())
    }
}
