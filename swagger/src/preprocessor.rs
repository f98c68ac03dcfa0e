use tracing::debug;
use wsdl2swagger_wsdl::types as wsdl;

use super::{error::Error, types};

/// Resolves every SOAP port of `service` through its binding to its port type.
pub fn preprocess(definition: &wsdl::Definition, service: &str) -> Result<types::Service, Error> {
    let service = definition
        .find_service(service)
        .ok_or_else(|| Error::UnknownService(service.to_owned()))?;

    let mut ports = Vec::new();

    for port in &service.ports {
        let binding = definition
            .find_binding(&port.binding)
            .ok_or_else(|| Error::UnknownBinding {
                port: port.name.name.clone(),
                binding: port.binding.name.clone(),
            })?;

        let soap_version = if let Some(version) = binding.soap_version.or(port.soap_version) {
            version
        } else {
            debug!(port = %port.name.name, "skipping non-SOAP port");
            continue;
        };

        let port_type = definition
            .find_port_type(&binding.ty)
            .ok_or_else(|| Error::UnknownPortType {
                binding: binding.name.name.clone(),
                port_type: binding.ty.name.clone(),
            })?;

        let operations = port_type
            .operations
            .iter()
            .map(|operation| types::Operation {
                operation: operation.clone(),
                action: binding
                    .operations
                    .iter()
                    .find(|bound| bound.name.name == operation.name.name)
                    .and_then(|bound| bound.action.clone()),
            })
            .collect();

        ports.push(types::Port {
            name: port.name.clone(),
            location: port.location.clone(),
            soap_version,
            operations,
        });
    }

    Ok(types::Service {
        name: service.name.clone(),
        documentation: service.documentation.clone(),
        ports,
    })
}
