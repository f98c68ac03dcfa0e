use indexmap::IndexMap;
use tracing::{debug, warn};
use url::Url;
use wsdl2swagger_wsdl::{
    types::{self as wsdl, NamespacedName, SoapVersion},
    WsdlEntry,
};

use super::{
    document::{
        Configuration, Document, Info, Operation, Parameter, PathItem, Response, Schema,
        SoapOperation, WsdlDefinition, Xml,
    },
    error::Error,
    preprocessor,
    schema::{element_definition, Context, DefinitionNames, ToSchema},
    types,
};

const SOAP11_ENVELOPE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP12_ENVELOPE: &str = "http://www.w3.org/2003/05/soap-envelope";

struct OperationNames {
    /// Unique among the service's operations; also the path key and `operationId`.
    path: String,
    input: String,
    output: Option<String>,
    fault: Option<String>,
}

struct Endpoint {
    host: Option<String>,
    base_path: Option<String>,
    schemes: Vec<String>,
}

fn envelope_namespace(version: SoapVersion) -> &'static str {
    match version {
        SoapVersion::V11 => SOAP11_ENVELOPE,
        SoapVersion::V12 => SOAP12_ENVELOPE,
    }
}

fn content_type(version: SoapVersion) -> &'static str {
    match version {
        SoapVersion::V11 => "text/xml",
        SoapVersion::V12 => "application/soap+xml",
    }
}

fn soapenv(version: SoapVersion) -> Xml {
    Xml {
        prefix: Some("soapenv".to_owned()),
        ..Xml::namespaced(envelope_namespace(version))
    }
}

fn ibm_name(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

fn choose_port(service: &types::Service) -> Option<&types::Port> {
    service
        .ports
        .iter()
        .find(|port| port.soap_version == SoapVersion::V11)
        .or_else(|| service.ports.first())
}

fn endpoint(location: Option<&str>) -> Endpoint {
    let url = location.and_then(|location| match Url::parse(location) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(%location, %err, "unable to parse port address");
            None
        }
    });

    match url {
        Some(url) => Endpoint {
            host: url.host_str().map(|host| match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_owned(),
            }),
            base_path: Some(url.path().to_owned()).filter(|path| !path.is_empty()),
            schemes: vec![url.scheme().to_owned()],
        },

        None => Endpoint {
            host: None,
            base_path: None,
            schemes: Vec::new(),
        },
    }
}

fn object(properties: Vec<(&str, Schema)>) -> Schema {
    let required = properties.iter().map(|(name, _)| name.to_string()).collect();
    let properties = properties
        .into_iter()
        .map(|(name, schema)| (name.to_owned(), schema))
        .collect();

    Schema::object(properties, required)
}

fn envelope(version: SoapVersion, body: Schema) -> Schema {
    object(vec![(
        "Envelope",
        object(vec![("Body", body.with_xml(soapenv(version)))]).with_xml(soapenv(version)),
    )])
}

fn message_body(
    message: Option<&NamespacedName>,
    definition: &wsdl::Definition,
    context: &Context<'_>,
) -> Schema {
    let parts: &[wsdl::Field] = match message.map(|name| (name, definition.find_message(name))) {
        Some((_, Some(message))) => message.parts.as_slice(),
        Some((name, None)) => {
            warn!(message = %name.name, "unresolved message reference");
            &[]
        }
        None => &[],
    };

    let properties = parts
        .iter()
        .map(|part| {
            let key = match &part.ty {
                wsdl::FieldKind::Ref(element) => element.name.clone(),
                _ => part.name.name.clone(),
            };

            (key, part.to_schema(context))
        })
        .collect::<IndexMap<_, _>>();
    let required = properties.keys().cloned().collect();

    Schema::object(properties, required)
}

fn fault_body(
    version: SoapVersion,
    faults: &[wsdl::Fault],
    definition: &wsdl::Definition,
    context: &Context<'_>,
) -> Schema {
    let mut detail = IndexMap::new();

    for fault in faults {
        let body = message_body(Some(&fault.message), definition, context);
        detail.extend(body.properties);
    }

    let string = || Schema::primitive("string", None);
    let detail = Schema::object(detail, Vec::new());

    let fault = match version {
        SoapVersion::V11 => {
            let mut fault = object(vec![("faultcode", string()), ("faultstring", string())]);
            fault.properties.insert("faultactor".to_owned(), string());
            fault.properties.insert("detail".to_owned(), detail);
            fault
        }

        SoapVersion::V12 => {
            let mut fault = object(vec![
                ("Code", object(vec![("Value", string())])),
                ("Reason", object(vec![("Text", string())])),
            ]);
            fault.properties.insert("Detail".to_owned(), detail);
            fault
        }
    };

    object(vec![("Fault", fault.with_xml(soapenv(version)))])
}

fn operation(
    resolved: &types::Operation,
    names: &OperationNames,
    context: &Context<'_>,
) -> Operation {
    let wsdl_operation = &resolved.operation;
    let name = &wsdl_operation.name;

    let mut responses = IndexMap::new();
    responses.insert(
        "200".to_owned(),
        Response {
            description: "OK".to_owned(),
            schema: names.output.as_deref().map(Schema::reference_to),
        },
    );

    if let Some(fault) = &names.fault {
        responses.insert(
            "500".to_owned(),
            Response {
                description: "Fault".to_owned(),
                schema: Some(Schema::reference_to(fault)),
            },
        );
    }

    Operation {
        operation_id: names.path.clone(),
        summary: Some(format!("Operation {}", name.name)),
        description: wsdl_operation.documentation.clone(),
        soap: Some(SoapOperation {
            action: resolved.action.clone(),
            operation: format!("{{{}}}{}", name.namespace(context.namespaces()), name.name),
        }),
        parameters: vec![Parameter {
            name: "body".to_owned(),
            location: "body".to_owned(),
            required: true,
            schema: Some(Schema::reference_to(&names.input)),
        }],
        responses,
    }
}

pub fn generate(entry: &WsdlEntry, service: &str, wsdl_id: &str) -> Result<Document, Error> {
    let definition = &entry.definition;
    let resolved_service = preprocessor::preprocess(definition, service)?;
    let port = choose_port(&resolved_service).ok_or_else(|| Error::NoSoapPort(service.to_owned()))?;
    let version = port.soap_version;

    debug!(
        service,
        port = %port.name.name,
        soap_version = version.as_str(),
        operations = port.operations.len(),
        "generating swagger"
    );

    let mut names = DefinitionNames::default();
    let mut path_names = DefinitionNames::default();
    let operation_names: Vec<_> = port
        .operations
        .iter()
        .map(|resolved| {
            let operation = &resolved.operation;
            let name = &operation.name.name;
            let path = path_names.claim(name);

            if &path != name {
                warn!(operation = %name, path = %path, "operation name declared more than once");
            }

            OperationNames {
                path,
                input: names.claim(&format!("{}Input", name)),
                output: operation
                    .output
                    .as_ref()
                    .map(|_| names.claim(&format!("{}Output", name))),
                fault: (!operation.faults.is_empty())
                    .then(|| names.claim(&format!("{}Fault", name))),
            }
        })
        .collect();

    let context = Context::new(definition, &entry.namespaces, &mut names);

    let mut paths = IndexMap::new();
    let mut definitions = IndexMap::new();

    for (resolved, claimed) in port.operations.iter().zip(&operation_names) {
        let wsdl_operation = &resolved.operation;

        definitions.insert(
            claimed.input.clone(),
            envelope(
                version,
                message_body(wsdl_operation.input.as_ref(), definition, &context),
            ),
        );

        if let Some(output) = &claimed.output {
            definitions.insert(
                output.clone(),
                envelope(
                    version,
                    message_body(wsdl_operation.output.as_ref(), definition, &context),
                ),
            );
        }

        if let Some(fault) = &claimed.fault {
            definitions.insert(
                fault.clone(),
                envelope(
                    version,
                    fault_body(version, &wsdl_operation.faults, definition, &context),
                ),
            );
        }

        paths.insert(
            format!("/{}", claimed.path),
            PathItem {
                post: Some(operation(resolved, claimed, &context)),
            },
        );
    }

    for element in &definition.elements {
        if let Some(name) = context.element_name(&element.name) {
            definitions.insert(name.to_owned(), element_definition(element, &context));
        }
    }

    for ty in &definition.types {
        if let Some(name) = context.type_name(&ty.name) {
            definitions.insert(name.to_owned(), ty.to_schema(&context));
        }
    }

    let endpoint = endpoint(port.location.as_deref());
    let media_type = content_type(version).to_owned();

    Ok(Document {
        swagger: "2.0".to_owned(),
        info: Info {
            title: resolved_service.name.name.clone(),
            description: resolved_service.documentation.clone(),
            version: "1.0.0".to_owned(),
            name: Some(ibm_name(&resolved_service.name.name)),
        },
        host: endpoint.host,
        base_path: endpoint.base_path,
        schemes: endpoint.schemes,
        consumes: vec![media_type.clone()],
        produces: vec![media_type],
        paths,
        definitions,
        configuration: Some(Configuration {
            kind: "wsdl".to_owned(),
            wsdl_definition: WsdlDefinition {
                wsdl: wsdl_id.to_owned(),
                service: resolved_service.name.name.clone(),
                port: port.name.name.clone(),
                soap_version: version.as_str().to_owned(),
            },
        }),
    })
}
