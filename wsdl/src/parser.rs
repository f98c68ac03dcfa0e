use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::{HashMap, HashSet},
    io::{BufRead, BufReader},
    mem,
};
use tracing::{debug, trace, warn};
use url::Url;

use super::{
    catalog::WsdlEntry,
    error,
    types::{
        Binding, BindingOperation, Definition, Fault, Field, FieldKind, Message, NamespacedName,
        Namespaces, Occurs, Operation, Port, PortType, Service, SoapVersion, Type, TypeKind,
        XSD_NAMESPACE,
    },
};

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], error::Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                let value = attribute.unescaped_value()?;
                result[index] = Some(reader.decode(value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn required(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, error::Error> {
    value.ok_or(error::Error::MissingAttribute { element, attribute })
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, prefixed_name),
    }
}

fn parse_occurs(min: Option<String>, max: Option<String>) -> Occurs {
    let default = Occurs::default();

    Occurs {
        min: min
            .and_then(|min| min.trim().parse().ok())
            .unwrap_or(default.min),
        max: match max.as_deref().map(str::trim) {
            Some("unbounded") => None,
            Some(max) => max.parse().ok().or(default.max),
            None => default.max,
        },
    }
}

fn filename_for(url: &Url) -> String {
    let from_path = match url.scheme() {
        "file" => url.to_file_path().ok().and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        }),
        _ => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(ToOwned::to_owned),
    };

    from_path.unwrap_or_else(|| url.to_string())
}

#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    namespaces: HashMap<Option<String>, String>,
    scopes: Vec<Vec<(Option<String>, Option<String>)>>,
}

/// Prefix bindings of the document that triggered an import.
struct SavedScope {
    namespaces: HashMap<Option<String>, String>,
    scopes: Vec<Vec<(Option<String>, Option<String>)>>,
}

struct Parser {
    definition: Definition,
    namespaces: Namespaces,
    current_namespaces: CurrentNamespaces,
    visited: HashSet<Url>,
    saw_definitions: bool,
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema,
    Element {
        name: String,
        kind: Option<TypeKind>,
    },
    ComplexType {
        name: Option<String>,
        kind: Option<TypeKind>,
        attributes: Vec<Field>,
    },
    ComplexContent {
        kind: Option<TypeKind>,
    },
    ComplexExtension {
        base: NamespacedName,
        fields: Vec<Field>,
        restriction: bool,
    },
    SimpleContent {
        ty: Option<NamespacedName>,
    },
    SimpleExtension {
        ty: NamespacedName,
    },
    Particle {
        choice: bool,
        fields: Vec<Field>,
    },
    ParticleElement {
        name: String,
        ty: Option<FieldKind>,
        occurs: Occurs,
    },
    Attribute {
        name: String,
        ty: Option<NamespacedName>,
        required: bool,
    },
    SimpleType {
        name: Option<String>,
        ty: Option<(NamespacedName, Vec<String>)>,
    },
    Restriction {
        ty: NamespacedName,
        enumeration: Vec<String>,
    },
    Enumeration(String),

    Message {
        name: String,
        parts: Vec<Field>,
    },
    Part(Field),

    PortType {
        name: String,
        operations: Vec<Operation>,
    },
    Operation {
        name: String,
        documentation: Option<String>,
        input: Option<NamespacedName>,
        output: Option<NamespacedName>,
        faults: Vec<Fault>,
    },
    Documentation(Option<String>),
    Input {
        message: NamespacedName,
    },
    Output {
        message: NamespacedName,
    },
    OperationFault(Fault),

    Binding {
        name: String,
        ty: NamespacedName,
        transport: Option<String>,
        style: Option<String>,
        soap_version: Option<SoapVersion>,
        operations: Vec<BindingOperation>,
    },
    Transport {
        transport: Option<String>,
        style: Option<String>,
        soap_version: Option<SoapVersion>,
    },
    BindingOperation {
        name: String,
        action: Option<String>,
        style: Option<String>,
        input: Option<String>,
        output: Option<String>,
    },
    OperationAction {
        action: Option<String>,
        style: Option<String>,
    },
    BindingInput {
        body: Option<String>,
    },
    BindingOutput {
        body: Option<String>,
    },
    BindingBody {
        body: Option<String>,
    },

    Service {
        name: String,
        documentation: Option<String>,
        ports: Vec<Port>,
    },
    Port {
        name: String,
        binding: NamespacedName,
        address: Option<String>,
        soap_version: Option<SoapVersion>,
    },
    Address {
        location: String,
        soap_version: Option<SoapVersion>,
    },

    Import,

    Other(String),
}

impl CurrentNamespaces {
    pub fn push_target_namespace(&mut self, namespace: String) {
        self.target.push(namespace);
    }

    pub fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    pub fn current_target(&self) -> String {
        self.target.last().cloned().unwrap_or_default()
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn close_scope(&mut self) {
        for (prefix, previous) in self.scopes.pop().into_iter().flatten().rev() {
            match previous {
                Some(namespace) => self.namespaces.insert(prefix, namespace),
                None => self.namespaces.remove(&prefix),
            };
        }
    }

    pub fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        let previous = self.namespaces.insert(prefix.clone(), namespace.to_owned());

        if let Some(scope) = self.scopes.last_mut() {
            scope.push((prefix, previous));
        }
    }

    pub fn isolate(&mut self) -> SavedScope {
        SavedScope {
            namespaces: mem::take(&mut self.namespaces),
            scopes: mem::take(&mut self.scopes),
        }
    }

    pub fn restore(&mut self, saved: SavedScope) {
        self.namespaces = saved.namespaces;
        self.scopes = saved.scopes;
    }

    pub fn target_namespaced(&self, namespaces: &mut Namespaces, name: String) -> NamespacedName {
        NamespacedName::new(namespaces, &self.current_target(), name)
    }

    pub fn resolved_prefix(
        &self,
        namespaces: &mut Namespaces,
        prefix: Option<String>,
        name: String,
    ) -> Result<NamespacedName, error::Error> {
        match (self.namespaces.get(&prefix), prefix) {
            (Some(value), _) => Ok(NamespacedName::new(namespaces, value, name)),
            (None, None) => Ok(self.target_namespaced(namespaces, name)),
            (None, Some(prefix)) if prefix == "tns" => Ok(self.target_namespaced(namespaces, name)),
            (None, Some(prefix)) => Err(error::Error::UnknownPrefix(prefix)),
        }
    }
}

impl Parser {
    fn new() -> Self {
        Self {
            definition: Default::default(),
            namespaces: Default::default(),
            current_namespaces: Default::default(),
            visited: HashSet::new(),
            saw_definitions: false,
        }
    }

    fn push_target_namespace(&mut self, namespace: Option<String>) {
        let namespace = namespace.unwrap_or_else(|| self.current_namespaces.current_target());
        self.current_namespaces.push_target_namespace(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.current_namespaces.pop_target_namespace();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.current_namespaces
            .add_namespace_prefix(prefix, namespace);
    }

    fn target_namespaced(&mut self, name: String) -> NamespacedName {
        self.current_namespaces
            .target_namespaced(&mut self.namespaces, name)
    }

    fn xsd(&mut self, name: &str) -> NamespacedName {
        NamespacedName::new(&mut self.namespaces, XSD_NAMESPACE, name.to_owned())
    }

    fn resolve_namespace(&mut self, prefixed_name: &str) -> Result<NamespacedName, error::Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name.trim());

        self.current_namespaces.resolved_prefix(
            &mut self.namespaces,
            prefix.map(ToOwned::to_owned),
            local_name.to_owned(),
        )
    }

    fn finish(self, url: Option<&Url>, filename: String) -> Result<WsdlEntry, error::Error> {
        if !self.saw_definitions {
            return Err(error::Error::NotWsdl(
                url.map_or_else(|| filename.clone(), Url::to_string),
            ));
        }

        Ok(WsdlEntry {
            filename,
            definition: self.definition,
            namespaces: self.namespaces,
        })
    }

    fn parse_url(&mut self, url: Url) -> Result<(), error::Error> {
        debug!(%url, "parsing document");
        self.visited.insert(url.clone());

        let result = match url.scheme() {
            "file" => self.parse_xml(
                Some(&url),
                Reader::from_file(
                    url.to_file_path()
                        .map_err(|()| error::Error::PathConversionError(None))?,
                )
                .map_err(error::Error::FileOpenError)?,
            ),

            "http" | "https" => {
                let response = reqwest::blocking::get(url.clone())?.error_for_status()?;
                self.parse_xml(Some(&url), Reader::from_reader(BufReader::new(response)))
            }

            other => Err(error::Error::UnsupportedScheme(other.into())),
        };

        debug!(%url, ok = result.is_ok(), "finished document");
        result
    }

    fn import(&mut self, base: Option<&Url>, location: &str) -> Result<(), error::Error> {
        let url = match base {
            Some(base) => base.join(location)?,
            None => Url::parse(location)?,
        };

        if self.visited.contains(&url) {
            debug!(%url, "skipping already imported document");
            return Ok(());
        }

        let saved = self.current_namespaces.isolate();
        let result = self.parse_url(url);
        self.current_namespaces.restore(saved);

        result
    }

    fn parse_xml<B: BufRead>(
        &mut self,
        url: Option<&Url>,
        mut reader: Reader<B>,
    ) -> Result<(), error::Error> {
        let mut stack = Vec::new();
        let mut buffer = Vec::new();
        let mut namespace_buffer = Vec::new();

        reader.trim_text(true);

        loop {
            let (namespace, event) =
                reader.read_namespaced_event(&mut buffer, &mut namespace_buffer)?;

            match event {
                Event::Decl(..) => (),

                Event::Start(start) => {
                    self.handle_start(&mut stack, &reader, start, namespace, url)?
                }
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, start, namespace, url)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, text)?,

                Event::Eof => break,

                event => trace!(?event, "ignoring event"),
            }

            buffer.clear();
        }

        Ok(())
    }

    fn handle_start<'a, B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesStart<'a>,
        namespace_bytes: Option<&[u8]>,
        url: Option<&Url>,
    ) -> Result<(), error::Error> {
        let (_, local_name) = split_namespaced_name(reader.decode(start.name())?);
        let element_namespace = namespace_bytes
            .and_then(|ns| std::str::from_utf8(ns).ok())
            .unwrap_or_default();

        self.current_namespaces.open_scope();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let declared = match split_namespaced_name(key) {
                (Some("xmlns"), prefix) => Some(Some(prefix.to_owned())),
                (None, "xmlns") => Some(None),
                _ => None,
            };

            if let Some(prefix) = declared {
                let namespace = attribute.unescaped_value()?;
                self.add_namespace_prefix(prefix, reader.decode(&namespace)?);
            }
        }

        let state = stack.pop();
        let mut new_state = Some(ParseState::Other(local_name.to_owned()));

        match state {
            None => match local_name {
                "definitions" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    self.push_target_namespace(namespace);
                    self.saw_definitions = true;
                    new_state = Some(ParseState::Definitions)
                }

                "schema" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    self.push_target_namespace(namespace);
                    new_state = Some(ParseState::Schema)
                }

                _ => debug!("found {} as document root", local_name),
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;
                    let location = required(location, "import", "location")?;

                    self.import(url, &location)?;
                    new_state = Some(ParseState::Import);
                }

                "types" => new_state = Some(ParseState::Types),

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Message {
                        name: required(name, "message", "name")?,
                        parts: Vec::new(),
                    });
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::PortType {
                        name: required(name, "portType", "name")?,
                        operations: Vec::new(),
                    });
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                    let name = required(name, "binding", "name")?;
                    let ty = self.resolve_namespace(&required(ty, "binding", "type")?)?;

                    new_state = Some(ParseState::Binding {
                        name,
                        ty,
                        transport: None,
                        style: None,
                        soap_version: None,
                        operations: Vec::new(),
                    });
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Service {
                        name: required(name, "service", "name")?,
                        documentation: None,
                        ports: Vec::new(),
                    });
                }

                _ => trace!("found {} inside definitions", local_name),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    self.push_target_namespace(namespace);
                    new_state = Some(ParseState::Schema)
                }

                _ => trace!("found {} inside types", local_name),
            },

            Some(ParseState::Schema) => match local_name {
                "element" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                    let name = required(name, "element", "name")?;
                    let kind = match ty {
                        Some(ty) => Some(TypeKind::Alias(self.resolve_namespace(&ty)?)),
                        None => None,
                    };

                    new_state = Some(ParseState::Element { name, kind })
                }

                "complexType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::ComplexType {
                        name: Some(required(name, "complexType", "name")?),
                        kind: None,
                        attributes: Vec::new(),
                    });
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::SimpleType {
                        name: Some(required(name, "simpleType", "name")?),
                        ty: None,
                    })
                }

                "include" | "import" => {
                    let [location] =
                        get_attributes(reader, start.attributes(), ["schemaLocation"])?;

                    match location {
                        Some(location) => self.import(url, &location)?,
                        None => debug!("schema {} without schemaLocation", local_name),
                    }

                    new_state = Some(ParseState::Import);
                }

                _ => trace!("found {} inside schema", local_name),
            },

            Some(ParseState::Element { .. }) => match local_name {
                "complexType" => {
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        kind: None,
                        attributes: Vec::new(),
                    })
                }

                "simpleType" => new_state = Some(ParseState::SimpleType { name: None, ty: None }),

                _ => trace!("found {} inside element", local_name),
            },

            Some(ParseState::ComplexType { .. }) => match local_name {
                "sequence" | "all" | "choice" => {
                    new_state = Some(ParseState::Particle {
                        choice: local_name == "choice",
                        fields: Vec::new(),
                    })
                }

                "simpleContent" => new_state = Some(ParseState::SimpleContent { ty: None }),

                "complexContent" => new_state = Some(ParseState::ComplexContent { kind: None }),

                "attribute" => new_state = Some(self.start_attribute(reader, &start)?),

                _ => trace!("found {} inside complexType", local_name),
            },

            Some(ParseState::ComplexContent { .. }) => match local_name {
                "extension" | "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = self.resolve_namespace(&required(base, "extension", "base")?)?;

                    new_state = Some(ParseState::ComplexExtension {
                        base,
                        fields: Vec::new(),
                        restriction: local_name == "restriction",
                    });
                }

                _ => trace!("found {} inside complexContent", local_name),
            },

            Some(ParseState::ComplexExtension { .. }) => match local_name {
                "sequence" | "all" | "choice" => {
                    new_state = Some(ParseState::Particle {
                        choice: local_name == "choice",
                        fields: Vec::new(),
                    })
                }

                "attribute" => new_state = Some(self.start_attribute(reader, &start)?),

                _ => trace!("found {} inside complex extension", local_name),
            },

            Some(ParseState::SimpleContent { .. }) => match local_name {
                "extension" | "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let ty = self.resolve_namespace(&required(base, "extension", "base")?)?;

                    new_state = Some(ParseState::SimpleExtension { ty });
                }

                _ => trace!("found {} inside simpleContent", local_name),
            },

            Some(ParseState::SimpleType { .. }) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let ty = self.resolve_namespace(&required(base, "restriction", "base")?)?;

                    new_state = Some(ParseState::Restriction {
                        ty,
                        enumeration: Vec::new(),
                    });
                }

                _ => trace!("found {} inside simpleType", local_name),
            },

            Some(ParseState::Restriction { .. }) => match local_name {
                "enumeration" => {
                    let [value] = get_attributes(reader, start.attributes(), ["value"])?;
                    new_state = Some(ParseState::Enumeration(required(
                        value,
                        "enumeration",
                        "value",
                    )?));
                }

                _ => trace!("found {} inside restriction", local_name),
            },

            Some(ParseState::Particle { .. }) => match local_name {
                "element" => {
                    let [name, ty, reference, min, max] = get_attributes(
                        reader,
                        start.attributes(),
                        ["name", "type", "ref", "minOccurs", "maxOccurs"],
                    )?;

                    let occurs = parse_occurs(min, max);

                    new_state = Some(match reference {
                        Some(reference) => {
                            let reference = self.resolve_namespace(&reference)?;

                            ParseState::ParticleElement {
                                name: reference.name.clone(),
                                ty: Some(FieldKind::Ref(reference)),
                                occurs,
                            }
                        }

                        None => ParseState::ParticleElement {
                            name: required(name, "element", "name")?,
                            ty: match ty {
                                Some(ty) => Some(FieldKind::Type(self.resolve_namespace(&ty)?)),
                                None => None,
                            },
                            occurs,
                        },
                    });
                }

                "sequence" | "all" | "choice" => {
                    new_state = Some(ParseState::Particle {
                        choice: local_name == "choice",
                        fields: Vec::new(),
                    })
                }

                _ => trace!("found {} inside particle", local_name),
            },

            Some(ParseState::ParticleElement { .. }) => match local_name {
                "complexType" => {
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        kind: None,
                        attributes: Vec::new(),
                    })
                }

                "simpleType" => new_state = Some(ParseState::SimpleType { name: None, ty: None }),

                _ => trace!("found {} inside particle element", local_name),
            },

            Some(ParseState::Attribute { .. }) => match local_name {
                "simpleType" => new_state = Some(ParseState::SimpleType { name: None, ty: None }),

                _ => trace!("found {} inside attribute", local_name),
            },

            Some(ParseState::Message { .. }) => match local_name {
                "part" => {
                    let [name, element, ty] =
                        get_attributes(reader, start.attributes(), ["name", "element", "type"])?;

                    let name = required(name, "part", "name")?;
                    let ty = match (element, ty) {
                        (Some(element), _) => FieldKind::Ref(self.resolve_namespace(&element)?),
                        (None, Some(ty)) => FieldKind::Type(self.resolve_namespace(&ty)?),
                        (None, None) => {
                            return Err(error::Error::MissingAttribute {
                                element: "part",
                                attribute: "element",
                            })
                        }
                    };

                    new_state = Some(ParseState::Part(Field {
                        name: self.target_namespaced(name),
                        ty,
                        occurs: Occurs::default(),
                        attribute: false,
                    }));
                }

                _ => trace!("found {} inside message", local_name),
            },

            Some(ParseState::PortType { .. }) => match local_name {
                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Operation {
                        name: required(name, "operation", "name")?,
                        documentation: None,
                        input: None,
                        output: None,
                        faults: Vec::new(),
                    })
                }

                _ => trace!("found {} inside portType", local_name),
            },

            Some(ParseState::Operation { .. }) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "input" | "output" => {
                    let [message] = get_attributes(reader, start.attributes(), ["message"])?;
                    let message =
                        self.resolve_namespace(&required(message, "input", "message")?)?;

                    if local_name == "input" {
                        new_state = Some(ParseState::Input { message })
                    } else {
                        new_state = Some(ParseState::Output { message })
                    }
                }

                "fault" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;

                    new_state = Some(ParseState::OperationFault(Fault {
                        name: required(name, "fault", "name")?,
                        message: self.resolve_namespace(&required(message, "fault", "message")?)?,
                    }));
                }

                _ => trace!("found {} inside operation", local_name),
            },

            Some(ParseState::Binding { .. }) => match local_name {
                "binding" => {
                    let [transport, style] =
                        get_attributes(reader, start.attributes(), ["transport", "style"])?;

                    new_state = Some(ParseState::Transport {
                        transport,
                        style,
                        soap_version: SoapVersion::from_namespace(element_namespace),
                    })
                }

                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::BindingOperation {
                        name: required(name, "operation", "name")?,
                        action: None,
                        style: None,
                        input: None,
                        output: None,
                    })
                }

                _ => trace!("found {} inside binding", local_name),
            },

            Some(ParseState::BindingOperation { .. }) => match local_name {
                "operation" => {
                    let [action, style] =
                        get_attributes(reader, start.attributes(), ["soapAction", "style"])?;

                    new_state = Some(ParseState::OperationAction { action, style });
                }

                "input" => new_state = Some(ParseState::BindingInput { body: None }),
                "output" => new_state = Some(ParseState::BindingOutput { body: None }),

                _ => trace!("found {} inside binding operation", local_name),
            },

            Some(ParseState::BindingInput { .. } | ParseState::BindingOutput { .. }) => {
                match local_name {
                    "body" => {
                        let [body] = get_attributes(reader, start.attributes(), ["use"])?;
                        new_state = Some(ParseState::BindingBody { body });
                    }

                    _ => trace!("found {} inside binding message", local_name),
                }
            }

            Some(ParseState::Service { .. }) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;

                    let name = required(name, "port", "name")?;
                    let binding = self.resolve_namespace(&required(binding, "port", "binding")?)?;

                    new_state = Some(ParseState::Port {
                        name,
                        binding,
                        address: None,
                        soap_version: None,
                    });
                }

                _ => trace!("found {} inside service", local_name),
            },

            Some(ParseState::Port { .. }) => match local_name {
                "address" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;

                    new_state = Some(ParseState::Address {
                        location: required(location, "address", "location")?,
                        soap_version: SoapVersion::from_namespace(element_namespace),
                    })
                }

                _ => trace!("found {} inside port", local_name),
            },

            Some(ref state) => trace!("found {} inside {:?}", local_name, state),
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn start_attribute<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<ParseState, error::Error> {
        let [name, ty, reference, usage] =
            get_attributes(reader, start.attributes(), ["name", "type", "ref", "use"])?;

        let (name, ty) = match reference {
            Some(reference) => {
                let reference = self.resolve_namespace(&reference)?;
                (reference.name.clone(), Some(reference))
            }

            None => (
                required(name, "attribute", "name")?,
                match ty {
                    Some(ty) => Some(self.resolve_namespace(&ty)?),
                    None => None,
                },
            ),
        };

        Ok(ParseState::Attribute {
            name,
            ty,
            required: usage.as_deref() == Some("required"),
        })
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), error::Error> {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions | ParseState::Schema) => self.pop_target_namespace(),

            Some(ParseState::Element { name, kind }) => {
                let kind = match kind {
                    Some(kind) => kind,
                    None => TypeKind::Alias(self.xsd("anyType")),
                };

                let name = self.target_namespaced(name);
                self.definition.elements.push(Type { name, kind })
            }

            Some(ParseState::ComplexType {
                name,
                kind,
                attributes,
            }) => {
                let kind = match kind {
                    Some(TypeKind::Struct(mut fields)) => {
                        fields.extend(attributes);
                        TypeKind::Struct(fields)
                    }
                    Some(TypeKind::Extension { base, mut fields }) => {
                        fields.extend(attributes);
                        TypeKind::Extension { base, fields }
                    }
                    Some(kind) => kind,
                    None => TypeKind::Struct(attributes),
                };

                match next_state {
                    Some(ParseState::ParticleElement { ref mut ty, .. }) => {
                        *ty = Some(FieldKind::Inner(kind))
                    }

                    Some(ParseState::Element {
                        kind: ref mut el_kind,
                        ..
                    }) => *el_kind = Some(kind),

                    _ => {
                        let name = required(name, "complexType", "name")?;
                        let name = self.target_namespaced(name);
                        self.definition.types.push(Type { name, kind })
                    }
                }
            }

            Some(ParseState::ComplexContent { kind: content }) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) if kind.is_none() => {
                    *kind = content
                }

                _ => debug!("dropping complexContent outside complexType"),
            },

            Some(ParseState::ComplexExtension {
                base,
                fields,
                restriction,
            }) => match next_state {
                Some(ParseState::ComplexContent { ref mut kind }) => {
                    *kind = Some(match (restriction, fields.is_empty()) {
                        (true, true) => TypeKind::Alias(base),
                        (true, false) => TypeKind::Struct(fields),
                        (false, _) => TypeKind::Extension { base, fields },
                    })
                }

                _ => debug!("dropping extension outside complexContent"),
            },

            Some(ParseState::SimpleContent { ty }) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) if kind.is_none() => {
                    *kind = ty.map(TypeKind::Alias)
                }

                _ => debug!("dropping simpleContent outside complexType"),
            },

            Some(ParseState::SimpleExtension { ty: base }) => {
                if let Some(ParseState::SimpleContent { ref mut ty }) = next_state {
                    *ty = Some(base)
                }
            }

            Some(ParseState::SimpleType { name, ty }) => {
                let kind = match ty {
                    Some((base, enumeration)) => TypeKind::Simple { base, enumeration },
                    None => TypeKind::Simple {
                        base: self.xsd("string"),
                        enumeration: Vec::new(),
                    },
                };

                match next_state {
                    Some(ParseState::ParticleElement { ref mut ty, .. }) => {
                        *ty = Some(FieldKind::Inner(kind))
                    }

                    Some(ParseState::Element {
                        kind: ref mut el_kind,
                        ..
                    }) => *el_kind = Some(kind),

                    Some(ParseState::Attribute { ref mut ty, .. }) => {
                        if let TypeKind::Simple { base, .. } = kind {
                            *ty = Some(base)
                        }
                    }

                    _ => {
                        let name = required(name, "simpleType", "name")?;
                        let name = self.target_namespaced(name);
                        self.definition.types.push(Type { name, kind })
                    }
                }
            }

            Some(ParseState::Restriction {
                ty: base,
                enumeration,
            }) => {
                if let Some(ParseState::SimpleType { ref mut ty, .. }) = next_state {
                    *ty = Some((base, enumeration))
                }
            }

            Some(ParseState::Enumeration(value)) => {
                if let Some(ParseState::Restriction {
                    ref mut enumeration,
                    ..
                }) = next_state
                {
                    enumeration.push(value)
                }
            }

            Some(ParseState::Particle { choice, mut fields }) => {
                if choice {
                    for field in &mut fields {
                        field.occurs.min = 0;
                    }
                }

                match next_state {
                    Some(ParseState::ComplexType { ref mut kind, .. }) if kind.is_none() => {
                        *kind = Some(TypeKind::Struct(fields))
                    }

                    Some(
                        ParseState::ComplexExtension {
                            fields: ref mut parent,
                            ..
                        }
                        | ParseState::Particle {
                            fields: ref mut parent,
                            ..
                        },
                    ) => parent.extend(fields),

                    _ => debug!("dropping particle outside complexType"),
                }
            }

            Some(ParseState::ParticleElement { name, ty, occurs }) => {
                if let Some(ParseState::Particle { ref mut fields, .. }) = next_state {
                    let ty = match ty {
                        Some(ty) => ty,
                        None => FieldKind::Type(self.xsd("anyType")),
                    };

                    fields.push(Field {
                        name: self.target_namespaced(name),
                        ty,
                        occurs,
                        attribute: false,
                    })
                }
            }

            Some(ParseState::Attribute { name, ty, required }) => {
                let ty = match ty {
                    Some(ty) => ty,
                    None => self.xsd("string"),
                };

                let field = Field {
                    name: self.target_namespaced(name),
                    ty: FieldKind::Type(ty),
                    occurs: Occurs {
                        min: u32::from(required),
                        max: Some(1),
                    },
                    attribute: true,
                };

                match next_state {
                    Some(ParseState::ComplexType {
                        ref mut attributes, ..
                    }) => attributes.push(field),

                    Some(ParseState::ComplexExtension { ref mut fields, .. }) => fields.push(field),

                    _ => trace!("dropping attribute {}", field.name.name),
                }
            }

            Some(ParseState::Message { name, parts }) => {
                let name = self.target_namespaced(name);
                self.definition.messages.push(Message { name, parts })
            }

            Some(ParseState::Part(field)) => {
                if let Some(ParseState::Message { ref mut parts, .. }) = next_state {
                    parts.push(field)
                }
            }

            Some(ParseState::PortType { name, operations }) => {
                let name = self.target_namespaced(name);
                self.definition
                    .port_types
                    .push(PortType { name, operations })
            }

            Some(ParseState::Operation {
                name,
                documentation,
                input,
                output,
                faults,
            }) => {
                if let Some(ParseState::PortType {
                    ref mut operations, ..
                }) = next_state
                {
                    operations.push(Operation {
                        name: self.target_namespaced(name),
                        documentation,
                        input,
                        output,
                        faults,
                    })
                }
            }

            Some(ParseState::Documentation(text)) => match next_state {
                Some(
                    ParseState::Operation {
                        ref mut documentation,
                        ..
                    }
                    | ParseState::Service {
                        ref mut documentation,
                        ..
                    },
                ) => *documentation = text,

                _ => (),
            },

            Some(ParseState::Input { message }) => {
                if let Some(ParseState::Operation { ref mut input, .. }) = next_state {
                    *input = Some(message)
                }
            }

            Some(ParseState::Output { message }) => {
                if let Some(ParseState::Operation { ref mut output, .. }) = next_state {
                    *output = Some(message)
                }
            }

            Some(ParseState::OperationFault(fault)) => {
                if let Some(ParseState::Operation { ref mut faults, .. }) = next_state {
                    faults.push(fault)
                }
            }

            Some(ParseState::Transport {
                transport: kind,
                style: binding_style,
                soap_version: version,
            }) => {
                if let Some(ParseState::Binding {
                    ref mut transport,
                    ref mut style,
                    ref mut soap_version,
                    ..
                }) = next_state
                {
                    *transport = kind;
                    *style = binding_style;
                    *soap_version = version;
                }
            }

            Some(ParseState::Binding {
                name,
                ty,
                transport,
                style,
                soap_version,
                operations,
            }) => {
                let name = self.target_namespaced(name);
                self.definition.bindings.push(Binding {
                    name,
                    ty,
                    transport,
                    style,
                    soap_version,
                    operations,
                })
            }

            Some(ParseState::BindingOperation {
                name,
                action,
                style,
                input,
                output,
            }) => {
                if let Some(ParseState::Binding {
                    ref mut operations, ..
                }) = next_state
                {
                    operations.push(BindingOperation {
                        name: self.target_namespaced(name),
                        action,
                        style,
                        input,
                        output,
                    })
                }
            }

            Some(ParseState::OperationAction { action, style }) => {
                if let Some(ParseState::BindingOperation {
                    action: ref mut a,
                    style: ref mut s,
                    ..
                }) = next_state
                {
                    *a = action.filter(|action| !action.is_empty());
                    *s = style;
                }
            }

            Some(ParseState::BindingInput { body }) => {
                if let Some(ParseState::BindingOperation { ref mut input, .. }) = next_state {
                    *input = body
                }
            }

            Some(ParseState::BindingOutput { body }) => {
                if let Some(ParseState::BindingOperation { ref mut output, .. }) = next_state {
                    *output = body
                }
            }

            Some(ParseState::BindingBody { body: body_use }) => match next_state {
                Some(
                    ParseState::BindingInput { ref mut body }
                    | ParseState::BindingOutput { ref mut body },
                ) => *body = body_use,
                _ => (),
            },

            Some(ParseState::Service {
                name,
                documentation,
                ports,
            }) => {
                let name = self.target_namespaced(name);
                self.definition.services.push(Service {
                    name,
                    documentation,
                    ports,
                })
            }

            Some(ParseState::Port {
                name,
                binding,
                address,
                soap_version,
            }) => {
                if let Some(ParseState::Service { ref mut ports, .. }) = next_state {
                    ports.push(Port {
                        name: self.target_namespaced(name),
                        binding,
                        location: address,
                        soap_version,
                    })
                }
            }

            Some(ParseState::Address {
                location,
                soap_version: version,
            }) => {
                if let Some(ParseState::Port {
                    ref mut address,
                    ref mut soap_version,
                    ..
                }) = next_state
                {
                    *address = Some(location);
                    *soap_version = version;
                }
            }

            None => warn!("unbalanced end tag"),

            _ => (),
        }

        self.current_namespaces.close_scope();
        stack.extend(next_state);
        Ok(())
    }

    fn handle_text<'a, B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesText<'a>,
    ) -> Result<(), error::Error> {
        if let Some(ParseState::Documentation(ref mut docs)) = stack.last_mut() {
            let unescaped = start.unescaped()?;
            let text = reader.decode(unescaped.as_ref())?.trim();

            if !text.is_empty() {
                *docs = Some(text.to_owned());
            }
        }

        Ok(())
    }
}

pub fn parse(url: Url) -> Result<WsdlEntry, error::Error> {
    let mut parser = Parser::new();
    parser.parse_url(url.clone())?;
    parser.finish(Some(&url), filename_for(&url))
}

pub fn parse_str(xml: &str, filename: &str) -> Result<WsdlEntry, error::Error> {
    let mut parser = Parser::new();
    parser.parse_xml(None, Reader::from_str(xml))?;
    parser.finish(None, filename.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_prefixed_names() {
        assert_eq!(split_namespaced_name("tns:Add"), (Some("tns"), "Add"));
        assert_eq!(split_namespaced_name("Add"), (None, "Add"));
    }

    #[test]
    fn occurs_defaults_to_exactly_one() {
        assert_eq!(parse_occurs(None, None), Occurs::default());
    }

    #[test]
    fn occurs_understands_unbounded() {
        let occurs = parse_occurs(Some("0".into()), Some("unbounded".into()));
        assert_eq!(occurs, Occurs { min: 0, max: None });
        assert!(occurs.is_optional());
        assert!(occurs.is_repeated());
    }

    #[test]
    fn prefix_scopes_are_restored() {
        let mut namespaces = CurrentNamespaces::default();
        namespaces.open_scope();
        namespaces.add_namespace_prefix(Some("a".into()), "urn:outer");
        namespaces.open_scope();
        namespaces.add_namespace_prefix(Some("a".into()), "urn:inner");
        assert_eq!(namespaces.namespaces[&Some("a".into())], "urn:inner");

        namespaces.close_scope();
        assert_eq!(namespaces.namespaces[&Some("a".into())], "urn:outer");

        namespaces.close_scope();
        assert!(namespaces.namespaces.is_empty());
    }

    #[test]
    fn undeclared_prefix_is_an_error() {
        let current = CurrentNamespaces::default();
        let mut namespaces = Namespaces::default();

        let result = current.resolved_prefix(&mut namespaces, Some("q".into()), "Thing".into());
        assert!(matches!(result, Err(error::Error::UnknownPrefix(prefix)) if prefix == "q"));
    }

    #[test]
    fn filename_uses_last_url_segment() {
        let url = Url::parse("https://example.com/services/Bank.wsdl").unwrap();
        assert_eq!(filename_for(&url), "Bank.wsdl");
    }
}
