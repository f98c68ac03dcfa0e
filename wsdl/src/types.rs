pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP12_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

#[derive(Default, Debug, Clone)]
pub struct Namespaces(Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    namespace_idx: usize,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    V11,
    V12,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Struct(Vec<Field>),
    Extension {
        base: NamespacedName,
        fields: Vec<Field>,
    },
    Alias(NamespacedName),
    Simple {
        base: NamespacedName,
        enumeration: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub name: NamespacedName,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Type(NamespacedName),
    /// Reference to a global element.
    Ref(NamespacedName),
    Inner(TypeKind),
}

/// `minOccurs`/`maxOccurs`. A `max` of `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: u32,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: NamespacedName,
    pub ty: FieldKind,
    pub occurs: Occurs,
    pub attribute: bool,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: NamespacedName,
    pub parts: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Fault {
    pub name: String,
    pub message: NamespacedName,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub input: Option<NamespacedName>,
    pub output: Option<NamespacedName>,
    pub faults: Vec<Fault>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: NamespacedName,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: NamespacedName,
    pub action: Option<String>,
    pub style: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: NamespacedName,
    pub ty: NamespacedName,
    pub transport: Option<String>,
    pub style: Option<String>,
    /// `None` for non-SOAP (e.g. HTTP) bindings.
    pub soap_version: Option<SoapVersion>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: NamespacedName,
    pub binding: NamespacedName,
    pub location: Option<String>,
    pub soap_version: Option<SoapVersion>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Default, Debug, Clone)]
pub struct Definition {
    pub elements: Vec<Type>,
    pub types: Vec<Type>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

impl Namespaces {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn add_or_get(&mut self, namespace: &str) -> usize {
        if let Some(index) = self.index_of(namespace) {
            index
        } else {
            let index = self.0.len();
            self.0.push(namespace.to_owned());
            index
        }
    }

    pub fn index_of(&self, namespace: &str) -> Option<usize> {
        self.0.iter().position(|value| value == namespace)
    }
}

impl NamespacedName {
    pub fn new(namespaces: &mut Namespaces, namespace: &str, name: String) -> Self {
        Self {
            namespace_idx: namespaces.add_or_get(namespace),
            name,
        }
    }

    pub fn namespace<'a>(&self, namespaces: &'a Namespaces) -> &'a str {
        namespaces.get(self.namespace_idx).unwrap_or_default()
    }

    pub fn is_in(&self, namespaces: &Namespaces, namespace: &str) -> bool {
        namespaces.index_of(namespace) == Some(self.namespace_idx)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self {
            min: 1,
            max: Some(1),
        }
    }
}

impl Occurs {
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    pub fn is_repeated(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }
}

impl SoapVersion {
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP11_NAMESPACE => Some(Self::V11),
            SOAP12_NAMESPACE => Some(Self::V12),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V11 => "1.1",
            Self::V12 => "1.2",
        }
    }
}

impl Definition {
    pub fn find_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.name.name == name)
    }

    pub fn find_binding(&self, name: &NamespacedName) -> Option<&Binding> {
        self.bindings.iter().find(|binding| &binding.name == name)
    }

    pub fn find_port_type(&self, name: &NamespacedName) -> Option<&PortType> {
        self.port_types
            .iter()
            .find(|port_type| &port_type.name == name)
    }

    pub fn find_message(&self, name: &NamespacedName) -> Option<&Message> {
        self.messages.iter().find(|message| &message.name == name)
    }
}
