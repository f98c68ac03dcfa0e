use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Service {0} is not defined")]
    UnknownService(String),

    #[error("Port {port} refers to unknown binding {binding}")]
    UnknownBinding { port: String, binding: String },

    #[error("Binding {binding} refers to unknown port type {port_type}")]
    UnknownPortType { binding: String, port_type: String },

    #[error("Service {0} has no SOAP port")]
    NoSoapPort(String),
}
