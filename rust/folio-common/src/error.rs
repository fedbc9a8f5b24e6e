use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Malformed input: bad magic, unknown version, truncated structure.
    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// Well-formed input that asks for a capability this reader does not have,
    /// e.g. compressed postings.
    pub fn unsupported(element: impl Into<String>, feature: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnsupportedFeature {
                element: element.into(),
                feature: feature.into(),
            }
            .into(),
        )
    }

    /// The resource layer failed to produce the bytes of `resource`.
    pub fn resource(resource: impl Into<String>, source: impl Into<Arc<std::io::Error>>) -> Error {
        Error(
            ErrorKind::Resource {
                resource: resource.into(),
                source: source.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn is_format(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidFormat { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnsupportedFeature { .. })
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind(), ErrorKind::Resource { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("unsupported feature in '{element}': {feature}")]
    UnsupportedFeature { element: String, feature: String },

    #[error("failed to load resource '{resource}': {source}")]
    Resource {
        resource: String,
        source: Arc<std::io::Error>,
    },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
