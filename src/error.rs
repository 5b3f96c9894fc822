use thiserror::Error;

/// Result type for rejar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the remapper
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Class parse error: {message}")]
    ClassParse { message: String },

    #[error("Unsupported bootstrap constant shape in {class}.{method}: {message}")]
    BootstrapShape {
        class: String,
        method: String,
        message: String,
    },

    #[error("Mappings error: {message}")]
    Mappings { message: String },

    #[error("Failed to transform {class}: {message}")]
    Transform { class: String, message: String },
}

impl Error {
    /// Create a class parse error
    pub fn class_parse(message: impl Into<String>) -> Self {
        Self::ClassParse { message: message.into() }
    }

    /// Create a bootstrap shape error with the owning class and method
    pub fn bootstrap_shape(
        class: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::BootstrapShape {
            class: class.into(),
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a mappings error
    pub fn mappings(message: impl Into<String>) -> Self {
        Self::Mappings { message: message.into() }
    }

    /// Wrap a per-class transformation failure with the class name
    pub fn transform(class: impl Into<String>, inner: Error) -> Self {
        Self::Transform {
            class: class.into(),
            message: inner.to_string(),
        }
    }
}
