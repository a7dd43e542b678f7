use thiserror::Error;

/// Failures raised while binding a widget to the namespace.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("Variable {name} not defined in the namespace")]
    NameNotFound { name: String },

    #[error("Variable {name} should be {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{context}")]
    ShapeMismatch { context: String },

    #[error("{0}")]
    Decoder(String),

    #[error("Transform {name} failed: {source}")]
    Transform {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid widget configuration: {0}")]
    Config(String),
}

impl BindError {
    pub fn name_not_found(name: &str) -> Self {
        BindError::NameNotFound {
            name: name.to_string(),
        }
    }

    pub fn shape(context: impl Into<String>) -> Self {
        BindError::ShapeMismatch {
            context: context.into(),
        }
    }

    /// Fatal errors close the widget that raised them. Transform failures
    /// belong to user code and go back to the host instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BindError::Transform { .. } | BindError::Config(_))
    }
}

pub type BindResult<T> = Result<T, BindError>;
