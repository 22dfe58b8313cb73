use thiserror::Error;

/// Result type alias using CmpError
pub type Result<T> = std::result::Result<T, CmpError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure of a comparison call maps to one kind with a stable code.
/// An inequality is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpErrorKind {
    // Configuration
    InvalidOption,
    InvalidName,

    // Ambiguity
    UnfilteredOption,
    AmbiguousOptions,

    // Access
    UnexportedField,

    // Consistency
    NanMapKey,
    InconsistentResult,

    // User function contract
    NonDeterministicFunction,
    RecursiveTransformer,

    // Descriptor defects
    InvalidDescriptor,

    // Report export
    Serialization,

    // Internal
    Internal,
}

impl CmpErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            CmpErrorKind::InvalidOption => "ERR_INVALID_OPTION",
            CmpErrorKind::InvalidName => "ERR_INVALID_NAME",
            CmpErrorKind::UnfilteredOption => "ERR_UNFILTERED_OPTION",
            CmpErrorKind::AmbiguousOptions => "ERR_AMBIGUOUS_OPTIONS",
            CmpErrorKind::UnexportedField => "ERR_UNEXPORTED_FIELD",
            CmpErrorKind::NanMapKey => "ERR_NAN_MAP_KEY",
            CmpErrorKind::InconsistentResult => "ERR_INCONSISTENT_RESULT",
            CmpErrorKind::NonDeterministicFunction => "ERR_NON_DETERMINISTIC_FUNCTION",
            CmpErrorKind::RecursiveTransformer => "ERR_RECURSIVE_TRANSFORMER",
            CmpErrorKind::InvalidDescriptor => "ERR_INVALID_DESCRIPTOR",
            CmpErrorKind::Serialization => "ERR_SERIALIZATION",
            CmpErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the failing operation, the rendered path of the node being compared
/// when the failure happened, and, for ambiguity errors, the descriptions of the
/// competing options.
#[derive(Debug, Clone)]
pub struct CmpError {
    kind: CmpErrorKind,
    op: Option<String>,
    path: Option<String>,
    message: String,
    candidates: Option<Vec<String>>,
}

impl CmpError {
    /// Create a new error with the specified kind
    pub fn new(kind: CmpErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            message: String::new(),
            candidates: None,
        }
    }

    /// Set the operation name
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Set the operation name unless one is already recorded
    pub(crate) fn or_op(self, op: &str) -> Self {
        if self.op.is_some() {
            self
        } else {
            self.with_op(op)
        }
    }

    /// Set the rendered path of the failing node
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the option descriptions involved (populated on AmbiguousOptions)
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn kind(&self) -> CmpErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
    }
}

impl std::fmt::Display for CmpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if let Some(path) = &self.path {
            write!(f, " at {}", path)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(candidates) = &self.candidates {
            for c in candidates {
                write!(f, "\n\t{}", c)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CmpError {}

// ========== End Error Facility ==========

/// Option construction failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionError {
    /// Transformer name is not an identifier path
    #[error("invalid transformer name: {name:?}")]
    InvalidTransformerName { name: String },

    /// Visibility grant names a type that is not a struct
    #[error("invalid struct type: {type_name}")]
    NotAStruct { type_name: String },

    /// Ignore or unfiltered comparer supplied without a filter
    #[error("cannot use an unfiltered option: {option}")]
    Unfiltered { option: String },

    /// Option kind that cannot be wrapped by a filter
    #[error("invalid option in filter: {option}")]
    NotFilterable { option: String },
}

impl From<OptionError> for CmpError {
    fn from(err: OptionError) -> Self {
        let message = err.to_string();
        match err {
            OptionError::InvalidTransformerName { .. } => {
                CmpError::new(CmpErrorKind::InvalidName)
                    .with_op("transformer")
                    .with_message(message)
            }
            OptionError::NotAStruct { .. } => CmpError::new(CmpErrorKind::InvalidOption)
                .with_op("allow_unexported")
                .with_message(message),
            OptionError::Unfiltered { .. } => {
                CmpError::new(CmpErrorKind::UnfilteredOption).with_message(message)
            }
            OptionError::NotFilterable { .. } => {
                CmpError::new(CmpErrorKind::InvalidOption).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for CmpError {
    fn from(err: serde_json::Error) -> Self {
        CmpError::new(CmpErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (CmpErrorKind::InvalidOption, "ERR_INVALID_OPTION"),
            (CmpErrorKind::UnfilteredOption, "ERR_UNFILTERED_OPTION"),
            (CmpErrorKind::AmbiguousOptions, "ERR_AMBIGUOUS_OPTIONS"),
            (CmpErrorKind::UnexportedField, "ERR_UNEXPORTED_FIELD"),
            (CmpErrorKind::NanMapKey, "ERR_NAN_MAP_KEY"),
            (
                CmpErrorKind::NonDeterministicFunction,
                "ERR_NON_DETERMINISTIC_FUNCTION",
            ),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_cmp_error_candidates_field() {
        let err = CmpError::new(CmpErrorKind::AmbiguousOptions)
            .with_candidates(vec!["Comparer(a)".into(), "Comparer(b)".into()]);
        let candidates = err.candidates().expect("candidates should be Some");
        assert_eq!(
            candidates,
            &["Comparer(a)".to_string(), "Comparer(b)".to_string()]
        );
    }

    #[test]
    fn test_cmp_error_candidates_none_by_default() {
        let err = CmpError::new(CmpErrorKind::Internal);
        assert!(err.candidates().is_none());
    }

    #[test]
    fn test_display_includes_op_and_path() {
        let err = CmpError::new(CmpErrorKind::UnexportedField)
            .with_op("equal")
            .with_path("{Point}.x")
            .with_message("cannot read field");
        assert_eq!(
            err.to_string(),
            "[ERR_UNEXPORTED_FIELD] in operation 'equal' at {Point}.x: cannot read field"
        );
    }

    #[test]
    fn test_option_error_maps_to_kind() {
        let err: CmpError = OptionError::InvalidTransformerName {
            name: "1bad".into(),
        }
        .into();
        assert_eq!(err.kind(), CmpErrorKind::InvalidName);
        assert_eq!(err.op(), Some("transformer"));
        assert!(err.message().contains("1bad"));
    }
}
