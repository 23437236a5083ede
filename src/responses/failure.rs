use std::fmt;

/// Category of a [`Failure`].
///
/// The set is closed on purpose: downstream layers (HTTP mappers, retry
/// policies) can match exhaustively and the compiler flags the gap when a
/// kind is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FailureKind {
    /// Problem with no more specific category.
    #[default]
    Unspecified,
    /// Caller identity could not be established.
    NotAuthenticated,
    /// Caller is known but not permitted to perform the operation.
    NotAllowed,
    /// Referenced resource does not exist.
    NotFound,
    /// Concurrent modification conflict.
    ConcurrencyError,
    /// Input violates the request contract (shape, required fields).
    ContractValidation,
    /// Input is well-formed but violates a business rule.
    DomainValidation,
    /// Unexpected fault surfaced as a failure (e.g. a caught panic).
    UnhandledException,
}

impl FailureKind {
    /// Stable short label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureKind::Unspecified => "unspecified",
            FailureKind::NotAuthenticated => "not_authenticated",
            FailureKind::NotAllowed => "not_allowed",
            FailureKind::NotFound => "not_found",
            FailureKind::ConcurrencyError => "concurrency_error",
            FailureKind::ContractValidation => "contract_validation",
            FailureKind::DomainValidation => "domain_validation",
            FailureKind::UnhandledException => "unhandled_exception",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One named validation problem inside a [`Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field or rule the problem refers to.
    pub name: String,
    /// Human-readable description of the problem.
    pub detail: String,
}

impl ValidationError {
    pub fn new(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// Expected business failure produced by a handler or behavior.
///
/// A `Failure` is data, not a fault: it flows back through the pipeline as
/// the `Err` arm of [`DispatchResult`](crate::DispatchResult) and
/// short-circuits any behaviors still open on the way out.
///
/// Constructors start from a [`FailureKind`] and layer optional detail in the
/// builder style:
///
/// ```
/// use mediary::{Failure, FailureKind};
///
/// let failure = Failure::of(FailureKind::NotFound)
///     .with_title("order missing")
///     .with_detail("order 42 was not found");
/// assert_eq!(failure.kind, FailureKind::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Failure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Short summary, if any.
    pub title: Option<String>,
    /// Longer description, if any.
    pub detail: Option<String>,
    /// Named validation problems, usually non-empty only for the two
    /// validation kinds.
    pub errors: Vec<ValidationError>,
}

impl Failure {
    /// Failure of the given kind with no further detail.
    pub fn of(kind: FailureKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Shorthand for a [`FailureKind::NotFound`] failure with a detail text.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::of(FailureKind::NotFound).with_detail(detail)
    }

    /// Shorthand for a [`FailureKind::UnhandledException`] failure with a
    /// detail text.
    pub fn unhandled(detail: impl Into<String>) -> Self {
        Self::of(FailureKind::UnhandledException).with_detail(detail)
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Appends one validation error.
    pub fn with_error(mut self, error: ValidationError) -> Self {
        self.errors.push(error);
        self
    }

    /// Replaces the validation error list.
    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = errors;
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_label())?;
        if let Some(title) = &self.title {
            write!(f, ": {title}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        if !self.errors.is_empty() {
            write!(f, " [{} validation error(s)]", self.errors.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}
