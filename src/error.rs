use std::backtrace::Backtrace;
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while assembling a problem. These can only occur during
/// construction; once a problem is built, solving never fails with a
/// `BuildError` (unsatisfiability is reported as an empty solution list,
/// not an error).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("constraint scope references unknown variable {0}")]
    UnknownVariable(u32),
    #[error("constraint scope is empty")]
    EmptyScope,
    #[error("domain universe for variable `{0}` is empty")]
    EmptyUniverse(String),
    #[error("duplicate variable name `{0}`")]
    DuplicateVariable(String),
    #[error("malformed input: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Build: {inner}\n{backtrace}")]
    Build {
        inner: Box<BuildError>,
        backtrace: Box<Backtrace>,
    },
}

impl From<BuildError> for Error {
    fn from(inner: BuildError) -> Self {
        Error::Build {
            inner: Box::new(inner),
            backtrace: Box::new(std::backtrace::Backtrace::capture()),
        }
    }
}

impl Error {
    /// The build error carried by this error.
    pub fn build_error(&self) -> &BuildError {
        match self {
            Error::Build { inner, .. } => inner,
        }
    }
}
