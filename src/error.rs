//! Error types.
//!
//! Each subsystem has its own error enum; [`Error`] wraps all of them so that
//! frame callbacks can mix stack, camera and shader operations behind a
//! single `?`.

use std::fmt;

/// Errors raised by [`TransformStack`](crate::TransformStack).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackError {
    /// `pop` or `peek` was called with no entries on the stack.
    Empty,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::Empty => write!(f, "transform stack is empty"),
        }
    }
}

impl std::error::Error for StackError {}

/// Errors raised when building or mutating a [`Camera`](crate::Camera).
#[derive(Clone, Debug, PartialEq)]
pub enum CameraError {
    /// A parameter would produce a degenerate view or projection matrix.
    InvalidConfiguration {
        /// Human readable description of the offending parameter.
        reason: String,
    },
}

impl CameraError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CameraError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidConfiguration { reason } => {
                write!(f, "Invalid camera configuration: {}", reason)
            }
        }
    }
}

impl std::error::Error for CameraError {}

/// Shader pipeline stage, used in compile diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Kind of shader variable that failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Attribute,
    Uniform,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Attribute => write!(f, "attribute"),
            VariableKind::Uniform => write!(f, "uniform"),
        }
    }
}

/// Errors reported by a [`RenderBackend`](crate::RenderBackend) while
/// preparing shader programs. All of them are fatal at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShaderError {
    /// A shader stage failed to compile. `log` is the compiler output.
    Compile { stage: ShaderStage, log: String },
    /// The program failed to link. `log` is the linker output.
    Link { log: String },
    /// A named attribute or uniform does not exist in the linked program.
    MissingVariable { kind: VariableKind, name: String },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => {
                write!(f, "Failed to compile {} shader: {}", stage, log)
            }
            ShaderError::Link { log } => write!(f, "Failed to link shader program: {}", log),
            ShaderError::MissingVariable { kind, name } => {
                write!(f, "Shader {} '{}' not found in program", kind, name)
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// Crate-level error.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Stack(StackError),
    Camera(CameraError),
    Shader(ShaderError),
    /// A shape was drawn that has no mesh registered with the renderer.
    UnknownShape(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Stack(e) => write!(f, "{}", e),
            Error::Camera(e) => write!(f, "{}", e),
            Error::Shader(e) => write!(f, "{}", e),
            Error::UnknownShape(name) => write!(f, "No mesh registered for shape '{}'", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Stack(e) => Some(e),
            Error::Camera(e) => Some(e),
            Error::Shader(e) => Some(e),
            Error::UnknownShape(_) => None,
        }
    }
}

impl From<StackError> for Error {
    fn from(e: StackError) -> Self {
        Error::Stack(e)
    }
}

impl From<CameraError> for Error {
    fn from(e: CameraError) -> Self {
        Error::Camera(e)
    }
}

impl From<ShaderError> for Error {
    fn from(e: ShaderError) -> Self {
        Error::Shader(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_errors_carry_diagnostics() {
        let err = ShaderError::Compile {
            stage: ShaderStage::Fragment,
            log: "0:3: 'vec5' : undeclared identifier".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fragment"));
        assert!(msg.contains("vec5"));
    }

    #[test]
    fn crate_error_wraps_source() {
        use std::error::Error as _;

        let err: Error = StackError::Empty.into();
        assert_eq!(err.to_string(), "transform stack is empty");
        assert!(err.source().is_some());
    }
}
