//! Error types.
//!
//! Configuration-time failures (format parsing, name resolution, shader
//! compilation) abort construction of the object being built. Draw-time
//! failures abort only the call that produced them.

use std::fmt;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Shader compilation or program linking failed.
    #[error(transparent)]
    Program(#[from] ProgramError),
    /// A pipeline descriptor could not be resolved against its program.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A draw or transform call was rejected.
    #[error(transparent)]
    Draw(#[from] DrawError),
    /// A buffer operation was out of range.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// Texture dimensions or pixel data are inconsistent.
    #[error("invalid texture: {0}")]
    InvalidTexture(String),
    /// The driver refused to create a GL object.
    #[error("GL object creation failed: {0}")]
    Gl(String),
}

/// A malformed vertex format string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid vertex format token \"{token}\": {kind}")]
pub struct ParseError {
    token: String,
    kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(token: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            token: token.into(),
            kind,
        }
    }

    /// The offending token (empty for an empty format string).
    pub fn token(&self) -> &str {
        &self.token
    }

    /// What was wrong with the token.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

/// Reason a format token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The format string has no attribute or padding tokens.
    Empty,
    /// The token does not start with a decimal count.
    MissingCount,
    /// The count is zero.
    ZeroCount,
    /// The count does not fit in 32 bits.
    CountOverflow,
    /// The type code after the count is not recognised.
    UnknownType,
    /// A `/...` step-rate marker that is neither `/v` nor `/i`.
    UnknownDivisor,
    /// A step-rate marker that is not the final token.
    MisplacedDivisor,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "format has no attribute tokens",
            Self::MissingCount => "missing component count",
            Self::ZeroCount => "component count must be at least 1",
            Self::CountOverflow => "component count is too large",
            Self::UnknownType => "unknown type code",
            Self::UnknownDivisor => "unknown step rate, expected /v or /i",
            Self::MisplacedDivisor => "step rate must be the last token",
        })
    }
}

/// A vertex attribute name that cannot be bound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeResolutionError {
    /// The program has no active attribute with this name.
    #[error("attribute \"{0}\" is not an active attribute of the program")]
    Unknown(String),
    /// The attribute's GL type cannot be fed from a vertex buffer.
    #[error("attribute \"{name}\" has unsupported type 0x{gl_type:04x}")]
    UnsupportedType {
        /// Attribute name.
        name: String,
        /// GL type enum reported by introspection.
        gl_type: u32,
    },
}

/// A resource binding name that cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceResolutionError {
    /// No active sampler uniform with this name.
    #[error("\"{0}\" is not an active sampler uniform of the program")]
    UnknownSampler(String),
    /// No active uniform block with this name.
    #[error("\"{0}\" is not an active uniform block of the program")]
    UnknownUniformBlock(String),
}

/// A pipeline descriptor that does not fit its program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A vertex format string failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An attribute name failed to resolve.
    #[error(transparent)]
    Attribute(#[from] AttributeResolutionError),
    /// A resource binding failed to resolve.
    #[error(transparent)]
    Resource(#[from] ResourceResolutionError),
    /// The number of attribute names differs from the number of non-padding
    /// nodes in the format.
    #[error("format \"{format}\" has {expected} attribute(s) but {given} name(s) were given")]
    AttributeCount {
        /// The format string.
        format: String,
        /// Non-padding nodes in the format.
        expected: usize,
        /// Attribute names supplied.
        given: usize,
    },
    /// A matrix attribute's node cannot be split evenly across its locations,
    /// or a location would receive more than four components.
    #[error("attribute \"{name}\" cannot take {count} component(s) over {locations} location(s)")]
    ComponentCount {
        /// Attribute name.
        name: String,
        /// Components in the format node.
        count: u32,
        /// Locations consumed by the attribute.
        locations: u32,
    },
    /// An integer shader attribute was fed floating-point data.
    #[error("integer attribute \"{0}\" cannot be fed floating-point data")]
    IntegerAttributeFromFloat(String),
    /// The buffer given as index buffer was not created as one.
    #[error("index buffer was not created with BufferKind::Index")]
    NotAnIndexBuffer,
    /// A stride or offset does not fit the GL integer range.
    #[error("vertex layout too large: {0} bytes")]
    LayoutTooLarge(u32),
    /// An unknown primitive topology name.
    #[error("unknown topology \"{0}\"")]
    UnknownTopology(String),
}

/// Shader stage, for compile diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Shader compilation or linking failure, carrying the driver's log verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// A shader stage failed to compile.
    #[error("{stage} shader compile error: {log}")]
    Compile {
        /// Stage that failed.
        stage: ShaderStage,
        /// Driver info log.
        log: String,
    },
    /// The program failed to link.
    #[error("program link error: {0}")]
    Link(String),
}

/// A rejected `render` or `transform` call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    /// Vertex count was zero or negative.
    #[error("vertex count must be positive, got {0}")]
    NonPositiveVertexCount(i32),
    /// Instance count was zero or negative.
    #[error("instance count must be positive, got {0}")]
    NonPositiveInstanceCount(i32),
    /// `transform` on a program linked without output varyings.
    #[error("program has no transform feedback outputs")]
    NoFeedbackOutputs,
    /// `transform` on a pipeline without an output buffer.
    #[error("pipeline has no transform feedback output buffer")]
    NoOutputBuffer,
}

/// A buffer access outside the buffer's storage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The range `offset..offset + len` exceeds the buffer size.
    #[error("range {offset}..{offset}+{len} exceeds buffer size {size}")]
    OutOfRange {
        /// Start of the range in bytes.
        offset: usize,
        /// Length of the range in bytes.
        len: usize,
        /// Buffer size in bytes.
        size: usize,
    },
    /// The size does not fit the GL integer range.
    #[error("{0} bytes exceeds the GL buffer size limit")]
    TooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_token() {
        let err = ParseError::new("3z", ParseErrorKind::UnknownType);
        assert_eq!(err.token(), "3z");
        assert_eq!(
            err.to_string(),
            "invalid vertex format token \"3z\": unknown type code"
        );
    }

    #[test]
    fn nested_errors_stay_transparent() {
        let err: Error = ConfigurationError::from(AttributeResolutionError::Unknown(
            "in_vert".to_string(),
        ))
        .into();
        assert_eq!(
            err.to_string(),
            "attribute \"in_vert\" is not an active attribute of the program"
        );
    }

    #[test]
    fn compile_error_keeps_driver_log() {
        let err = ProgramError::Compile {
            stage: ShaderStage::Fragment,
            log: "0:3: 'foo' : undeclared identifier".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "fragment shader compile error: 0:3: 'foo' : undeclared identifier"
        );
    }
}
