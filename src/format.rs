//! Compact vertex format strings.
//!
//! A format string describes how one interleaved buffer is laid out, e.g.
//! `"3f 12x 2f"` (a `vec3`, 12 bytes of padding, a `vec2`) or `"2f /i"` (a
//! per-instance `vec2`). Each token is a decimal component count followed by
//! a type code; an optional final `/v` or `/i` selects the step rate.
//!
//! | Code         | Component type   | Bytes |
//! |--------------|------------------|-------|
//! | `f`, `f4`    | `FLOAT`          | 4     |
//! | `f2`         | `HALF_FLOAT`     | 2     |
//! | `i`, `i4`    | `INT`            | 4     |
//! | `i2`         | `SHORT`          | 2     |
//! | `i1`         | `BYTE`           | 1     |
//! | `u`, `u4`    | `UNSIGNED_INT`   | 4     |
//! | `u2`         | `UNSIGNED_SHORT` | 2     |
//! | `u1`         | `UNSIGNED_BYTE`  | 1     |
//! | `x`          | padding          | 1     |

use std::str::FromStr;

use crate::error::{ParseError, ParseErrorKind};

/// Component type of a vertex attribute as stored in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 32-bit float.
    Float,
    /// 16-bit float.
    HalfFloat,
    /// 32-bit signed integer.
    Int,
    /// 16-bit signed integer.
    Short,
    /// 8-bit signed integer.
    Byte,
    /// 32-bit unsigned integer.
    UnsignedInt,
    /// 16-bit unsigned integer.
    UnsignedShort,
    /// 8-bit unsigned integer.
    UnsignedByte,
}

impl ScalarType {
    /// The GL type enum passed to `glVertexAttrib*Pointer`.
    pub fn gl_type(self) -> u32 {
        match self {
            Self::Float => glow::FLOAT,
            Self::HalfFloat => glow::HALF_FLOAT,
            Self::Int => glow::INT,
            Self::Short => glow::SHORT,
            Self::Byte => glow::BYTE,
            Self::UnsignedInt => glow::UNSIGNED_INT,
            Self::UnsignedShort => glow::UNSIGNED_SHORT,
            Self::UnsignedByte => glow::UNSIGNED_BYTE,
        }
    }

    /// Size of one component in bytes.
    pub fn byte_width(self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::UnsignedInt => 4,
            Self::HalfFloat | Self::Short | Self::UnsignedShort => 2,
            Self::Byte | Self::UnsignedByte => 1,
        }
    }

    /// Whether the type is an integer type.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float | Self::HalfFloat)
    }
}

/// What a format node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A shader attribute with the given component type.
    Attribute(ScalarType),
    /// Bytes skipped between attributes.
    Padding,
}

/// One token of a vertex format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatNode {
    /// Number of components (or padding bytes).
    pub count: u32,
    /// Attribute component type, or padding.
    pub kind: NodeKind,
    /// Size of the node in bytes.
    pub size: u32,
}

impl FormatNode {
    /// Whether this node feeds a shader attribute.
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, NodeKind::Attribute(_))
    }
}

/// How often an attribute advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StepRate {
    /// Once per vertex (`/v`, the default).
    #[default]
    Vertex,
    /// Once per instance (`/i`).
    Instance,
}

impl StepRate {
    /// The value passed to `glVertexAttribDivisor`.
    pub fn divisor(self) -> u32 {
        match self {
            Self::Vertex => 0,
            Self::Instance => 1,
        }
    }
}

/// A parsed vertex format: the layout of one interleaved buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    nodes: Vec<FormatNode>,
    step_rate: StepRate,
    stride: u32,
}

impl VertexFormat {
    /// Parse a format string such as `"3f 12x 2f"` or `"2f /i"`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming the first token that is not valid.
    pub fn parse(format: &str) -> Result<Self, ParseError> {
        let mut tokens: Vec<&str> = format.split_whitespace().collect();

        let step_rate = match tokens.last() {
            Some(&"/v") => Some(StepRate::Vertex),
            Some(&"/i") => Some(StepRate::Instance),
            Some(token) if token.starts_with('/') => {
                return Err(ParseError::new(*token, ParseErrorKind::UnknownDivisor));
            }
            _ => None,
        };
        if step_rate.is_some() {
            tokens.pop();
        }

        if tokens.is_empty() {
            return Err(ParseError::new(format.trim(), ParseErrorKind::Empty));
        }

        let mut nodes = Vec::with_capacity(tokens.len());
        let mut stride = 0u32;
        for token in tokens {
            let node = parse_node(token)?;
            stride = stride
                .checked_add(node.size)
                .ok_or_else(|| ParseError::new(token, ParseErrorKind::CountOverflow))?;
            nodes.push(node);
        }

        Ok(Self {
            nodes,
            step_rate: step_rate.unwrap_or_default(),
            stride,
        })
    }

    /// The nodes in buffer order.
    pub fn nodes(&self) -> &[FormatNode] {
        &self.nodes
    }

    /// Per-vertex or per-instance.
    pub fn step_rate(&self) -> StepRate {
        self.step_rate
    }

    /// Distance in bytes between consecutive elements: the sum of node sizes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Number of nodes that feed shader attributes.
    pub fn attribute_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_attribute()).count()
    }
}

impl FromStr for VertexFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_node(token: &str) -> Result<FormatNode, ParseError> {
    if token.starts_with('/') {
        return Err(ParseError::new(token, ParseErrorKind::MisplacedDivisor));
    }

    let split = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, code) = token.split_at(split);
    if digits.is_empty() {
        return Err(ParseError::new(token, ParseErrorKind::MissingCount));
    }

    let count: u32 = digits
        .parse()
        .map_err(|_| ParseError::new(token, ParseErrorKind::CountOverflow))?;
    if count == 0 {
        return Err(ParseError::new(token, ParseErrorKind::ZeroCount));
    }

    let kind = parse_type_code(code)
        .ok_or_else(|| ParseError::new(token, ParseErrorKind::UnknownType))?;
    let width = match kind {
        NodeKind::Attribute(scalar) => scalar.byte_width(),
        NodeKind::Padding => 1,
    };
    let size = count
        .checked_mul(width)
        .ok_or_else(|| ParseError::new(token, ParseErrorKind::CountOverflow))?;

    Ok(FormatNode { count, kind, size })
}

fn parse_type_code(code: &str) -> Option<NodeKind> {
    let scalar = match code {
        "f" | "f4" => ScalarType::Float,
        "f2" => ScalarType::HalfFloat,
        "i" | "i4" => ScalarType::Int,
        "i2" => ScalarType::Short,
        "i1" => ScalarType::Byte,
        "u" | "u4" => ScalarType::UnsignedInt,
        "u2" => ScalarType::UnsignedShort,
        "u1" => ScalarType::UnsignedByte,
        "x" => return Some(NodeKind::Padding),
        _ => return None,
    };
    Some(NodeKind::Attribute(scalar))
}
