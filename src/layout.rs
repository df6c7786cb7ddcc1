//! Vertex buffer layouts: format nodes paired with shader attributes.
//!
//! Each non-padding node of a [`VertexFormat`] is matched, in order, with
//! one attribute name. A node feeding a matrix attribute is split into one
//! pointer per column location, each taking `count / columns` components at
//! `offset + column * size / columns`.

use crate::{
    error::ConfigurationError,
    format::{NodeKind, ScalarType, VertexFormat},
    gl::GlBackend,
    reflection::Reflection,
};

/// Which `glVertexAttrib*Pointer` entry point feeds a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPath {
    /// `glVertexAttribPointer`, never normalized.
    Float,
    /// `glVertexAttribIPointer`.
    Integer,
}

/// Configuration of one attribute location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePointer {
    /// Attribute location.
    pub location: u32,
    /// Components read per element, 1 to 4.
    pub components: i32,
    /// Component type as stored in the buffer.
    pub data_type: ScalarType,
    /// Pointer entry point.
    pub path: PointerPath,
    /// Bytes between consecutive elements.
    pub stride: i32,
    /// Byte offset of the first component.
    pub offset: i32,
    /// 0 per vertex, 1 per instance.
    pub divisor: u32,
}

impl AttributePointer {
    /// Enable the location and point it at the currently bound
    /// `ARRAY_BUFFER`.
    ///
    /// # Safety
    ///
    /// Requires a bound vertex array and array buffer on a current context.
    pub(crate) unsafe fn apply<G: GlBackend>(&self, gl: &G) {
        unsafe {
            gl.enable_vertex_attrib_array(self.location);
            match self.path {
                PointerPath::Float => gl.vertex_attrib_pointer_f32(
                    self.location,
                    self.components,
                    self.data_type.gl_type(),
                    false,
                    self.stride,
                    self.offset,
                ),
                PointerPath::Integer => gl.vertex_attrib_pointer_i32(
                    self.location,
                    self.components,
                    self.data_type.gl_type(),
                    self.stride,
                    self.offset,
                ),
            }
            gl.vertex_attrib_divisor(self.location, self.divisor);
        }
    }
}

/// Resolve one buffer's format against the program's attributes.
///
/// # Errors
///
/// Fails if the format does not parse, the name count differs from the
/// number of non-padding nodes, a name does not resolve, an integer
/// attribute is fed float data, or a node cannot be split across the
/// locations of its attribute.
pub fn attribute_pointers(
    reflection: &Reflection,
    format: &str,
    names: &[&str],
) -> Result<Vec<AttributePointer>, ConfigurationError> {
    let parsed = VertexFormat::parse(format)?;

    if parsed.attribute_count() != names.len() {
        return Err(ConfigurationError::AttributeCount {
            format: format.to_string(),
            expected: parsed.attribute_count(),
            given: names.len(),
        });
    }

    let stride = gl_int(parsed.stride())?;
    let divisor = parsed.step_rate().divisor();

    let mut pointers = Vec::with_capacity(names.len());
    let mut names = names.iter();
    let mut node_offset = 0;

    for node in parsed.nodes() {
        let offset = node_offset;
        // Never exceeds the stride, which parsing checked for overflow.
        node_offset += node.size;

        let NodeKind::Attribute(data_type) = node.kind else {
            continue;
        };
        // Counts were checked to match above.
        let Some(&name) = names.next() else {
            break;
        };

        let resolved = reflection.resolve_attribute(name)?;
        if resolved.component_type.is_integer() && !data_type.is_integer() {
            return Err(ConfigurationError::IntegerAttributeFromFloat(name.to_string()));
        }

        let columns = resolved.location_count;
        let components = node.count / columns;
        if node.count % columns != 0 || !(1..=4).contains(&components) {
            return Err(ConfigurationError::ComponentCount {
                name: name.to_string(),
                count: node.count,
                locations: columns,
            });
        }
        let path = if resolved.component_type.is_integer() {
            PointerPath::Integer
        } else {
            PointerPath::Float
        };

        let column_size = node.size / columns;
        for column in 0..columns {
            pointers.push(AttributePointer {
                location: resolved.location + column,
                components: gl_int(components)?,
                data_type,
                path,
                stride,
                offset: gl_int(offset + column * column_size)?,
                divisor,
            });
        }
    }

    Ok(pointers)
}

fn gl_int(bytes: u32) -> Result<i32, ConfigurationError> {
    i32::try_from(bytes).map_err(|_| ConfigurationError::LayoutTooLarge(bytes))
}
