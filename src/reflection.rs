//! Post-link program introspection.
//!
//! After a program links, [`Reflection::introspect`] walks its active
//! attributes, uniform blocks and uniforms once and records stable name →
//! slot tables. Uniform blocks are bound to binding point = block index, and
//! sampler uniforms are assigned texture units in the order the driver
//! reports them. The tables are owned by the [`Program`](crate::Program) and
//! never change afterwards.

use crate::{error::AttributeResolutionError, gl::GlBackend};

/// Sampler uniform types that get a texture unit at link time.
const SAMPLER_TYPES: [u32; 7] = [
    glow::SAMPLER_2D,
    glow::SAMPLER_2D_ARRAY,
    glow::SAMPLER_2D_SHADOW,
    glow::SAMPLER_2D_ARRAY_SHADOW,
    glow::SAMPLER_CUBE,
    glow::SAMPLER_CUBE_SHADOW,
    glow::SAMPLER_3D,
];

/// Base type of a shader attribute, which selects the pointer path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// `float`, `vec*` and `mat*`: fed through `glVertexAttribPointer`.
    Float,
    /// `int` and `ivec*`: fed through `glVertexAttribIPointer`.
    Int,
    /// `uint` and `uvec*`: fed through `glVertexAttribIPointer`.
    UnsignedInt,
}

impl ComponentType {
    /// Whether the attribute uses the integer pointer path.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float)
    }
}

/// An active vertex attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Name as declared in the shader.
    pub name: String,
    /// GL type enum, e.g. `glow::FLOAT_MAT4`.
    pub gl_type: u32,
    /// First location assigned by the linker.
    pub location: u32,
}

/// An active uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockInfo {
    /// Block name as declared in the shader.
    pub name: String,
    /// Uniform buffer binding point the block reads from.
    pub binding: u32,
}

/// An active sampler uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerInfo {
    /// Uniform name as declared in the shader.
    pub name: String,
    /// Texture unit assigned at link time.
    pub unit: u32,
}

/// An attribute name resolved to the slots it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAttribute {
    /// First location.
    pub location: u32,
    /// Pointer path.
    pub component_type: ComponentType,
    /// Consecutive locations consumed: the column count for matrices, else 1.
    pub location_count: u32,
}

/// Name → slot tables of a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reflection {
    attributes: Vec<AttributeInfo>,
    uniform_blocks: Vec<UniformBlockInfo>,
    samplers: Vec<SamplerInfo>,
    outputs: Vec<String>,
}

impl Reflection {
    /// Build the tables for a freshly linked program.
    ///
    /// Leaves `program` bound as the current program.
    ///
    /// # Safety
    ///
    /// `program` must be a successfully linked program of `gl`, whose context
    /// is current.
    pub(crate) unsafe fn introspect<G: GlBackend>(
        gl: &G,
        program: G::Program,
        outputs: &[&str],
    ) -> Self {
        let mut reflection = Self {
            outputs: outputs.iter().map(|name| (*name).to_string()).collect(),
            ..Self::default()
        };

        unsafe {
            gl.use_program(Some(program));

            for index in 0..gl.get_active_attributes(program) {
                let Some(attribute) = gl.get_active_attribute(program, index) else {
                    continue;
                };
                // Built-ins such as gl_VertexID are reported without a location.
                let Some(location) = gl.get_attrib_location(program, &attribute.name) else {
                    continue;
                };
                reflection.attributes.push(AttributeInfo {
                    name: attribute.name,
                    gl_type: attribute.atype,
                    location,
                });
            }

            for index in 0..gl.get_active_uniform_blocks(program) {
                let name = gl.get_active_uniform_block_name(program, index);
                gl.uniform_block_binding(program, index, index);
                reflection.uniform_blocks.push(UniformBlockInfo {
                    name,
                    binding: index,
                });
            }

            let mut next_unit: i32 = 0;
            for index in 0..gl.get_active_uniforms(program) {
                let Some(uniform) = gl.get_active_uniform(program, index) else {
                    continue;
                };
                if !SAMPLER_TYPES.contains(&uniform.utype) {
                    continue;
                }
                match gl.get_uniform_location(program, &uniform.name) {
                    Some(location) => gl.uniform_1_i32(Some(&location), next_unit),
                    None => log::warn!("sampler uniform {} has no location", uniform.name),
                }
                reflection.samplers.push(SamplerInfo {
                    name: uniform.name,
                    unit: next_unit.unsigned_abs(),
                });
                next_unit += 1;
            }
        }

        reflection
    }

    /// Active attributes in introspection order.
    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    /// Active uniform blocks in introspection order.
    pub fn uniform_blocks(&self) -> &[UniformBlockInfo] {
        &self.uniform_blocks
    }

    /// Active sampler uniforms in unit order.
    pub fn samplers(&self) -> &[SamplerInfo] {
        &self.samplers
    }

    /// Varyings captured by transform feedback, in capture order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Binding point of a uniform block.
    pub fn uniform_block_binding(&self, name: &str) -> Option<u32> {
        self.uniform_blocks
            .iter()
            .find(|block| block.name == name)
            .map(|block| block.binding)
    }

    /// Texture unit of a sampler uniform.
    pub fn sampler_unit(&self, name: &str) -> Option<u32> {
        self.samplers
            .iter()
            .find(|sampler| sampler.name == name)
            .map(|sampler| sampler.unit)
    }

    /// Resolve an attribute name to its location, pointer path and the
    /// number of locations it consumes.
    ///
    /// # Errors
    ///
    /// Fails if the name is not an active attribute or its type cannot be fed
    /// from a vertex buffer (e.g. `bool`).
    pub fn resolve_attribute(&self, name: &str) -> Result<ResolvedAttribute, AttributeResolutionError> {
        let attribute = self
            .attribute(name)
            .ok_or_else(|| AttributeResolutionError::Unknown(name.to_string()))?;
        let (component_type, location_count) = attribute_shape(attribute.gl_type).ok_or_else(
            || AttributeResolutionError::UnsupportedType {
                name: name.to_string(),
                gl_type: attribute.gl_type,
            },
        )?;
        Ok(ResolvedAttribute {
            location: attribute.location,
            component_type,
            location_count,
        })
    }
}

/// Component type and location count of a GL attribute type.
///
/// Matrices take one location per column: `matCxR` consumes `C` locations.
pub fn attribute_shape(gl_type: u32) -> Option<(ComponentType, u32)> {
    let shape = match gl_type {
        glow::FLOAT | glow::FLOAT_VEC2 | glow::FLOAT_VEC3 | glow::FLOAT_VEC4 => {
            (ComponentType::Float, 1)
        }
        glow::FLOAT_MAT2 | glow::FLOAT_MAT2x3 | glow::FLOAT_MAT2x4 => (ComponentType::Float, 2),
        glow::FLOAT_MAT3 | glow::FLOAT_MAT3x2 | glow::FLOAT_MAT3x4 => (ComponentType::Float, 3),
        glow::FLOAT_MAT4 | glow::FLOAT_MAT4x2 | glow::FLOAT_MAT4x3 => (ComponentType::Float, 4),
        glow::INT | glow::INT_VEC2 | glow::INT_VEC3 | glow::INT_VEC4 => (ComponentType::Int, 1),
        glow::UNSIGNED_INT
        | glow::UNSIGNED_INT_VEC2
        | glow::UNSIGNED_INT_VEC3
        | glow::UNSIGNED_INT_VEC4 => (ComponentType::UnsignedInt, 1),
        _ => return None,
    };
    Some(shape)
}
