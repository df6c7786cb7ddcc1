//! Named resource bindings resolved against a program.

use std::fmt;

use crate::{
    buffer::Buffer,
    error::ResourceResolutionError,
    gl::GlBackend,
    reflection::Reflection,
    texture::Sampler,
};

/// A resource a pipeline reads during a draw.
pub enum Resource<'a, G: GlBackend> {
    /// A texture sampler, bound to a sampler uniform.
    Sampler(&'a Sampler<G>),
    /// A buffer, bound to a uniform block.
    UniformBuffer(&'a Buffer<G>),
}

impl<G: GlBackend> Clone for Resource<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: GlBackend> Copy for Resource<'_, G> {}

/// A resource paired with the shader name it is bound to.
pub struct ResourceBinding<'a, G: GlBackend> {
    /// The resource.
    pub resource: Resource<'a, G>,
    /// Sampler uniform or uniform block name.
    pub name: &'a str,
}

impl<'a, G: GlBackend> ResourceBinding<'a, G> {
    /// Bind `sampler` to the sampler uniform `name`.
    pub fn sampler(name: &'a str, sampler: &'a Sampler<G>) -> Self {
        Self {
            resource: Resource::Sampler(sampler),
            name,
        }
    }

    /// Bind `buffer` to the uniform block `name`.
    pub fn uniform_buffer(name: &'a str, buffer: &'a Buffer<G>) -> Self {
        Self {
            resource: Resource::UniformBuffer(buffer),
            name,
        }
    }
}

/// A sampler resolved to its texture unit.
pub struct SamplerBinding<G: GlBackend> {
    /// Sampler object.
    pub sampler: G::Sampler,
    /// Texture the sampler reads.
    pub texture: G::Texture,
    /// Texture unit.
    pub unit: u32,
}

/// A uniform buffer resolved to its binding point.
pub struct UniformBufferBinding<G: GlBackend> {
    /// Buffer object.
    pub buffer: G::Buffer,
    /// Uniform buffer binding point.
    pub binding: u32,
}

// Derives would require `G` itself to implement these traits.

impl<G: GlBackend> Clone for SamplerBinding<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: GlBackend> Copy for SamplerBinding<G> {}

impl<G: GlBackend> PartialEq for SamplerBinding<G> {
    fn eq(&self, other: &Self) -> bool {
        self.sampler == other.sampler && self.texture == other.texture && self.unit == other.unit
    }
}

impl<G: GlBackend> fmt::Debug for SamplerBinding<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerBinding")
            .field("sampler", &self.sampler)
            .field("texture", &self.texture)
            .field("unit", &self.unit)
            .finish()
    }
}

impl<G: GlBackend> Clone for UniformBufferBinding<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: GlBackend> Copy for UniformBufferBinding<G> {}

impl<G: GlBackend> PartialEq for UniformBufferBinding<G> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer && self.binding == other.binding
    }
}

impl<G: GlBackend> fmt::Debug for UniformBufferBinding<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformBufferBinding")
            .field("buffer", &self.buffer)
            .field("binding", &self.binding)
            .finish()
    }
}

/// Resolved sampler and uniform buffer bindings, in insertion order.
pub struct ResourceTable<G: GlBackend> {
    samplers: Vec<SamplerBinding<G>>,
    uniform_buffers: Vec<UniformBufferBinding<G>>,
}

impl<G: GlBackend> fmt::Debug for ResourceTable<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("samplers", &self.samplers)
            .field("uniform_buffers", &self.uniform_buffers)
            .finish()
    }
}

impl<G: GlBackend> ResourceTable<G> {
    /// Route each binding to the sampler or uniform block table and resolve
    /// its name.
    ///
    /// Two bindings to the same slot are both kept; the later one wins when
    /// bound.
    ///
    /// # Errors
    ///
    /// Fails on the first name the program does not declare.
    pub fn build(
        reflection: &Reflection,
        bindings: &[ResourceBinding<'_, G>],
    ) -> Result<Self, ResourceResolutionError> {
        let mut samplers = Vec::new();
        let mut uniform_buffers = Vec::new();

        for binding in bindings {
            match binding.resource {
                Resource::Sampler(sampler) => {
                    let unit = reflection.sampler_unit(binding.name).ok_or_else(|| {
                        ResourceResolutionError::UnknownSampler(binding.name.to_string())
                    })?;
                    samplers.push(SamplerBinding {
                        sampler: sampler.raw(),
                        texture: sampler.texture(),
                        unit,
                    });
                }
                Resource::UniformBuffer(buffer) => {
                    let index = reflection
                        .uniform_block_binding(binding.name)
                        .ok_or_else(|| {
                            ResourceResolutionError::UnknownUniformBlock(binding.name.to_string())
                        })?;
                    uniform_buffers.push(UniformBufferBinding {
                        buffer: buffer.raw(),
                        binding: index,
                    });
                }
            }
        }

        Ok(Self {
            samplers,
            uniform_buffers,
        })
    }

    /// Resolved samplers.
    pub fn samplers(&self) -> &[SamplerBinding<G>] {
        &self.samplers
    }

    /// Resolved uniform buffers.
    pub fn uniform_buffers(&self) -> &[UniformBufferBinding<G>] {
        &self.uniform_buffers
    }

    /// Bind uniform buffers, then textures and samplers.
    ///
    /// # Safety
    ///
    /// Requires a current context that owns every bound object.
    pub(crate) unsafe fn bind(&self, gl: &G) {
        unsafe {
            for uniform in &self.uniform_buffers {
                gl.bind_buffer_base(glow::UNIFORM_BUFFER, uniform.binding, Some(uniform.buffer));
            }
            for sampler in &self.samplers {
                gl.active_texture(glow::TEXTURE0 + sampler.unit);
                gl.bind_texture(glow::TEXTURE_2D, Some(sampler.texture));
                gl.bind_sampler(sampler.unit, Some(sampler.sampler));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        buffer::{BufferContents, BufferDescriptor, BufferKind},
        context::Context,
        mock::{Call, MockGl},
        texture::TextureDescriptor,
    };

    fn setup() -> (Arc<MockGl>, Context<MockGl>, Reflection) {
        let gl = Arc::new(
            MockGl::new()
                .with_uniform_block("Common")
                .with_uniform_block("Lights")
                .with_uniform("Texture", glow::SAMPLER_2D)
                .with_uniform("Normals", glow::SAMPLER_2D),
        );
        let reflection = unsafe {
            let program = gl.create_program().unwrap();
            Reflection::introspect(gl.as_ref(), program, &[])
        };
        let ctx = unsafe { Context::new(Arc::clone(&gl)) };
        (gl, ctx, reflection)
    }

    fn uniform_buffer(ctx: &mut Context<MockGl>) -> Buffer<MockGl> {
        ctx.create_buffer(&BufferDescriptor {
            contents: BufferContents::Reserve(64),
            kind: BufferKind::Uniform,
            ..BufferDescriptor::default()
        })
        .unwrap()
    }

    #[test]
    fn routes_bindings_by_tag() {
        let (_, mut ctx, reflection) = setup();
        let texture = ctx.create_texture(&TextureDescriptor::default()).unwrap();
        let sampler = ctx.create_sampler(&texture).unwrap();
        let lights = uniform_buffer(&mut ctx);

        let table = ResourceTable::build(
            &reflection,
            &[
                ResourceBinding::sampler("Normals", &sampler),
                ResourceBinding::uniform_buffer("Lights", &lights),
            ],
        )
        .unwrap();

        assert_eq!(
            table.samplers(),
            [SamplerBinding {
                sampler: sampler.raw(),
                texture: texture.raw(),
                unit: 1,
            }]
        );
        assert_eq!(
            table.uniform_buffers(),
            [UniformBufferBinding {
                buffer: lights.raw(),
                binding: 1,
            }]
        );
    }

    #[test]
    fn unknown_names_fail() {
        let (_, mut ctx, reflection) = setup();
        let texture = ctx.create_texture(&TextureDescriptor::default()).unwrap();
        let sampler = ctx.create_sampler(&texture).unwrap();
        let buffer = uniform_buffer(&mut ctx);

        assert_eq!(
            ResourceTable::build(&reflection, &[ResourceBinding::sampler("Common", &sampler)])
                .unwrap_err(),
            ResourceResolutionError::UnknownSampler("Common".to_string())
        );
        assert_eq!(
            ResourceTable::build(&reflection, &[ResourceBinding::uniform_buffer("Texture", &buffer)])
                .unwrap_err(),
            ResourceResolutionError::UnknownUniformBlock("Texture".to_string())
        );
    }

    #[test]
    fn binds_uniform_buffers_before_samplers() {
        let (gl, mut ctx, reflection) = setup();
        let texture = ctx.create_texture(&TextureDescriptor::default()).unwrap();
        let sampler = ctx.create_sampler(&texture).unwrap();
        let common = uniform_buffer(&mut ctx);

        let table = ResourceTable::build(
            &reflection,
            &[
                ResourceBinding::sampler("Texture", &sampler),
                ResourceBinding::uniform_buffer("Common", &common),
            ],
        )
        .unwrap();
        gl.clear_calls();
        unsafe { table.bind(gl.as_ref()) };

        assert_eq!(
            gl.calls(),
            vec![
                Call::BindBufferBase {
                    target: glow::UNIFORM_BUFFER,
                    index: 0,
                    buffer: Some(common.raw())
                },
                Call::ActiveTexture(glow::TEXTURE0),
                Call::BindTexture {
                    target: glow::TEXTURE_2D,
                    texture: Some(texture.raw())
                },
                Call::BindSampler {
                    unit: 0,
                    sampler: Some(sampler.raw())
                },
            ]
        );
    }

    #[test]
    fn duplicate_slots_are_kept_in_order() {
        let (_, mut ctx, reflection) = setup();
        let first = uniform_buffer(&mut ctx);
        let second = uniform_buffer(&mut ctx);

        let table = ResourceTable::build(
            &reflection,
            &[
                ResourceBinding::uniform_buffer("Common", &first),
                ResourceBinding::uniform_buffer("Common", &second),
            ],
        )
        .unwrap();

        let buffers: Vec<_> = table.uniform_buffers().iter().map(|b| b.buffer).collect();
        assert_eq!(buffers, [first.raw(), second.raw()]);
    }
}
