//! Declarative pipelines for OpenGL via [glow].
//!
//! This crate sits on top of the stateful GL API and lets callers describe a
//! draw instead of issuing binding calls. A [`Pipeline`] bundles a linked
//! [`Program`], vertex buffers described by compact format strings, and
//! samplers and uniform buffers bound by their shader names. Everything is
//! resolved against the program's introspection tables once, when the
//! pipeline is created; drawing only rebinds.
//!
//! # Features
//!
//! - **Vertex format strings**: `"3f 12x 2f"` describes a `vec3`, 12 bytes of
//!   padding and a `vec2` in one interleaved buffer; a trailing `/i` makes
//!   the buffer per-instance. Matrix attributes are split across their
//!   column locations automatically. See [`VertexFormat`].
//! - **Name-based binding**: attributes, uniform blocks and samplers are
//!   matched by name. Uniform blocks are bound to their block index and
//!   sampler uniforms get texture units in declaration order at link time.
//! - **Transform feedback**: programs declare captured outputs, and
//!   [`Pipeline::transform`] copies them into an output buffer.
//! - **Instancing and indexed draws** through the same
//!   [`render`](Pipeline::render) call.
//!
//! # Safety
//!
//! A [`Context`] requires a valid, current OpenGL context, which is why
//! [`Context::new`] is `unsafe`. Every call that changes GL state takes the
//! context by `&mut`. GL objects are released explicitly with `destroy`.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use glow_pipeline::*;
//! # fn example(gl: Arc<glow::Context>) -> Result<()> {
//! let mut ctx = unsafe { Context::new(gl) };
//! let program = ctx.create_program(&ProgramDescriptor {
//!     vertex_shader: "#version 330 core
//!         in vec2 in_vert;
//!         void main() { gl_Position = vec4(in_vert, 0.0, 1.0); }",
//!     fragment_shader: Some("#version 330 core
//!         out vec4 color;
//!         void main() { color = vec4(1.0); }"),
//!     outputs: &[],
//! })?;
//! let vertices: [f32; 6] = [0.0, 0.8, -0.6, -0.8, 0.6, -0.8];
//! let vbo = ctx.create_buffer(&BufferDescriptor {
//!     contents: BufferContents::from_slice(&vertices),
//!     ..BufferDescriptor::default()
//! })?;
//! let pipeline = ctx.create_pipeline(&PipelineDescriptor {
//!     vertex_buffers: &[VertexBufferLayout {
//!         buffer: &vbo,
//!         format: "2f",
//!         attributes: &["in_vert"],
//!     }],
//!     ..PipelineDescriptor::new(&program)
//! })?;
//!
//! ctx.clear(&ClearParams::default());
//! pipeline.render(&mut ctx, 3, 1)?;
//! # Ok(())
//! # }
//! ```
//!
//! [glow]: https://docs.rs/glow

mod buffer;
mod context;
mod error;
mod format;
mod gl;
mod layout;
#[cfg(test)]
mod mock;
mod pipeline;
mod program;
mod reflection;
mod resources;
mod texture;

pub use buffer::{Buffer, BufferContents, BufferDescriptor, BufferKind};
pub use context::{BufferCopy, ClearParams, Context, DEFAULT_CLEAR_COLOR};
pub use error::{
    AttributeResolutionError, BufferError, ConfigurationError, DrawError, Error, ParseError,
    ParseErrorKind, ProgramError, ResourceResolutionError, Result, ShaderStage,
};
pub use format::{FormatNode, NodeKind, ScalarType, StepRate, VertexFormat};
pub use gl::{ActiveAttribute, ActiveUniform, GlBackend};
pub use layout::{attribute_pointers, AttributePointer, PointerPath};
pub use pipeline::{
    Pipeline, PipelineDescriptor, RenderState, Topology, VertexBufferLayout,
    DEFAULT_RENDER_TOPOLOGY, DEFAULT_TRANSFORM_TOPOLOGY,
};
pub use program::{Program, ProgramDescriptor};
pub use reflection::{
    attribute_shape, AttributeInfo, ComponentType, Reflection, ResolvedAttribute, SamplerInfo,
    UniformBlockInfo,
};
pub use resources::{
    Resource, ResourceBinding, ResourceTable, SamplerBinding, UniformBufferBinding,
};
pub use texture::{Sampler, Texture, TextureDescriptor};
