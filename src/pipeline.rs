//! Pipelines: a program, its vertex array and resources, ready to draw.
//!
//! Everything a [`PipelineDescriptor`] names is parsed and resolved against
//! the program's reflection before any GL object is created. The vertex
//! array is configured once at construction; program, render state and
//! resource bindings are reapplied on every [`render`](Pipeline::render) and
//! [`transform`](Pipeline::transform), since other pipelines sharing the
//! context may have changed them.

use std::{fmt, str::FromStr};

use crate::{
    buffer::{gl_size, Buffer, BufferKind},
    context::Context,
    error::{ConfigurationError, DrawError, Error, Result},
    gl::GlBackend,
    layout::{attribute_pointers, AttributePointer},
    program::Program,
    resources::{ResourceBinding, ResourceTable},
};

/// Topology used by [`Pipeline::render`] unless one is given.
pub const DEFAULT_RENDER_TOPOLOGY: Topology = Topology::Triangles;

/// Topology used by [`Pipeline::transform`] unless one is given.
pub const DEFAULT_TRANSFORM_TOPOLOGY: Topology = Topology::Points;

/// Primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// `points`
    Points,
    /// `lines`
    Lines,
    /// `line_strip`
    LineStrip,
    /// `line_loop`
    LineLoop,
    /// `triangles`
    Triangles,
    /// `triangle_fan`
    TriangleFan,
    /// `triangle_strip`
    TriangleStrip,
}

impl Topology {
    /// The GL primitive mode.
    pub fn gl_mode(self) -> u32 {
        match self {
            Self::Points => glow::POINTS,
            Self::Lines => glow::LINES,
            Self::LineStrip => glow::LINE_STRIP,
            Self::LineLoop => glow::LINE_LOOP,
            Self::Triangles => glow::TRIANGLES,
            Self::TriangleFan => glow::TRIANGLE_FAN,
            Self::TriangleStrip => glow::TRIANGLE_STRIP,
        }
    }

    /// The primitive mode transform feedback captures in: strips, loops and
    /// fans are recorded as their separate lines or triangles.
    pub fn feedback_mode(self) -> u32 {
        match self {
            Self::Points => glow::POINTS,
            Self::Lines | Self::LineStrip | Self::LineLoop => glow::LINES,
            Self::Triangles | Self::TriangleFan | Self::TriangleStrip => glow::TRIANGLES,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Lines => "lines",
            Self::LineStrip => "line_strip",
            Self::LineLoop => "line_loop",
            Self::Triangles => "triangles",
            Self::TriangleFan => "triangle_fan",
            Self::TriangleStrip => "triangle_strip",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topology {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "points" => Self::Points,
            "lines" => Self::Lines,
            "line_strip" => Self::LineStrip,
            "line_loop" => Self::LineLoop,
            "triangles" => Self::Triangles,
            "triangle_fan" => Self::TriangleFan,
            "triangle_strip" => Self::TriangleStrip,
            _ => return Err(ConfigurationError::UnknownTopology(s.to_string())),
        })
    }
}

/// Fixed-function state applied before each [`Pipeline::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderState {
    /// Enable `BLEND`. Off by default.
    pub blend: bool,
    /// Enable `CULL_FACE`. Off by default.
    pub cull_face: bool,
    /// Enable `DEPTH_TEST`. On by default.
    pub depth_test: bool,
    /// Depth writes. On by default.
    pub depth_write: bool,
    /// Color writes on all four channels. On by default.
    pub color_write: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            blend: false,
            cull_face: false,
            depth_test: true,
            depth_write: true,
            color_write: true,
        }
    }
}

impl RenderState {
    unsafe fn apply<G: GlBackend>(&self, gl: &G) {
        unsafe {
            set_capability(gl, glow::BLEND, self.blend);
            set_capability(gl, glow::CULL_FACE, self.cull_face);
            set_capability(gl, glow::DEPTH_TEST, self.depth_test);
            gl.depth_mask(self.depth_write);
            gl.color_mask(
                self.color_write,
                self.color_write,
                self.color_write,
                self.color_write,
            );
        }
    }
}

unsafe fn set_capability<G: GlBackend>(gl: &G, capability: u32, enabled: bool) {
    unsafe {
        if enabled {
            gl.enable(capability);
        } else {
            gl.disable(capability);
        }
    }
}

/// One interleaved vertex buffer and the attributes it feeds.
pub struct VertexBufferLayout<'a, G: GlBackend> {
    /// Source buffer.
    pub buffer: &'a Buffer<G>,
    /// Vertex format string, e.g. `"3f 12x 2f"` or `"16f /i"`.
    pub format: &'a str,
    /// One attribute name per non-padding node, in order.
    pub attributes: &'a [&'a str],
}

/// Parameters for [`Context::create_pipeline`].
///
/// `'a` is how long the pipeline borrows the program, buffers and samplers;
/// `'d` only has to cover the call.
pub struct PipelineDescriptor<'a, 'd, G: GlBackend> {
    /// Program to draw with.
    pub program: &'a Program<G>,
    /// Topology for both render and transform passes. `None` uses
    /// [`DEFAULT_RENDER_TOPOLOGY`] and [`DEFAULT_TRANSFORM_TOPOLOGY`].
    pub topology: Option<Topology>,
    /// Vertex buffers and their layouts.
    pub vertex_buffers: &'d [VertexBufferLayout<'a, G>],
    /// Samplers and uniform buffers, bound by name.
    pub resources: &'d [ResourceBinding<'a, G>],
    /// 32-bit index buffer; switches draws to `glDrawElementsInstanced`.
    pub index_buffer: Option<&'a Buffer<G>>,
    /// Destination of [`Pipeline::transform`].
    pub output_buffer: Option<&'a Buffer<G>>,
    /// Fixed-function state for [`Pipeline::render`].
    pub render_state: RenderState,
}

impl<'a, G: GlBackend> PipelineDescriptor<'a, '_, G> {
    /// A descriptor with no buffers, no resources and default state.
    pub fn new(program: &'a Program<G>) -> Self {
        Self {
            program,
            topology: None,
            vertex_buffers: &[],
            resources: &[],
            index_buffer: None,
            output_buffer: None,
            render_state: RenderState::default(),
        }
    }
}

struct FeedbackTarget<'a, G: GlBackend> {
    output: &'a Buffer<G>,
    scratch: G::Buffer,
    size: i32,
}

/// A ready-to-draw bundle of program, vertex array, resources and state.
///
/// Borrows everything it was built from. Release with
/// [`destroy`](Self::destroy); dropping leaks the vertex array and the
/// transform feedback scratch buffer.
pub struct Pipeline<'a, G: GlBackend> {
    program: &'a Program<G>,
    vertex_array: G::VertexArray,
    resources: ResourceTable<G>,
    render_state: RenderState,
    render_topology: Topology,
    transform_topology: Topology,
    indexed: bool,
    feedback: Option<FeedbackTarget<'a, G>>,
}

impl<G: GlBackend> fmt::Debug for Pipeline<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("program", &self.program.raw())
            .field("vertex_array", &self.vertex_array)
            .field("resources", &self.resources)
            .field("render_state", &self.render_state)
            .field("render_topology", &self.render_topology)
            .field("transform_topology", &self.transform_topology)
            .field("indexed", &self.indexed)
            .field("feedback_size", &self.feedback.as_ref().map(|feedback| feedback.size))
            .finish_non_exhaustive()
    }
}

impl<G: GlBackend> Context<G> {
    /// Resolve a pipeline descriptor and build its vertex array.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a format fails to parse, an
    /// attribute or resource name does not resolve, a layout does not fit
    /// its attributes, or the index buffer is not [`BufferKind::Index`].
    /// Fails with [`Error::Gl`] if the driver cannot create the vertex array
    /// or scratch buffer, in which case nothing stays allocated.
    pub fn create_pipeline<'a>(
        &mut self,
        descriptor: &PipelineDescriptor<'a, '_, G>,
    ) -> Result<Pipeline<'a, G>> {
        let program = descriptor.program;
        let reflection = program.reflection();

        let layouts = descriptor
            .vertex_buffers
            .iter()
            .map(|layout| {
                attribute_pointers(reflection, layout.format, layout.attributes)
                    .map(|pointers| (layout.buffer.raw(), pointers))
            })
            .collect::<Result<Vec<(G::Buffer, Vec<AttributePointer>)>, _>>()?;

        let resources = ResourceTable::build(reflection, descriptor.resources)
            .map_err(ConfigurationError::from)?;

        if let Some(index_buffer) = descriptor.index_buffer {
            if index_buffer.kind() != BufferKind::Index {
                return Err(ConfigurationError::NotAnIndexBuffer.into());
            }
        }

        let feedback_size = descriptor
            .output_buffer
            .map(|output| gl_size(output.size()))
            .transpose()?;

        let gl = self.gl();
        let vertex_array = unsafe { gl.create_vertex_array() }.map_err(Error::Gl)?;
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
            for (buffer, pointers) in &layouts {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(*buffer));
                for pointer in pointers {
                    pointer.apply(gl.as_ref());
                }
            }
            if let Some(index_buffer) = descriptor.index_buffer {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer.raw()));
            }
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        let feedback = match (descriptor.output_buffer, feedback_size) {
            (Some(output), Some(size)) => match unsafe { gl.create_buffer() } {
                Ok(scratch) => {
                    unsafe {
                        gl.bind_buffer(glow::TRANSFORM_FEEDBACK_BUFFER, Some(scratch));
                        gl.buffer_data_u8_slice(
                            glow::TRANSFORM_FEEDBACK_BUFFER,
                            &vec![0_u8; output.size()],
                            glow::STATIC_DRAW,
                        );
                        gl.bind_buffer(glow::TRANSFORM_FEEDBACK_BUFFER, None);
                    }
                    Some(FeedbackTarget {
                        output,
                        scratch,
                        size,
                    })
                }
                Err(err) => {
                    unsafe { gl.delete_vertex_array(vertex_array) };
                    return Err(Error::Gl(err));
                }
            },
            _ => None,
        };

        let attribute_count: usize = layouts.iter().map(|(_, pointers)| pointers.len()).sum();
        log::debug!(
            "created pipeline for program {:?}: {} vertex buffer(s), {attribute_count} attribute location(s), {} uniform buffer(s), {} sampler(s)",
            program.raw(),
            layouts.len(),
            resources.uniform_buffers().len(),
            resources.samplers().len(),
        );

        Ok(Pipeline {
            program,
            vertex_array,
            resources,
            render_state: descriptor.render_state,
            render_topology: descriptor.topology.unwrap_or(DEFAULT_RENDER_TOPOLOGY),
            transform_topology: descriptor.topology.unwrap_or(DEFAULT_TRANSFORM_TOPOLOGY),
            indexed: descriptor.index_buffer.is_some(),
            feedback,
        })
    }
}

impl<'a, G: GlBackend> Pipeline<'a, G> {
    /// The program this pipeline draws with.
    pub fn program(&self) -> &'a Program<G> {
        self.program
    }

    /// The GL vertex array name.
    pub fn vertex_array(&self) -> G::VertexArray {
        self.vertex_array
    }

    /// Resolved resource bindings.
    pub fn resources(&self) -> &ResourceTable<G> {
        &self.resources
    }

    /// Fixed-function state applied by [`render`](Self::render).
    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Topology of [`render`](Self::render).
    pub fn render_topology(&self) -> Topology {
        self.render_topology
    }

    /// Topology of [`transform`](Self::transform).
    pub fn transform_topology(&self) -> Topology {
        self.transform_topology
    }

    /// Whether draws read the index buffer.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Draw `vertices` vertices (or indices) `instances` times.
    ///
    /// # Errors
    ///
    /// Rejects non-positive counts without touching GL state.
    pub fn render(&self, ctx: &mut Context<G>, vertices: i32, instances: i32) -> Result<(), DrawError> {
        check_counts(vertices, instances)?;

        log::trace!(
            "render {vertices} vertex(es) x {instances} instance(s) as {}",
            self.render_topology
        );

        let gl = ctx.gl().as_ref();
        unsafe {
            gl.use_program(Some(self.program.raw()));
            self.render_state.apply(gl);
            self.draw(gl, self.render_topology, vertices, instances);
        }
        Ok(())
    }

    /// Run the vertex stage with rasterization disabled and copy the
    /// captured outputs into the output buffer.
    ///
    /// Exactly the output buffer's size is copied, starting at offset 0 of
    /// both buffers.
    ///
    /// # Errors
    ///
    /// Rejects non-positive counts, a program without outputs, and a
    /// pipeline without an output buffer, all without touching GL state.
    pub fn transform(&self, ctx: &mut Context<G>, vertices: i32, instances: i32) -> Result<(), DrawError> {
        check_counts(vertices, instances)?;
        let transform_feedback = self
            .program
            .transform_feedback()
            .ok_or(DrawError::NoFeedbackOutputs)?;
        let feedback = self.feedback.as_ref().ok_or(DrawError::NoOutputBuffer)?;

        log::trace!(
            "transform {vertices} vertex(es) x {instances} instance(s) as {} into {} byte(s)",
            self.transform_topology,
            feedback.size
        );

        let gl = ctx.gl().as_ref();
        unsafe {
            gl.use_program(Some(self.program.raw()));
            gl.bind_transform_feedback(glow::TRANSFORM_FEEDBACK, Some(transform_feedback));
            gl.bind_buffer_base(glow::TRANSFORM_FEEDBACK_BUFFER, 0, Some(feedback.scratch));
            gl.begin_transform_feedback(self.transform_topology.feedback_mode());
            gl.enable(glow::RASTERIZER_DISCARD);
            self.draw(gl, self.transform_topology, vertices, instances);
            gl.disable(glow::RASTERIZER_DISCARD);
            gl.end_transform_feedback();

            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(feedback.output.raw()));
            gl.copy_buffer_sub_data(
                glow::TRANSFORM_FEEDBACK_BUFFER,
                glow::COPY_WRITE_BUFFER,
                0,
                0,
                feedback.size,
            );
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            gl.bind_buffer_base(glow::TRANSFORM_FEEDBACK_BUFFER, 0, None);
            gl.bind_transform_feedback(glow::TRANSFORM_FEEDBACK, None);
        }
        Ok(())
    }

    unsafe fn draw(&self, gl: &G, topology: Topology, vertices: i32, instances: i32) {
        unsafe {
            gl.bind_vertex_array(Some(self.vertex_array));
            self.resources.bind(gl);
            if self.indexed {
                gl.draw_elements_instanced(
                    topology.gl_mode(),
                    vertices,
                    glow::UNSIGNED_INT,
                    0,
                    instances,
                );
            } else {
                gl.draw_arrays_instanced(topology.gl_mode(), 0, vertices, instances);
            }
            gl.bind_vertex_array(None);
        }
    }

    /// Delete the vertex array and the scratch buffer. Borrowed buffers,
    /// samplers and the program are not affected.
    pub fn destroy(self, ctx: &mut Context<G>) {
        let gl = ctx.gl();
        unsafe {
            gl.delete_vertex_array(self.vertex_array);
            if let Some(feedback) = self.feedback {
                gl.delete_buffer(feedback.scratch);
            }
        }
    }
}

fn check_counts(vertices: i32, instances: i32) -> Result<(), DrawError> {
    if vertices <= 0 {
        return Err(DrawError::NonPositiveVertexCount(vertices));
    }
    if instances <= 0 {
        return Err(DrawError::NonPositiveInstanceCount(instances));
    }
    Ok(())
}
