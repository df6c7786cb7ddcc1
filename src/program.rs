//! Shader programs: compilation, linking and introspection.

use std::fmt;

use crate::{
    context::Context,
    error::{Error, ProgramError, Result, ShaderStage},
    gl::GlBackend,
    reflection::Reflection,
};

/// `#version` line used for the fallback fragment shader when the vertex
/// shader does not declare one.
const DEFAULT_GLSL_VERSION: &str = "#version 330 core";

/// Parameters for [`Context::create_program`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramDescriptor<'a> {
    /// Vertex shader source.
    pub vertex_shader: &'a str,
    /// Fragment shader source. Transform-only programs may omit it; an empty
    /// shader with the vertex shader's `#version` is used instead.
    pub fragment_shader: Option<&'a str>,
    /// Vertex outputs captured by transform feedback, interleaved in this
    /// order.
    pub outputs: &'a [&'a str],
}

/// A linked shader program and its introspection tables.
///
/// Release with [`destroy`](Self::destroy); dropping leaks the GL objects.
pub struct Program<G: GlBackend> {
    raw: G::Program,
    reflection: Reflection,
    transform_feedback: Option<G::TransformFeedback>,
}

impl<G: GlBackend> Context<G> {
    /// Compile and link a program, then record its active attributes,
    /// uniform blocks and sampler uniforms.
    ///
    /// Uniform block `i` is bound to uniform buffer binding point `i`, and
    /// sampler uniforms are assigned texture units `0, 1, ...` in the order
    /// the driver reports them.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError`] with the driver log if a stage fails to
    /// compile or the program fails to link. Nothing is left allocated on
    /// failure.
    pub fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<Program<G>> {
        let gl = self.gl().as_ref();

        let fallback;
        let fragment_src = match descriptor.fragment_shader {
            Some(source) => source,
            None => {
                fallback = fallback_fragment_source(descriptor.vertex_shader);
                &fallback
            }
        };

        let raw = unsafe { gl.create_program() }.map_err(Error::Gl)?;

        let vs = match unsafe { compile_shader(gl, ShaderStage::Vertex, descriptor.vertex_shader) } {
            Ok(shader) => shader,
            Err(err) => {
                unsafe { gl.delete_program(raw) };
                return Err(err);
            }
        };
        let fs = match unsafe { compile_shader(gl, ShaderStage::Fragment, fragment_src) } {
            Ok(shader) => shader,
            Err(err) => {
                unsafe {
                    gl.delete_shader(vs);
                    gl.delete_program(raw);
                }
                return Err(err);
            }
        };

        let transform_feedback = if descriptor.outputs.is_empty() {
            None
        } else {
            match unsafe { gl.create_transform_feedback() } {
                Ok(transform_feedback) => Some(transform_feedback),
                Err(err) => {
                    unsafe {
                        gl.delete_shader(vs);
                        gl.delete_shader(fs);
                        gl.delete_program(raw);
                    }
                    return Err(Error::Gl(err));
                }
            }
        };

        unsafe {
            gl.attach_shader(raw, vs);
            gl.attach_shader(raw, fs);
            if transform_feedback.is_some() {
                gl.transform_feedback_varyings(raw, descriptor.outputs, glow::INTERLEAVED_ATTRIBS);
            }
            gl.link_program(raw);

            if !gl.get_program_link_status(raw) {
                let log = gl.get_program_info_log(raw);
                gl.delete_program(raw);
                gl.delete_shader(vs);
                gl.delete_shader(fs);
                if let Some(transform_feedback) = transform_feedback {
                    gl.delete_transform_feedback(transform_feedback);
                }
                return Err(ProgramError::Link(log).into());
            }

            // Shaders can be detached and deleted after successful linking.
            gl.detach_shader(raw, vs);
            gl.detach_shader(raw, fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
        }

        let reflection = unsafe { Reflection::introspect(gl, raw, descriptor.outputs) };
        unsafe { gl.use_program(None) };

        log::debug!(
            "linked program {raw:?}: {} attribute(s), {} uniform block(s), {} sampler(s), {} output(s)",
            reflection.attributes().len(),
            reflection.uniform_blocks().len(),
            reflection.samplers().len(),
            reflection.outputs().len(),
        );

        Ok(Program {
            raw,
            reflection,
            transform_feedback,
        })
    }
}

impl<G: GlBackend> fmt::Debug for Program<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("raw", &self.raw)
            .field("reflection", &self.reflection)
            .field("transform_feedback", &self.transform_feedback)
            .finish()
    }
}

impl<G: GlBackend> Program<G> {
    /// The GL program name.
    pub fn raw(&self) -> G::Program {
        self.raw
    }

    /// Introspection tables recorded at link time.
    pub fn reflection(&self) -> &Reflection {
        &self.reflection
    }

    /// Whether the program was linked with transform feedback outputs.
    pub fn has_outputs(&self) -> bool {
        self.transform_feedback.is_some()
    }

    pub(crate) fn transform_feedback(&self) -> Option<G::TransformFeedback> {
        self.transform_feedback
    }

    /// Delete the program and its transform feedback object.
    pub fn destroy(self, ctx: &mut Context<G>) {
        let gl = ctx.gl();
        unsafe {
            gl.delete_program(self.raw);
            if let Some(transform_feedback) = self.transform_feedback {
                gl.delete_transform_feedback(transform_feedback);
            }
        }
    }
}

/// An empty fragment shader matching the vertex shader's GLSL version.
fn fallback_fragment_source(vertex_src: &str) -> String {
    let version = vertex_src
        .trim_start()
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| line.starts_with("#version"))
        .unwrap_or(DEFAULT_GLSL_VERSION);
    format!("{version}\nvoid main() {{}}\n")
}

/// Compile a single shader stage from source.
///
/// # Safety
///
/// Requires `gl` to be current.
unsafe fn compile_shader<G: GlBackend>(
    gl: &G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader> {
    let shader_type = match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    };

    unsafe {
        let shader = gl.create_shader(shader_type).map_err(Error::Gl)?;
        // `#version` must be the first line, so drop leading indentation and
        // blank lines from inline sources.
        gl.shader_source(shader, source.trim());
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(ProgramError::Compile { stage, log }.into());
        }

        Ok(shader)
    }
}
