//! The explicit handle to the shared GL state.
//!
//! Every operation that creates GL objects or changes bindings goes through a
//! [`Context`], and draws take it by `&mut`. One pipeline's bindings are
//! visible to every other user of the same GL context, so the exclusive
//! borrow keeps all of that mutation on a single writer.

use std::sync::Arc;

use crate::{
    buffer::{gl_size, Buffer},
    error::{BufferError, Result},
    gl::GlBackend,
};

/// Color used by [`ClearParams::default`]: opaque black.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Parameters for [`Context::clear`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearParams {
    /// RGBA clear color.
    pub color: [f32; 4],
    /// `[x, y, width, height]`; `None` covers the context's viewport size.
    pub viewport: Option<[i32; 4]>,
}

impl Default for ClearParams {
    fn default() -> Self {
        Self {
            color: DEFAULT_CLEAR_COLOR,
            viewport: None,
        }
    }
}

/// A byte range copy between two buffers, see [`Context::copy_buffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferCopy {
    /// Offset into the source buffer.
    pub read_offset: usize,
    /// Offset into the destination buffer.
    pub write_offset: usize,
    /// Bytes to copy.
    pub size: usize,
}

/// The GL context together with the little state this crate keeps about it.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use glow_pipeline::{BufferContents, BufferDescriptor, Context};
/// # fn example(gl: Arc<glow::Context>) -> glow_pipeline::Result<()> {
/// // With a current GL context:
/// let mut ctx = unsafe { Context::new(gl) };
/// let vertices: [f32; 6] = [0.0, 0.8, -0.6, -0.8, 0.6, -0.8];
/// let vbo = ctx.create_buffer(&BufferDescriptor {
///     contents: BufferContents::from_slice(&vertices),
///     ..BufferDescriptor::default()
/// })?;
/// # let _ = vbo;
/// # Ok(())
/// # }
/// ```
pub struct Context<G: GlBackend = glow::Context> {
    gl: Arc<G>,
    /// Texture unit used for uploads, so uploads never disturb units that
    /// samplers are bound to.
    staging_unit: u32,
    viewport_size: [u32; 2],
}

impl<G: GlBackend> Context<G> {
    /// Wrap a GL context.
    ///
    /// # Safety
    ///
    /// `gl` must be current on this thread for as long as the returned
    /// context, or anything created from it, is used.
    pub unsafe fn new(gl: Arc<G>) -> Self {
        let units = unsafe { gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS) };
        let last_unit = u32::try_from(units.saturating_sub(1)).unwrap_or(0);
        Self {
            gl,
            staging_unit: glow::TEXTURE0 + last_unit,
            viewport_size: [0, 0],
        }
    }

    /// The wrapped GL context.
    pub fn gl(&self) -> &Arc<G> {
        &self.gl
    }

    pub(crate) fn staging_unit(&self) -> u32 {
        self.staging_unit
    }

    /// Record the drawable size used by [`clear`](Self::clear) when no
    /// explicit viewport is given.
    pub fn set_viewport_size(&mut self, size: [u32; 2]) {
        self.viewport_size = size;
    }

    /// Set the viewport and clear color and depth.
    pub fn clear(&mut self, params: &ClearParams) {
        let [x, y, width, height] = params.viewport.unwrap_or_else(|| {
            let [width, height] = self.viewport_size;
            [
                0,
                0,
                i32::try_from(width).unwrap_or(i32::MAX),
                i32::try_from(height).unwrap_or(i32::MAX),
            ]
        });
        let [red, green, blue, alpha] = params.color;

        unsafe {
            self.gl.viewport(x, y, width, height);
            self.gl.clear_color(red, green, blue, alpha);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    /// Copy a byte range from `src` into `dst` on the GPU.
    ///
    /// # Errors
    ///
    /// Fails if either range lies outside its buffer.
    pub fn copy_buffer(&mut self, src: &Buffer<G>, dst: &Buffer<G>, copy: &BufferCopy) -> Result<()> {
        check_range(copy.read_offset, copy.size, src.size())?;
        check_range(copy.write_offset, copy.size, dst.size())?;
        let read_offset = gl_size(copy.read_offset)?;
        let write_offset = gl_size(copy.write_offset)?;
        let size = gl_size(copy.size)?;

        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::COPY_READ_BUFFER, Some(src.raw()));
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(dst.raw()));
            gl.copy_buffer_sub_data(
                glow::COPY_READ_BUFFER,
                glow::COPY_WRITE_BUFFER,
                read_offset,
                write_offset,
                size,
            );
            gl.bind_buffer(glow::COPY_READ_BUFFER, None);
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(())
    }
}

/// Check that `offset..offset + len` fits in `size` bytes.
pub(crate) fn check_range(offset: usize, len: usize, size: usize) -> Result<(), BufferError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(BufferError::OutOfRange { offset, len, size }),
    }
}
