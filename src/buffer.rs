//! GPU buffers.

use std::fmt;

use bytemuck::Pod;

use crate::{
    context::{check_range, Context},
    error::{BufferError, Error, Result},
    gl::GlBackend,
};

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex attribute data (`ARRAY_BUFFER`).
    #[default]
    Vertex,
    /// 32-bit indices (`ELEMENT_ARRAY_BUFFER`).
    Index,
    /// Uniform block storage (`UNIFORM_BUFFER`).
    Uniform,
}

impl BufferKind {
    /// The GL bind target.
    pub fn target(self) -> u32 {
        match self {
            Self::Vertex => glow::ARRAY_BUFFER,
            Self::Index => glow::ELEMENT_ARRAY_BUFFER,
            Self::Uniform => glow::UNIFORM_BUFFER,
        }
    }
}

/// Initial contents of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferContents<'a> {
    /// Upload these bytes.
    Data(&'a [u8]),
    /// Reserve this many zeroed bytes.
    Reserve(usize),
}

impl<'a> BufferContents<'a> {
    /// Upload a slice of plain-old-data values.
    pub fn from_slice<T: Pod>(data: &'a [T]) -> Self {
        Self::Data(bytemuck::cast_slice(data))
    }

    fn len(&self) -> usize {
        match self {
            Self::Data(data) => data.len(),
            Self::Reserve(size) => *size,
        }
    }
}

impl Default for BufferContents<'_> {
    fn default() -> Self {
        Self::Reserve(0)
    }
}

/// Parameters for [`Context::create_buffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferDescriptor<'a> {
    /// Initial contents; fixes the buffer size.
    pub contents: BufferContents<'a>,
    /// Hint that the contents will be rewritten often.
    pub dynamic: bool,
    /// Bind target class.
    pub kind: BufferKind,
}

/// A fixed-size GPU buffer.
///
/// Release with [`destroy`](Self::destroy); dropping leaks the GL object.
pub struct Buffer<G: GlBackend> {
    raw: G::Buffer,
    size: usize,
    kind: BufferKind,
}

impl<G: GlBackend> Context<G> {
    /// Create a buffer and upload its initial contents.
    ///
    /// # Errors
    ///
    /// Fails if the size exceeds the GL range or the driver cannot create
    /// the buffer.
    pub fn create_buffer(&mut self, descriptor: &BufferDescriptor<'_>) -> Result<Buffer<G>> {
        let size = descriptor.contents.len();
        gl_size(size)?;

        let zeroed;
        let data = match descriptor.contents {
            BufferContents::Data(data) => data,
            BufferContents::Reserve(size) => {
                zeroed = vec![0_u8; size];
                &zeroed[..]
            }
        };

        let target = descriptor.kind.target();
        let usage = if descriptor.dynamic {
            glow::DYNAMIC_DRAW
        } else {
            glow::STATIC_DRAW
        };

        let gl = self.gl();
        let raw = unsafe { gl.create_buffer() }.map_err(Error::Gl)?;
        unsafe {
            gl.bind_buffer(target, Some(raw));
            gl.buffer_data_u8_slice(target, data, usage);
            gl.bind_buffer(target, None);
        }

        log::debug!("created {:?} buffer of {size} bytes", descriptor.kind);

        Ok(Buffer {
            raw,
            size,
            kind: descriptor.kind,
        })
    }
}

impl<G: GlBackend> fmt::Debug for Buffer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("raw", &self.raw)
            .field("size", &self.size)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<G: GlBackend> Buffer<G> {
    /// The GL buffer name.
    pub fn raw(&self) -> G::Buffer {
        self.raw
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bind target class.
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Overwrite `data.len()` bytes starting at `offset`.
    ///
    /// The write is ordered before any later draw on the same context.
    ///
    /// # Errors
    ///
    /// Fails if the range lies outside the buffer.
    pub fn write(&self, ctx: &mut Context<G>, data: &[u8], offset: usize) -> Result<()> {
        check_range(offset, data.len(), self.size)?;
        let offset = gl_size(offset)?;
        let target = self.kind.target();

        let gl = ctx.gl();
        unsafe {
            gl.bind_buffer(target, Some(self.raw));
            gl.buffer_sub_data_u8_slice(target, offset, data);
            gl.bind_buffer(target, None);
        }
        Ok(())
    }

    /// [`write`](Self::write) a slice of plain-old-data values.
    ///
    /// # Errors
    ///
    /// Fails if the range lies outside the buffer.
    pub fn write_slice<T: Pod>(&self, ctx: &mut Context<G>, data: &[T], offset: usize) -> Result<()> {
        self.write(ctx, bytemuck::cast_slice(data), offset)
    }

    /// Delete the GL buffer.
    pub fn destroy(self, ctx: &mut Context<G>) {
        unsafe { ctx.gl().delete_buffer(self.raw) };
    }
}

/// Convert a byte count or offset to the `i32` GL expects.
pub(crate) fn gl_size(bytes: usize) -> Result<i32, BufferError> {
    i32::try_from(bytes).map_err(|_| BufferError::TooLarge(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::{Call, MockGl};

    fn context() -> (Arc<MockGl>, Context<MockGl>) {
        let gl = Arc::new(MockGl::new());
        let ctx = unsafe { Context::new(Arc::clone(&gl)) };
        (gl, ctx)
    }

    #[test]
    fn uploads_initial_data_to_kind_target() {
        let (gl, mut ctx) = context();
        let vertices = [0.0_f32, 0.5, 1.0];
        let buffer = ctx
            .create_buffer(&BufferDescriptor {
                contents: BufferContents::from_slice(&vertices),
                dynamic: true,
                kind: BufferKind::Uniform,
            })
            .unwrap();

        assert_eq!(buffer.size(), 12);
        assert_eq!(buffer.kind(), BufferKind::Uniform);
        assert!(gl.calls().contains(&Call::BufferData {
            target: glow::UNIFORM_BUFFER,
            len: 12,
            usage: glow::DYNAMIC_DRAW,
        }));
    }

    #[test]
    fn reserve_uploads_zeroed_storage() {
        let (gl, mut ctx) = context();
        let buffer = ctx
            .create_buffer(&BufferDescriptor {
                contents: BufferContents::Reserve(256),
                kind: BufferKind::Index,
                ..BufferDescriptor::default()
            })
            .unwrap();

        assert_eq!(buffer.size(), 256);
        assert!(gl.calls().contains(&Call::BufferData {
            target: glow::ELEMENT_ARRAY_BUFFER,
            len: 256,
            usage: glow::STATIC_DRAW,
        }));
    }

    #[test]
    fn partial_write_uses_sub_data() {
        let (gl, mut ctx) = context();
        let buffer = ctx
            .create_buffer(&BufferDescriptor {
                contents: BufferContents::Reserve(64),
                ..BufferDescriptor::default()
            })
            .unwrap();
        gl.clear_calls();

        buffer.write_slice(&mut ctx, &[1.0_f32, 2.0], 16).unwrap();

        assert_eq!(
            gl.calls(),
            vec![
                Call::BindBuffer {
                    target: glow::ARRAY_BUFFER,
                    buffer: Some(buffer.raw())
                },
                Call::BufferSubData {
                    target: glow::ARRAY_BUFFER,
                    offset: 16,
                    len: 8
                },
                Call::BindBuffer {
                    target: glow::ARRAY_BUFFER,
                    buffer: None
                },
            ]
        );
    }

    #[test]
    fn write_past_end_fails() {
        let (gl, mut ctx) = context();
        let buffer = ctx
            .create_buffer(&BufferDescriptor {
                contents: BufferContents::Reserve(16),
                ..BufferDescriptor::default()
            })
            .unwrap();
        gl.clear_calls();

        let err = buffer.write(&mut ctx, &[0; 8], 12).unwrap_err();
        assert!(matches!(
            err,
            Error::Buffer(BufferError::OutOfRange {
                offset: 12,
                len: 8,
                size: 16
            })
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn destroy_releases_the_buffer() {
        let (gl, mut ctx) = context();
        let buffer = ctx.create_buffer(&BufferDescriptor::default()).unwrap();
        assert_eq!(gl.live_objects(), 1);
        buffer.destroy(&mut ctx);
        assert_eq!(gl.live_objects(), 0);
    }
}
