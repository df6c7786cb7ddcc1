//! RGBA8 textures and the samplers that read them.

use std::fmt;

use image::RgbaImage;

use crate::{
    context::Context,
    error::{Error, Result},
    gl::GlBackend,
};

/// Parameters for [`Context::create_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor<'a> {
    /// `[width, height]` in pixels.
    pub size: [u32; 2],
    /// Tightly packed RGBA8 rows for level 0, or `None` to leave the
    /// storage undefined.
    pub pixels: Option<&'a [u8]>,
    /// Number of mip levels. When `pixels` is given, the levels after the
    /// first are generated from it.
    pub levels: u32,
}

impl Default for TextureDescriptor<'_> {
    fn default() -> Self {
        Self {
            size: [1, 1],
            pixels: None,
            levels: 1,
        }
    }
}

/// An immutable-storage 2D texture.
///
/// Release with [`destroy`](Self::destroy); dropping leaks the GL object.
pub struct Texture<G: GlBackend> {
    raw: G::Texture,
    size: [u32; 2],
    levels: u32,
}

/// A sampler paired with the texture it reads.
///
/// Bind it by name through a
/// [`ResourceBinding`](crate::resources::ResourceBinding). Destroying the
/// texture while a pipeline still samples it is undefined behaviour.
pub struct Sampler<G: GlBackend> {
    raw: G::Sampler,
    texture: G::Texture,
}

impl<G: GlBackend> Context<G> {
    /// Allocate texture storage and upload level 0.
    ///
    /// Uploads go through the last combined texture unit so units bound by
    /// pipelines are left untouched.
    ///
    /// # Errors
    ///
    /// Fails on a zero-sized texture, an impossible level count, pixel data
    /// whose length is not `width * height * 4`, or if the driver cannot
    /// create the texture.
    pub fn create_texture(&mut self, descriptor: &TextureDescriptor<'_>) -> Result<Texture<G>> {
        let [width, height] = descriptor.size;
        let (w, h) = match (i32::try_from(width), i32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(Error::InvalidTexture(format!(
                    "unsupported size {width}x{height}"
                )))
            }
        };

        let max_levels = 32 - width.max(height).leading_zeros();
        if descriptor.levels == 0 || descriptor.levels > max_levels {
            return Err(Error::InvalidTexture(format!(
                "{} mip level(s) requested for {width}x{height}, at most {max_levels} possible",
                descriptor.levels
            )));
        }
        // Bounded by `max_levels` above.
        #[expect(clippy::cast_possible_wrap)]
        let levels = descriptor.levels as i32;

        if let Some(pixels) = descriptor.pixels {
            let expected = u64::from(width) * u64::from(height) * 4;
            if pixels.len() as u64 != expected {
                return Err(Error::InvalidTexture(format!(
                    "{} byte(s) of pixel data for {width}x{height}, expected {expected}",
                    pixels.len()
                )));
            }
        }

        let gl = self.gl();
        let raw = unsafe { gl.create_texture() }.map_err(Error::Gl)?;
        unsafe {
            gl.active_texture(self.staging_unit());
            gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            gl.tex_storage_2d(glow::TEXTURE_2D, levels, glow::RGBA8, w, h);
            if let Some(pixels) = descriptor.pixels {
                gl.tex_sub_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    0,
                    0,
                    w,
                    h,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    pixels,
                );
                if levels > 1 {
                    gl.generate_mipmap(glow::TEXTURE_2D);
                }
            }
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        log::debug!("created {width}x{height} texture with {levels} level(s)");

        Ok(Texture {
            raw,
            size: descriptor.size,
            levels: descriptor.levels,
        })
    }

    /// Upload a decoded image as a texture.
    ///
    /// # Errors
    ///
    /// See [`create_texture`](Self::create_texture).
    pub fn create_texture_from_image(&mut self, image: &RgbaImage, levels: u32) -> Result<Texture<G>> {
        let (width, height) = image.dimensions();
        self.create_texture(&TextureDescriptor {
            size: [width, height],
            pixels: Some(image.as_raw()),
            levels,
        })
    }

    /// Create a linearly filtered sampler for `texture`.
    ///
    /// # Errors
    ///
    /// Fails if the driver cannot create the sampler.
    pub fn create_sampler(&mut self, texture: &Texture<G>) -> Result<Sampler<G>> {
        let gl = self.gl();
        let raw = unsafe { gl.create_sampler() }.map_err(Error::Gl)?;

        // GL enum values fit in an i32.
        #[expect(clippy::cast_possible_wrap)]
        unsafe {
            gl.sampler_parameter_i32(raw, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.sampler_parameter_i32(raw, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        }

        Ok(Sampler {
            raw,
            texture: texture.raw,
        })
    }
}

impl<G: GlBackend> fmt::Debug for Texture<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("raw", &self.raw)
            .field("size", &self.size)
            .field("levels", &self.levels)
            .finish()
    }
}

impl<G: GlBackend> Texture<G> {
    /// The GL texture name.
    pub fn raw(&self) -> G::Texture {
        self.raw
    }

    /// `[width, height]` in pixels.
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Number of mip levels.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Delete the GL texture.
    pub fn destroy(self, ctx: &mut Context<G>) {
        unsafe { ctx.gl().delete_texture(self.raw) };
    }
}

impl<G: GlBackend> fmt::Debug for Sampler<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("raw", &self.raw)
            .field("texture", &self.texture)
            .finish()
    }
}

impl<G: GlBackend> Sampler<G> {
    /// The GL sampler name.
    pub fn raw(&self) -> G::Sampler {
        self.raw
    }

    /// The texture this sampler reads.
    pub fn texture(&self) -> G::Texture {
        self.texture
    }

    /// Delete the GL sampler. The texture is not affected.
    pub fn destroy(self, ctx: &mut Context<G>) {
        unsafe { ctx.gl().delete_sampler(self.raw) };
    }
}
