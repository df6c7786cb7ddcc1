//! The slice of the OpenGL API this crate drives.
//!
//! [`GlBackend`] mirrors the subset of [`glow::HasContext`] used by programs,
//! buffers, textures and pipelines, with the same method names and argument
//! conventions. It is implemented for [`glow::Context`]; keeping the surface
//! narrow lets the binding logic run against a recording backend in tests.

use std::fmt;

use glow::{HasContext, PixelUnpackData};

/// An active vertex attribute reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    /// Attribute name as declared in the shader.
    pub name: String,
    /// Array size (1 for non-arrays).
    pub size: i32,
    /// GL type enum, e.g. `glow::FLOAT_VEC3`.
    pub atype: u32,
}

/// An active uniform reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    /// Uniform name as declared in the shader.
    pub name: String,
    /// Array size (1 for non-arrays).
    pub size: i32,
    /// GL type enum, e.g. `glow::SAMPLER_2D`.
    pub utype: u32,
}

/// Raw GL entry points used by this crate.
///
/// # Safety
///
/// Every method issues GL calls and requires the implementor's context to be
/// current on the calling thread. Handles passed in must have been created by
/// the same context and not yet deleted.
#[allow(missing_docs, clippy::missing_safety_doc, clippy::too_many_arguments)]
pub trait GlBackend {
    type Shader: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug + PartialEq;
    type Buffer: Copy + fmt::Debug + PartialEq;
    type VertexArray: Copy + fmt::Debug + PartialEq;
    type Texture: Copy + fmt::Debug + PartialEq;
    type Sampler: Copy + fmt::Debug + PartialEq;
    type TransformFeedback: Copy + fmt::Debug + PartialEq;
    type UniformLocation: fmt::Debug;

    unsafe fn get_parameter_i32(&self, parameter: u32) -> i32;

    // Shaders and programs.
    unsafe fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String>;
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str);
    unsafe fn compile_shader(&self, shader: Self::Shader);
    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    unsafe fn delete_shader(&self, shader: Self::Shader);
    unsafe fn create_program(&self) -> Result<Self::Program, String>;
    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn link_program(&self, program: Self::Program);
    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool;
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String;
    unsafe fn delete_program(&self, program: Self::Program);
    unsafe fn use_program(&self, program: Option<Self::Program>);

    // Introspection.
    unsafe fn get_active_attributes(&self, program: Self::Program) -> u32;
    unsafe fn get_active_attribute(
        &self,
        program: Self::Program,
        index: u32,
    ) -> Option<ActiveAttribute>;
    unsafe fn get_attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    unsafe fn get_active_uniforms(&self, program: Self::Program) -> u32;
    unsafe fn get_active_uniform(&self, program: Self::Program, index: u32)
        -> Option<ActiveUniform>;
    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    unsafe fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32);
    unsafe fn get_active_uniform_blocks(&self, program: Self::Program) -> u32;
    unsafe fn get_active_uniform_block_name(&self, program: Self::Program, index: u32) -> String;
    unsafe fn uniform_block_binding(&self, program: Self::Program, index: u32, binding: u32);

    // Transform feedback.
    unsafe fn transform_feedback_varyings(
        &self,
        program: Self::Program,
        varyings: &[&str],
        buffer_mode: u32,
    );
    unsafe fn create_transform_feedback(&self) -> Result<Self::TransformFeedback, String>;
    unsafe fn bind_transform_feedback(
        &self,
        target: u32,
        transform_feedback: Option<Self::TransformFeedback>,
    );
    unsafe fn delete_transform_feedback(&self, transform_feedback: Self::TransformFeedback);
    unsafe fn begin_transform_feedback(&self, primitive_mode: u32);
    unsafe fn end_transform_feedback(&self);

    // Buffers.
    unsafe fn create_buffer(&self) -> Result<Self::Buffer, String>;
    unsafe fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    unsafe fn bind_buffer_base(&self, target: u32, index: u32, buffer: Option<Self::Buffer>);
    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    unsafe fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, src_data: &[u8]);
    unsafe fn copy_buffer_sub_data(
        &self,
        src_target: u32,
        dst_target: u32,
        src_offset: i32,
        dst_offset: i32,
        size: i32,
    );
    unsafe fn delete_buffer(&self, buffer: Self::Buffer);

    // Vertex arrays.
    unsafe fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    unsafe fn enable_vertex_attrib_array(&self, index: u32);
    unsafe fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    unsafe fn vertex_attrib_pointer_i32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    );
    unsafe fn vertex_attrib_divisor(&self, index: u32, divisor: u32);

    // Textures and samplers.
    unsafe fn create_texture(&self) -> Result<Self::Texture, String>;
    unsafe fn active_texture(&self, unit: u32);
    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    unsafe fn tex_storage_2d(
        &self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    );
    unsafe fn tex_sub_image_2d(
        &self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    );
    unsafe fn generate_mipmap(&self, target: u32);
    unsafe fn delete_texture(&self, texture: Self::Texture);
    unsafe fn create_sampler(&self) -> Result<Self::Sampler, String>;
    unsafe fn sampler_parameter_i32(&self, sampler: Self::Sampler, name: u32, value: i32);
    unsafe fn bind_sampler(&self, unit: u32, sampler: Option<Self::Sampler>);
    unsafe fn delete_sampler(&self, sampler: Self::Sampler);

    // Fixed-function state and drawing.
    unsafe fn enable(&self, parameter: u32);
    unsafe fn disable(&self, parameter: u32);
    unsafe fn depth_mask(&self, value: bool);
    unsafe fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool);
    unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    unsafe fn clear(&self, mask: u32);
    unsafe fn draw_arrays_instanced(&self, mode: u32, first: i32, count: i32, instance_count: i32);
    unsafe fn draw_elements_instanced(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    );
}

// Straight delegation to glow. Fully qualified calls avoid ambiguity with the
// identically named `HasContext` methods.
impl GlBackend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type Texture = glow::Texture;
    type Sampler = <glow::Context as HasContext>::Sampler;
    type TransformFeedback = <glow::Context as HasContext>::TransformFeedback;
    type UniformLocation = glow::UniformLocation;

    unsafe fn get_parameter_i32(&self, parameter: u32) -> i32 {
        unsafe { HasContext::get_parameter_i32(self, parameter) }
    }

    unsafe fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, shader_type) }
    }

    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    unsafe fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    unsafe fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    unsafe fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    unsafe fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    unsafe fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    unsafe fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    unsafe fn get_active_attributes(&self, program: Self::Program) -> u32 {
        unsafe { HasContext::get_active_attributes(self, program) }
    }

    unsafe fn get_active_attribute(
        &self,
        program: Self::Program,
        index: u32,
    ) -> Option<ActiveAttribute> {
        unsafe { HasContext::get_active_attribute(self, program, index) }.map(|attribute| {
            ActiveAttribute {
                name: attribute.name,
                size: attribute.size,
                atype: attribute.atype,
            }
        })
    }

    unsafe fn get_attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { HasContext::get_attrib_location(self, program, name) }
    }

    unsafe fn get_active_uniforms(&self, program: Self::Program) -> u32 {
        unsafe { HasContext::get_active_uniforms(self, program) }
    }

    unsafe fn get_active_uniform(
        &self,
        program: Self::Program,
        index: u32,
    ) -> Option<ActiveUniform> {
        unsafe { HasContext::get_active_uniform(self, program, index) }.map(|uniform| {
            ActiveUniform {
                name: uniform.name,
                size: uniform.size,
                utype: uniform.utype,
            }
        })
    }

    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    unsafe fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32) {
        unsafe { HasContext::uniform_1_i32(self, location, x) }
    }

    unsafe fn get_active_uniform_blocks(&self, program: Self::Program) -> u32 {
        let count = unsafe {
            HasContext::get_program_parameter_i32(self, program, glow::ACTIVE_UNIFORM_BLOCKS)
        };
        u32::try_from(count).unwrap_or(0)
    }

    unsafe fn get_active_uniform_block_name(&self, program: Self::Program, index: u32) -> String {
        unsafe { HasContext::get_active_uniform_block_name(self, program, index) }
    }

    unsafe fn uniform_block_binding(&self, program: Self::Program, index: u32, binding: u32) {
        unsafe { HasContext::uniform_block_binding(self, program, index, binding) }
    }

    unsafe fn transform_feedback_varyings(
        &self,
        program: Self::Program,
        varyings: &[&str],
        buffer_mode: u32,
    ) {
        unsafe { HasContext::transform_feedback_varyings(self, program, varyings, buffer_mode) }
    }

    unsafe fn create_transform_feedback(&self) -> Result<Self::TransformFeedback, String> {
        unsafe { HasContext::create_transform_feedback(self) }
    }

    unsafe fn bind_transform_feedback(
        &self,
        target: u32,
        transform_feedback: Option<Self::TransformFeedback>,
    ) {
        unsafe { HasContext::bind_transform_feedback(self, target, transform_feedback) }
    }

    unsafe fn delete_transform_feedback(&self, transform_feedback: Self::TransformFeedback) {
        unsafe { HasContext::delete_transform_feedback(self, transform_feedback) }
    }

    unsafe fn begin_transform_feedback(&self, primitive_mode: u32) {
        unsafe { HasContext::begin_transform_feedback(self, primitive_mode) }
    }

    unsafe fn end_transform_feedback(&self) {
        unsafe { HasContext::end_transform_feedback(self) }
    }

    unsafe fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    unsafe fn bind_buffer_base(&self, target: u32, index: u32, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer_base(self, target, index, buffer) }
    }

    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    unsafe fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, src_data: &[u8]) {
        unsafe { HasContext::buffer_sub_data_u8_slice(self, target, offset, src_data) }
    }

    unsafe fn copy_buffer_sub_data(
        &self,
        src_target: u32,
        dst_target: u32,
        src_offset: i32,
        dst_offset: i32,
        size: i32,
    ) {
        unsafe {
            HasContext::copy_buffer_sub_data(
                self, src_target, dst_target, src_offset, dst_offset, size,
            );
        }
    }

    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    unsafe fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    unsafe fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    unsafe fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self, index, size, data_type, normalized, stride, offset,
            );
        }
    }

    unsafe fn vertex_attrib_pointer_i32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    ) {
        unsafe { HasContext::vertex_attrib_pointer_i32(self, index, size, data_type, stride, offset) }
    }

    unsafe fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        unsafe { HasContext::vertex_attrib_divisor(self, index, divisor) }
    }

    unsafe fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    unsafe fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    unsafe fn tex_storage_2d(
        &self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        unsafe { HasContext::tex_storage_2d(self, target, levels, internal_format, width, height) }
    }

    unsafe fn tex_sub_image_2d(
        &self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    ) {
        unsafe {
            HasContext::tex_sub_image_2d(
                self,
                target,
                level,
                x_offset,
                y_offset,
                width,
                height,
                format,
                ty,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    unsafe fn generate_mipmap(&self, target: u32) {
        unsafe { HasContext::generate_mipmap(self, target) }
    }

    unsafe fn delete_texture(&self, texture: Self::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    unsafe fn create_sampler(&self) -> Result<Self::Sampler, String> {
        unsafe { HasContext::create_sampler(self) }
    }

    unsafe fn sampler_parameter_i32(&self, sampler: Self::Sampler, name: u32, value: i32) {
        unsafe { HasContext::sampler_parameter_i32(self, sampler, name, value) }
    }

    unsafe fn bind_sampler(&self, unit: u32, sampler: Option<Self::Sampler>) {
        unsafe { HasContext::bind_sampler(self, unit, sampler) }
    }

    unsafe fn delete_sampler(&self, sampler: Self::Sampler) {
        unsafe { HasContext::delete_sampler(self, sampler) }
    }

    unsafe fn enable(&self, parameter: u32) {
        unsafe { HasContext::enable(self, parameter) }
    }

    unsafe fn disable(&self, parameter: u32) {
        unsafe { HasContext::disable(self, parameter) }
    }

    unsafe fn depth_mask(&self, value: bool) {
        unsafe { HasContext::depth_mask(self, value) }
    }

    unsafe fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool) {
        unsafe { HasContext::color_mask(self, red, green, blue, alpha) }
    }

    unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { HasContext::clear_color(self, red, green, blue, alpha) }
    }

    unsafe fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    unsafe fn draw_arrays_instanced(&self, mode: u32, first: i32, count: i32, instance_count: i32) {
        unsafe { HasContext::draw_arrays_instanced(self, mode, first, count, instance_count) }
    }

    unsafe fn draw_elements_instanced(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    ) {
        unsafe {
            HasContext::draw_elements_instanced(
                self,
                mode,
                count,
                element_type,
                offset,
                instance_count,
            );
        }
    }
}
