//! A recording [`GlBackend`] for unit tests.
//!
//! Serves introspection results from fixtures, records every state-changing
//! call in order and tracks live object handles so tests can check call
//! sequences and leaks without a real GL context.

use std::{cell::RefCell, collections::BTreeSet};

use crate::{
    error::ShaderStage,
    gl::{ActiveAttribute, ActiveUniform, GlBackend},
    reflection::attribute_shape,
};

/// A state-changing GL call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UseProgram(Option<u32>),
    TransformFeedbackVaryings(Vec<String>),
    UniformBlockBinding { index: u32, binding: u32 },
    Uniform1I32 { location: u32, value: i32 },
    BindTransformFeedback(Option<u32>),
    BeginTransformFeedback(u32),
    EndTransformFeedback,
    BindBuffer { target: u32, buffer: Option<u32> },
    BindBufferBase { target: u32, index: u32, buffer: Option<u32> },
    BufferData { target: u32, len: usize, usage: u32 },
    BufferSubData { target: u32, offset: i32, len: usize },
    CopyBufferSubData { src_target: u32, dst_target: u32, src_offset: i32, dst_offset: i32, size: i32 },
    BindVertexArray(Option<u32>),
    EnableVertexAttribArray(u32),
    VertexAttribPointerF32 { index: u32, size: i32, data_type: u32, normalized: bool, stride: i32, offset: i32 },
    VertexAttribPointerI32 { index: u32, size: i32, data_type: u32, stride: i32, offset: i32 },
    VertexAttribDivisor { index: u32, divisor: u32 },
    ActiveTexture(u32),
    BindTexture { target: u32, texture: Option<u32> },
    TexStorage2d { levels: i32, internal_format: u32, width: i32, height: i32 },
    TexSubImage2d { width: i32, height: i32, len: usize },
    GenerateMipmap(u32),
    SamplerParameter { name: u32, value: i32 },
    BindSampler { unit: u32, sampler: Option<u32> },
    Enable(u32),
    Disable(u32),
    DepthMask(bool),
    ColorMask(bool, bool, bool, bool),
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear(u32),
    DrawArraysInstanced { mode: u32, first: i32, count: i32, instances: i32 },
    DrawElementsInstanced { mode: u32, count: i32, element_type: u32, offset: i32, instances: i32 },
}

#[derive(Default)]
struct State {
    next_handle: u32,
    live: BTreeSet<u32>,
    shaders: Vec<(u32, u32)>,
    calls: Vec<Call>,
    creation_budget: Option<usize>,
}

/// Fixture-driven fake GL context.
#[derive(Default)]
pub struct MockGl {
    attributes: Vec<(String, u32, u32)>,
    next_location: u32,
    uniform_blocks: Vec<String>,
    uniforms: Vec<(String, u32)>,
    compile_error: Option<(u32, String)>,
    link_error: Option<String>,
    state: RefCell<State>,
}

impl MockGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an active attribute; locations are assigned consecutively,
    /// matrices taking one per column.
    pub fn with_attribute(mut self, name: &str, gl_type: u32) -> Self {
        let location = self.next_location;
        self.next_location += attribute_shape(gl_type).map_or(1, |(_, count)| count);
        self.attributes.push((name.to_string(), gl_type, location));
        self
    }

    pub fn with_uniform_block(mut self, name: &str) -> Self {
        self.uniform_blocks.push(name.to_string());
        self
    }

    pub fn with_uniform(mut self, name: &str, gl_type: u32) -> Self {
        self.uniforms.push((name.to_string(), gl_type));
        self
    }

    pub fn with_compile_error(mut self, stage: ShaderStage, log: &str) -> Self {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        self.compile_error = Some((shader_type, log.to_string()));
        self
    }

    pub fn with_link_error(mut self, log: &str) -> Self {
        self.link_error = Some(log.to_string());
        self
    }

    /// Allow only `remaining` more objects to be created.
    pub fn fail_creation_after(&self, remaining: usize) {
        self.state.borrow_mut().creation_budget = Some(remaining);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn live_objects(&self) -> usize {
        self.state.borrow().live.len()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if let Some(budget) = state.creation_budget.as_mut() {
            if *budget == 0 {
                return Err("out of memory".to_string());
            }
            *budget -= 1;
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        state.live.insert(handle);
        Ok(handle)
    }

    fn delete(&self, handle: u32) {
        assert!(
            self.state.borrow_mut().live.remove(&handle),
            "deleted unknown or already deleted handle {handle}"
        );
    }

    fn shader_type(&self, shader: u32) -> Option<u32> {
        self.state
            .borrow()
            .shaders
            .iter()
            .find(|(handle, _)| *handle == shader)
            .map(|(_, shader_type)| *shader_type)
    }
}

#[allow(clippy::cast_possible_truncation)]
impl GlBackend for MockGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Texture = u32;
    type Sampler = u32;
    type TransformFeedback = u32;
    type UniformLocation = u32;

    unsafe fn get_parameter_i32(&self, parameter: u32) -> i32 {
        match parameter {
            glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS => 32,
            _ => 0,
        }
    }

    unsafe fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let shader = self.create()?;
        self.state.borrow_mut().shaders.push((shader, shader_type));
        Ok(shader)
    }

    unsafe fn shader_source(&self, _shader: u32, _source: &str) {}

    unsafe fn compile_shader(&self, _shader: u32) {}

    unsafe fn get_shader_compile_status(&self, shader: u32) -> bool {
        match &self.compile_error {
            Some((shader_type, _)) => self.shader_type(shader) != Some(*shader_type),
            None => true,
        }
    }

    unsafe fn get_shader_info_log(&self, _shader: u32) -> String {
        self.compile_error
            .as_ref()
            .map(|(_, log)| log.clone())
            .unwrap_or_default()
    }

    unsafe fn delete_shader(&self, shader: u32) {
        self.delete(shader);
    }

    unsafe fn create_program(&self) -> Result<u32, String> {
        self.create()
    }

    unsafe fn attach_shader(&self, _program: u32, _shader: u32) {}

    unsafe fn detach_shader(&self, _program: u32, _shader: u32) {}

    unsafe fn link_program(&self, _program: u32) {}

    unsafe fn get_program_link_status(&self, _program: u32) -> bool {
        self.link_error.is_none()
    }

    unsafe fn get_program_info_log(&self, _program: u32) -> String {
        self.link_error.clone().unwrap_or_default()
    }

    unsafe fn delete_program(&self, program: u32) {
        self.delete(program);
    }

    unsafe fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    unsafe fn get_active_attributes(&self, _program: u32) -> u32 {
        self.attributes.len() as u32
    }

    unsafe fn get_active_attribute(&self, _program: u32, index: u32) -> Option<ActiveAttribute> {
        self.attributes
            .get(index as usize)
            .map(|(name, atype, _)| ActiveAttribute {
                name: name.clone(),
                size: 1,
                atype: *atype,
            })
    }

    unsafe fn get_attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(attribute, _, _)| attribute == name)
            .map(|(_, _, location)| *location)
    }

    unsafe fn get_active_uniforms(&self, _program: u32) -> u32 {
        self.uniforms.len() as u32
    }

    unsafe fn get_active_uniform(&self, _program: u32, index: u32) -> Option<ActiveUniform> {
        self.uniforms
            .get(index as usize)
            .map(|(name, utype)| ActiveUniform {
                name: name.clone(),
                size: 1,
                utype: *utype,
            })
    }

    unsafe fn get_uniform_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.uniforms
            .iter()
            .position(|(uniform, _)| uniform == name)
            .map(|index| index as u32 + 1)
    }

    unsafe fn uniform_1_i32(&self, location: Option<&u32>, value: i32) {
        if let Some(location) = location {
            self.record(Call::Uniform1I32 {
                location: *location,
                value,
            });
        }
    }

    unsafe fn get_active_uniform_blocks(&self, _program: u32) -> u32 {
        self.uniform_blocks.len() as u32
    }

    unsafe fn get_active_uniform_block_name(&self, _program: u32, index: u32) -> String {
        self.uniform_blocks[index as usize].clone()
    }

    unsafe fn uniform_block_binding(&self, _program: u32, index: u32, binding: u32) {
        self.record(Call::UniformBlockBinding { index, binding });
    }

    unsafe fn transform_feedback_varyings(&self, _program: u32, varyings: &[&str], _mode: u32) {
        self.record(Call::TransformFeedbackVaryings(
            varyings.iter().map(|name| (*name).to_string()).collect(),
        ));
    }

    unsafe fn create_transform_feedback(&self) -> Result<u32, String> {
        self.create()
    }

    unsafe fn bind_transform_feedback(&self, _target: u32, transform_feedback: Option<u32>) {
        self.record(Call::BindTransformFeedback(transform_feedback));
    }

    unsafe fn delete_transform_feedback(&self, transform_feedback: u32) {
        self.delete(transform_feedback);
    }

    unsafe fn begin_transform_feedback(&self, primitive_mode: u32) {
        self.record(Call::BeginTransformFeedback(primitive_mode));
    }

    unsafe fn end_transform_feedback(&self) {
        self.record(Call::EndTransformFeedback);
    }

    unsafe fn create_buffer(&self) -> Result<u32, String> {
        self.create()
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        self.record(Call::BindBuffer { target, buffer });
    }

    unsafe fn bind_buffer_base(&self, target: u32, index: u32, buffer: Option<u32>) {
        self.record(Call::BindBufferBase {
            target,
            index,
            buffer,
        });
    }

    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        self.record(Call::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    unsafe fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, src_data: &[u8]) {
        self.record(Call::BufferSubData {
            target,
            offset,
            len: src_data.len(),
        });
    }

    unsafe fn copy_buffer_sub_data(
        &self,
        src_target: u32,
        dst_target: u32,
        src_offset: i32,
        dst_offset: i32,
        size: i32,
    ) {
        self.record(Call::CopyBufferSubData {
            src_target,
            dst_target,
            src_offset,
            dst_offset,
            size,
        });
    }

    unsafe fn delete_buffer(&self, buffer: u32) {
        self.delete(buffer);
    }

    unsafe fn create_vertex_array(&self) -> Result<u32, String> {
        self.create()
    }

    unsafe fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    unsafe fn delete_vertex_array(&self, vertex_array: u32) {
        self.delete(vertex_array);
    }

    unsafe fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(Call::EnableVertexAttribArray(index));
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
        self.record(Call::VertexAttribPointerF32 {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    unsafe fn vertex_attrib_pointer_i32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::VertexAttribPointerI32 {
            index,
            size,
            data_type,
            stride,
            offset,
        });
    }

    unsafe fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        self.record(Call::VertexAttribDivisor { index, divisor });
    }

    unsafe fn create_texture(&self) -> Result<u32, String> {
        self.create()
    }

    unsafe fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    unsafe fn bind_texture(&self, target: u32, texture: Option<u32>) {
        self.record(Call::BindTexture { target, texture });
    }

    unsafe fn tex_storage_2d(
        &self,
        _target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        self.record(Call::TexStorage2d {
            levels,
            internal_format,
            width,
            height,
        });
    }

    unsafe fn tex_sub_image_2d(
        &self,
        _target: u32,
        _level: i32,
        _x_offset: i32,
        _y_offset: i32,
        width: i32,
        height: i32,
        _format: u32,
        _ty: u32,
        pixels: &[u8],
    ) {
        self.record(Call::TexSubImage2d {
            width,
            height,
            len: pixels.len(),
        });
    }

    unsafe fn generate_mipmap(&self, target: u32) {
        self.record(Call::GenerateMipmap(target));
    }

    unsafe fn delete_texture(&self, texture: u32) {
        self.delete(texture);
    }

    unsafe fn create_sampler(&self) -> Result<u32, String> {
        self.create()
    }

    unsafe fn sampler_parameter_i32(&self, _sampler: u32, name: u32, value: i32) {
        self.record(Call::SamplerParameter { name, value });
    }

    unsafe fn bind_sampler(&self, unit: u32, sampler: Option<u32>) {
        self.record(Call::BindSampler { unit, sampler });
    }

    unsafe fn delete_sampler(&self, sampler: u32) {
        self.delete(sampler);
    }

    unsafe fn enable(&self, parameter: u32) {
        self.record(Call::Enable(parameter));
    }

    unsafe fn disable(&self, parameter: u32) {
        self.record(Call::Disable(parameter));
    }

    unsafe fn depth_mask(&self, value: bool) {
        self.record(Call::DepthMask(value));
    }

    unsafe fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.record(Call::ColorMask(red, green, blue, alpha));
    }

    unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(Call::ClearColor([red, green, blue, alpha]));
    }

    unsafe fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    unsafe fn draw_arrays_instanced(&self, mode: u32, first: i32, count: i32, instance_count: i32) {
        self.record(Call::DrawArraysInstanced {
            mode,
            first,
            count,
            instances: instance_count,
        });
    }

    unsafe fn draw_elements_instanced(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    ) {
        self.record(Call::DrawElementsInstanced {
            mode,
            count,
            element_type,
            offset,
            instances: instance_count,
        });
    }
}
