//! The graphics-device contract a [`ShaderProgram`](super::ShaderProgram) is built on
//!
//! The trait mirrors the classic compile/link/uniform object model. Every method
//! takes `&self`; backends keep their object tables behind interior mutability
//! because the device is a single-threaded, process-wide resource.

use std::fmt;

/// Which pipeline stage a shader source is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Device-side handle of a compiled stage object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(pub u32);

/// Device-side handle of a program object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// A uniform slot resolved by name within one linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Value written to a uniform
///
/// Booleans are carried as `Int` (0 or 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    /// Column-major 4x4 matrix
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Int(v) => bytemuck::bytes_of(v),
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(m) => bytemuck::bytes_of(m),
        }
    }

    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

/// Declared type of a uniform, as far as the setters care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Mat4,
    /// Any type none of the setters can write
    Other,
}

/// Graphics device operations needed to build and drive shader programs
///
/// Compile and link failures are returned as the device's diagnostic text.
pub trait GraphicsBackend {
    /// Allocates an empty stage object, `None` if the device refuses
    fn create_stage(&self, stage: ShaderStage) -> Option<StageId>;

    fn compile_stage(&self, stage: StageId, source: &str) -> Result<(), String>;

    fn delete_stage(&self, stage: StageId);

    /// Allocates an empty program object, `None` if the device refuses
    fn create_program(&self) -> Option<ProgramId>;

    fn link_program(
        &self,
        program: ProgramId,
        vertex: StageId,
        fragment: StageId,
    ) -> Result<(), String>;

    fn delete_program(&self, program: ProgramId);

    /// Makes `program` the target of subsequent draw calls
    fn use_program(&self, program: ProgramId);

    /// Resolves a uniform by name, `None` if the program has no such uniform
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Writes a uniform; fails if the value cannot be stored in the declared type
    fn set_uniform(
        &self,
        program: ProgramId,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), String>;
}
