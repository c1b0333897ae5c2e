//! # Shader Programs
//!
//! Loads a vertex and a fragment source, compiles both stages, links them into a
//! program and exposes named uniform setters. The device work goes through a
//! [`GraphicsBackend`]; [`WgpuBackend`](crate::gfx::rendering::WgpuBackend) is
//! the implementation the viewer uses.
//!
//! A program's lifecycle is decided entirely at construction:
//!
//! ```text
//! Uncompiled ──new──▶ Linked ──release──▶ Destroyed
//!                 └─▶ Failed
//! ```
//!
//! Construction never panics or returns early with an error; a failed program
//! keeps its diagnostics (see [`ShaderProgram::errors`]) and ignores every call.

pub mod backend;
pub mod program;
pub mod source;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{
    GraphicsBackend, ProgramId, ShaderStage, StageId, UniformKind, UniformLocation, UniformValue,
};
pub use program::{ProgramState, ShaderProgram};

use std::{io, path::PathBuf};
use thiserror::Error;

/// Everything that can go wrong while building a [`ShaderProgram`]
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader source '{}'", path.display())]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} shader source '{}' is empty", path.display())]
    EmptySource { stage: ShaderStage, path: PathBuf },

    #[error("could not create {stage} shader object")]
    StageCreation { stage: ShaderStage },

    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("could not create program object")]
    ProgramCreation,

    #[error("program failed to link:\n{log}")]
    Link { log: String },
}
