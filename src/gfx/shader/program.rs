//! [`ShaderProgram`]: one vertex and one fragment stage linked together
//!
//! Stage objects only live while a program is being built. Any failure on the
//! way leaves the program `Failed` with every diagnostic it collected.

use std::{path::Path, rc::Rc};

use super::{
    source::read_source, GraphicsBackend, ProgramId, ShaderError, ShaderStage, StageId,
    UniformValue,
};

/// Observable lifecycle state of a [`ShaderProgram`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Uncompiled,
    Linked,
    Failed,
    Destroyed,
}

enum Lifecycle {
    Uncompiled,
    Linked(ProgramId),
    Failed(Vec<ShaderError>),
    Destroyed,
}

/// A compiled stage object, deleted exactly once when dropped
struct CompiledStage<'a, B: GraphicsBackend + ?Sized> {
    backend: &'a B,
    id: StageId,
}

impl<B: GraphicsBackend + ?Sized> Drop for CompiledStage<'_, B> {
    fn drop(&mut self) {
        self.backend.delete_stage(self.id);
    }
}

fn compile<'a, B: GraphicsBackend + ?Sized>(
    backend: &'a B,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledStage<'a, B>, ShaderError> {
    let id = backend
        .create_stage(stage)
        .ok_or(ShaderError::StageCreation { stage })?;
    let compiled = CompiledStage { backend, id };

    backend
        .compile_stage(id, source)
        .map_err(|log| ShaderError::Compile { stage, log })?;
    Ok(compiled)
}

/// Compiles both stages, then links them. Stage objects are released on every path.
fn link<B: GraphicsBackend + ?Sized>(
    backend: &B,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<ProgramId, Vec<ShaderError>> {
    // Both stages are always attempted so one build reports every compile error.
    let vertex = compile(backend, ShaderStage::Vertex, vertex_source);
    let fragment = compile(backend, ShaderStage::Fragment, fragment_source);

    let (vertex, fragment) = match (vertex, fragment) {
        (Ok(vertex), Ok(fragment)) => (vertex, fragment),
        (vertex, fragment) => {
            return Err(vertex.err().into_iter().chain(fragment.err()).collect());
        }
    };

    let program = backend
        .create_program()
        .ok_or_else(|| vec![ShaderError::ProgramCreation])?;

    if let Err(log) = backend.link_program(program, vertex.id, fragment.id) {
        backend.delete_program(program);
        return Err(vec![ShaderError::Link { log }]);
    }

    Ok(program)
}

/// One linked vertex + fragment program on a [`GraphicsBackend`]
///
/// Owned exclusively by whoever created it. Call [`release`](Self::release) before
/// shutdown; dropping a program that is still linked releases it with a warning.
pub struct ShaderProgram<B: GraphicsBackend> {
    backend: Rc<B>,
    label: String,
    lifecycle: Lifecycle,
}

impl<B: GraphicsBackend> ShaderProgram<B> {
    /// Reads, compiles and links the two shader files
    ///
    /// Never fails outright: if a file cannot be read, a stage does not compile or
    /// the program does not link, the result is in [`ProgramState::Failed`] and
    /// each problem is logged and kept in [`errors`](Self::errors).
    pub fn new(
        backend: Rc<B>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Self {
        let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
        let label = format!("{} + {}", vertex_path.display(), fragment_path.display());

        let vertex = read_source(ShaderStage::Vertex, vertex_path);
        let fragment = read_source(ShaderStage::Fragment, fragment_path);

        let result = match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => link(backend.as_ref(), &vertex, &fragment),
            (vertex, fragment) => Err(vertex.err().into_iter().chain(fragment.err()).collect()),
        };
        Self::from_result(backend, label, result)
    }

    /// Compiles and links sources that are already in memory
    pub fn from_sources(
        backend: Rc<B>,
        label: impl Into<String>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Self {
        let result = link(backend.as_ref(), vertex_source, fragment_source);
        Self::from_result(backend, label.into(), result)
    }

    fn from_result(
        backend: Rc<B>,
        label: String,
        result: Result<ProgramId, Vec<ShaderError>>,
    ) -> Self {
        let mut program = Self {
            backend,
            label,
            lifecycle: Lifecycle::Uncompiled,
        };

        program.lifecycle = match result {
            Ok(id) => {
                log::debug!("linked shader program '{}' as {:?}", program.label, id);
                Lifecycle::Linked(id)
            }
            Err(errors) => {
                for error in &errors {
                    match std::error::Error::source(error) {
                        Some(cause) => {
                            log::error!("shader program '{}': {}: {}", program.label, error, cause)
                        }
                        None => log::error!("shader program '{}': {}", program.label, error),
                    }
                }
                Lifecycle::Failed(errors)
            }
        };
        program
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ProgramState {
        match self.lifecycle {
            Lifecycle::Uncompiled => ProgramState::Uncompiled,
            Lifecycle::Linked(_) => ProgramState::Linked,
            Lifecycle::Failed(_) => ProgramState::Failed,
            Lifecycle::Destroyed => ProgramState::Destroyed,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Linked(_))
    }

    /// The device handle, present only while linked
    pub fn handle(&self) -> Option<ProgramId> {
        match self.lifecycle {
            Lifecycle::Linked(id) => Some(id),
            _ => None,
        }
    }

    /// Diagnostics collected while building a failed program
    pub fn errors(&self) -> &[ShaderError] {
        match &self.lifecycle {
            Lifecycle::Failed(errors) => errors,
            _ => &[],
        }
    }

    fn linked_handle(&self, operation: &str) -> Option<ProgramId> {
        let handle = self.handle();
        if handle.is_none() {
            log::warn!(
                "{} on shader program '{}' ignored: program is {:?}",
                operation,
                self.label,
                self.state()
            );
        }
        handle
    }

    /// Makes this program the one subsequent draw calls use
    pub fn activate(&self) {
        if let Some(id) = self.linked_handle("activate") {
            self.backend.use_program(id);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Int(value as i32));
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    /// Writes a column-major 4x4 matrix (e.g. a `cgmath::Matrix4<f32>`)
    pub fn set_mat4(&self, name: &str, value: impl Into<[[f32; 4]; 4]>) {
        self.set_uniform(name, UniformValue::Mat4(value.into()));
    }

    /// Resolves `name` and writes `value`
    ///
    /// Unknown names are ignored; uniforms the shader never reads are commonly
    /// optimised away.
    pub fn set_uniform(&self, name: &str, value: UniformValue) {
        let Some(id) = self.linked_handle("uniform write") else {
            return;
        };

        match self.backend.uniform_location(id, name) {
            Some(location) => {
                if let Err(e) = self.backend.set_uniform(id, location, value) {
                    log::warn!(
                        "shader program '{}': could not write uniform '{}': {}",
                        self.label,
                        name,
                        e
                    );
                }
            }
            None => log::debug!(
                "shader program '{}' has no uniform named '{}'",
                self.label,
                name
            ),
        }
    }

    /// Deletes the device-side program
    ///
    /// Idempotent. A failed program owns no device resource and stays `Failed`.
    pub fn release(&mut self) {
        match self.lifecycle {
            Lifecycle::Linked(id) => {
                self.backend.delete_program(id);
                self.lifecycle = Lifecycle::Destroyed;
                log::debug!("released shader program '{}'", self.label);
            }
            Lifecycle::Uncompiled => self.lifecycle = Lifecycle::Destroyed,
            Lifecycle::Failed(_) | Lifecycle::Destroyed => {}
        }
    }
}

impl<B: GraphicsBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        if self.is_linked() {
            log::warn!(
                "shader program '{}' dropped without release; releasing now",
                self.label
            );
            self.release();
        }
    }
}

impl<B: GraphicsBackend> std::fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("label", &self.label)
            .field("state", &self.state())
            .field("handle", &self.handle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::shader::{
        mock::{temp_file, MockBackend, GOOD_FRAGMENT, GOOD_VERTEX},
        UniformKind,
    };

    fn backend() -> Rc<MockBackend> {
        Rc::new(
            MockBackend::default()
                .with_uniform("model", UniformKind::Mat4)
                .with_uniform("scale", UniformKind::Float)
                .with_uniform("mode", UniformKind::Int),
        )
    }

    fn linked(backend: &Rc<MockBackend>) -> ShaderProgram<MockBackend> {
        let program =
            ShaderProgram::from_sources(backend.clone(), "test", GOOD_VERTEX, GOOD_FRAGMENT);
        assert_eq!(program.state(), ProgramState::Linked);
        program
    }

    #[test]
    fn test_links_from_files() {
        let backend = backend();
        let vertex = temp_file("link_vs.wgsl", GOOD_VERTEX);
        let fragment = temp_file("link_fs.wgsl", GOOD_FRAGMENT);

        let mut program = ShaderProgram::new(backend.clone(), &vertex, &fragment);
        assert!(program.is_linked());
        assert!(program.label().contains("link_vs.wgsl"));
        assert!(program.label().contains("link_fs.wgsl"));
        assert!(program.handle().is_some());
        assert!(program.errors().is_empty());
        assert_eq!(
            backend.compiled_sources(),
            vec![GOOD_VERTEX.to_string(), GOOD_FRAGMENT.to_string()]
        );

        // Intermediate stages are gone once the program is linked.
        assert_eq!(backend.live_stage_count(), 0);
        assert_eq!(backend.deleted_stage_count(), 2);

        program.release();
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_missing_vertex_file_fails_without_device_work() {
        let backend = backend();
        let fragment = temp_file("missing_fs.wgsl", GOOD_FRAGMENT);

        let mut program = ShaderProgram::new(backend.clone(), "/no/such/vertex.wgsl", &fragment);
        assert_eq!(program.state(), ProgramState::Failed);
        assert_eq!(program.handle(), None);
        assert!(matches!(
            program.errors(),
            [ShaderError::Read { stage: ShaderStage::Vertex, .. }]
        ));
        assert_eq!(backend.created_stage_count(), 0);

        program.release();
        program.release();
        assert_eq!(program.state(), ProgramState::Failed);
        assert_eq!(backend.deleted_program_count(), 0);
    }

    #[test]
    fn test_both_read_errors_reported() {
        let backend = backend();
        let empty = temp_file("both_empty_fs.wgsl", "");
        let program = ShaderProgram::new(backend, "/no/such/vertex.wgsl", &empty);
        assert!(matches!(
            program.errors(),
            [
                ShaderError::Read { stage: ShaderStage::Vertex, .. },
                ShaderError::EmptySource { stage: ShaderStage::Fragment, .. }
            ]
        ));
    }

    #[test]
    fn test_compile_errors_collected_from_both_stages() {
        let backend = backend();
        let program = ShaderProgram::from_sources(
            backend.clone(),
            "broken",
            "syntax error in vertex",
            "syntax error in fragment",
        );

        assert_eq!(program.state(), ProgramState::Failed);
        let stages: Vec<_> = program
            .errors()
            .iter()
            .map(|e| match e {
                ShaderError::Compile { stage, log } => {
                    assert!(log.contains("syntax error"));
                    *stage
                }
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Fragment]);
        assert_eq!(backend.created_program_count(), 0);
        assert_eq!(backend.live_stage_count(), 0);
        assert_eq!(backend.deleted_stage_count(), 2);
    }

    #[test]
    fn test_one_stage_failing_still_releases_the_other() {
        let backend = backend();
        let program =
            ShaderProgram::from_sources(backend.clone(), "half", GOOD_VERTEX, "syntax error");
        assert!(matches!(
            program.errors(),
            [ShaderError::Compile { stage: ShaderStage::Fragment, .. }]
        ));
        assert_eq!(backend.live_stage_count(), 0);
        assert_eq!(backend.deleted_stage_count(), 2);
    }

    #[test]
    fn test_link_failure_cleans_up() {
        let backend = Rc::new(MockBackend::default().with_link_error("varying mismatch"));
        let program =
            ShaderProgram::from_sources(backend.clone(), "unlinked", GOOD_VERTEX, GOOD_FRAGMENT);

        assert_eq!(program.state(), ProgramState::Failed);
        assert!(matches!(
            program.errors(),
            [ShaderError::Link { log }] if log == "varying mismatch"
        ));
        assert_eq!(backend.live_program_count(), 0);
        assert_eq!(backend.deleted_program_count(), 1);
        assert_eq!(backend.live_stage_count(), 0);
        assert_eq!(backend.deleted_stage_count(), 2);
    }

    #[test]
    fn test_device_refusing_objects() {
        let backend = Rc::new(MockBackend::default().refusing_programs());
        let program =
            ShaderProgram::from_sources(backend.clone(), "refused", GOOD_VERTEX, GOOD_FRAGMENT);
        assert!(matches!(program.errors(), [ShaderError::ProgramCreation]));
        assert_eq!(backend.live_stage_count(), 0);

        let backend = Rc::new(MockBackend::default().refusing_stages());
        let program =
            ShaderProgram::from_sources(backend.clone(), "refused", GOOD_VERTEX, GOOD_FRAGMENT);
        assert!(matches!(
            program.errors(),
            [ShaderError::StageCreation { .. }, ShaderError::StageCreation { .. }]
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = backend();
        let mut program = linked(&backend);

        program.release();
        assert_eq!(program.state(), ProgramState::Destroyed);
        assert_eq!(program.handle(), None);
        program.release();
        drop(program);

        assert_eq!(backend.deleted_program_count(), 1);
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_drop_releases_linked_program() {
        let backend = backend();
        drop(linked(&backend));
        assert_eq!(backend.deleted_program_count(), 1);
    }

    #[test]
    fn test_activate() {
        let backend = backend();
        let program = linked(&backend);
        program.activate();
        assert_eq!(backend.active_program(), program.handle());
    }

    #[test]
    fn test_unknown_uniform_is_a_no_op() {
        let backend = backend();
        let program = linked(&backend);

        program.set_float("scale", 2.5);
        program.set_int("nonexistent_uniform", 5);

        let id = program.handle().unwrap();
        assert_eq!(backend.uniform_value(id, "scale"), Some(UniformValue::Float(2.5)));
        assert_eq!(backend.uniform_value(id, "nonexistent_uniform"), None);
        assert_eq!(backend.write_count(), 1);
    }

    #[test]
    fn test_setters() {
        let backend = backend();
        let program = linked(&backend);
        let id = program.handle().unwrap();

        let matrix = cgmath::Matrix4::from_scale(2.0f32);
        program.set_mat4("model", matrix);
        program.set_bool("mode", true);

        let expected: [[f32; 4]; 4] = matrix.into();
        assert_eq!(backend.uniform_value(id, "model"), Some(UniformValue::Mat4(expected)));
        assert_eq!(backend.uniform_value(id, "mode"), Some(UniformValue::Int(1)));

        program.set_int("mode", 7);
        assert_eq!(backend.uniform_value(id, "mode"), Some(UniformValue::Int(7)));
    }

    #[test]
    fn test_mismatched_uniform_type_is_ignored() {
        let backend = backend();
        let program = linked(&backend);
        let id = program.handle().unwrap();

        program.set_float("model", 1.0);
        assert_eq!(backend.uniform_value(id, "model"), None);
    }

    #[test]
    fn test_calls_on_failed_program_are_ignored() {
        let backend = backend();
        let program =
            ShaderProgram::from_sources(backend.clone(), "broken", "syntax error", GOOD_FRAGMENT);

        program.activate();
        program.set_float("scale", 1.0);
        assert_eq!(backend.active_program(), None);
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_calls_after_release_are_ignored() {
        let backend = backend();
        let mut program = linked(&backend);
        program.release();

        program.activate();
        program.set_mat4("model", [[0.0; 4]; 4]);
        assert_eq!(backend.active_program(), None);
        assert_eq!(backend.write_count(), 0);
    }
}
