//! Recording backend for exercising the program lifecycle without a GPU

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::{
    GraphicsBackend, ProgramId, ShaderStage, StageId, UniformKind, UniformLocation, UniformValue,
};

pub const GOOD_VERTEX: &str = "@vertex fn vs_main() {}";
pub const GOOD_FRAGMENT: &str = "@fragment fn fs_main() {}";

/// Writes `contents` to a fresh file in the temp directory
pub fn temp_file(name: &str, contents: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "meshview-{}-{}-{}",
        std::process::id(),
        n,
        name
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

/// Sources containing "syntax error" fail to compile. Deleting an object twice panics.
#[derive(Default)]
pub struct MockBackend {
    uniforms: Vec<(&'static str, UniformKind)>,
    link_error: Option<String>,
    refuse_stages: bool,
    refuse_programs: bool,

    next_id: Cell<u32>,
    live_stages: RefCell<HashMap<u32, ShaderStage>>,
    live_programs: RefCell<Vec<u32>>,
    created_stages: Cell<usize>,
    created_programs: Cell<usize>,
    deleted_stages: Cell<usize>,
    deleted_programs: Cell<usize>,
    compiled: RefCell<Vec<String>>,
    active: Cell<Option<ProgramId>>,
    values: RefCell<HashMap<(u32, u32), UniformValue>>,
    writes: Cell<usize>,
}

impl MockBackend {
    pub fn with_uniform(mut self, name: &'static str, kind: UniformKind) -> Self {
        self.uniforms.push((name, kind));
        self
    }

    pub fn with_link_error(mut self, log: &str) -> Self {
        self.link_error = Some(log.to_string());
        self
    }

    pub fn refusing_stages(mut self) -> Self {
        self.refuse_stages = true;
        self
    }

    pub fn refusing_programs(mut self) -> Self {
        self.refuse_programs = true;
        self
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub fn live_stage_count(&self) -> usize {
        self.live_stages.borrow().len()
    }

    pub fn created_stage_count(&self) -> usize {
        self.created_stages.get()
    }

    pub fn deleted_stage_count(&self) -> usize {
        self.deleted_stages.get()
    }

    pub fn live_program_count(&self) -> usize {
        self.live_programs.borrow().len()
    }

    pub fn created_program_count(&self) -> usize {
        self.created_programs.get()
    }

    pub fn deleted_program_count(&self) -> usize {
        self.deleted_programs.get()
    }

    pub fn compiled_sources(&self) -> Vec<String> {
        self.compiled.borrow().clone()
    }

    pub fn active_program(&self) -> Option<ProgramId> {
        self.active.get()
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let location = self.uniforms.iter().position(|(n, _)| *n == name)? as u32;
        self.values.borrow().get(&(program.0, location)).copied()
    }
}

impl GraphicsBackend for MockBackend {
    fn create_stage(&self, stage: ShaderStage) -> Option<StageId> {
        if self.refuse_stages {
            return None;
        }
        let id = self.next();
        self.live_stages.borrow_mut().insert(id, stage);
        self.created_stages.set(self.created_stages.get() + 1);
        Some(StageId(id))
    }

    fn compile_stage(&self, stage: StageId, source: &str) -> Result<(), String> {
        let kind = self.live_stages.borrow()[&stage.0];
        if source.contains("syntax error") {
            return Err(format!("{kind}: 0:1: syntax error"));
        }
        self.compiled.borrow_mut().push(source.to_string());
        Ok(())
    }

    fn delete_stage(&self, stage: StageId) {
        assert!(
            self.live_stages.borrow_mut().remove(&stage.0).is_some(),
            "stage {stage:?} deleted twice"
        );
        self.deleted_stages.set(self.deleted_stages.get() + 1);
    }

    fn create_program(&self) -> Option<ProgramId> {
        if self.refuse_programs {
            return None;
        }
        let id = self.next();
        self.live_programs.borrow_mut().push(id);
        self.created_programs.set(self.created_programs.get() + 1);
        Some(ProgramId(id))
    }

    fn link_program(
        &self,
        _program: ProgramId,
        vertex: StageId,
        fragment: StageId,
    ) -> Result<(), String> {
        let stages = self.live_stages.borrow();
        assert_eq!(stages.get(&vertex.0), Some(&ShaderStage::Vertex));
        assert_eq!(stages.get(&fragment.0), Some(&ShaderStage::Fragment));
        match &self.link_error {
            Some(log) => Err(log.clone()),
            None => Ok(()),
        }
    }

    fn delete_program(&self, program: ProgramId) {
        let mut live = self.live_programs.borrow_mut();
        let index = live
            .iter()
            .position(|&id| id == program.0)
            .unwrap_or_else(|| panic!("program {program:?} deleted twice"));
        live.remove(index);
        if self.active.get() == Some(program) {
            self.active.set(None);
        }
        self.deleted_programs.set(self.deleted_programs.get() + 1);
    }

    fn use_program(&self, program: ProgramId) {
        assert!(self.live_programs.borrow().contains(&program.0));
        self.active.set(Some(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        assert!(self.live_programs.borrow().contains(&program.0));
        self.uniforms
            .iter()
            .position(|(n, _)| *n == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn set_uniform(
        &self,
        program: ProgramId,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), String> {
        let (name, kind) = self.uniforms[location.0 as usize];
        if kind != value.kind() {
            return Err(format!("'{name}' is {kind:?}, got {:?}", value.kind()));
        }
        self.values
            .borrow_mut()
            .insert((program.0, location.0), value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
