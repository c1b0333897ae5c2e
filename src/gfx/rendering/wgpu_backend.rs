//! [`GraphicsBackend`] on top of wgpu
//!
//! Stage objects hold naga-validated WGSL. Linking builds the uniform buffers,
//! bind group and pipeline layout, and creates the default pipeline inside a
//! validation error scope so device-side problems surface as link errors.
//! Pipelines for other topologies and polygon modes are created on first draw
//! and cached per program.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    sync::Arc,
};

use wgpu::{Device, Queue, TextureFormat};

use super::{
    mesh::GpuMesh,
    wgsl::{self, CompiledModule, UniformBinding},
};
use crate::gfx::{
    geometry::Topology,
    shader::{
        GraphicsBackend, ProgramId, ShaderStage, StageId, UniformLocation, UniformValue,
    },
};

/// Pipeline state that wgpu bakes into a render pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawMode {
    pub topology: Topology,
    pub wireframe: bool,
}

impl DrawMode {
    const DEFAULT: DrawMode = DrawMode {
        topology: Topology::TriangleList,
        wireframe: false,
    };
}

struct StageSlot {
    stage: ShaderStage,
    compiled: Option<CompiledModule>,
}

struct UniformSlot {
    binding: UniformBinding,
    buffer: wgpu::Buffer,
}

struct LinkedProgram {
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    layout: wgpu::PipelineLayout,
    bind_group: Option<wgpu::BindGroup>,
    uniforms: Vec<UniformSlot>,
    pipelines: HashMap<DrawMode, Option<wgpu::RenderPipeline>>,
}

enum ProgramSlot {
    Created,
    Linked(LinkedProgram),
}

fn compiled_stage(
    stages: &HashMap<StageId, StageSlot>,
    id: StageId,
    expected: ShaderStage,
) -> Result<&CompiledModule, String> {
    match stages.get(&id) {
        Some(StageSlot {
            stage,
            compiled: Some(module),
        }) if *stage == expected => Ok(module),
        Some(StageSlot { stage, .. }) if *stage != expected => {
            Err(format!("{id:?} is a {stage} stage, expected {expected}"))
        }
        _ => Err(format!("{expected} stage {id:?} is not compiled")),
    }
}

pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    color_format: TextureFormat,
    depth_format: Option<TextureFormat>,
    wireframe_supported: bool,
    next_id: Cell<u32>,
    stages: RefCell<HashMap<StageId, StageSlot>>,
    programs: RefCell<HashMap<ProgramId, ProgramSlot>>,
    active: Cell<Option<ProgramId>>,
}

impl WgpuBackend {
    /// Creates a backend whose pipelines render into `color_format`, depth-tested
    /// against `depth_format` when given
    pub fn new(
        device: Arc<Device>,
        queue: Arc<Queue>,
        color_format: TextureFormat,
        depth_format: Option<TextureFormat>,
    ) -> Self {
        let wireframe_supported = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        if !wireframe_supported {
            log::info!("POLYGON_MODE_LINE unavailable; wireframe objects are drawn filled");
        }

        Self {
            device,
            queue,
            color_format,
            depth_format,
            wireframe_supported,
            next_id: Cell::new(0),
            stages: RefCell::new(HashMap::new()),
            programs: RefCell::new(HashMap::new()),
            active: Cell::new(None),
        }
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn create_pipeline(&self, program: &LinkedProgram, mode: DrawMode) -> wgpu::RenderPipeline {
        let polygon_mode = if mode.wireframe {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        };
        let topology = match mode.topology {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shader Program Pipeline"),
                layout: Some(&program.layout),
                vertex: wgpu::VertexState {
                    module: &program.vertex_module,
                    entry_point: Some(&program.vertex_entry),
                    buffers: &[GpuMesh::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment_module,
                    entry_point: Some(&program.fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn build_program(
        &self,
        vertex: &CompiledModule,
        fragment: &CompiledModule,
        uniforms: Vec<UniformBinding>,
    ) -> Result<LinkedProgram, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex Stage"),
            source: wgpu::ShaderSource::Wgsl(vertex.source.as_str().into()),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fragment Stage"),
            source: wgpu::ShaderSource::Wgsl(fragment.source.as_str().into()),
        });

        let uniforms: Vec<UniformSlot> = uniforms
            .into_iter()
            .map(|binding| {
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Uniform: {}", binding.name)),
                    size: binding.size.max(4).next_multiple_of(16),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                UniformSlot { binding, buffer }
            })
            .collect();

        let bind_group_layout = (!uniforms.is_empty()).then(|| {
            let entries: Vec<_> = uniforms
                .iter()
                .map(|slot| {
                    let mut visibility = wgpu::ShaderStages::NONE;
                    if slot.binding.in_vertex {
                        visibility |= wgpu::ShaderStages::VERTEX;
                    }
                    if slot.binding.in_fragment {
                        visibility |= wgpu::ShaderStages::FRAGMENT;
                    }
                    wgpu::BindGroupLayoutEntry {
                        binding: slot.binding.binding,
                        visibility,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(slot.binding.size),
                        },
                        count: None,
                    }
                })
                .collect();
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Shader Program Uniforms Layout"),
                    entries: &entries,
                })
        });

        let bind_group = bind_group_layout.as_ref().map(|layout| {
            let entries: Vec<_> = uniforms
                .iter()
                .map(|slot| wgpu::BindGroupEntry {
                    binding: slot.binding.binding,
                    resource: slot.buffer.as_entire_binding(),
                })
                .collect();
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shader Program Uniforms"),
                layout,
                entries: &entries,
            })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shader Program Layout"),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let mut program = LinkedProgram {
            vertex_module,
            fragment_module,
            vertex_entry: vertex.entry_point().to_owned(),
            fragment_entry: fragment.entry_point().to_owned(),
            layout,
            bind_group,
            uniforms,
            pipelines: HashMap::new(),
        };
        let pipeline = self.create_pipeline(&program, DrawMode::DEFAULT);
        program.pipelines.insert(DrawMode::DEFAULT, Some(pipeline));

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(program),
        }
    }

    /// Pipeline and bind group for drawing `id` in `mode`
    ///
    /// Variants other than the default are created here on first use, inside a
    /// validation error scope. A variant the device rejects is logged once and
    /// cached as failed, so draws that need it are skipped.
    fn pipeline(
        &self,
        id: ProgramId,
        mode: DrawMode,
    ) -> Option<(wgpu::RenderPipeline, Option<wgpu::BindGroup>)> {
        let mut programs = self.programs.borrow_mut();
        let Some(ProgramSlot::Linked(program)) = programs.get_mut(&id) else {
            log::warn!("draw ignored: {:?} is not linked", id);
            return None;
        };

        if !program.pipelines.contains_key(&mode) {
            log::debug!("creating pipeline {:?} for {:?}", mode, id);
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let pipeline = self.create_pipeline(program, mode);
            let built = match pollster::block_on(self.device.pop_error_scope()) {
                Some(error) => {
                    log::error!("pipeline {:?} for {:?} rejected: {}", mode, id, error);
                    None
                }
                None => Some(pipeline),
            };
            program.pipelines.insert(mode, built);
        }

        let pipeline = program.pipelines.get(&mode).cloned().flatten()?;
        Some((pipeline, program.bind_group.clone()))
    }

    /// Draws `mesh` with the active program
    ///
    /// `wireframe` falls back to filled polygons when the device lacks line mode.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mesh: &GpuMesh, wireframe: bool) {
        let Some(id) = self.active.get() else {
            log::warn!("draw ignored: no active shader program");
            return;
        };
        let mode = DrawMode {
            topology: mesh.topology(),
            wireframe: wireframe && self.wireframe_supported,
        };
        let Some((pipeline, bind_group)) = self.pipeline(id, mode) else {
            return;
        };

        pass.set_pipeline(&pipeline);
        if let Some(bind_group) = &bind_group {
            pass.set_bind_group(0, bind_group, &[]);
        }
        pass.set_vertex_buffer(0, mesh.buffer().slice(..));
        pass.draw(0..mesh.vertex_count(), 0..1);
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_stage(&self, stage: ShaderStage) -> Option<StageId> {
        let id = StageId(self.next_id());
        self.stages.borrow_mut().insert(
            id,
            StageSlot {
                stage,
                compiled: None,
            },
        );
        Some(id)
    }

    fn compile_stage(&self, id: StageId, source: &str) -> Result<(), String> {
        let mut stages = self.stages.borrow_mut();
        let slot = stages
            .get_mut(&id)
            .ok_or_else(|| format!("{id:?} is not a stage object"))?;
        slot.compiled = Some(wgsl::compile(slot.stage, source)?);
        Ok(())
    }

    fn delete_stage(&self, id: StageId) {
        if self.stages.borrow_mut().remove(&id).is_none() {
            log::warn!("delete of unknown {:?}", id);
        }
    }

    fn create_program(&self) -> Option<ProgramId> {
        let id = ProgramId(self.next_id());
        self.programs.borrow_mut().insert(id, ProgramSlot::Created);
        Some(id)
    }

    fn link_program(
        &self,
        program: ProgramId,
        vertex: StageId,
        fragment: StageId,
    ) -> Result<(), String> {
        if !self.programs.borrow().contains_key(&program) {
            return Err(format!("{program:?} is not a program object"));
        }

        let linked = {
            let stages = self.stages.borrow();
            let vertex = compiled_stage(&stages, vertex, ShaderStage::Vertex)?;
            let fragment = compiled_stage(&stages, fragment, ShaderStage::Fragment)?;

            wgsl::check_interface(vertex, fragment)?;
            let uniforms = wgsl::reflect_uniforms(vertex, fragment)?;
            self.build_program(vertex, fragment, uniforms)?
        };

        self.programs
            .borrow_mut()
            .insert(program, ProgramSlot::Linked(linked));
        Ok(())
    }

    fn delete_program(&self, program: ProgramId) {
        if self.programs.borrow_mut().remove(&program).is_none() {
            log::warn!("delete of unknown {:?}", program);
        }
        if self.active.get() == Some(program) {
            self.active.set(None);
        }
    }

    fn use_program(&self, program: ProgramId) {
        match self.programs.borrow().get(&program) {
            Some(ProgramSlot::Linked(_)) => self.active.set(Some(program)),
            _ => log::warn!("use of unlinked {:?} ignored", program),
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        match self.programs.borrow().get(&program) {
            Some(ProgramSlot::Linked(linked)) => linked
                .uniforms
                .iter()
                .position(|slot| slot.binding.name == name)
                .map(|index| UniformLocation(index as u32)),
            _ => None,
        }
    }

    fn set_uniform(
        &self,
        program: ProgramId,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), String> {
        let programs = self.programs.borrow();
        let Some(ProgramSlot::Linked(linked)) = programs.get(&program) else {
            return Err(format!("{program:?} is not linked"));
        };
        let slot = linked
            .uniforms
            .get(location.0 as usize)
            .ok_or_else(|| format!("{location:?} is out of range"))?;

        if slot.binding.kind != value.kind() {
            return Err(format!(
                "'{}' is declared as {:?}, cannot store {:?}",
                slot.binding.name,
                slot.binding.kind,
                value.kind()
            ));
        }

        self.queue.write_buffer(&slot.buffer, 0, value.as_bytes());
        Ok(())
    }
}
