//! WGSL front end for [`WgpuBackend`](super::WgpuBackend)
//!
//! Compiling a stage parses and validates it with naga. Linking checks the
//! vertex → fragment interface and reflects the `var<uniform>` globals both
//! stages declare, which is what the named uniform setters resolve against.

use std::collections::BTreeMap;

use naga::{
    valid::{Capabilities, ValidationFlags, Validator},
    AddressSpace, Binding, Handle, Module, Scalar, ScalarKind, Type, TypeInner, VectorSize,
};

use crate::gfx::shader::{ShaderStage, UniformKind};

/// A stage that parsed, validated and has an entry point for its stage
#[derive(Debug)]
pub struct CompiledModule {
    pub stage: ShaderStage,
    pub source: String,
    pub module: Module,
    pub entry_index: usize,
}

impl CompiledModule {
    pub fn entry_point(&self) -> &str {
        &self.module.entry_points[self.entry_index].name
    }
}

/// One uniform binding of a linked program
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBinding {
    pub name: String,
    pub binding: u32,
    pub kind: UniformKind,
    /// Size in bytes of the declared type
    pub size: u64,
    pub in_vertex: bool,
    pub in_fragment: bool,
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    message
}

/// Parses and validates `source`, returning the compiler log on failure
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledModule, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| error_chain(e.as_inner()))?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == wanted)
        .ok_or_else(|| format!("no @{stage} entry point in {stage} shader"))?;

    Ok(CompiledModule {
        stage,
        source: source.to_owned(),
        module,
        entry_index,
    })
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut BTreeMap<u32, TypeInner>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn vertex_outputs(vertex: &CompiledModule) -> BTreeMap<u32, TypeInner> {
    let mut out = BTreeMap::new();
    let function = &vertex.module.entry_points[vertex.entry_index].function;
    if let Some(result) = &function.result {
        collect_locations(&vertex.module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn fragment_inputs(fragment: &CompiledModule) -> BTreeMap<u32, TypeInner> {
    let mut out = BTreeMap::new();
    let function = &fragment.module.entry_points[fragment.entry_index].function;
    for argument in &function.arguments {
        collect_locations(
            &fragment.module,
            argument.ty,
            argument.binding.as_ref(),
            &mut out,
        );
    }
    out
}

/// Every fragment input must be written by the vertex stage with the same type
pub fn check_interface(vertex: &CompiledModule, fragment: &CompiledModule) -> Result<(), String> {
    let outputs = vertex_outputs(vertex);
    for (location, input) in fragment_inputs(fragment) {
        match outputs.get(&location) {
            None => {
                return Err(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                ))
            }
            Some(output) if *output != input => {
                return Err(format!(
                    "@location({location}) is {output:?} in the vertex stage but {input:?} in the fragment stage"
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn uniform_kind(inner: &TypeInner) -> UniformKind {
    match inner {
        TypeInner::Scalar(Scalar {
            kind: ScalarKind::Sint | ScalarKind::Uint,
            width: 4,
        }) => UniformKind::Int,
        TypeInner::Scalar(Scalar {
            kind: ScalarKind::Float,
            width: 4,
        }) => UniformKind::Float,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar: Scalar {
                kind: ScalarKind::Float,
                width: 4,
            },
        } => UniformKind::Mat4,
        _ => UniformKind::Other,
    }
}

fn merge_uniforms(
    compiled: &CompiledModule,
    uniforms: &mut Vec<UniformBinding>,
) -> Result<(), String> {
    let module = &compiled.module;
    let stage = compiled.stage;

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        let name = var
            .name
            .clone()
            .unwrap_or_else(|| format!("<binding {}>", binding.binding));

        if var.space != AddressSpace::Uniform {
            return Err(format!(
                "'{name}' in the {stage} stage is not a var<uniform>; only uniform bindings are supported"
            ));
        }
        if binding.group != 0 {
            return Err(format!(
                "uniform '{name}' uses @group({}); only @group(0) is supported",
                binding.group
            ));
        }

        let inner = &module.types[var.ty].inner;
        let size = inner.size(module.to_ctx()) as u64;
        let kind = uniform_kind(inner);

        let existing = uniforms
            .iter()
            .position(|u| u.binding == binding.binding || u.name == name);
        let index = match existing {
            Some(i) => {
                let u = &uniforms[i];
                if u.binding != binding.binding || u.name != name || u.size != size {
                    return Err(format!(
                        "uniform '{name}' @binding({}) in the {stage} stage conflicts with '{}' @binding({})",
                        binding.binding, u.name, u.binding
                    ));
                }
                i
            }
            None => {
                uniforms.push(UniformBinding {
                    name,
                    binding: binding.binding,
                    kind,
                    size,
                    in_vertex: false,
                    in_fragment: false,
                });
                uniforms.len() - 1
            }
        };

        let slot = &mut uniforms[index];
        match stage {
            ShaderStage::Vertex => slot.in_vertex = true,
            ShaderStage::Fragment => slot.in_fragment = true,
        }
    }
    Ok(())
}

/// Collects the uniforms of both stages, ordered by binding
///
/// A uniform declared in both stages must use the same name, binding and type.
pub fn reflect_uniforms(
    vertex: &CompiledModule,
    fragment: &CompiledModule,
) -> Result<Vec<UniformBinding>, String> {
    let mut uniforms = Vec::new();
    merge_uniforms(vertex, &mut uniforms)?;
    merge_uniforms(fragment, &mut uniforms)?;
    uniforms.sort_by_key(|u| u.binding);
    Ok(uniforms)
}
