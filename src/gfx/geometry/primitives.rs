//! # Primitive Shape Generation
//!
//! Sphere, torus and heightfield generators. Every generator validates its
//! parameters before touching any buffer and returns an exactly sized
//! [`VertexBuffer`].

use super::{GeometryError, Topology, VertexBuffer, FLOATS_PER_VERTEX};
use std::f32::consts::PI;

/// Radius of the generated sphere (unit diameter)
pub const SPHERE_RADIUS: f32 = 0.5;

/// Product of `factors` times the floats per vertex, or an error on overflow.
fn float_count(name: &'static str, factors: &[usize]) -> Result<usize, GeometryError> {
    factors
        .iter()
        .try_fold(FLOATS_PER_VERTEX, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| GeometryError::invalid(name, "vertex count overflows usize"))
}

fn require_positive(name: &'static str, value: u32) -> Result<usize, GeometryError> {
    if value == 0 {
        return Err(GeometryError::invalid(name, "must be at least 1"));
    }
    Ok(value as usize)
}

fn require_radius(name: &'static str, value: f32) -> Result<f32, GeometryError> {
    if !value.is_finite() || value < 0.0 {
        return Err(GeometryError::invalid(
            name,
            format!("must be finite and non-negative, got {value}"),
        ));
    }
    Ok(value)
}

#[inline]
fn sphere_point(theta: f32, phi: f32) -> [f32; 3] {
    [
        SPHERE_RADIUS * theta.sin() * phi.cos(),
        SPHERE_RADIUS * theta.cos(),
        SPHERE_RADIUS * theta.sin() * phi.sin(),
    ]
}

/// Generate a UV sphere of radius 0.5 as a non-indexed triangle list
///
/// # Arguments
/// * `latitude_segments` - Number of bands the polar angle `[0, π]` is split into
/// * `longitude_segments` - Number of bands the azimuth `[0, 2π]` is split into
///
/// Emits two triangles for each of the `(latitude_segments + 1) * (longitude_segments + 1)`
/// band intersections. Rows touching the poles contain zero-area triangles.
pub fn generate_sphere(
    latitude_segments: u32,
    longitude_segments: u32,
) -> Result<VertexBuffer, GeometryError> {
    let lat_segs = require_positive("latitude_segments", latitude_segments)?;
    let long_segs = require_positive("longitude_segments", longitude_segments)?;
    let len = float_count("sphere", &[lat_segs + 1, long_segs + 1, 6])?;

    let mut data = Vec::with_capacity(len);
    for i in 0..=lat_segs {
        let theta1 = i as f32 * PI / lat_segs as f32;
        let theta2 = (i + 1) as f32 * PI / lat_segs as f32;

        for j in 0..=long_segs {
            let phi1 = j as f32 * 2.0 * PI / long_segs as f32;
            let phi2 = (j + 1) as f32 * 2.0 * PI / long_segs as f32;

            let p1 = sphere_point(theta1, phi1);
            let p2 = sphere_point(theta2, phi1);
            let p3 = sphere_point(theta2, phi2);
            let p4 = sphere_point(theta1, phi2);

            for p in [p1, p2, p3, p1, p3, p4] {
                data.extend_from_slice(&p);
            }
        }
    }

    debug_assert_eq!(data.len(), len);
    Ok(VertexBuffer::new(data, Topology::TriangleList))
}

/// Generate a torus around the Z axis as a triangle strip
///
/// # Arguments
/// * `major_segments` - Number of bands around the ring (angle θ)
/// * `minor_segments` - Number of bands around the tube (angle φ), sampled `minor_segments + 1` times
/// * `major_radius` - Distance from the origin to the centre of the tube
/// * `minor_radius` - Radius of the tube
///
/// For every major band each minor sample emits the point at θ followed by the
/// point at the next θ, giving `major_segments * (minor_segments + 1) * 2` vertices.
pub fn generate_torus(
    major_segments: u32,
    minor_segments: u32,
    major_radius: f32,
    minor_radius: f32,
) -> Result<VertexBuffer, GeometryError> {
    let major_segs = require_positive("major_segments", major_segments)?;
    let minor_segs = require_positive("minor_segments", minor_segments)?;
    let big_r = require_radius("major_radius", major_radius)?;
    let small_r = require_radius("minor_radius", minor_radius)?;
    let len = float_count("torus", &[major_segs, minor_segs + 1, 2])?;

    let mut data = Vec::with_capacity(len);
    for i in 0..major_segs {
        let theta = i as f32 * 2.0 * PI / major_segs as f32;
        let next_theta = (i + 1) as f32 * 2.0 * PI / major_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_next, cos_next) = next_theta.sin_cos();

        for j in 0..=minor_segs {
            let phi = j as f32 * 2.0 * PI / minor_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let ring = big_r + small_r * cos_phi;
            let z = small_r * sin_phi;

            data.extend_from_slice(&[ring * cos_theta, ring * sin_theta, z]);
            data.extend_from_slice(&[ring * cos_next, ring * sin_next, z]);
        }
    }

    debug_assert_eq!(data.len(), len);
    Ok(VertexBuffer::new(data, Topology::TriangleStrip))
}

/// Height of the generated surface at `(x, y)`
#[inline]
pub fn heightfield_z(x: f32, y: f32) -> f32 {
    (x * y).abs().sqrt()
}

/// Number of floats [`generate_heightfield`] produces for `resolution_steps`
pub fn heightfield_float_count(resolution_steps: u32) -> Result<usize, GeometryError> {
    if resolution_steps < 2 {
        return Err(GeometryError::invalid(
            "resolution_steps",
            format!("must be at least 2, got {resolution_steps}"),
        ));
    }
    let quads_per_side = resolution_steps as usize - 1;
    float_count("heightfield", &[quads_per_side, quads_per_side, 6])
}

/// Write the heightfield into a caller-provided buffer
///
/// `resolution_steps` samples per axis span `[-1, 1]`, giving
/// `(resolution_steps - 1)²` quads of two triangles each. Fails with
/// [`GeometryError::Capacity`] before writing anything if `out` is too small.
///
/// Returns the number of floats written.
pub fn generate_heightfield_into(
    resolution_steps: u32,
    out: &mut [f32],
) -> Result<usize, GeometryError> {
    let required = heightfield_float_count(resolution_steps)?;
    if out.len() < required {
        return Err(GeometryError::Capacity {
            required,
            capacity: out.len(),
        });
    }

    let quads_per_side = resolution_steps as usize - 1;
    let step = 2.0 / quads_per_side as f32;
    let corner = |x: f32, y: f32| [x, y, heightfield_z(x, y)];

    let mut k = 0;
    for i in 0..quads_per_side {
        let x1 = -1.0 + i as f32 * step;
        let x2 = -1.0 + (i + 1) as f32 * step;
        for j in 0..quads_per_side {
            let y1 = -1.0 + j as f32 * step;
            let y2 = -1.0 + (j + 1) as f32 * step;

            let quad = [
                corner(x1, y1),
                corner(x2, y1),
                corner(x1, y2),
                corner(x2, y1),
                corner(x1, y2),
                corner(x2, y2),
            ];
            for v in quad {
                out[k..k + FLOATS_PER_VERTEX].copy_from_slice(&v);
                k += FLOATS_PER_VERTEX;
            }
        }
    }

    debug_assert_eq!(k, required);
    Ok(k)
}

/// Generate the heightfield `z = sqrt(|x * y|)` over `[-1, 1]²` as a triangle list
///
/// The returned buffer is sized exactly to `(resolution_steps - 1)² * 6` vertices.
pub fn generate_heightfield(resolution_steps: u32) -> Result<VertexBuffer, GeometryError> {
    let mut data = vec![0.0; heightfield_float_count(resolution_steps)?];
    generate_heightfield_into(resolution_steps, &mut data)?;
    Ok(VertexBuffer::new(data, Topology::TriangleList))
}
