use glam::{Affine3A, Mat3A, Vec2, Vec3};
use lightbuilder_models::TRACER_EPSILON;

use crate::utils::metrics;
use crate::{
    Actor, Component, Error, Geometry, Lod, MeshRender, Result, Scene,
    Triangle,
};

/// Flattens a scene graph into world-space [`Geometry`].
#[derive(Default)]
pub struct GeometryCollector;

impl GeometryCollector {
    pub fn collect(scene: &Scene) -> Result<Geometry> {
        let (geometry, tt) = metrics::measure(|| {
            let mut geometry = Geometry::default();

            for actor in scene.actors() {
                Self::visit(&mut geometry, actor, Affine3A::IDENTITY)?;
            }

            Ok::<_, Error>(geometry)
        });

        let geometry = geometry?;

        log::info!(
            "Geometry collected; triangles = {}, vertices = {}, lights = {}, \
             tt = {}",
            geometry.triangles().len(),
            geometry.vertex_count(),
            geometry.lights().len(),
            metrics::display(tt),
        );

        Ok(geometry)
    }

    fn visit(
        geometry: &mut Geometry,
        actor: &Actor,
        parent: Affine3A,
    ) -> Result<()> {
        if !actor.enabled() {
            return Ok(());
        }

        let xform = parent * actor.transform();

        for component in actor.components() {
            match component {
                Component::MeshRender(render) => {
                    Self::add_mesh(geometry, actor.name(), render, xform)?;
                }

                Component::Light(light) => {
                    geometry.push_light(light.transformed(xform));
                }
            }
        }

        for child in actor.children() {
            Self::visit(geometry, child, xform)?;
        }

        Ok(())
    }

    fn add_mesh(
        geometry: &mut Geometry,
        actor: &str,
        render: &MeshRender,
        xform: Affine3A,
    ) -> Result<()> {
        if !render.enabled() {
            return Ok(());
        }

        let Some(lod) = render.mesh().and_then(|mesh| mesh.lod0()) else {
            return Ok(());
        };

        let used = lod.triangle_count() * 3;

        if used != lod.indices.len() {
            log::warn!(
                "Mesh of actor `{}` has {} dangling indices; ignoring them",
                actor,
                lod.indices.len() - used,
            );
        }

        if let Some(&index) = lod.indices[..used]
            .iter()
            .find(|&&index| index as usize >= lod.vertices.len())
        {
            return Err(Error::InvalidMesh {
                actor: actor.to_owned(),
                index,
                vertex_count: lod.vertices.len(),
            });
        }

        let base = geometry.vertex_count() as u32;
        let instance = geometry.push_instance(actor, *render.material());
        let normal_xform = normal_matrix(xform);

        let normals = if lod.normals.len() == lod.vertices.len() {
            lod.normals.clone()
        } else {
            smooth_normals(lod)
        };

        for (idx, vertex) in lod.vertices.iter().enumerate() {
            let uv = lod.uvs.get(idx).copied().unwrap_or(Vec2::ZERO);

            geometry.push_vertex(
                xform.transform_point3(*vertex),
                normal_xform.mul_vec3(normals[idx]).normalize_or_zero(),
                uv,
            );
        }

        for tri in lod.indices[..used].chunks_exact(3) {
            geometry.push_triangle(Triangle {
                indices: [base + tri[0], base + tri[1], base + tri[2]],
                instance,
            });
        }

        Ok(())
    }
}

/// Returns matrix transforming normals, i.e. the inverse-transpose of the
/// linear part; singular matrices are used as-is.
fn normal_matrix(xform: Affine3A) -> Mat3A {
    let matrix = xform.matrix3;

    if matrix.determinant().abs() <= TRACER_EPSILON {
        matrix
    } else {
        matrix.inverse().transpose()
    }
}

/// Computes area-weighted vertex normals for meshes that don't provide any.
fn smooth_normals(lod: &Lod) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; lod.vertices.len()];

    for tri in lod.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|idx| idx as usize);

        if a.max(b).max(c) >= lod.vertices.len() {
            continue;
        }

        let normal = (lod.vertices[b] - lod.vertices[a])
            .cross(lod.vertices[c] - lod.vertices[a]);

        normals[a] += normal;
        normals[b] += normal;
        normals[c] += normal;
    }

    normals
        .into_iter()
        .map(|normal| normal.normalize_or_zero())
        .collect()
}
