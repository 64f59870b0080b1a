use glam::{Vec2, Vec3};

/// Mesh resource shared between mesh renderers.
///
/// Only the first level of detail takes part in baking; the rest are kept so
/// that the same resource can be handed over from the editor as-is.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    lods: Vec<Lod>,
}

impl Mesh {
    pub fn new(lods: Vec<Lod>) -> Self {
        Self { lods }
    }

    pub fn with_lod(mut self, lod: Lod) -> Self {
        self.lods.push(lod);
        self
    }

    pub fn lods(&self) -> &[Lod] {
        &self.lods
    }

    pub fn lod0(&self) -> Option<&Lod> {
        self.lods.first()
    }
}

/// Single level of detail, in the mesh's local space.
///
/// `normals` and `uvs` are either empty or parallel to `vertices`.
#[derive(Clone, Debug, Default)]
pub struct Lod {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Lod {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Creates a unit quad lying on the XY plane, centered at the origin and
    /// facing +Z.
    pub fn quad() -> Self {
        Self::new(
            vec![
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, 0.5, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .with_normals(vec![Vec3::Z; 4])
        .with_uvs(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
