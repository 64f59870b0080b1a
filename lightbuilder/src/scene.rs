use std::sync::Arc;

use glam::Affine3A;

use crate::{Light, Material, Mesh};

/// Scene graph handed over by the editor.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    actors: Vec<Actor>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.push(actor);
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }
}

#[derive(Clone, Debug)]
pub struct Actor {
    name: String,
    enabled: bool,
    transform: Affine3A,
    components: Vec<Component>,
    children: Vec<Actor>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            transform: Affine3A::IDENTITY,
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the transform relative to the parent actor.
    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_component(mut self, component: impl Into<Component>) -> Self {
        self.components.push(component.into());
        self
    }

    pub fn with_child(mut self, child: Actor) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn transform(&self) -> Affine3A {
        self.transform
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn children(&self) -> &[Actor] {
        &self.children
    }
}

#[derive(Clone, Debug)]
pub enum Component {
    MeshRender(MeshRender),
    Light(Light),
}

impl From<MeshRender> for Component {
    fn from(value: MeshRender) -> Self {
        Self::MeshRender(value)
    }
}

impl From<Light> for Component {
    fn from(value: Light) -> Self {
        Self::Light(value)
    }
}

#[derive(Clone, Debug)]
pub struct MeshRender {
    enabled: bool,
    mesh: Option<Arc<Mesh>>,
    material: Material,
}

impl MeshRender {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            enabled: true,
            mesh: Some(mesh),
            material: Material::default(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}
