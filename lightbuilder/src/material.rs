use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    diffuse: Vec3,
    emissive: Vec3,
    reflection: f32,
    refraction: f32,
    ior: f32,
}

impl Material {
    pub fn with_diffuse(mut self, diffuse: Vec3) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn with_emissive(mut self, emissive: Vec3) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_reflection(mut self, reflection: f32) -> Self {
        self.reflection = reflection.clamp(0.0, 1.0);
        self
    }

    pub fn with_refraction(mut self, refraction: f32) -> Self {
        self.refraction = refraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_ior(mut self, ior: f32) -> Self {
        self.ior = ior;
        self
    }

    pub fn diffuse(&self) -> Vec3 {
        self.diffuse
    }

    pub fn emissive(&self) -> Vec3 {
        self.emissive
    }

    pub fn reflection(&self) -> f32 {
        self.reflection
    }

    pub fn refraction(&self) -> f32 {
        self.refraction
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec3::ONE,
            emissive: Vec3::ZERO,
            reflection: 0.0,
            refraction: 0.0,
            ior: 2.8,
        }
    }
}
