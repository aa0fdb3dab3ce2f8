//! Base colors for structures and the colors they hand to their quantities.

use glam::Vec3;

const PALETTE: [Vec3; 8] = [
    Vec3::new(0.216, 0.494, 0.722),
    Vec3::new(0.894, 0.102, 0.110),
    Vec3::new(0.302, 0.686, 0.290),
    Vec3::new(0.596, 0.306, 0.639),
    Vec3::new(1.000, 0.498, 0.000),
    Vec3::new(0.651, 0.337, 0.157),
    Vec3::new(0.969, 0.506, 0.749),
    Vec3::new(0.200, 0.627, 0.620),
];

/// Minimum distance between a sub-color and its structure's base color.
const DISTINCT_THRESHOLD: f32 = 0.1;

/// Cycles through the palette, one color per registered structure.
#[derive(Debug, Default)]
pub struct StructureColorCycle {
    issued: usize,
}

impl StructureColorCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_color(&mut self) -> Vec3 {
        let color = PALETTE[self.issued % PALETTE.len()];
        self.issued += 1;
        color
    }
}

/// Hands out colors for a structure's quantities that stay distinguishable
/// from the structure's own base color.
#[derive(Debug, Clone)]
pub struct SubColorManager {
    base: Vec3,
    issued: usize,
}

impl SubColorManager {
    pub fn new(base: Vec3) -> Self {
        Self { base, issued: 0 }
    }

    pub fn base(&self) -> Vec3 {
        self.base
    }

    pub fn next_sub_color(&mut self) -> Vec3 {
        for _ in 0..PALETTE.len() {
            let candidate = PALETTE[self.issued % PALETTE.len()];
            self.issued += 1;
            if candidate.distance(self.base) > DISTINCT_THRESHOLD {
                return candidate;
            }
        }
        Vec3::ONE - self.base
    }
}
