use serde::{Deserialize, Serialize};

/// Colormaps understood by the value shaders; the discriminant is the index
/// bound to `u_colormap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Colormap {
    #[default]
    Viridis = 0,
    Coolwarm = 1,
    Blues = 2,
    Reds = 3,
    Spectral = 4,
    Rainbow = 5,
}

impl Colormap {
    pub const ALL: [Colormap; 6] = [
        Colormap::Viridis,
        Colormap::Coolwarm,
        Colormap::Blues,
        Colormap::Reds,
        Colormap::Spectral,
        Colormap::Rainbow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Viridis => "viridis",
            Colormap::Coolwarm => "coolwarm",
            Colormap::Blues => "blues",
            Colormap::Reds => "reds",
            Colormap::Spectral => "spectral",
            Colormap::Rainbow => "rainbow",
        }
    }

    pub fn shader_index(self) -> i32 {
        self as i32
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|map| map.name() == name)
    }

    pub fn names() -> [&'static str; 6] {
        Self::ALL.map(Colormap::name)
    }

    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|map| *map == self)
            .unwrap_or_default()
    }
}
