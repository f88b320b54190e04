//! Closed literal sets accepted by the generation endpoint.
//!
//! Each category is an exhaustively matched enum. String-valued categories
//! serialize to the literal the service expects and parse back from the same
//! literal (case-insensitive).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! literal_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $literal:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Literal value sent on the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $literal ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lowered)
                    .ok_or_else(|| format!(concat!("unknown ", stringify!($name), ": {}"), s))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

literal_enum! {
    /// Diffusion model.
    Model {
        /// Anime V3
        V3 => "nai-diffusion-3",
        /// Anime V3 inpainting
        V3Inpainting => "nai-diffusion-3-inpainting",
        /// Furry model (beta)
        Furry => "nai-diffusion-furry",
        /// Furry model inpainting
        FurryInpainting => "furry-diffusion-inpainting",
    }
}

literal_enum! {
    /// Kind of generation to perform.
    Action {
        Generate => "generate",
        Inpaint => "infill",
        Img2Img => "img2img",
    }
}

literal_enum! {
    /// Sampling method.
    Sampler {
        Euler => "k_euler",
        EulerAncestral => "k_euler_ancestral",
        DpmPp2sAncestral => "k_dpmpp_2s_ancestral",
        DpmPp2m => "k_dpmpp_2m",
        DpmPpSde => "k_dpmpp_sde",
        Ddim => "ddim",
    }
}

literal_enum! {
    /// Noise schedule.
    NoiseSchedule {
        Native => "native",
        Karras => "karras",
        Exponential => "exponential",
        Polyexponential => "polyexponential",
    }
}

literal_enum! {
    /// ControlNet annotator model.
    Controlnet {
        /// Palette Swap
        PaletteSwap => "hed",
        /// Form Lock
        FormLock => "midas",
        Scribbler => "fake_scribble",
        BuildingControl => "mlsd",
        Landscaper => "uniformer",
    }
}

/// Named resolution preset, carrying its `(width, height)`.
///
/// Presets are never sent on the wire; they only fill in missing dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    SmallPortrait,
    SmallLandscape,
    SmallSquare,
    NormalPortrait,
    NormalLandscape,
    #[default]
    NormalSquare,
    LargePortrait,
    LargeLandscape,
    LargeSquare,
    WallpaperPortrait,
    WallpaperLandscape,
}

impl Resolution {
    pub const ALL: &'static [Resolution] = &[
        Resolution::SmallPortrait,
        Resolution::SmallLandscape,
        Resolution::SmallSquare,
        Resolution::NormalPortrait,
        Resolution::NormalLandscape,
        Resolution::NormalSquare,
        Resolution::LargePortrait,
        Resolution::LargeLandscape,
        Resolution::LargeSquare,
        Resolution::WallpaperPortrait,
        Resolution::WallpaperLandscape,
    ];

    /// `(width, height)` in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::SmallPortrait => (512, 768),
            Resolution::SmallLandscape => (768, 512),
            Resolution::SmallSquare => (640, 640),
            Resolution::NormalPortrait => (832, 1216),
            Resolution::NormalLandscape => (1216, 832),
            Resolution::NormalSquare => (1024, 1024),
            Resolution::LargePortrait => (1024, 1536),
            Resolution::LargeLandscape => (1536, 1024),
            Resolution::LargeSquare => (1472, 1472),
            Resolution::WallpaperPortrait => (1088, 1920),
            Resolution::WallpaperLandscape => (1920, 1088),
        }
    }

    /// Pixel area of the preset.
    pub fn area(self) -> u64 {
        let (w, h) = self.dimensions();
        u64::from(w) * u64::from(h)
    }

    /// Snake-case preset name, e.g. `normal_square`.
    pub fn name(self) -> &'static str {
        match self {
            Resolution::SmallPortrait => "small_portrait",
            Resolution::SmallLandscape => "small_landscape",
            Resolution::SmallSquare => "small_square",
            Resolution::NormalPortrait => "normal_portrait",
            Resolution::NormalLandscape => "normal_landscape",
            Resolution::NormalSquare => "normal_square",
            Resolution::LargePortrait => "large_portrait",
            Resolution::LargeLandscape => "large_landscape",
            Resolution::LargeSquare => "large_square",
            Resolution::WallpaperPortrait => "wallpaper_portrait",
            Resolution::WallpaperLandscape => "wallpaper_landscape",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} ({w}x{h})", self.name())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('-', "_");
        Resolution::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| format!("unknown resolution preset: {s}"))
    }
}

/// Undesired-content preset (`ucPreset`), serialized as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UcPreset {
    Heavy = 0,
    Light = 1,
    #[default]
    HumanFocus = 2,
    Disabled = 3,
}

impl UcPreset {
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for UcPreset {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UcPreset::Heavy),
            1 => Ok(UcPreset::Light),
            2 => Ok(UcPreset::HumanFocus),
            3 => Ok(UcPreset::Disabled),
            other => Err(other),
        }
    }
}

impl Serialize for UcPreset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for UcPreset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        UcPreset::try_from(raw).map_err(|v| serde::de::Error::custom(format!("ucPreset must be 0-3, got {v}")))
    }
}
