use std::fmt;
use std::str::FromStr;

use palette::{Srgb, Srgba};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThematicError};

// ---------------------------------------------------------------------------
// Rgba
// ---------------------------------------------------------------------------

/// An 8-bit RGBA color, serialized as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(255, 255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Rgba { a, ..self }
    }

    /// Parse `#rrggbb`, `#rgb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(text: &str) -> Result<Self> {
        let hex = text.trim().trim_start_matches('#');
        let invalid = |reason: String| {
            ThematicError::Validation(format!("invalid color '{text}': {reason}"))
        };
        if !hex.is_ascii() {
            return Err(invalid("not a hex color".to_string()));
        }
        let (rgb, alpha) = match hex.len() {
            3 | 6 => (hex, 255),
            8 => {
                let alpha = u8::from_str_radix(&hex[6..], 16).map_err(|e| invalid(e.to_string()))?;
                (&hex[..6], alpha)
            }
            n => return Err(invalid(format!("expected 3, 6 or 8 hex digits, got {n}"))),
        };
        let color = Srgb::<u8>::from_str(rgb).map_err(|e| invalid(e.to_string()))?;
        Ok(Rgba::new(color.red, color.green, color.blue, alpha))
    }

    /// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgba {
    type Err = ThematicError;

    fn from_str(s: &str) -> Result<Self> {
        Rgba::from_hex(s)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Rgba::new(r, g, b, a)
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

impl From<Srgba<u8>> for Rgba {
    fn from(c: Srgba<u8>) -> Self {
        Rgba::new(c.red, c.green, c.blue, c.alpha)
    }
}

impl From<Rgba> for Srgba<u8> {
    fn from(c: Rgba) -> Self {
        Srgba::new(c.r, c.g, c.b, c.a)
    }
}

// ---------------------------------------------------------------------------
// Ramp generation
// ---------------------------------------------------------------------------

/// `floor((a * (den - num) + b * num) / den)` in exact integer arithmetic.
///
/// The expression is symmetric in `(a, num)` / `(b, den - num)`, so swapping
/// the endpoints gives exactly the reversed sequence.
fn lerp_channel(a: u8, b: u8, num: u32, den: u32) -> u8 {
    ((a as u32 * (den - num) + b as u32 * num) / den) as u8
}

fn lerp(a: Rgba, b: Rgba, num: u32, den: u32) -> Rgba {
    Rgba::new(
        lerp_channel(a.r, b.r, num, den),
        lerp_channel(a.g, b.g, num, den),
        lerp_channel(a.b, b.b, num, den),
        lerp_channel(a.a, b.a, num, den),
    )
}

/// `k` colors linearly interpolated from `start` to `end`, alpha included.
///
/// Color `i` sits at `t = i / (k - 1)`; every channel is rounded down. The
/// first and last colors equal the endpoints exactly. `reversed` swaps the
/// endpoints before interpolating. `k == 1` yields the (swapped) start color.
pub fn generate(start: Rgba, end: Rgba, k: usize, reversed: bool) -> Vec<Rgba> {
    let (start, end) = if reversed { (end, start) } else { (start, end) };
    match k {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let den = (k - 1) as u32;
            (0..k as u32).map(|i| lerp(start, end, i, den)).collect()
        }
    }
}

/// `k` colors interpolated piecewise-linearly through evenly spaced `stops`.
///
/// Uses the same rounding rule as [`generate`]; with two stops both agree.
pub fn generate_multi(stops: &[Rgba], k: usize, reversed: bool) -> Result<Vec<Rgba>> {
    let Some((&first, rest)) = stops.split_first() else {
        return Err(ThematicError::Validation(
            "a color ramp needs at least one stop".to_string(),
        ));
    };
    Ok(interpolate(first, rest, k, reversed))
}

/// Piecewise interpolation through `first` followed by `rest`.
fn interpolate(first: Rgba, rest: &[Rgba], k: usize, reversed: bool) -> Vec<Rgba> {
    let mut stops = Vec::with_capacity(rest.len() + 1);
    stops.push(first);
    stops.extend_from_slice(rest);
    if reversed {
        stops.reverse();
    }
    let last = rest.len();
    if k == 0 {
        return Vec::new();
    }
    if k == 1 || last == 0 {
        return vec![stops[0]; k];
    }

    // Position of color i along the stops is i * last / (k - 1).
    let den = (k - 1) as u32;
    (0..k as u32)
        .map(|i| {
            let num = i * last as u32;
            let seg = (num / den) as usize;
            let rem = num % den;
            if seg >= last {
                stops[last]
            } else {
                lerp(stops[seg], stops[seg + 1], rem, den)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Named schemes
// ---------------------------------------------------------------------------

/// How a scheme turns into a ramp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Two-stop gradient between the scheme's first and last color.
    #[default]
    Endpoints,
    /// Piecewise gradient through every color of the scheme.
    Stops,
}

/// The eight built-in color schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Blue,
    Red,
    Green,
    Rainbow,
    Purple,
    Heat,
    Orange,
    /// Caller-chosen endpoints.
    Custom { start: Rgba, end: Rgba },
}

const BLUE: [Rgba; 9] = [
    Rgba::rgb(247, 251, 255),
    Rgba::rgb(222, 235, 247),
    Rgba::rgb(198, 219, 239),
    Rgba::rgb(158, 202, 225),
    Rgba::rgb(107, 174, 214),
    Rgba::rgb(66, 146, 198),
    Rgba::rgb(33, 113, 181),
    Rgba::rgb(8, 81, 156),
    Rgba::rgb(8, 48, 107),
];

const RED: [Rgba; 9] = [
    Rgba::rgb(255, 245, 240),
    Rgba::rgb(254, 224, 210),
    Rgba::rgb(252, 187, 161),
    Rgba::rgb(252, 146, 114),
    Rgba::rgb(251, 106, 74),
    Rgba::rgb(239, 59, 44),
    Rgba::rgb(203, 24, 29),
    Rgba::rgb(165, 15, 21),
    Rgba::rgb(103, 0, 13),
];

const GREEN: [Rgba; 9] = [
    Rgba::rgb(247, 252, 245),
    Rgba::rgb(229, 245, 224),
    Rgba::rgb(199, 233, 192),
    Rgba::rgb(161, 217, 155),
    Rgba::rgb(116, 196, 118),
    Rgba::rgb(65, 171, 93),
    Rgba::rgb(35, 139, 69),
    Rgba::rgb(0, 109, 44),
    Rgba::rgb(0, 68, 27),
];

const RAINBOW: [Rgba; 7] = [
    Rgba::rgb(158, 202, 225),
    Rgba::rgb(171, 221, 164),
    Rgba::rgb(255, 255, 191),
    Rgba::rgb(253, 174, 97),
    Rgba::rgb(244, 109, 67),
    Rgba::rgb(215, 48, 39),
    Rgba::rgb(165, 0, 38),
];

const PURPLE: [Rgba; 9] = [
    Rgba::rgb(252, 251, 253),
    Rgba::rgb(239, 237, 245),
    Rgba::rgb(218, 218, 235),
    Rgba::rgb(188, 189, 220),
    Rgba::rgb(158, 154, 200),
    Rgba::rgb(128, 125, 186),
    Rgba::rgb(106, 81, 163),
    Rgba::rgb(84, 39, 143),
    Rgba::rgb(63, 0, 125),
];

const HEAT: [Rgba; 9] = [
    Rgba::rgb(255, 255, 204),
    Rgba::rgb(255, 237, 160),
    Rgba::rgb(254, 217, 118),
    Rgba::rgb(254, 178, 76),
    Rgba::rgb(253, 141, 60),
    Rgba::rgb(252, 78, 42),
    Rgba::rgb(227, 26, 28),
    Rgba::rgb(189, 0, 38),
    Rgba::rgb(128, 0, 38),
];

const ORANGE: [Rgba; 9] = [
    Rgba::rgb(255, 245, 235),
    Rgba::rgb(254, 230, 206),
    Rgba::rgb(253, 208, 162),
    Rgba::rgb(253, 174, 107),
    Rgba::rgb(254, 143, 66),
    Rgba::rgb(253, 109, 30),
    Rgba::rgb(236, 82, 11),
    Rgba::rgb(204, 76, 2),
    Rgba::rgb(140, 45, 4),
];

/// Default endpoints of a custom scheme: light blue to dark blue.
pub const CUSTOM_START: Rgba = Rgba::rgb(173, 216, 230);
pub const CUSTOM_END: Rgba = Rgba::rgb(8, 81, 156);

impl ColorScheme {
    /// Names accepted by [`ColorScheme::from_name`], in display order.
    pub const NAMES: [&'static str; 8] = [
        "Blue", "Red", "Green", "Rainbow", "Purple", "Heat", "Orange", "Custom",
    ];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ColorScheme::Blue => "Blue",
            ColorScheme::Red => "Red",
            ColorScheme::Green => "Green",
            ColorScheme::Rainbow => "Rainbow",
            ColorScheme::Purple => "Purple",
            ColorScheme::Heat => "Heat",
            ColorScheme::Orange => "Orange",
            ColorScheme::Custom { .. } => "Custom",
        }
    }

    /// Look a scheme up by (case-insensitive) name; `Custom` gets the default endpoints.
    pub fn from_name(name: &str) -> Result<Self> {
        let scheme = match name.trim().to_ascii_lowercase().as_str() {
            "blue" => ColorScheme::Blue,
            "red" => ColorScheme::Red,
            "green" => ColorScheme::Green,
            "rainbow" => ColorScheme::Rainbow,
            "purple" => ColorScheme::Purple,
            "heat" => ColorScheme::Heat,
            "orange" => ColorScheme::Orange,
            "custom" => ColorScheme::Custom {
                start: CUSTOM_START,
                end: CUSTOM_END,
            },
            other => {
                return Err(ThematicError::Validation(format!(
                    "unknown color scheme '{other}' (expected one of {})",
                    Self::NAMES.join(", ")
                )))
            }
        };
        Ok(scheme)
    }

    /// Every color of the scheme, light to dark.
    pub fn stops(&self) -> Vec<Rgba> {
        let (first, rest) = self.split_stops();
        std::iter::once(first).chain(rest.iter().copied()).collect()
    }

    /// First stop and the remaining ones.
    fn split_stops(&self) -> (Rgba, &[Rgba]) {
        macro_rules! split {
            ($stops:expr) => {{
                let [first, rest @ ..] = &$stops;
                (*first, rest.as_slice())
            }};
        }
        match self {
            ColorScheme::Blue => split!(BLUE),
            ColorScheme::Red => split!(RED),
            ColorScheme::Green => split!(GREEN),
            ColorScheme::Rainbow => split!(RAINBOW),
            ColorScheme::Purple => split!(PURPLE),
            ColorScheme::Heat => split!(HEAT),
            ColorScheme::Orange => split!(ORANGE),
            ColorScheme::Custom { start, end } => (*start, std::slice::from_ref(end)),
        }
    }

    /// The `(start, end)` pair fed to [`generate`].
    pub fn endpoints(&self) -> (Rgba, Rgba) {
        let (first, rest) = self.split_stops();
        (first, rest.last().copied().unwrap_or(first))
    }

    /// `k` colors for this scheme.
    pub fn ramp(&self, k: usize, reversed: bool, interpolation: Interpolation) -> Vec<Rgba> {
        match interpolation {
            Interpolation::Endpoints => {
                let (start, end) = self.endpoints();
                generate(start, end, k, reversed)
            }
            Interpolation::Stops => {
                let (first, rest) = self.split_stops();
                interpolate(first, rest, k, reversed)
            }
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorScheme::Custom { start, end } => write!(f, "Custom ({start} → {end})"),
            other => f.write_str(other.name()),
        }
    }
}
