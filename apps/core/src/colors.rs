use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Palette {
    Uf,
    Area,
}

const UF_COLORS: [(&str, &str); 27] = [
    ("AC", "#2563eb"),
    ("AL", "#3b82f6"),
    ("AP", "#60a5fa"),
    ("AM", "#93c5fd"),
    ("BA", "#1e40af"),
    ("CE", "#1e3a8a"),
    ("DF", "#1d4ed8"),
    ("ES", "#2563eb"),
    ("GO", "#3b82f6"),
    ("MA", "#60a5fa"),
    ("MT", "#93c5fd"),
    ("MS", "#1e40af"),
    ("MG", "#1e3a8a"),
    ("PA", "#1d4ed8"),
    ("PB", "#2563eb"),
    ("PR", "#3b82f6"),
    ("PE", "#60a5fa"),
    ("PI", "#93c5fd"),
    ("RJ", "#1e40af"),
    ("RN", "#1e3a8a"),
    ("RS", "#1d4ed8"),
    ("RO", "#2563eb"),
    ("RR", "#3b82f6"),
    ("SC", "#60a5fa"),
    ("SP", "#1e40af"),
    ("SE", "#1e3a8a"),
    ("TO", "#1d4ed8"),
];

const UF_FALLBACK: [&str; 7] = [
    "#2563eb", "#3b82f6", "#60a5fa", "#93c5fd", "#1e40af", "#1e3a8a", "#1d4ed8",
];

const AREA_COLORS: [(&str, &str); 4] = [
    ("Operações", "#3182ce"),
    ("Cobranças", "#667eea"),
    ("Jurídico Interno", "#8b5cf6"),
    ("Não Informado", "#9ca3af"),
];

pub const POSITIVE: &str = "#48bb78";
pub const NEGATIVE: &str = "#f56565";
pub const NEUTRAL: &str = "#4299e1";
pub const WARNING: &str = "#ed8936";
pub const ABOVE_TARGET: &str = "#dc2626";
pub const BELOW_TARGET: &str = "#22c55e";
pub const SERIES_BLUE: &str = "#3182ce";
pub const SERIES_ORANGE: &str = "#ed8936";

/// `rgba(r, g, b, a)` color as Chart.js and Leaflet accept it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn from_hex(hex: &str, alpha: f64) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel =
            |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
            a: alpha.clamp(0.0, 1.0),
        })
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

fn stable_hash(key: &str) -> u64 {
    key.bytes()
        .fold(0_u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

/// Hex base color for `key`. Unknown keys land on a palette entry chosen by a
/// stable hash of the key.
pub fn base_hex(key: &str, palette: Palette) -> &'static str {
    match palette {
        Palette::Uf => {
            let upper = key.trim().to_uppercase();
            UF_COLORS
                .iter()
                .find(|(uf, _)| *uf == upper)
                .map_or_else(|| pick(&UF_FALLBACK, &upper), |(_, hex)| *hex)
        }
        Palette::Area => AREA_COLORS
            .iter()
            .find(|(area, _)| *area == key.trim())
            .map_or_else(
                || {
                    let hexes: Vec<&'static str> =
                        AREA_COLORS.iter().map(|(_, hex)| *hex).collect();
                    pick(&hexes, key.trim())
                },
                |(_, hex)| *hex,
            ),
    }
}

fn pick(hexes: &[&'static str], key: &str) -> &'static str {
    let len = hexes.len() as u64;
    let index = usize::try_from(stable_hash(key) % len).unwrap_or_default();
    hexes.get(index).copied().unwrap_or(SERIES_BLUE)
}

pub fn color_for(key: &str, palette: Palette, alpha: f64) -> Rgba {
    hex_to_rgba(base_hex(key, palette), alpha)
}

pub fn border_for(key: &str, palette: Palette) -> Rgba {
    color_for(key, palette, 1.0)
}

/// Registry hexes are well formed; anything else degrades to black.
pub fn hex_to_rgba(hex: &str, alpha: f64) -> Rgba {
    Rgba::from_hex(hex, alpha).unwrap_or(Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: alpha,
    })
}
