use std::fmt;

use palette::{Mix, Srgb};

/// An opaque 8-bit sRGB bar color.
pub type BarColor = Srgb<u8>;

// ---------------------------------------------------------------------------
// Style modes
// ---------------------------------------------------------------------------

/// How bars are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StyleMode {
    /// Every bar gets [`SINGLE_COLOR`].
    #[default]
    Single,
    /// Continuous viridis scale over the sample's value range.
    Graduated,
    /// Categorical tab20 palette by bar position.
    Unique,
}

impl StyleMode {
    pub const SINGLE_TOKEN: &'static str = "Single symbol";
    pub const GRADUATED_TOKEN: &'static str = "Graduated colors";
    pub const UNIQUE_TOKEN: &'static str = "Unique values";

    /// Map a display-option token to a mode. Unrecognised tokens fall back
    /// to [`StyleMode::Single`].
    pub fn from_token(token: &str) -> Self {
        match token {
            Self::GRADUATED_TOKEN => StyleMode::Graduated,
            Self::UNIQUE_TOKEN => StyleMode::Unique,
            _ => StyleMode::Single,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            StyleMode::Single => Self::SINGLE_TOKEN,
            StyleMode::Graduated => Self::GRADUATED_TOKEN,
            StyleMode::Unique => Self::UNIQUE_TOKEN,
        }
    }

    /// Progress line announced before drawing.
    pub fn narration(self) -> &'static str {
        match self {
            StyleMode::Single => "Applying Single symbol style to plot.",
            StyleMode::Graduated => "Applying Graduated colors style to plot.",
            StyleMode::Unique => "Applying Unique values style (Categorical colors) to plot.",
        }
    }
}

impl fmt::Display for StyleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ---------------------------------------------------------------------------
// Fixed colors and palettes
// ---------------------------------------------------------------------------

/// `#0077B6`, used by [`StyleMode::Single`].
pub const SINGLE_COLOR: BarColor = Srgb::new(0x00, 0x77, 0xB6);

/// Number of categorical colors; matches the sample cap so no two bars share one.
pub const CATEGORICAL_SIZE: usize = 20;

/// The tab20 categorical palette.
pub const TAB20: [BarColor; CATEGORICAL_SIZE] = [
    Srgb::new(0x1f, 0x77, 0xb4),
    Srgb::new(0xae, 0xc7, 0xe8),
    Srgb::new(0xff, 0x7f, 0x0e),
    Srgb::new(0xff, 0xbb, 0x78),
    Srgb::new(0x2c, 0xa0, 0x2c),
    Srgb::new(0x98, 0xdf, 0x8a),
    Srgb::new(0xd6, 0x27, 0x28),
    Srgb::new(0xff, 0x98, 0x96),
    Srgb::new(0x94, 0x67, 0xbd),
    Srgb::new(0xc5, 0xb0, 0xd5),
    Srgb::new(0x8c, 0x56, 0x4b),
    Srgb::new(0xc4, 0x9c, 0x94),
    Srgb::new(0xe3, 0x77, 0xc2),
    Srgb::new(0xf7, 0xb6, 0xd2),
    Srgb::new(0x7f, 0x7f, 0x7f),
    Srgb::new(0xc7, 0xc7, 0xc7),
    Srgb::new(0xbc, 0xbd, 0x22),
    Srgb::new(0xdb, 0xdb, 0x8d),
    Srgb::new(0x17, 0xbe, 0xcf),
    Srgb::new(0x9e, 0xda, 0xe5),
];

/// Viridis sampled at nine evenly spaced stops.
const VIRIDIS_STOPS: [BarColor; 9] = [
    Srgb::new(0x44, 0x01, 0x54),
    Srgb::new(0x47, 0x2c, 0x7a),
    Srgb::new(0x3b, 0x51, 0x8b),
    Srgb::new(0x2c, 0x71, 0x8e),
    Srgb::new(0x21, 0x90, 0x8d),
    Srgb::new(0x27, 0xad, 0x81),
    Srgb::new(0x5c, 0xc8, 0x63),
    Srgb::new(0xaa, 0xdc, 0x32),
    Srgb::new(0xfd, 0xe7, 0x25),
];

/// Color at position `t` of the viridis scale. `t` is clamped to `[0, 1]`.
pub fn viridis(t: f64) -> BarColor {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let segments = (VIRIDIS_STOPS.len() - 1) as f64;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(VIRIDIS_STOPS.len() - 2);
    let frac = (pos - idx as f64) as f32;

    let lo: Srgb<f32> = VIRIDIS_STOPS[idx].into_format();
    let hi: Srgb<f32> = VIRIDIS_STOPS[idx + 1].into_format();
    lo.mix(hi, frac).into_format()
}

/// Midpoint of the scale; every bar gets it when all values are equal.
pub fn viridis_midpoint() -> BarColor {
    viridis(0.5)
}

// ---------------------------------------------------------------------------
// Per-bar colors
// ---------------------------------------------------------------------------

/// One color per value, in order, under `mode`.
pub fn bar_colors(mode: StyleMode, values: &[f64]) -> Vec<BarColor> {
    match mode {
        StyleMode::Single => vec![SINGLE_COLOR; values.len()],
        StyleMode::Graduated => {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            // Halved so the span stays finite for values near f64::MAX.
            let half_range = max / 2.0 - min / 2.0;
            values
                .iter()
                .map(|&v| {
                    if half_range > 0.0 {
                        viridis((v / 2.0 - min / 2.0) / half_range)
                    } else {
                        viridis_midpoint()
                    }
                })
                .collect()
        }
        StyleMode::Unique => (0..values.len())
            .map(|i| TAB20[i % CATEGORICAL_SIZE])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SAMPLE_CAP;
    use std::collections::HashSet;

    #[test]
    fn tokens_map_to_modes() {
        assert_eq!(StyleMode::from_token("Single symbol"), StyleMode::Single);
        assert_eq!(StyleMode::from_token("Graduated colors"), StyleMode::Graduated);
        assert_eq!(StyleMode::from_token("Unique values"), StyleMode::Unique);
    }

    #[test]
    fn unknown_tokens_fall_back_to_single() {
        for token in ["", "graduated colors", "Heatmap", "Unique values "] {
            assert_eq!(StyleMode::from_token(token), StyleMode::Single, "{token:?}");
        }
    }

    #[test]
    fn token_round_trips_through_display() {
        for mode in [StyleMode::Single, StyleMode::Graduated, StyleMode::Unique] {
            assert_eq!(StyleMode::from_token(&mode.to_string()), mode);
        }
    }

    #[test]
    fn single_mode_uses_one_color() {
        let colors = bar_colors(StyleMode::Single, &[1.0, 50.0, -3.0]);
        assert_eq!(colors, vec![SINGLE_COLOR; 3]);
    }

    #[test]
    fn graduated_spans_the_scale() {
        let colors = bar_colors(StyleMode::Graduated, &[0.0, 5.0, 10.0]);
        assert_eq!(colors[0], VIRIDIS_STOPS[0]);
        assert_eq!(colors[1], viridis_midpoint());
        assert_eq!(colors[2], VIRIDIS_STOPS[8]);
    }

    #[test]
    fn graduated_survives_values_near_f64_max() {
        let colors = bar_colors(StyleMode::Graduated, &[-1e308, 0.0, 1e308]);
        assert_eq!(colors[0], VIRIDIS_STOPS[0]);
        assert_eq!(colors[1], viridis_midpoint());
        assert_eq!(colors[2], VIRIDIS_STOPS[8]);
    }

    #[test]
    fn graduated_with_equal_values_uses_midpoint() {
        let colors = bar_colors(StyleMode::Graduated, &[5.0, 5.0, 5.0]);
        assert_eq!(colors, vec![viridis_midpoint(); 3]);
        assert_eq!(viridis_midpoint(), Srgb::new(0x21, 0x90, 0x8d));
    }

    #[test]
    fn graduated_single_value_uses_midpoint() {
        assert_eq!(bar_colors(StyleMode::Graduated, &[42.0]), vec![viridis_midpoint()]);
    }

    #[test]
    fn unique_colors_are_distinct_up_to_cap() {
        let values: Vec<f64> = (0..SAMPLE_CAP).map(|i| i as f64).collect();
        let colors = bar_colors(StyleMode::Unique, &values);
        let distinct: HashSet<(u8, u8, u8)> =
            colors.iter().map(|c| (c.red, c.green, c.blue)).collect();
        assert_eq!(distinct.len(), SAMPLE_CAP);
    }

    #[test]
    fn unique_palette_wraps() {
        let values = vec![0.0; CATEGORICAL_SIZE + 2];
        let colors = bar_colors(StyleMode::Unique, &values);
        assert_eq!(colors[CATEGORICAL_SIZE], TAB20[0]);
        assert_eq!(colors[CATEGORICAL_SIZE + 1], TAB20[1]);
    }

    #[test]
    fn viridis_clamps_out_of_range() {
        assert_eq!(viridis(-1.0), VIRIDIS_STOPS[0]);
        assert_eq!(viridis(2.0), VIRIDIS_STOPS[8]);
    }

    #[test]
    fn empty_values_give_no_colors() {
        for mode in [StyleMode::Single, StyleMode::Graduated, StyleMode::Unique] {
            assert!(bar_colors(mode, &[]).is_empty());
        }
    }
}
