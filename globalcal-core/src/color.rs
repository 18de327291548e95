//! Event color derivation.
//!
//! Every projected event carries three color values derived from its source:
//! a background hex, a legible text hex picked by WCAG contrast, and a legacy
//! palette index kept for consumers that only understand the 12-slot palette.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Background used when a source has no valid hex color.
pub const DEFAULT_BACKGROUND: &str = "#3A53BB";

/// Number of slots in the legacy palette.
pub const PALETTE_SIZE: i64 = 12;

const WHITE: &str = "#FFFFFF";
const BLACK: &str = "#000000";

/// A normalized `#RRGGBB` color (always uppercase, always with `#`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(input: &str) -> Option<Self> {
        normalize_hex(input)
    }

    pub fn default_background() -> Self {
        HexColor(DEFAULT_BACKGROUND.to_string())
    }

    pub fn white() -> Self {
        HexColor(WHITE.to_string())
    }

    pub fn black() -> Self {
        HexColor(BLACK.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let digits = &self.0[1..];
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize_hex(&value).ok_or_else(|| format!("invalid hex color '{}'", value))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

/// Normalize a hex color: optional leading `#`, exactly six hex digits.
/// Surrounding whitespace is ignored. Returns `None` for anything else.
pub fn normalize_hex(input: &str) -> Option<HexColor> {
    let s = input.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(HexColor(format!("#{}", s.to_ascii_uppercase())))
}

/// Strict validation used for source configuration (`^#?[0-9A-Fa-f]{6}$`).
pub fn is_valid_hex(input: &str) -> bool {
    let s = input.strip_prefix('#').unwrap_or(input);
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The source's color if it normalizes, else the default background.
pub fn effective_background(source_hex: Option<&str>) -> HexColor {
    source_hex
        .and_then(normalize_hex)
        .unwrap_or_else(HexColor::default_background)
}

/// Seed used when a source declares no palette index: the first owner's id
/// if there is one, else the sum of the character codes of the model name.
pub fn fallback_seed(first_owner: Option<i64>, model: &str) -> i64 {
    match first_owner {
        Some(owner) => owner,
        None => model.chars().map(|c| c as i64).sum(),
    }
}

/// Legacy palette index in `0..12`.
pub fn legacy_index(source_index: Option<i64>, fallback_seed: i64) -> u8 {
    let base = source_index.unwrap_or(fallback_seed);
    // rem_euclid keeps negative inputs in range
    base.rem_euclid(PALETTE_SIZE) as u8
}

fn srgb_to_linear(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance of a color.
pub fn relative_luminance(color: &HexColor) -> f64 {
    let (r, g, b) = color.rgb();
    0.2126 * srgb_to_linear(r) + 0.7152 * srgb_to_linear(g) + 0.0722 * srgb_to_linear(b)
}

/// WCAG contrast ratio, `lighter` being the luminance of the lighter color.
pub fn contrast_ratio(lighter: f64, darker: f64) -> f64 {
    (lighter + 0.05) / (darker + 0.05)
}

/// White or black, whichever contrasts more with `background`. Ties go to white.
pub fn text_color_for(background: &HexColor) -> HexColor {
    let luminance = relative_luminance(background);
    let against_white = contrast_ratio(1.0, luminance);
    let against_black = contrast_ratio(luminance.max(0.0), 0.0);

    if against_white >= against_black {
        HexColor::white()
    } else {
        HexColor::black()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_hex_accepts_with_and_without_hash() {
        assert_eq!(normalize_hex("#3a53bb").unwrap().as_str(), "#3A53BB");
        assert_eq!(normalize_hex("3a53bb").unwrap().as_str(), "#3A53BB");
        assert_eq!(normalize_hex("  #aBcDeF ").unwrap().as_str(), "#ABCDEF");
    }

    #[test]
    fn test_normalize_hex_rejects_malformed() {
        for input in ["", "#", "#12345", "#1234567", "##123456", "#12345G", "red", "#ééé"] {
            assert!(normalize_hex(input).is_none(), "{input:?} should be invalid");
        }
    }

    #[test]
    fn test_is_valid_hex_is_strict_about_whitespace() {
        assert!(is_valid_hex("#3a53bb"));
        assert!(is_valid_hex("3A53BB"));
        assert!(!is_valid_hex(" #3a53bb"));
        assert!(!is_valid_hex("#3a53b"));
    }

    #[test]
    fn test_effective_background_falls_back() {
        assert_eq!(effective_background(Some("#00ff00")).as_str(), "#00FF00");
        assert_eq!(effective_background(Some("nope")).as_str(), DEFAULT_BACKGROUND);
        assert_eq!(effective_background(None).as_str(), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_text_color_extremes() {
        assert_eq!(text_color_for(&HexColor::black()).as_str(), "#FFFFFF");
        assert_eq!(text_color_for(&HexColor::white()).as_str(), "#000000");
    }

    #[test]
    fn test_text_color_default_background_is_white_and_stable() {
        let bg = HexColor::default_background();
        let first = text_color_for(&bg);
        assert_eq!(first.as_str(), "#FFFFFF");
        for _ in 0..10 {
            assert_eq!(text_color_for(&bg), first);
        }
    }

    #[test]
    fn test_text_color_light_backgrounds_get_black() {
        for bg in ["#FFFF00", "#00FF00", "#F0F0F0", "#FFA500"] {
            let color = HexColor::parse(bg).unwrap();
            assert_eq!(text_color_for(&color).as_str(), "#000000", "{bg}");
        }
    }

    #[test]
    fn test_relative_luminance_bounds() {
        assert_eq!(relative_luminance(&HexColor::black()), 0.0);
        assert!((relative_luminance(&HexColor::white()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_index_uses_declared_index() {
        assert_eq!(legacy_index(Some(3), 999), 3);
        assert_eq!(legacy_index(Some(14), 999), 2);
        assert_eq!(legacy_index(Some(-1), 999), 11);
    }

    #[test]
    fn test_legacy_index_fallback_seed() {
        assert_eq!(fallback_seed(Some(7), "crm.lead"), 7);
        let sum: i64 = "crm.lead".chars().map(|c| c as i64).sum();
        assert_eq!(fallback_seed(None, "crm.lead"), sum);
        assert_eq!(legacy_index(None, sum), (sum % 12) as u8);
    }

    proptest! {
        #[test]
        fn test_normalize_hex_valid_inputs(digits in "[0-9a-fA-F]{6}", hash in any::<bool>()) {
            let input = if hash { format!("#{digits}") } else { digits.clone() };
            let normalized = normalize_hex(&input).unwrap();
            prop_assert_eq!(normalized.as_str(), format!("#{}", digits.to_ascii_uppercase()));
        }

        #[test]
        fn test_normalize_hex_invalid_inputs(input in "[^0-9a-fA-F#]{0,8}") {
            prop_assert!(normalize_hex(&input).is_none());
        }

        #[test]
        fn test_legacy_index_deterministic_and_in_range(index in proptest::option::of(any::<i64>()), seed in any::<i64>()) {
            let first = legacy_index(index, seed);
            prop_assert!(first < 12);
            prop_assert_eq!(first, legacy_index(index, seed));
        }
    }
}
