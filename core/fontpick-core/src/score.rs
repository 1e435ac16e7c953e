//! Per-axis match scores (made by FontLab https://www.fontlab.com/)
//!
//! Every scorer returns 0.0 for a perfect match and grows as the match gets
//! worse; none of them ever goes negative.

use serde::Serialize;

use crate::catalog::{FaceSize, FontEntry};
use crate::generic::GenericFamilies;
use crate::properties::{FontProperties, FontStretch, FontWeight, Slant, Variant};

/// Family weighs as much as ten of the other axes together.
pub const FAMILY_WEIGHT: f64 = 10.0;

/// Score a candidate family name against a priority-ordered request list.
///
/// A direct hit at position `i` of `n` scores `i / n`. A hit through a generic
/// alias adds the candidate's relative position inside the alias list. No hit,
/// or an empty request, scores 1.0.
pub fn score_family(requested: &[String], candidate: &str, generics: &GenericFamilies) -> f64 {
    if requested.is_empty() {
        return 1.0;
    }
    let candidate = candidate.to_lowercase();
    let step = 1.0 / requested.len() as f64;

    for (i, family) in requested.iter().enumerate() {
        if let Some(options) = generics.resolve(family) {
            if let Some(idx) = options
                .iter()
                .position(|option| option.to_lowercase() == candidate)
            {
                return (i as f64 + idx as f64 / options.len() as f64) * step;
            }
        } else if family.to_lowercase() == candidate {
            return i as f64 * step;
        }
    }
    1.0
}

pub fn score_slant(a: Slant, b: Slant) -> f64 {
    if a == b {
        0.0
    } else if a.is_sloped() && b.is_sloped() {
        0.1
    } else {
        1.0
    }
}

pub fn score_variant(a: Variant, b: Variant) -> f64 {
    if a == b {
        0.0
    } else {
        1.0
    }
}

pub fn score_stretch(a: FontStretch, b: FontStretch) -> f64 {
    (a.value() as f64 - b.value() as f64).abs() / 1000.0
}

/// Identical keywords are a perfect match; anything else costs at least 0.05.
pub fn score_weight(a: FontWeight, b: FontWeight) -> f64 {
    if let (FontWeight::Named(x), FontWeight::Named(y)) = (a, b) {
        if x == y {
            return 0.0;
        }
    }
    0.95 * ((a.value() as f64 - b.value() as f64).abs() / 1000.0) + 0.05
}

/// Scalable faces fit every size; fixed sizes are compared on a 72pt scale.
pub fn score_size(requested_points: f64, candidate: &FaceSize) -> f64 {
    match candidate {
        FaceSize::Scalable => 0.0,
        FaceSize::Declared(raw) => match raw.trim().parse::<f64>() {
            Ok(points) => (requested_points - points).abs() / 72.0,
            Err(_) => 1.0,
        },
    }
}

/// The six axis scores of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub family: f64,
    pub slant: f64,
    pub variant: f64,
    pub weight: f64,
    pub stretch: f64,
    pub size: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.family * FAMILY_WEIGHT + self.slant + self.variant + self.weight + self.stretch + self.size
    }
}

pub fn score_entry(
    props: &FontProperties,
    entry: &FontEntry,
    generics: &GenericFamilies,
) -> ScoreBreakdown {
    ScoreBreakdown {
        family: score_family(props.family(), &entry.name, generics),
        slant: score_slant(props.slant(), entry.style),
        variant: score_variant(props.variant(), entry.variant),
        weight: score_weight(props.weight(), entry.weight),
        stretch: score_stretch(props.stretch(), entry.stretch),
        size: score_size(props.size_in_points(), &entry.size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{NamedStretch, NamedWeight};

    fn families(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn family_direct_match_is_weighted_by_position() {
        let generics = GenericFamilies::default();
        let requested = families(&["Foo", "Bar", "Baz", "Qux"]);
        assert_eq!(score_family(&requested, "foo", &generics), 0.0);
        assert_eq!(score_family(&requested, "Baz", &generics), 0.5);
        assert_eq!(score_family(&requested, "Nope", &generics), 1.0);
        assert_eq!(score_family(&[], "Foo", &generics), 1.0);
    }

    #[test]
    fn family_alias_gives_partial_credit() {
        let generics = GenericFamilies::default();
        let requested = families(&["Missing", "serif"]);
        // "Utopia" is the 6th of 14 serif names.
        let expected = (1.0 + 5.0 / 14.0) / 2.0;
        assert!((score_family(&requested, "Utopia", &generics) - expected).abs() < 1e-12);
    }

    #[test]
    fn slant_cross_match_costs_a_tenth() {
        assert_eq!(score_slant(Slant::Italic, Slant::Italic), 0.0);
        assert_eq!(score_slant(Slant::Italic, Slant::Oblique), 0.1);
        assert_eq!(score_slant(Slant::Normal, Slant::Oblique), 1.0);
    }

    #[test]
    fn weight_keywords_match_exactly_only_when_identical() {
        let bold = FontWeight::Named(NamedWeight::Bold);
        assert_eq!(score_weight(bold, bold), 0.0);
        assert!((score_weight(bold, FontWeight::Numeric(700)) - 0.05).abs() < 1e-12);
        let normal = FontWeight::Named(NamedWeight::Normal);
        let regular = FontWeight::Named(NamedWeight::Regular);
        assert!((score_weight(normal, regular) - 0.05).abs() < 1e-12);
        assert!((score_weight(FontWeight::Numeric(100), FontWeight::Numeric(900)) - 0.81).abs() < 1e-12);
    }

    #[test]
    fn stretch_is_linear_in_distance() {
        let condensed = FontStretch::Named(NamedStretch::Condensed);
        assert_eq!(score_stretch(condensed, FontStretch::NORMAL), 0.2);
        assert_eq!(score_stretch(FontStretch::Numeric(500), FontStretch::NORMAL), 0.0);
    }

    #[test]
    fn size_handles_scalable_fixed_and_garbage() {
        assert_eq!(score_size(12.0, &FaceSize::Scalable), 0.0);
        assert_eq!(score_size(12.0, &FaceSize::Declared("48".into())), 0.5);
        assert_eq!(score_size(12.0, &FaceSize::Declared("huge".into())), 1.0);
    }
}
