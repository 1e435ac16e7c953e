use proptest::prelude::*;

use fontpick_core::properties::{
    FontProperties, FontSize, FontStretch, FontWeight, NamedStretch, NamedWeight, Slant, Variant,
};

fn family_name() -> impl Strategy<Value = String> {
    // Printable names including every character the pattern syntax escapes.
    "[A-Za-z0-9 :,=\\\\-]{0,12}[A-Za-z0-9]"
}

fn request() -> impl Strategy<Value = FontProperties> {
    (
        proptest::collection::vec(family_name(), 1..4),
        prop_oneof![Just(Slant::Normal), Just(Slant::Italic), Just(Slant::Oblique)],
        prop_oneof![Just(Variant::Normal), Just(Variant::SmallCaps)],
        prop_oneof![
            (0u16..=1000).prop_map(FontWeight::Numeric),
            proptest::sample::select(NamedWeight::ALL.to_vec()).prop_map(FontWeight::Named),
        ],
        prop_oneof![
            (0u16..=1000).prop_map(FontStretch::Numeric),
            proptest::sample::select(NamedStretch::ALL.to_vec()).prop_map(FontStretch::Named),
        ],
        (1u32..2000).prop_map(|tenths| f64::from(tenths) / 10.0 + 1.0),
    )
        .prop_map(|(families, slant, variant, weight, stretch, size)| {
            FontProperties::new()
                .with_family(families)
                .with_slant(slant)
                .with_variant(variant)
                .with_weight(weight)
                .expect("weight in range")
                .with_stretch(stretch)
                .expect("stretch in range")
                .with_size(FontSize::points(size).expect("size"))
        })
}

#[test]
fn parses_a_typical_pattern() {
    let props: FontProperties = "Inter,sans-serif-11:semibold:oblique".parse().expect("parse");
    assert_eq!(props.family(), ["Inter", "sans-serif"]);
    assert_eq!(props.size_in_points(), 11.0);
    assert_eq!(props.weight(), FontWeight::Named(NamedWeight::Semibold));
    assert_eq!(props.slant(), Slant::Oblique);
}

proptest! {
    #[test]
    fn pattern_round_trip_preserves_the_request(props in request()) {
        let text = props.to_pattern();
        let parsed = FontProperties::from_pattern(&text).expect("reparse");
        prop_assert_eq!(parsed, props);
    }
}
