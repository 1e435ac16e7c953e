//! Criterion benchmark for scoring a request against a large catalog (made by FontLab https://www.fontlab.com/)

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fontpick_core::catalog::{FontCatalog, FontEntry, FontKind};
use fontpick_core::extract::FaceInfo;
use fontpick_core::generic::GenericFamilies;
use fontpick_core::matcher::{DefaultFamilies, Matcher};
use fontpick_core::properties::{FontProperties, FontWeight, Slant};

fn synthetic_catalog(size: usize) -> FontCatalog {
    let styles = [Slant::Normal, Slant::Italic, Slant::Oblique];
    let outline = (0..size)
        .map(|i| {
            let face = FaceInfo {
                style: styles[i % styles.len()],
                weight: FontWeight::Numeric(((i % 9) as u16 + 1) * 100),
                ..FaceInfo::new(format!("Family {}", i / 12))
            };
            FontEntry::from_face(PathBuf::from(format!("/fonts/face-{i}.ttf")), face)
        })
        .collect();
    FontCatalog::from_parts(outline, Vec::new(), None, None)
}

fn bench_best_match(c: &mut Criterion) {
    let catalog = synthetic_catalog(5_000);
    let generics = GenericFamilies::default();
    let defaults = DefaultFamilies::default();
    let matcher = Matcher::new(&generics, &defaults);

    let miss = FontProperties::new().with_family(["Nowhere", "serif", "Family 400"]);
    c.bench_function("best_match 5k entries, late family", |b| {
        b.iter(|| {
            matcher.best_match(
                black_box(catalog.entries(FontKind::Outline)),
                black_box(&miss),
                None,
            )
        })
    });

    let pattern = "Family 10,sans-serif-12:bold:italic";
    c.bench_function("parse pattern", |b| {
        b.iter(|| FontProperties::from_pattern(black_box(pattern)).unwrap())
    });
}

criterion_group!(benches, bench_best_match);
criterion_main!(benches);
