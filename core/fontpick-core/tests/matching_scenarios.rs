use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fontpick_core::catalog::FontKind;
use fontpick_core::config::ManagerConfig;
use fontpick_core::diagnostics::Diagnostic;
use fontpick_core::discovery::FontDiscovery;
use fontpick_core::error::{ExtractError, FontError};
use fontpick_core::extract::{FaceInfo, FontExtractor};
use fontpick_core::generic::GenericFamily;
use fontpick_core::manager::FontManager;
use fontpick_core::matcher::FindOptions;
use fontpick_core::properties::{FontProperties, FontWeight, NamedWeight};
use tempfile::{tempdir, TempDir};

/// Describes fonts by file name so tests need no real font data.
#[derive(Clone, Default)]
struct TableExtractor {
    faces: Arc<HashMap<String, FaceInfo>>,
    calls: Arc<AtomicUsize>,
}

impl FontExtractor for TableExtractor {
    fn extract(&self, path: &Path, _kind: FontKind) -> Result<FaceInfo, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.faces
            .get(name)
            .cloned()
            .ok_or_else(|| ExtractError::Unsupported(format!("unknown fixture {name}")))
    }
}

struct Fixture {
    dir: TempDir,
    extractor: TableExtractor,
}

impl Fixture {
    fn new(faces: &[(&str, FaceInfo)]) -> Self {
        let dir = tempdir().expect("tempdir");
        let mut table = HashMap::new();
        for (file, face) in faces {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(&path, b"").expect("touch font");
            let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
            table.insert(name.to_string(), face.clone());
        }
        Self {
            dir,
            extractor: TableExtractor {
                faces: Arc::new(table),
                calls: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir
            .path()
            .join(file)
            .canonicalize()
            .expect("canonical fixture path")
    }

    fn manager(&self) -> FontManager {
        let config = ManagerConfig {
            font_paths: vec![self.dir.path().to_path_buf()],
            include_system_fonts: false,
            use_fontconfig: false,
            ..ManagerConfig::default()
        };
        FontManager::builder(config)
            .extractor(self.extractor.clone())
            .without_snapshot()
            .build()
    }
}

fn weighted(family: &str, weight: u16) -> FaceInfo {
    FaceInfo {
        weight: FontWeight::Numeric(weight),
        ..FaceInfo::new(family)
    }
}

#[test]
fn unknown_family_falls_back_to_default_family() {
    let fx = Fixture::new(&[("DejaVuSans.ttf", FaceInfo::new("DejaVu Sans"))]);
    let manager = fx.manager();

    let props = FontProperties::new().with_family(["nonexistent-font", "serif"]);
    let path = manager
        .find_font(&props, &FindOptions::default())
        .expect("find");

    assert_eq!(path, fx.path("DejaVuSans.ttf"));
    let diags = manager.take_diagnostics();
    assert!(diags.iter().any(|d| matches!(
        d,
        Diagnostic::FamilyFallback { fallback, .. } if fallback == "DejaVu Sans"
    )));
}

#[test]
fn closest_weight_wins() {
    let fx = Fixture::new(&[
        ("Foo-Regular.ttf", weighted("Foo", 400)),
        ("Foo-Heavy.ttf", weighted("Foo", 800)),
    ]);
    let manager = fx.manager();

    let props = FontProperties::new()
        .with_family(["Foo"])
        .with_weight(FontWeight::Numeric(700))
        .expect("weight");
    let path = manager
        .find_font(&props, &FindOptions::default())
        .expect("find");

    assert_eq!(path, fx.path("Foo-Heavy.ttf"));
}

#[test]
fn explicit_file_is_returned_unchanged() {
    let fx = Fixture::new(&[("Foo.ttf", FaceInfo::new("Foo"))]);
    let manager = fx.manager();
    let pinned = fx.dir.path().join("Foo.ttf");

    let props = FontProperties::new()
        .with_family(["Anything"])
        .with_file(Some(pinned.clone()));
    let path = manager
        .find_font(&props, &FindOptions::default())
        .expect("find");

    assert_eq!(path, pinned);
    assert!(manager.take_diagnostics().is_empty());
}

#[test]
fn deleted_font_triggers_one_rebuild_then_not_found() {
    let fx = Fixture::new(&[("Only.ttf", FaceInfo::new("Only"))]);
    let manager = fx.manager();
    let props = FontProperties::new().with_family(["Only"]);

    fs::remove_file(fx.path("Only.ttf")).expect("remove");
    let err = manager
        .find_font(&props, &FindOptions::default())
        .unwrap_err();

    assert!(matches!(err, FontError::NotFound { .. }));
    assert_eq!(manager.rebuild_count(), 1);
    assert!(manager
        .take_diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::MissingFontRebuild { .. })));
}

#[test]
fn deleted_font_with_replacement_after_rebuild() {
    let fx = Fixture::new(&[
        ("A.ttf", FaceInfo::new("Foo")),
        ("B.ttf", FaceInfo::new("Foo")),
    ]);
    let manager = fx.manager();
    let props = FontProperties::new().with_family(["Foo"]);

    let first = manager
        .find_font(&props, &FindOptions::default())
        .expect("find");
    assert_eq!(first, fx.path("A.ttf"));

    fs::remove_file(&first).expect("remove");
    let second = manager
        .find_font(&props, &FindOptions::default())
        .expect("find after rebuild");
    assert_eq!(second, fx.path("B.ttf"));
    assert_eq!(manager.rebuild_count(), 1);
}

#[test]
fn missing_file_without_rebuild_is_not_found() {
    let fx = Fixture::new(&[("Only.ttf", FaceInfo::new("Only"))]);
    let manager = fx.manager();
    fs::remove_file(fx.path("Only.ttf")).expect("remove");

    let props = FontProperties::new().with_family(["Only"]);
    let err = manager
        .find_font(&props, &FindOptions::default().rebuild_if_missing(false))
        .unwrap_err();

    assert!(matches!(err, FontError::NotFound { .. }));
    assert_eq!(manager.rebuild_count(), 0);
}

#[test]
fn ties_keep_catalog_order() {
    let fx = Fixture::new(&[
        ("A-First.ttf", FaceInfo::new("Twin")),
        ("B-Second.ttf", FaceInfo::new("Twin")),
    ]);
    let manager = fx.manager();

    let props = FontProperties::new()
        .with_family(["Twin"])
        .with_weight(FontWeight::Numeric(650))
        .expect("weight");
    let path = manager
        .find_font(&props, &FindOptions::default())
        .expect("find");

    assert_eq!(path, fx.path("A-First.ttf"));
}

#[test]
fn repeated_lookups_are_memoized() {
    let fx = Fixture::new(&[("Foo.ttf", FaceInfo::new("Foo"))]);
    let manager = fx.manager();
    let props = FontProperties::new().with_family(["Foo"]);
    let opts = FindOptions::default();

    let first = manager.find_font(&props, &opts).expect("find");
    let second = manager.find_font(&props, &opts).expect("find again");
    assert_eq!(first, second);

    let from_pattern = manager.find_font_pattern("Foo", &opts).expect("pattern");
    assert_eq!(from_pattern, first);
}

#[test]
fn generic_table_change_invalidates_memoized_answers() {
    let fx = Fixture::new(&[
        ("Alpha.ttf", FaceInfo::new("Alpha")),
        ("Beta.ttf", FaceInfo::new("Beta")),
    ]);
    let manager = fx.manager();
    let props = FontProperties::new().with_family(["serif"]);
    let opts = FindOptions::default().fallback_to_default(false);

    manager.set_generic_family(GenericFamily::Serif, vec!["Alpha".into()]);
    assert_eq!(manager.find_font(&props, &opts).expect("find"), fx.path("Alpha.ttf"));

    manager.set_generic_family(GenericFamily::Serif, vec!["Beta".into()]);
    assert_eq!(manager.find_font(&props, &opts).expect("find"), fx.path("Beta.ttf"));
}

#[test]
fn directory_scope_excludes_outside_fonts() {
    let bold = FaceInfo {
        weight: FontWeight::Named(NamedWeight::Bold),
        ..FaceInfo::new("Foo")
    };
    let fx = Fixture::new(&[
        ("Foo.ttf", FaceInfo::new("Foo")),
        ("nested/Foo-Bold.ttf", bold),
    ]);
    let manager = fx.manager();
    let props = FontProperties::new().with_family(["Foo"]);

    let unscoped = manager
        .find_font(&props, &FindOptions::default())
        .expect("find");
    assert_eq!(unscoped, fx.path("Foo.ttf"));

    let scoped = manager
        .find_font(&props, &FindOptions::default().within(fx.dir.path().join("nested")))
        .expect("find");
    assert_eq!(scoped, fx.path("nested/Foo-Bold.ttf"));
}

#[test]
fn duplicate_file_names_are_extracted_once() {
    let fx = Fixture::new(&[("Dup.ttf", FaceInfo::new("Dup"))]);
    let other = fx.dir.path().join("copy");
    fs::create_dir_all(&other).expect("mkdir");
    fs::write(other.join("Dup.ttf"), b"").expect("touch");

    let manager = fx.manager();
    let catalog = manager.catalog();
    assert_eq!(catalog.entries(FontKind::Outline).len(), 1);
    assert_eq!(fx.extractor.calls.load(Ordering::SeqCst), 1);
}

/// Hands out a fixed candidate list exactly as given.
struct ListedDiscovery(Vec<PathBuf>);

impl FontDiscovery for ListedDiscovery {
    fn discover(&self, kind: FontKind) -> anyhow::Result<Vec<PathBuf>> {
        Ok(match kind {
            FontKind::Outline => self.0.clone(),
            FontKind::Metric => Vec::new(),
        })
    }
}

#[cfg(unix)]
#[test]
fn directory_scope_through_a_symlink() {
    use std::os::unix::fs::symlink;

    let fx = Fixture::new(&[
        ("other/DejaVuSans.ttf", FaceInfo::new("DejaVu Sans")),
        ("real/Foo.ttf", FaceInfo::new("Foo")),
    ]);
    let link = fx.dir.path().join("link");
    symlink(fx.dir.path().join("real"), &link).expect("symlink");

    let config = ManagerConfig {
        include_system_fonts: false,
        use_fontconfig: false,
        ..ManagerConfig::default()
    };
    let manager = FontManager::builder(config)
        .discovery(ListedDiscovery(vec![
            fx.dir.path().join("other/DejaVuSans.ttf"),
            link.join("Foo.ttf"),
        ]))
        .extractor(fx.extractor.clone())
        .without_snapshot()
        .build();

    let props = FontProperties::new().with_family(["Foo"]);
    let path = manager
        .find_font(&props, &FindOptions::default().within(&link))
        .expect("find");
    assert_eq!(path, fx.path("real/Foo.ttf"));
    assert!(manager.take_diagnostics().is_empty());

    let via_real = manager
        .find_font(&props, &FindOptions::default().within(fx.dir.path().join("real")))
        .expect("find");
    assert_eq!(via_real, path);
}
