//! The font manager: catalog lifecycle, lookup memo and diagnostics
//! (made by FontLab https://www.fontlab.com/)

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::catalog::{FontCatalog, FontKind};
use crate::config::ManagerConfig;
use crate::diagnostics::Diagnostic;
use crate::discovery::{resolve_path, FontDiscovery, PathDiscovery};
use crate::error::FontError;
use crate::extract::{FileExtractor, FontExtractor};
use crate::generic::{GenericFamilies, GenericFamily};
use crate::matcher::{CatalogProvider, FindOptions, Matcher};
use crate::pattern::parse_pattern;
use crate::properties::FontProperties;
use crate::snapshot::{CatalogSnapshot, JsonSnapshotStore, SnapshotStore, CATALOG_VERSION};

const MAX_DIAGNOSTICS: usize = 256;

/// Everything that decides the answer of one lookup.
///
/// The fingerprint of the generic family tables is part of the key, so a table
/// change makes older memo entries unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchCacheKey {
    request: FontProperties,
    kind: FontKind,
    directory: Option<PathBuf>,
    fallback: bool,
    rebuild: bool,
    fingerprint: u64,
}

impl MatchCacheKey {
    pub fn new(request: &FontProperties, opts: &FindOptions, fingerprint: u64) -> Self {
        Self {
            request: request.clone(),
            kind: opts.kind,
            directory: opts.directory.clone(),
            fallback: opts.fallback_to_default,
            rebuild: opts.rebuild_if_missing,
            fingerprint,
        }
    }
}

/// A memoized answer and the degraded-path notices raised while computing it.
#[derive(Debug, Clone)]
struct MemoEntry {
    path: PathBuf,
    notices: Vec<Diagnostic>,
}

/// Builder for [`FontManager`] with injectable discovery, extraction and storage.
pub struct FontManagerBuilder {
    config: ManagerConfig,
    discovery: Option<Box<dyn FontDiscovery>>,
    extractor: Option<Box<dyn FontExtractor>>,
    store: Option<Option<Box<dyn SnapshotStore>>>,
}

impl FontManagerBuilder {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            discovery: None,
            extractor: None,
            store: None,
        }
    }

    pub fn discovery(mut self, discovery: impl FontDiscovery + 'static) -> Self {
        self.discovery = Some(Box::new(discovery));
        self
    }

    pub fn extractor(mut self, extractor: impl FontExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn snapshot_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Some(Box::new(store)));
        self
    }

    /// Never read or write snapshots, whatever the config says.
    pub fn without_snapshot(mut self) -> Self {
        self.store = Some(None);
        self
    }

    /// Load the snapshot or build the catalog, then hand out the manager.
    pub fn build(self) -> FontManager {
        let config = self.config;
        let discovery = self.discovery.unwrap_or_else(|| {
            Box::new(
                PathDiscovery::new(config.font_roots())
                    .with_system_fonts(config.include_system_fonts)
                    .with_fontconfig(config.use_fontconfig)
                    .follow_symlinks(config.follow_symlinks),
            )
        });
        let extractor = self.extractor.unwrap_or_else(|| {
            Box::new(FileExtractor::new().with_max_file_size(config.max_font_file_size))
        });
        let store = self.store.unwrap_or_else(|| {
            config
                .cache_dir
                .clone()
                .map(|dir| Box::new(JsonSnapshotStore::new(dir)) as Box<dyn SnapshotStore>)
        });

        let base_dir = config.base_dir.as_deref().map(resolve_path);
        let manager = FontManager {
            base_dir,
            generics: RwLock::new(Arc::new(config.generic_families.clone())),
            config,
            discovery,
            extractor,
            store,
            catalog: RwLock::new(Arc::new(FontCatalog::default())),
            rebuild_gate: Mutex::new(()),
            lookups: RwLock::new(HashMap::new()),
            diagnostics: Mutex::new(Vec::new()),
            rebuilds: AtomicUsize::new(0),
        };
        manager.load_or_build();
        manager
    }
}

/// Owns one font catalog and answers lookups against it.
///
/// All methods take `&self`; share the manager across threads behind an `Arc`.
pub struct FontManager {
    config: ManagerConfig,
    /// `config.base_dir` resolved once, matching the resolved entry paths.
    base_dir: Option<PathBuf>,
    discovery: Box<dyn FontDiscovery>,
    extractor: Box<dyn FontExtractor>,
    store: Option<Box<dyn SnapshotStore>>,
    generics: RwLock<Arc<GenericFamilies>>,
    catalog: RwLock<Arc<FontCatalog>>,
    rebuild_gate: Mutex<()>,
    lookups: RwLock<HashMap<MatchCacheKey, MemoEntry>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
    rebuilds: AtomicUsize,
}

impl FontManager {
    pub fn new(config: ManagerConfig) -> Self {
        FontManagerBuilder::new(config).build()
    }

    pub fn builder(config: ManagerConfig) -> FontManagerBuilder {
        FontManagerBuilder::new(config)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// A request holding the configured default style.
    pub fn default_properties(&self) -> FontProperties {
        FontProperties::from_defaults(&self.config.style)
    }

    /// Path of the best font for `props`.
    ///
    /// Notices raised on the way are appended to the shared log drained by
    /// [`FontManager::take_diagnostics`].
    pub fn find_font(
        &self,
        props: &FontProperties,
        opts: &FindOptions,
    ) -> Result<PathBuf, FontError> {
        let (result, diagnostics) = self.find_font_with_diagnostics(props, opts);
        self.record(diagnostics);
        result
    }

    /// Like [`FontManager::find_font`], but hands this lookup's notices back
    /// instead of logging them in the shared list.
    ///
    /// A memo hit for an answer that needed a fallback repeats the fallback
    /// notices.
    pub fn find_font_with_diagnostics(
        &self,
        props: &FontProperties,
        opts: &FindOptions,
    ) -> (Result<PathBuf, FontError>, Vec<Diagnostic>) {
        let generics = self.generic_families();
        let key = MatchCacheKey::new(props, opts, generics.fingerprint());

        let mut diagnostics = Vec::new();
        if let Some(hit) = self.cached(&key) {
            tracing::debug!("lookup cache hit for {props}");
            for notice in hit.notices {
                notice.emit(&mut diagnostics);
            }
            return (Ok(hit.path), diagnostics);
        }

        let matcher = Matcher::new(&generics, &self.config.default_family);
        let result = matcher.find(self, props, opts, &mut diagnostics);
        if let Ok(path) = &result {
            let notices = diagnostics
                .iter()
                .filter(|d| d.is_fallback())
                .cloned()
                .collect();
            self.remember(
                key,
                MemoEntry {
                    path: path.clone(),
                    notices,
                },
            );
        }
        (result, diagnostics)
    }

    /// Parse `pattern` against the configured defaults, then look it up.
    pub fn find_font_pattern(&self, pattern: &str, opts: &FindOptions) -> Result<PathBuf, FontError> {
        let props = parse_pattern(pattern, &self.config.style)?;
        self.find_font(&props, opts)
    }

    /// Current catalog.
    pub fn catalog(&self) -> Arc<FontCatalog> {
        CatalogProvider::catalog(self)
    }

    /// Rebuild the catalog now and persist it.
    pub fn rebuild(&self) -> Arc<FontCatalog> {
        let current = self.catalog();
        CatalogProvider::rebuild(self, &current)
    }

    pub fn generic_families(&self) -> Arc<GenericFamilies> {
        self.generics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the list behind one generic alias. Memoized answers computed
    /// with the old list stop matching.
    pub fn set_generic_family(&self, family: GenericFamily, names: Vec<String>) {
        let mut guard = self.generics.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = GenericFamilies::clone(&guard);
        next.set(family, names);
        *guard = Arc::new(next);
    }

    /// Drain the notices recorded so far.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        let mut guard = self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }

    /// Rebuilds performed after construction.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    fn load_or_build(&self) {
        let mut diagnostics = Vec::new();
        let base = self.base_dir.as_deref();

        let catalog = match &self.store {
            Some(store) => match store.load(CATALOG_VERSION) {
                Ok(snapshot) => {
                    tracing::debug!("loaded catalog snapshot v{CATALOG_VERSION}");
                    snapshot.into_catalog(base)
                }
                Err(err) => {
                    Diagnostic::SnapshotRebuilt {
                        reason: err.to_string(),
                    }
                    .emit(&mut diagnostics);
                    let catalog = self.build_catalog();
                    self.persist(&catalog, &mut diagnostics);
                    catalog
                }
            },
            None => self.build_catalog(),
        };

        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        self.record(diagnostics);
    }

    fn build_catalog(&self) -> FontCatalog {
        let catalog = FontCatalog::build(
            self.discovery.as_ref(),
            self.extractor.as_ref(),
            &self.config.catalog_options(),
        );
        tracing::info!(
            "font catalog built: {} outline, {} metric, {} skipped",
            catalog.entries(FontKind::Outline).len(),
            catalog.entries(FontKind::Metric).len(),
            catalog.skipped().len()
        );
        catalog
    }

    fn persist(&self, catalog: &FontCatalog, diagnostics: &mut Vec<Diagnostic>) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = CatalogSnapshot::from_catalog(catalog, self.base_dir.as_deref());
        if let Err(err) = store.store(CATALOG_VERSION, &snapshot) {
            Diagnostic::SnapshotWriteFailed {
                reason: err.to_string(),
            }
            .emit(diagnostics);
        }
    }

    fn cached(&self, key: &MatchCacheKey) -> Option<MemoEntry> {
        let hit = self
            .lookups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()?;
        if key.request.file().is_some() || hit.path.is_file() {
            return Some(hit);
        }
        tracing::debug!("cached font {} vanished, looking up again", hit.path.display());
        self.lookups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        None
    }

    fn remember(&self, key: MatchCacheKey, entry: MemoEntry) {
        let capacity = self.config.lookup_cache_capacity.max(1);
        let mut lookups = self.lookups.write().unwrap_or_else(PoisonError::into_inner);
        if lookups.len() >= capacity {
            let fingerprint = key.fingerprint;
            lookups.retain(|k, _| k.fingerprint == fingerprint);
            if lookups.len() >= capacity {
                lookups.clear();
            }
        }
        lookups.insert(key, entry);
    }

    fn record(&self, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            return;
        }
        let mut guard = self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner);
        guard.extend(diagnostics);
        if guard.len() > MAX_DIAGNOSTICS {
            let excess = guard.len() - MAX_DIAGNOSTICS;
            guard.drain(..excess);
        }
    }
}

impl CatalogProvider for FontManager {
    fn catalog(&self) -> Arc<FontCatalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn rebuild(&self, stale: &Arc<FontCatalog>) -> Arc<FontCatalog> {
        let _gate = self.rebuild_gate.lock().unwrap_or_else(PoisonError::into_inner);

        let current = CatalogProvider::catalog(self);
        if !Arc::ptr_eq(&current, stale) {
            tracing::debug!("catalog already rebuilt by another caller");
            return current;
        }

        tracing::info!("rebuilding font catalog");
        let mut diagnostics = Vec::new();
        let catalog = Arc::new(self.build_catalog());
        self.persist(&catalog, &mut diagnostics);

        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&catalog);
        self.lookups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        self.record(diagnostics);
        catalog
    }
}
