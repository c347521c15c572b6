//! Integration tests for the bulk load cycle, the plugin bootstrap and the
//! precompiled layout.

mod common;

use std::sync::Arc;

use common::Fixture;
use hotload_cache::{ArtifactCache, HostHandle, UnitRecord};
use hotload_loader::reference::{DefinitionEvent, MarkerTransform, MemoryHost};
use hotload_loader::{DefineScope, TransformError, TransformPipeline};

/// A pipeline that compiles sources itself, so the loader skips its bulk compile.
struct SelfCompiling(Arc<MarkerTransform>);

impl TransformPipeline for SelfCompiling {
    fn enhance(&self, record: &mut UnitRecord) -> Result<Vec<u8>, TransformError> {
        self.0.enhance(record)
    }

    fn dependents_of(&self, modified: &[String], cache: &ArtifactCache) -> Vec<String> {
        self.0.dependents_of(modified, cache)
    }

    fn can_compile_sources(&self) -> bool {
        true
    }

    fn is_plugin(&self, compiled: &[u8]) -> bool {
        self.0.is_plugin(compiled)
    }

    fn activate_plugins(&self, plugins: &[HostHandle]) -> Result<(), TransformError> {
        self.0.activate_plugins(plugins)
    }
}

#[test]
fn load_all_defines_every_unit_sorted() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    fixture.write("app/models/Order.src", "pub total\n");
    fixture.write("app/Main.src", "pub run\n");
    let loader = fixture.loader();

    let handles = loader.load_all().unwrap();
    let names: Vec<&str> = handles.iter().map(|h| h.name()).collect();

    assert_eq!(names, vec!["app.Main", "app.models.Order", "app.models.User"]);
    assert_eq!(fixture.compiler.compiled_count(), 3);
    assert!(fixture.host.has_package("app"));
    assert!(fixture.host.has_package("app.models"));
}

#[test]
fn plugins_are_activated_before_other_units_transform() {
    let fixture = Fixture::new();
    fixture.write("app/plugins/Audit.src", "@plugin\npub run\n");
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    loader.load_all().unwrap();

    assert_eq!(fixture.transform.active_plugins(), vec!["app.plugins.Audit"]);
    let plugin = loader.cache().get("app.plugins.Audit").unwrap();
    assert_eq!(
        plugin.lock().transformed_bytes().unwrap(),
        b"@plugin\npub run\n"
    );
    let user = loader.cache().get("app.models.User").unwrap();
    assert_eq!(
        user.lock().transformed_bytes().unwrap(),
        b"pub name\n# app.plugins.Audit\n"
    );

    let units: Vec<String> = fixture
        .host
        .definitions()
        .into_iter()
        .filter_map(|event| match event {
            DefinitionEvent::Unit(name, _) => Some(name),
            DefinitionEvent::Package(_) => None,
        })
        .collect();
    assert_eq!(units, vec!["app.plugins.Audit", "app.models.User"]);
}

#[test]
fn bulk_compile_is_one_batch() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    fixture.write("app/models/Order.src", "pub total\n");
    let loader = fixture.loader();

    loader.load_all().unwrap();

    assert_eq!(fixture.compiler.compile_calls(), 1);
    assert_eq!(fixture.compiler.compiled_count(), 2);
}

#[test]
fn self_compiling_pipeline_still_activates_plugins_first() {
    let fixture = Fixture::new();
    fixture.write("app/plugins/Audit.src", "@plugin\npub run\n");
    fixture.write("app/models/User.src", "pub name\n");
    fixture.write("app/models/Bad.src", "error: nope\n");
    let loader = fixture.loader_with(Arc::new(SelfCompiling(fixture.transform.clone())));

    let handles = loader.load_all().unwrap();

    assert_eq!(handles.len(), 2);
    assert_eq!(fixture.compiler.compile_calls(), 3);
    assert_eq!(loader.diagnostics().error_count(), 1);
    assert_eq!(fixture.transform.active_plugins(), vec!["app.plugins.Audit"]);
    let user = loader.cache().get("app.models.User").unwrap();
    assert_eq!(
        user.lock().transformed_bytes().unwrap(),
        b"pub name\n# app.plugins.Audit\n"
    );
}

#[test]
fn load_all_drops_units_that_fail_to_compile() {
    let fixture = Fixture::new();
    fixture.write("app/Good.src", "pub ok\n");
    fixture.write("app/Bad.src", "error: nope\n");
    let loader = fixture.loader();

    let handles = loader.load_all().unwrap();

    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].name(), "app.Good");
    assert!(!loader.cache().contains("app.Bad"));
    assert_eq!(loader.diagnostics().error_count(), 1);
}

#[test]
fn load_all_is_idempotent() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let first = loader.load_all().unwrap();
    let second = loader.load_all().unwrap();

    assert!(first[0].same_as(&second[0]));
    assert_eq!(fixture.compiler.compiled_count(), 1);
}

#[test]
fn precompile_then_load_precompiled() {
    let mut fixture = Fixture::new();
    fixture.write("app/models/User.src", "@Entity\npub name\n");
    fixture.precompile = true;
    fixture.loader().load_all().unwrap();
    let artifact = fixture.precompiled().path_for("app.models.User");
    assert!(artifact.is_file());

    fixture.precompile = false;
    fixture.use_precompiled = true;
    fixture.host = Arc::new(MemoryHost::new());
    std::fs::remove_dir_all(fixture.root()).unwrap();
    let loader = fixture.loader();

    let handles = loader.load_all().unwrap();

    assert_eq!(handles.len(), 1);
    assert!(handles[0].has_marker("Entity"));
    assert_eq!(
        fixture.host.definitions(),
        vec![
            DefinitionEvent::Package("app.models".into()),
            DefinitionEvent::Unit("app.models.User".into(), DefineScope::Precompiled),
        ]
    );
    assert!(loader.resolve_and_define("app.models.Missing").unwrap().is_none());
    assert!(loader.detect_changes().is_ok());
}

#[test]
fn content_cache_survives_a_new_loader() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    fixture.loader().load_all().unwrap();
    assert_eq!(fixture.compiler.compiled_count(), 1);

    let mut restarted = Fixture::new();
    restarted.content = fixture.content.clone();
    restarted.write("app/models/User.src", "pub name\n");
    restarted.loader().load_all().unwrap();

    assert_eq!(restarted.compiler.compiled_count(), 0);
    assert_eq!(restarted.transform.enhanced_count(), 0);
}
