//! Integration tests for resolving single units: package ordering,
//! idempotence, content-cache hits and compile failures.

mod common;

use std::sync::Arc;

use common::Fixture;
use hotload_cache::{ContentCache, UnitKind};
use hotload_loader::reference::{DefinitionEvent, MemoryContentCache};
use hotload_loader::DefineScope;

#[test]
fn unknown_name_is_not_an_application_unit() {
    let fixture = Fixture::new();
    let loader = fixture.loader();

    assert!(loader.resolve_and_define("app.models.Missing").unwrap().is_none());
    assert!(!loader.cache().contains("app.models.Missing"));
    assert!(loader.cache().is_empty());
}

#[test]
fn single_unit_defines_package_marker_and_unit() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let handle = loader.resolve_and_define("app.models.User").unwrap();
    assert_eq!(handle.unwrap().name(), "app.models.User");
    assert_eq!(loader.cache().names(), vec!["app.models", "app.models.User"]);
    let marker = loader.cache().get("app.models").unwrap();
    assert_eq!(marker.lock().kind(), UnitKind::PackageMarker);
    assert_eq!(marker.lock().container().unwrap().name(), "app.models");
}

#[test]
fn package_is_defined_before_its_units() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    fixture.write("app/models/Order.src", "pub total\n");
    let loader = fixture.loader();

    loader.resolve_and_define("app.models.User").unwrap();
    loader.resolve_and_define("app.models.Order").unwrap();

    assert_eq!(
        fixture.host.definitions(),
        vec![
            DefinitionEvent::Package("app.models".into()),
            DefinitionEvent::Unit("app.models.User".into(), DefineScope::Application),
            DefinitionEvent::Unit("app.models.Order".into(), DefineScope::Application),
        ]
    );
}

#[test]
fn root_package_units_have_no_marker() {
    let fixture = Fixture::new();
    fixture.write("Main.src", "pub run\n");
    let loader = fixture.loader();

    assert!(loader.resolve_and_define("Main").unwrap().is_some());
    assert_eq!(loader.cache().names(), vec!["Main"]);
}

#[test]
fn resolving_twice_compiles_and_transforms_once() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let first = loader.resolve_and_define("app.models.User").unwrap().unwrap();
    let generation = loader.generation();
    let second = loader.resolve_and_define("app.models.User").unwrap().unwrap();

    assert!(first.same_as(&second));
    assert_eq!(fixture.compiler.compiled_count(), 1);
    assert_eq!(fixture.transform.enhanced_count(), 1);
    assert_eq!(loader.generation(), generation);
}

#[test]
fn content_cache_hit_skips_compile_and_transform() {
    let mut fixture = Fixture::new();
    let content = Arc::new(MemoryContentCache::new());
    content
        .put(b"pub name\n@Cached\n", 42, "app.models.User", "pub name\n")
        .unwrap();
    fixture.content = content;
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let handle = loader.resolve_and_define("app.models.User").unwrap().unwrap();

    assert!(handle.has_marker("Cached"));
    assert_eq!(fixture.compiler.compiled_count(), 0);
    assert_eq!(fixture.transform.enhanced_count(), 0);
    let record = loader.cache().get("app.models.User").unwrap();
    assert_eq!(record.lock().signature_checksum(), 42);
    assert!(record.lock().is_compiled());
}

#[test]
fn transformed_units_populate_the_content_cache() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    loader.resolve_and_define("app.models.User").unwrap();

    let cached = fixture.content.get("app.models.User", "pub name\n").unwrap();
    assert_eq!(cached.bytes, b"pub name\n");
}

#[test]
fn compile_failure_drops_the_record() {
    let fixture = Fixture::new();
    fixture.write("app/models/Broken.src", "pub name\nerror: unknown type Strin\n");
    let loader = fixture.loader();
    let before = loader.generation();

    assert!(loader.resolve_and_define("app.models.Broken").unwrap().is_none());
    assert!(!loader.cache().contains("app.models.Broken"));
    assert_ne!(loader.generation(), before);

    let diagnostics = loader.diagnostics().take_all();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].unit, "app.models.Broken");
    assert_eq!(diagnostics[0].line, Some(2));
}

#[test]
fn nested_units_share_the_outer_source() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let nested = loader
        .resolve_and_define("app.models.User$Address")
        .unwrap()
        .unwrap();

    assert_eq!(nested.name(), "app.models.User$Address");
    assert!(fixture.host.has_package("app.models"));
}

#[test]
fn load_delegates_to_parent() {
    let mut fixture = Fixture::new();
    fixture.host = Arc::new(hotload_loader::reference::MemoryHost::new().with_parent_unit("std.String"));
    let loader = fixture.loader();

    let handle = loader.load("std.String").unwrap().unwrap();
    assert_eq!(handle.name(), "std.String");
    assert!(loader.cache().is_empty());
    assert!(loader.load("std.Missing").unwrap().is_none());
}

#[test]
fn generation_changes_on_every_definition() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    fixture.write("app/models/Order.src", "pub total\n");
    let loader = fixture.loader();

    let mut seen = vec![loader.generation()];
    loader.resolve_and_define("app.models.User").unwrap();
    seen.push(loader.generation());
    loader.resolve_and_define("app.models.Order").unwrap();
    seen.push(loader.generation());

    let mut unique = seen.clone();
    unique.dedup();
    assert_eq!(unique, seen);
}

#[test]
fn concurrent_resolutions_define_once() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let handles: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (0..50)
                        .map(|_| loader.resolve_and_define("app.models.User").unwrap().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect()
    });

    assert_eq!(handles.len(), 400);
    assert!(handles.iter().all(|handle| handle.same_as(&handles[0])));
    assert_eq!(fixture.compiler.compiled_count(), 1);
    assert_eq!(fixture.transform.enhanced_count(), 1);
    assert_eq!(fixture.host.defined_units(), vec!["app.models.User"]);
}
