//! Integration tests for capability and marker queries, lookups and
//! resource resolution.

mod common;

use std::sync::Arc;

use common::Fixture;
use hotload_loader::reference::MemoryHost;

#[test]
fn assignable_to_loads_and_filters() {
    let fixture = Fixture::new();
    fixture.write("app/Named.src", "pub name\n");
    fixture.write("app/models/User.src", "implements app.Named\npub name\n");
    fixture.write("app/models/Tag.src", "pub label\n");
    let loader = fixture.loader();
    loader.cache().populate(&loader.locator().discover(), loader.locator()).unwrap();

    let handles = loader.assignable_to("app.Named").unwrap();
    let names: Vec<&str> = handles.iter().map(|h| h.name()).collect();

    assert_eq!(names, vec!["app.models.User"]);
    assert_eq!(fixture.host.defined_units().len(), 3);
}

#[test]
fn assignable_to_is_memoized_per_generation() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "implements Named\npub name\n");
    let loader = fixture.loader();
    loader.load_all().unwrap();

    let first = loader.assignable_to("Named").unwrap();
    let second = loader.assignable_to("Named").unwrap();
    assert!(first[0].same_as(&second[0]));

    fixture.write("app/models/Admin.src", "implements Named\npub name\n");
    loader.resolve_and_define("app.models.Admin").unwrap();
    assert_eq!(loader.assignable_to("Named").unwrap().len(), 2);
}

#[test]
fn queries_on_a_fresh_loader_load_every_unit_once() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "implements Named\n@Entity\npub name\n");
    fixture.write("app/models/Tag.src", "pub label\n");
    let loader = fixture.loader();

    let assignable = loader.assignable_to("Named").unwrap();
    assert_eq!(assignable.len(), 1);
    assert_eq!(assignable[0].name(), "app.models.User");
    assert_eq!(fixture.host.defined_units().len(), 2);

    let annotated = loader.annotated_with("Entity").unwrap();
    assert_eq!(annotated.len(), 1);
    assert!(annotated[0].same_as(&assignable[0]));
    assert_eq!(fixture.compiler.compiled_count(), 2);
    assert_eq!(fixture.compiler.compile_calls(), 1);
}

#[test]
fn annotated_with_filters_on_markers() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "@Entity\npub name\n");
    fixture.write("app/models/Form.src", "pub name\n");
    let loader = fixture.loader();
    loader.load_all().unwrap();

    let handles = loader.annotated_with("Entity").unwrap();
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].name(), "app.models.User");
}

#[test]
fn load_ignore_case_finds_discoverable_units() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();

    let handle = loader.load_ignore_case("APP.MODELS.user").unwrap().unwrap();
    assert_eq!(handle.name(), "app.models.User");
    assert!(loader.load_ignore_case("app.models.Nobody").unwrap().is_none());
}

#[test]
fn load_ignore_case_matches_nested_units_spelled_with_dots() {
    let fixture = Fixture::new();
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();
    loader.resolve_and_define("app.models.User$Address").unwrap();

    let handle = loader
        .load_ignore_case("app.models.user.address")
        .unwrap()
        .unwrap();
    assert_eq!(handle.name(), "app.models.User$Address");
}

#[test]
fn unit_definition_prefers_transformed_bytes() {
    let mut fixture = Fixture::new();
    let resources = fixture.dir.path().join("host");
    std::fs::create_dir_all(resources.join("std")).unwrap();
    std::fs::write(resources.join("std/String.unit"), "host bytes").unwrap();
    fixture.host = Arc::new(MemoryHost::new().with_resource_root(&resources));
    fixture.write("app/models/User.src", "pub name\n");
    let loader = fixture.loader();
    loader.resolve_and_define("app.models.User").unwrap();

    assert_eq!(
        loader.unit_definition("app/models/User").unwrap().unwrap(),
        b"pub name\n"
    );
    assert_eq!(
        loader.unit_definition("std.String").unwrap().unwrap(),
        b"host bytes"
    );
    assert!(loader.unit_definition("std.Missing").unwrap().is_none());
}

#[test]
fn resources_prefer_the_search_path() {
    let mut fixture = Fixture::new();
    let host_root = fixture.dir.path().join("host");
    std::fs::create_dir_all(host_root.join("conf")).unwrap();
    std::fs::write(host_root.join("conf/routes"), "host routes").unwrap();
    std::fs::write(host_root.join("conf/messages"), "host messages").unwrap();
    fixture.host = Arc::new(MemoryHost::new().with_resource_root(&host_root));
    let app_routes = fixture.write("conf/routes", "app routes");
    let loader = fixture.loader();

    assert_eq!(loader.resource("/conf/routes").unwrap(), app_routes);
    assert_eq!(
        loader.resources("conf/routes"),
        vec![app_routes, host_root.join("conf/routes")]
    );
    assert_eq!(
        loader.open_resource("conf/routes").unwrap().unwrap(),
        b"app routes"
    );
    assert_eq!(
        loader.open_resource("conf/messages").unwrap().unwrap(),
        b"host messages"
    );
    assert!(loader.open_resource("conf/missing").unwrap().is_none());
}
