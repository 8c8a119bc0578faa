mod common;

use std::sync::Mutex;

use cgmath::Point3;
use scene_core::{
    Scene,
    config::{ImportConfig, SceneConfig},
    data_structures::{graph::TextureKind, stats::PrimitiveStats},
    resources::{Importer, import_log::LogCategory, obj_loader::ObjImporter},
};

use crate::common::test_utils::{RecordingBackend, RecordingTextures, TempDir, init_logger};

const OBJ: &str = "\
mtllib two.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 2
v 1 0 2
v 0 1 2
o quad
usemtl wood
f 1 2 3 4
o tri
f 5 6 7
";

const MTL: &str = "\
newmtl wood
Kd 0.8 0.6 0.4
map_Kd textures/wood.png
";

fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
    dir.write("two.mtl", MTL);
    dir.write("two.obj", OBJ)
}

#[test]
fn imports_objects_as_children_of_root() {
    init_logger();
    let dir = TempDir::new("obj");
    let path = write_fixture(&dir);
    let lines = Mutex::new(Vec::new());

    let scene = ObjImporter
        .import(&path, &ImportConfig::default(), &|line: &str| {
            lines.lock().unwrap().push(line.to_string())
        })
        .unwrap();

    let root = scene.root_node().unwrap();
    assert_eq!(root.name, "two");
    assert_eq!(root.children.len(), 2);
    assert_eq!(scene.meshes.len(), 2);
    assert_eq!(scene.meshes[0].faces.len(), 2, "quad is triangulated");
    assert!(scene.meshes[0].faces.iter().all(|f| f.arity() == 3));
    assert_eq!(scene.meshes[1].faces.len(), 1);
    assert_eq!(scene.materials.len(), 1);
    assert_eq!(scene.materials[0].textures[0].kind, TextureKind::Diffuse);
    assert_eq!(scene.materials[0].textures[0].path, "textures/wood.png");
    assert!(!scene.incomplete);

    let lines = lines.into_inner().unwrap();
    assert!(lines[0].starts_with("Info, T"), "{:?}", lines);
    assert!(lines.iter().any(|l| l.starts_with("Warn, ") && l.contains("no normals")));
}

#[test]
fn scene_open_picks_obj_importer() {
    let dir = TempDir::new("obj-scene");
    let path = write_fixture(&dir);
    let textures = RecordingTextures::default();

    let scene = Scene::open(
        &path,
        &SceneConfig::default(),
        Box::new(textures.clone()),
        &RecordingBackend::default(),
    )
    .unwrap();

    assert_eq!(scene.total_vertex_count(), 7);
    assert_eq!(scene.total_triangle_count(), 3);
    assert_eq!(scene.bounds().min, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(scene.bounds().max, Point3::new(1.0, 1.0, 2.0));
    assert_eq!(
        textures.added(),
        vec![("textures/wood.png".to_string(), false)]
    );
    assert!(!scene.log_store().by_category(LogCategory::Info).is_empty());
    assert_eq!(scene.directory(), dir.path());
}

#[test]
fn missing_obj_file_fails_to_load() {
    let dir = TempDir::new("obj-missing");
    let textures = RecordingTextures::default();

    let err = Scene::open(
        dir.path().join("absent.obj"),
        &SceneConfig::default(),
        Box::new(textures.clone()),
        &RecordingBackend::default(),
    )
    .err()
    .unwrap();

    assert!(err.to_string().contains("absent.obj"), "{}", err);
    assert_eq!(textures.releases(), 1);
}

const MIXED_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
o mixed
f 1 2 3
l 1 2
p 3
";

#[test]
fn lines_are_not_counted_as_triangles() {
    let dir = TempDir::new("obj-mixed");
    let path = dir.write("mixed.obj", MIXED_OBJ);
    let lines = Mutex::new(Vec::new());

    let scene = ObjImporter
        .import(&path, &ImportConfig::default(), &|line: &str| {
            lines.lock().unwrap().push(line.to_string())
        })
        .unwrap();
    let stats = PrimitiveStats::aggregate(&scene.meshes).unwrap();

    assert_eq!(stats.triangles, 1);
    assert_eq!(stats.lines, 1);
    // Point elements are dropped by the parser, but never silently
    assert_eq!(stats.points, 0);
    let lines = lines.into_inner().unwrap();
    assert!(
        lines
            .iter()
            .any(|l| l.starts_with("Warn, ") && l.contains("Skipped 1 point element")),
        "{:?}",
        lines
    );
}

#[test]
fn polygons_are_fanned_into_triangles() {
    let dir = TempDir::new("obj-pentagon");
    let path = dir.write(
        "pentagon.obj",
        "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n",
    );

    let scene = ObjImporter
        .import(&path, &ImportConfig::default(), &|_: &str| {})
        .unwrap();

    let stats = PrimitiveStats::aggregate(&scene.meshes).unwrap();
    assert_eq!(stats.triangles, 3);
    assert_eq!(stats.vertices, 5);
}
