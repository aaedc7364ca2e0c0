//! 모듈 스캐너 벤치마크
//!
//! 파일명 기반 모듈명 유도, 모듈 식별, POM 파싱과 부모 체인 해석 성능을 측정합니다.

use std::collections::HashMap;
use std::sync::Arc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use modscan_module_scanner::testing::JarBuilder;
use modscan_module_scanner::{
    CoordinateDocument, CoordinateResolver, JarArchive, ModuleIdentityResolver,
    ModuleScannerError, ParentReference, PomParser, derive_from_file_name,
};

const FILE_NAMES: &[&str] = &[
    "commons-lang3-3.14.0.jar",
    "log4j-1.2-api-2.17.1.jar",
    "jackson-databind-2.17.0.jar",
    "guava-33.1.0-jre.jar",
    "automatic-module-name-not-present.jar",
    "netty-transport-native-epoll-4.1.108.Final-linux-x86_64.jar",
    "slf4j_api-2.0.12.jar",
    "foo-2x.jar",
];

const LEAF_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.bench</groupId>
    <artifactId>level-3</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>leaf</artifactId>
  <name>${parent.name} :: ${project.artifactId}</name>
  <dependencies>
    <dependency>
      <groupId>org.other</groupId>
      <artifactId>dep</artifactId>
      <version>2.0</version>
    </dependency>
  </dependencies>
</project>"#;

/// level-0 <- level-1 <- level-2 <- level-3 체인
fn ancestor_chain() -> HashMap<ParentReference, Arc<CoordinateDocument>> {
    (0..4)
        .map(|level| {
            let reference = ParentReference::new("org.bench", format!("level-{level}"), "1.0");
            let document = CoordinateDocument {
                origin: format!("level-{level}.pom"),
                group: Some("org.bench".to_owned()),
                artifact: Some(format!("level-{level}")),
                version: Some("1.0".to_owned()),
                name: (level == 0).then(|| "Bench Root".to_owned()),
                parent: (level > 0).then(|| {
                    ParentReference::new("org.bench", format!("level-{}", level - 1), "1.0")
                }),
            };
            (reference, Arc::new(document))
        })
        .collect()
}

fn bench_name_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("name_derivation");
    group.throughput(Throughput::Elements(FILE_NAMES.len() as u64));
    group.bench_function("derive_from_file_name", |b| {
        b.iter(|| {
            for name in FILE_NAMES {
                black_box(derive_from_file_name(black_box(name)));
            }
        })
    });
    group.finish();
}

fn bench_identity_resolution(c: &mut Criterion) {
    let descriptor = JarBuilder::new()
        .manifest(&[("Implementation-Title", "bench")])
        .module_info("org.bench.descriptor")
        .build();
    let manifest = JarBuilder::new()
        .manifest(&[("Automatic-Module-Name", "org.bench.manifest")])
        .build();
    let resolver = ModuleIdentityResolver::new();

    let mut group = c.benchmark_group("identity_resolution");
    group.bench_function("explicit_descriptor", |b| {
        b.iter(|| {
            let archive =
                JarArchive::from_bytes("bench-1.0.jar", black_box(descriptor.clone())).unwrap();
            resolver.resolve(&archive, false).unwrap()
        })
    });
    group.bench_function("manifest_attribute", |b| {
        b.iter(|| {
            let archive =
                JarArchive::from_bytes("bench-1.0.jar", black_box(manifest.clone())).unwrap();
            resolver.resolve(&archive, false).unwrap()
        })
    });
    group.finish();
}

fn bench_coordinate_resolution(c: &mut Criterion) {
    let parser = PomParser::new();
    let chain = ancestor_chain();
    let loader = move |reference: &ParentReference| {
        chain
            .get(reference)
            .cloned()
            .ok_or_else(|| ModuleScannerError::UnresolvableParent {
                group: reference.group.clone(),
                artifact: reference.artifact.clone(),
                version: reference.version.clone(),
            })
    };
    let leaf = parser.parse(LEAF_POM.as_bytes(), "leaf.pom").unwrap();
    let resolver = CoordinateResolver::new();

    let mut group = c.benchmark_group("coordinate_resolution");
    group.bench_function("parse_leaf_pom", |b| {
        b.iter(|| parser.parse(black_box(LEAF_POM.as_bytes()), "leaf.pom").unwrap())
    });
    group.bench_function("resolve_four_ancestors", |b| {
        b.iter(|| resolver.resolve(black_box(&leaf), &loader).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_name_derivation,
    bench_identity_resolution,
    bench_coordinate_resolution
);
criterion_main!(benches);
