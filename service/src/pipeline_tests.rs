//! Unit tests for pipeline orchestration.
//!
//! Each test lays out a package directory in a temp dir and drives the full
//! pipeline with a scripted executor standing in for cargo.

use super::{PipelineReport, Stage, run};
use crate::config::{Compression, ServiceConfig, Strategy};
use crate::error::ServiceError;
use crate::extraction::open_archive;
use crate::locator::SourceRef;
use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, stdout_output, success_output};
use flate2::write::GzEncoder;
use rstest::{fixture, rstest};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG_SNIPPET: &str = "[source.crates-io]\nreplace-with = \"vendored-sources\"\n";

/// A package directory as OBS hands it to the service.
struct PackageDir {
    dir: TempDir,
}

impl PackageDir {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn outdir(&self) -> PathBuf {
        self.path().join("out")
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    fn write_source_archive(&self, name: &str, entries: &[(&str, &str)]) {
        let file = File::create(self.path().join(name)).expect("create archive");
        let mut builder = tar::Builder::new(GzEncoder::new(file, flate2::Compression::default()));
        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, contents.as_bytes())
                .expect("append");
        }
        builder
            .into_inner()
            .expect("tar finish")
            .finish()
            .expect("gzip finish");
    }

    fn config(&self, archive: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            strategy: Strategy::Vendor,
            archive: archive.map(PathBuf::from),
            outdir: self.outdir(),
            compression: Compression::Gz,
            update: false,
            workdir: self.path().to_path_buf(),
        }
    }
}

#[fixture]
fn demo_package() -> PackageDir {
    let package = PackageDir {
        dir: TempDir::new().expect("temp dir"),
    };
    package.write("demo.spec", "Name: demo\nVersion: 1.2.3\n");
    package.write_source_archive(
        "demo-1.2.3.tar.gz",
        &[("demo-1.2.3/Cargo.toml", "[package]\nname = \"demo\"\n")],
    );
    package
}

fn vendoring_executor() -> StubExecutor {
    StubExecutor::new(vec![
        ExpectedCall::cargo_vendor(Ok(stdout_output(CONFIG_SNIPPET)))
            .creating("vendor/serde-1.0.0/Cargo.toml", "[package]\nname = \"serde\"\n"),
    ])
}

fn archive_entries(path: &Path) -> Vec<String> {
    let mut archive = open_archive(path, Compression::Gz).expect("open");
    archive
        .entries()
        .expect("entries")
        .map(|entry| {
            let entry = entry.expect("entry");
            entry.path().expect("path").to_string_lossy().into_owned()
        })
        .collect()
}

#[rstest]
fn end_to_end_produces_vendor_archive(demo_package: PackageDir) {
    let executor = vendoring_executor();

    let report = run(&demo_package.config(None), &executor).expect("pipeline");

    executor.assert_finished();
    let outdir = demo_package.outdir();
    assert_eq!(report.archive_path, outdir.join("vendor.tar.gz"));
    assert_eq!(report.project_root, outdir.join("demo-1.2.3"));
    assert_eq!(executor.working_dirs(), vec![outdir.join("demo-1.2.3")]);
    assert!(report.cleaned_up);
    assert!(!outdir.join("demo-1.2.3").exists());

    let entries = archive_entries(&report.archive_path);
    assert!(entries.iter().all(|entry| entry.starts_with("vendor")));
    assert!(entries.contains(&"vendor/serde-1.0.0/Cargo.toml".to_owned()));
}

#[rstest]
fn cargo_config_is_written_verbatim(demo_package: PackageDir) {
    let report = run(&demo_package.config(None), &vendoring_executor()).expect("pipeline");

    let config_path = demo_package.outdir().join("cargo_config");
    assert_eq!(report.cargo_config, Some(config_path.clone()));
    assert_eq!(
        fs::read_to_string(config_path).expect("read config"),
        CONFIG_SNIPPET
    );
}

#[rstest]
fn silent_cargo_writes_no_config(demo_package: PackageDir) {
    let executor = StubExecutor::new(vec![ExpectedCall::cargo_vendor(Ok(success_output()))]);

    let report = run(&demo_package.config(None), &executor).expect("pipeline");

    assert_eq!(report.cargo_config, None);
    assert!(!demo_package.outdir().join("cargo_config").exists());
    assert!(report.archive_path.is_file());
}

#[rstest]
fn version_mismatch_still_vendors(demo_package: PackageDir) {
    demo_package.write("demo.spec", "Name: demo\nVersion: 2.0.0\n");

    let report = run(&demo_package.config(None), &vendoring_executor()).expect("pipeline");

    assert!(matches!(
        report.source,
        SourceRef::Archive {
            version_mismatch: Some(_),
            ..
        }
    ));
    assert!(report.archive_path.is_file());
}

#[rstest]
fn vendor_failure_is_fatal_and_keeps_tree(demo_package: PackageDir) {
    let executor = StubExecutor::new(vec![ExpectedCall::cargo_vendor(Ok(failure_output(
        "error: no matching package named `serde` found",
    )))]);

    let err = run(&demo_package.config(None), &executor).expect_err("vendor failure");

    assert!(matches!(err, ServiceError::VendorFailed { .. }));
    assert!(err.to_string().contains("no matching package"));
    let outdir = demo_package.outdir();
    assert!(!outdir.join("vendor.tar.gz").exists());
    assert!(outdir.join("demo-1.2.3/Cargo.toml").is_file());
}

#[rstest]
fn update_runs_before_vendor(demo_package: PackageDir) {
    let executor = StubExecutor::new(vec![
        ExpectedCall::cargo_update(Ok(success_output())),
        ExpectedCall::cargo_vendor(Ok(success_output())),
    ]);
    let config = ServiceConfig {
        update: true,
        ..demo_package.config(None)
    };

    run(&config, &executor).expect("pipeline");

    executor.assert_finished();
}

#[rstest]
fn explicit_directory_source_is_copied_and_removed(demo_package: PackageDir) {
    demo_package.write("checkout/Cargo.toml", "[package]\nname = \"demo\"\n");
    demo_package.write("checkout/src/main.rs", "fn main() {}\n");

    let report = run(&demo_package.config(Some("checkout")), &vendoring_executor())
        .expect("pipeline");

    let outdir = demo_package.outdir();
    assert_eq!(report.source, SourceRef::Explicit(PathBuf::from("checkout")));
    assert_eq!(report.project_root, outdir.join("checkout"));
    assert!(report.cleaned_up);
    assert!(!outdir.join("checkout").exists());
    assert!(
        demo_package.path().join("checkout/Cargo.toml").is_file(),
        "the original checkout must be left alone"
    );
}

#[rstest]
fn checkout_inside_outdir_is_vendored_in_place(demo_package: PackageDir) {
    let manifest = "[package]\nname = \"demo\"\nversion = \"1.2.3\"\n";
    demo_package.write("checkout/Cargo.toml", manifest);
    demo_package.write("checkout/src/main.rs", "fn main() {}\n");
    let config = ServiceConfig {
        outdir: demo_package.path().to_path_buf(),
        ..demo_package.config(Some("checkout"))
    };

    let report = run(&config, &vendoring_executor()).expect("pipeline");

    let checkout = demo_package.path().join("checkout");
    assert_eq!(report.project_root, checkout);
    assert!(!report.cleaned_up);
    assert_eq!(
        fs::read_to_string(checkout.join("Cargo.toml")).expect("read manifest"),
        manifest
    );
    assert!(checkout.join("src/main.rs").is_file());
    assert!(demo_package.path().join("vendor.tar.gz").is_file());
}

#[test]
fn missing_spec_file_fails_before_cargo_runs() {
    let dir = TempDir::new().expect("temp dir");
    let package = PackageDir { dir };
    let executor = StubExecutor::new(Vec::new());

    let err = run(&package.config(None), &executor).expect_err("no spec");

    assert!(matches!(err, ServiceError::NoSpecFile { .. }));
    assert!(executor.working_dirs().is_empty());
}

#[rstest]
fn unsupported_source_produces_no_output(demo_package: PackageDir) {
    demo_package.write("notes.txt", "not an archive");
    let executor = StubExecutor::new(Vec::new());

    let err = run(&demo_package.config(Some("notes.txt")), &executor).expect_err("unsupported");

    assert!(matches!(err, ServiceError::UnsupportedArchiveFormat { .. }));
    assert!(!demo_package.outdir().exists());
}

#[rstest]
fn repeated_runs_reuse_the_archive_name(demo_package: PackageDir) {
    let first: PipelineReport =
        run(&demo_package.config(None), &vendoring_executor()).expect("first run");
    let second: PipelineReport =
        run(&demo_package.config(None), &vendoring_executor()).expect("second run");

    assert_eq!(first.archive_path, second.archive_path);
    assert_eq!(
        second.archive_path.file_name().and_then(|name| name.to_str()),
        Some("vendor.tar.gz")
    );
}

#[rstest]
#[case(Stage::Start, "start")]
#[case(Stage::ManifestFound, "manifest found")]
#[case(Stage::Done, "done")]
fn stages_render_for_logs(#[case] stage: Stage, #[case] expected: &str) {
    assert_eq!(stage.to_string(), expected);
}
