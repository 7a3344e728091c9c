//! Behaviour-driven tests for plugin dispatch.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use super::{
    InvocationLog, MockFetcher, dispatch_with, is_empty_dir, recording_executors,
    unreachable_repository,
};
use crate::alias::{AliasTable, AliasTarget};
use crate::detect::PluginFormat;
use crate::dispatch::InvocationContext;
use crate::error::DispatchError;
use crate::executor::{Environ, ExecutionResult};
use crate::reference::{PluginReference, PluginSource};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    aliases: AliasTable,
    markers: Vec<String>,
    unreachable: bool,
    requested: Arc<Mutex<Vec<(PluginSource, PathBuf)>>>,
    log: InvocationLog,
    root: TempDir,
    work: TempDir,
    outcome: Option<Result<ExecutionResult, DispatchError>>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld {
        aliases: AliasTable::new(),
        markers: Vec::new(),
        unreachable: false,
        requested: Arc::new(Mutex::new(Vec::new())),
        log: InvocationLog::default(),
        root: TempDir::new().expect("workspace root"),
        work: TempDir::new().expect("work dir"),
        outcome: None,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_fetcher(world: &TestWorld) -> MockFetcher {
    let markers = world.markers.clone();
    let unreachable = world.unreachable;
    let requested = Arc::clone(&world.requested);
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .returning(move |source, destination, _cancel| {
            requested
                .lock()
                .expect("lock requests")
                .push((source.clone(), destination.to_path_buf()));
            if unreachable {
                return Err(unreachable_repository());
            }
            for marker in &markers {
                fs::write(destination.join(marker), "name: fixture\n").expect("write marker");
            }
            Ok(())
        });
    fetcher
}

fn requests(world: &TestWorld) -> Vec<(PluginSource, PathBuf)> {
    world.requested.lock().expect("lock requests").clone()
}

fn format_named(name: &str) -> PluginFormat {
    [
        PluginFormat::Harness,
        PluginFormat::Bitrise,
        PluginFormat::GithubAction,
    ]
    .into_iter()
    .find(|format| format.as_str() == name)
    .unwrap_or_else(|| panic!("unknown plugin format '{name}'"))
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("an alias {name} pointing at {repository} commit {commit}")]
fn given_alias(world: &mut TestWorld, name: String, repository: String, commit: String) {
    world.aliases.insert(
        name.trim_matches('"'),
        AliasTarget::new(repository.trim_matches('"'), commit.trim_matches('"')),
    );
}

#[given("the plugin source contains {marker}")]
fn given_marker(world: &mut TestWorld, marker: String) {
    world.markers.push(marker.trim_matches('"').to_owned());
}

#[given("the plugin repository is unreachable")]
fn given_unreachable(world: &mut TestWorld) {
    world.unreachable = true;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the plugin is run with name {name} repo {repository} ref {git_ref} sha {commit}")]
fn when_run(world: &mut TestWorld, name: String, repository: String, git_ref: String, commit: String) {
    let reference = PluginReference::new(
        name.trim_matches('"'),
        repository.trim_matches('"'),
        git_ref.trim_matches('"'),
        commit.trim_matches('"'),
    );
    let context = InvocationContext::new(world.work.path(), Environ::from_iter(["CI=true"]));
    let fetcher = build_fetcher(world);
    world.outcome = Some(dispatch_with(
        world.aliases.clone(),
        fetcher,
        recording_executors(&world.log),
        &world.root,
        reference,
        &context,
    ));
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the dispatch succeeds")]
fn then_succeeds(world: &mut TestWorld) {
    let outcome = world.outcome.as_ref().expect("no dispatch captured");
    assert!(outcome.is_ok(), "expected success, got {outcome:?}");
}

#[then("the fetcher was asked for {repository} at {locator}")]
fn then_fetched(world: &mut TestWorld, repository: String, locator: String) {
    let requested = requests(world);
    let [(source, _)] = requested.as_slice() else {
        panic!("expected one fetch, got {}", requested.len());
    };
    assert_eq!(source.repository(), repository.trim_matches('"'));
    assert_eq!(source.locator(), locator.trim_matches('"'));
}

#[then("the {format} executor ran once")]
fn then_executor_ran(world: &mut TestWorld, format: String) {
    let expected = format_named(format.trim_matches('"'));
    let invocations = world.log.borrow();
    let [call] = invocations.as_slice() else {
        panic!("expected one executor call, got {}", invocations.len());
    };
    assert_eq!(call.format, expected);
    assert_eq!(call.work_dir, world.work.path());
    assert!(call.source_present, "source tree missing during execution");
}

#[then("no executor ran")]
fn then_no_executor(world: &mut TestWorld) {
    assert!(world.log.borrow().is_empty());
}

#[then("the dispatch fails with {kind}")]
fn then_fails(world: &mut TestWorld, kind: String) {
    let err = world
        .outcome
        .as_ref()
        .expect("no dispatch captured")
        .as_ref()
        .expect_err("expected failure but dispatch succeeded");
    match kind.trim_matches('"') {
        "fetch" => assert!(
            matches!(err, DispatchError::Fetch { .. }),
            "expected Fetch, got: {err}"
        ),
        "unsupported_format" => assert!(
            matches!(err, DispatchError::UnsupportedFormat { .. }),
            "expected UnsupportedFormat, got: {err}"
        ),
        "unresolved_reference" => assert!(
            matches!(err, DispatchError::UnresolvedReference { .. }),
            "expected UnresolvedReference, got: {err}"
        ),
        other => panic!(
            "unsupported error kind: '{other}' (supported: fetch, unsupported_format, unresolved_reference)"
        ),
    }
}

#[then("the workspace was removed")]
fn then_workspace_removed(world: &mut TestWorld) {
    for (_, destination) in requests(world) {
        assert!(!destination.exists(), "workspace {destination:?} leaked");
    }
    assert!(is_empty_dir(world.root.path()));
}

#[then("no workspace was created")]
fn then_no_workspace(world: &mut TestWorld) {
    assert!(requests(world).is_empty());
    assert!(is_empty_dir(world.root.path()));
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "An alias pins a Bitrise step"
)]
fn alias_pins_bitrise_step(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "An explicit ref fetches a GitHub Action"
)]
fn explicit_ref_fetches_action(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "An unreachable repository fails cleanly"
)]
fn unreachable_repository_fails(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "An unrecognised source tree is rejected"
)]
fn unrecognised_tree_rejected(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A reference without a repository never fetches"
)]
fn missing_repository_never_fetches(world: TestWorld) {
    drop(world);
}
