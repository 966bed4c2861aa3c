use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::*;
use crate::launcher::{build_child_command, ChildExit};
use crate::logging::default_filter;
use crate::notify::{render_failure, resolve_output_style, OutputStyle};
use crate::orchestrator::{capture_path, executable_path, pre_swap, Capture, PreSwap};
use clap::Parser;
use sxs_core::{LaunchTarget, VersionKey};
use sxs_settings::{Settings, VersionPathMap};
use sxs_state::memory::MemoryBackend;
use sxs_state::StateBackend;
use sxs_version::fixtures::{write_pe_image, FixtureVersion};

static TEST_ROOT_COUNTER: AtomicU64 = AtomicU64::new(0);

const PATH_ENTRY: &str = "kProjectBasePath_h3183975713";

struct TestEnv {
    root: PathBuf,
    store: SettingsStore,
}

impl TestEnv {
    fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let sequence = TEST_ROOT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "sxs-cli-tests-{}-{}-{}",
            std::process::id(),
            nanos,
            sequence
        ));
        let store = SettingsStore::new(root.join("settings").join("settings.toml"));
        Self { root, store }
    }

    fn editor(&self, major: u16, minor: u16, build: u16) -> PathBuf {
        let path = self
            .root
            .join(format!("{major}.{minor}.{build}f1"))
            .join("Editor")
            .join("Unity.exe");
        write_pe_image(&path, &FixtureVersion::unity_editor(major, minor, build))
            .expect("must write editor fixture");
        path
    }

    fn seed(&self, first_run_completed: bool, versions: &[(&str, &str)]) {
        let settings = Settings {
            first_run_completed,
            versions: versions
                .iter()
                .map(|(key, path)| (key.to_string(), path.to_string()))
                .collect::<VersionPathMap>(),
            ..Settings::default()
        };
        self.store.save(&settings).expect("must seed settings");
    }

    fn request(&self, executable: &Path, arguments: &[&str]) -> LaunchRequest {
        LaunchRequest {
            executable: Some(executable.display().to_string()),
            arguments: arguments.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn key(input: &str) -> VersionKey {
    VersionKey::parse(input).expect("valid version key")
}

fn exited() -> anyhow::Result<ChildExit> {
    Ok(ChildExit { code: Some(0) })
}

fn parse_request(args: &[&str]) -> (Cli, LaunchRequest) {
    let cli = Cli::try_parse_from(args.iter().copied()).expect("must parse");
    let request = cli.launch_request();
    (cli, request)
}

#[test]
fn cli_passes_hyphenated_editor_arguments_through() {
    let (cli, request) = parse_request(&[
        "unity-sxs",
        "--clear-unmapped",
        "C:/Unity/2021.3.5f1/Editor/Unity.exe",
        "-projectPath",
        "D:/Projects/Racer",
        "-v",
    ]);

    assert!(cli.clear_unmapped);
    assert_eq!(cli.verbose, 0);
    assert_eq!(
        request.executable.as_deref(),
        Some("C:/Unity/2021.3.5f1/Editor/Unity.exe")
    );
    assert_eq!(
        request.arguments,
        vec!["-projectPath", "D:/Projects/Racer", "-v"]
    );
}

#[test]
fn cli_passes_tool_flag_lookalike_right_after_executable() {
    let (cli, request) = parse_request(&["unity-sxs", "Unity.exe", "-v", "-batchmode"]);

    assert_eq!(cli.verbose, 0);
    assert_eq!(request.executable.as_deref(), Some("Unity.exe"));
    assert_eq!(request.arguments, vec!["-v", "-batchmode"]);
}

#[test]
fn cli_keeps_settings_file_option_after_executable_for_editor() {
    let (cli, request) =
        parse_request(&["unity-sxs", "Unity.exe", "--settings-file", "elsewhere.toml"]);

    assert_eq!(cli.settings_file, None);
    assert_eq!(request.arguments, vec!["--settings-file", "elsewhere.toml"]);
}

#[test]
fn cli_passes_help_and_escape_after_executable() {
    for passthrough in [["-h"], ["--help"], ["--"]] {
        let mut args = vec!["unity-sxs", "Unity.exe"];
        args.extend(passthrough);
        let (_, request) = parse_request(&args);
        assert_eq!(request.arguments, passthrough.to_vec());
    }

    let (_, request) = parse_request(&["unity-sxs", "Unity.exe", "--", "-x"]);
    assert_eq!(request.arguments, vec!["--", "-x"]);
}

#[test]
fn cli_accepts_missing_executable_for_usage_notice() {
    let (_, request) = parse_request(&["unity-sxs"]);
    assert_eq!(request, LaunchRequest::default());
}

#[test]
fn cli_reads_tool_options_before_executable() {
    let (cli, request) = parse_request(&[
        "unity-sxs",
        "-vv",
        "--settings-file",
        "/tmp/sxs.toml",
        "Unity.exe",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.settings_file, Some(PathBuf::from("/tmp/sxs.toml")));
    assert_eq!(request.executable.as_deref(), Some("Unity.exe"));
    assert!(request.arguments.is_empty());
}

fn unresolvable_root() -> anyhow::Result<PathBuf> {
    anyhow::bail!("LOCALAPPDATA is not set")
}

#[test]
fn usage_errors_win_over_unresolvable_settings_root() {
    let err = prepare_store(&LaunchRequest::default(), None, unresolvable_root)
        .expect_err("missing executable must abort");
    assert!(matches!(err, LaunchError::Usage));

    let env = TestEnv::new();
    let err = prepare_store(
        &env.request(&env.root.join("absent.exe"), &[]),
        None,
        unresolvable_root,
    )
    .expect_err("absent executable must abort");
    assert!(matches!(err, LaunchError::TargetNotFound { .. }));
}

#[test]
fn unresolvable_settings_root_is_reported_as_location_error() {
    let env = TestEnv::new();
    let editor = env.editor(2021, 3, 5);

    let err = prepare_store(&env.request(&editor, &[]), None, unresolvable_root)
        .expect_err("unresolvable root must abort");
    match err {
        LaunchError::SettingsLocation { message } => {
            assert!(message.contains("LOCALAPPDATA"), "unexpected message: {message}")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!env.store.path().exists());

    let store = prepare_store(
        &env.request(&editor, &[]),
        Some(env.store.path().to_path_buf()),
        unresolvable_root,
    )
    .expect("settings file flag skips the default root");
    assert_eq!(store.path(), env.store.path());
}

#[test]
fn executable_path_requires_argument() {
    let err = executable_path(&LaunchRequest::default()).expect_err("missing argument");
    assert!(matches!(err, LaunchError::Usage));

    let err = executable_path(&LaunchRequest {
        executable: Some("\"\"".to_string()),
        arguments: Vec::new(),
    })
    .expect_err("quotes only");
    assert!(matches!(err, LaunchError::Usage));
}

#[test]
fn executable_path_strips_quotes() {
    let env = TestEnv::new();
    let editor = env.editor(2021, 3, 5);
    let quoted = format!("\"{}\"", editor.display());

    let path = executable_path(&LaunchRequest {
        executable: Some(quoted),
        arguments: Vec::new(),
    })
    .expect("quoted path must resolve");
    assert_eq!(path, editor);
}

#[test]
fn executable_path_rejects_directories_and_missing_files() {
    let env = TestEnv::new();
    let editor = env.editor(2021, 3, 5);
    let directory = editor.parent().expect("parent").to_path_buf();

    for candidate in [directory, env.root.join("missing").join("Unity.exe")] {
        let err = executable_path(&env.request(&candidate, &[])).expect_err("must reject");
        assert!(matches!(err, LaunchError::TargetNotFound { .. }));
    }
}

#[test]
fn pre_swap_first_run_deletes_entry_and_sets_flag() {
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "D:/Other")]);
    let mut container = backend
        .open(sxs_core::VersionFamily::new(2021), true)
        .expect("must open");
    let mut settings = Settings::default();
    settings.versions.upsert(&key("2021.3.5"), "D:/Mine");

    let outcome = pre_swap(
        &mut container,
        &mut settings,
        &key("2021.3.5"),
        LaunchOptions::default(),
    )
    .expect("must swap");

    assert_eq!(
        outcome,
        PreSwap::FirstRunCleared {
            entry: Some(PATH_ENTRY.to_string())
        }
    );
    assert!(settings.first_run_completed);
    assert_eq!(backend.entry(2021, PATH_ENTRY), None);
}

#[test]
fn pre_swap_first_run_without_entry_only_sets_flag() {
    let mut backend = MemoryBackend::new().with_family(2021, &[]);
    let mut container = backend
        .open(sxs_core::VersionFamily::new(2021), true)
        .expect("must open");
    let mut settings = Settings::default();

    let outcome = pre_swap(
        &mut container,
        &mut settings,
        &key("2021.3.5"),
        LaunchOptions::default(),
    )
    .expect("must swap");
    assert_eq!(outcome, PreSwap::FirstRunCleared { entry: None });
    assert!(settings.first_run_completed);
    assert_eq!(backend.events(), vec!["open 2021.x"]);
}

#[test]
fn pre_swap_leaves_unmapped_version_untouched_by_default() {
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "D:/Other")]);
    let mut container = backend
        .open(sxs_core::VersionFamily::new(2021), true)
        .expect("must open");
    let mut settings = Settings {
        first_run_completed: true,
        ..Settings::default()
    };

    let outcome = pre_swap(
        &mut container,
        &mut settings,
        &key("2021.3.5"),
        LaunchOptions::default(),
    )
    .expect("must swap");
    assert_eq!(outcome, PreSwap::Untouched);
    assert_eq!(backend.entry(2021, PATH_ENTRY).as_deref(), Some("D:/Other"));
}

#[test]
fn pre_swap_clear_unmapped_deletes_foreign_path() {
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "D:/Other")]);
    let mut container = backend
        .open(sxs_core::VersionFamily::new(2021), true)
        .expect("must open");
    let mut settings = Settings {
        first_run_completed: true,
        ..Settings::default()
    };

    let outcome = pre_swap(
        &mut container,
        &mut settings,
        &key("2021.3.5"),
        LaunchOptions {
            clear_unmapped: true,
        },
    )
    .expect("must swap");
    assert_eq!(
        outcome,
        PreSwap::ClearedUnmapped {
            entry: PATH_ENTRY.to_string()
        }
    );
    assert_eq!(backend.entry(2021, PATH_ENTRY), None);
}

#[test]
fn pre_swap_does_not_create_missing_entry() {
    let mut backend = MemoryBackend::new().with_family(2021, &[("UnityEditor.Layout", "x")]);
    let mut container = backend
        .open(sxs_core::VersionFamily::new(2021), true)
        .expect("must open");
    let mut settings = Settings {
        first_run_completed: true,
        ..Settings::default()
    };
    settings.versions.upsert(&key("2021.3.5"), "D:/Mine");

    let outcome = pre_swap(
        &mut container,
        &mut settings,
        &key("2021.3.5"),
        LaunchOptions::default(),
    )
    .expect("must swap");
    assert_eq!(outcome, PreSwap::NoEntryToRestore);
    assert_eq!(backend.entries(2021).len(), 1);
}

#[test]
fn capture_ignores_empty_entry() {
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "")]);
    let mut container = backend
        .open(sxs_core::VersionFamily::new(2021), true)
        .expect("must open");
    let mut versions = VersionPathMap::new();
    versions.upsert(&key("2021.3.5"), "D:/Kept");

    let outcome = capture_path(&mut container, &mut versions, &key("2021.3.5")).expect("capture");
    assert_eq!(
        outcome,
        Capture::EmptyEntry {
            entry: PATH_ENTRY.to_string()
        }
    );
    assert_eq!(versions.get(&key("2021.3.5")), Some("D:/Kept"));
}

#[test]
fn first_run_clears_entry_once_across_invocations() {
    let env = TestEnv::new();
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "D:/FromOtherVersion")]);
    let observer = backend.clone();

    let report = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| {
            assert_eq!(observer.entry(2021, PATH_ENTRY), None);
            exited()
        },
    )
    .expect("first launch must succeed");
    assert_eq!(
        report.pre_swap,
        PreSwap::FirstRunCleared {
            entry: Some(PATH_ENTRY.to_string())
        }
    );
    assert!(env.store.load().first_run_completed);

    observer.put(2021, PATH_ENTRY, "D:/FromOtherVersion");
    let report = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| {
            assert_eq!(
                observer.entry(2021, PATH_ENTRY).as_deref(),
                Some("D:/FromOtherVersion")
            );
            exited()
        },
    )
    .expect("second launch must succeed");
    assert_eq!(report.pre_swap, PreSwap::Untouched);

    let deletions = backend
        .events()
        .into_iter()
        .filter(|event| event.starts_with("delete "))
        .count();
    assert_eq!(deletions, 1);
}

#[test]
fn stored_path_is_swapped_in_before_launch() {
    let env = TestEnv::new();
    env.seed(true, &[("2021.3.5", "/path/A"), ("2021.3.6", "/path/C")]);
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/Z")]);
    let observer = backend.clone();
    let seen_before_launch = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&seen_before_launch);

    let report = run_launch(
        env.request(&editor, &["-projectPath", "/path/A"]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |target: &LaunchTarget| {
            *seen.borrow_mut() = observer.entry(2021, PATH_ENTRY);
            assert_eq!(target.argument_line(), "-projectPath /path/A");
            assert_eq!(target.version().to_string(), "2021.3.5");
            exited()
        },
    )
    .expect("launch must succeed");

    assert_eq!(seen_before_launch.borrow().as_deref(), Some("/path/A"));
    assert_eq!(
        report.pre_swap,
        PreSwap::Restored {
            entry: PATH_ENTRY.to_string(),
            path: "/path/A".to_string()
        }
    );
}

#[test]
fn path_left_by_editor_is_captured_for_exact_version() {
    let env = TestEnv::new();
    env.seed(true, &[("2021.3.5", "/path/A"), ("2021.3.6", "/path/C")]);
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/Z")]);
    let editor_session = backend.clone();

    let report = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| {
            // The editor recreates its entry under a new hash.
            editor_session.remove(2021, PATH_ENTRY);
            editor_session.put(2021, "kProjectBasePath_h42", "/path/B");
            exited()
        },
    )
    .expect("launch must succeed");

    assert_eq!(
        report.capture,
        Capture::Recorded {
            entry: "kProjectBasePath_h42".to_string(),
            path: "/path/B".to_string(),
            previous: Some("/path/A".to_string()),
        }
    );
    let saved = env.store.load();
    assert_eq!(saved.versions.get(&key("2021.3.5")), Some("/path/B"));
    assert_eq!(saved.versions.get(&key("2021.3.6")), Some("/path/C"));
    assert_eq!(saved.versions.len(), 2);
}

#[test]
fn container_without_path_entry_is_not_an_error() {
    let env = TestEnv::new();
    env.seed(true, &[("2020.3.48", "/path/Old")]);
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[("UnityEditor.Layout", "Default")]);

    let report = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| exited(),
    )
    .expect("launch must succeed");

    assert_eq!(report.pre_swap, PreSwap::Untouched);
    assert_eq!(report.capture, Capture::NoEntry);
    let saved = env.store.load();
    assert_eq!(saved.versions.get(&key("2021.3.5")), None);
    assert_eq!(saved.versions.get(&key("2020.3.48")), Some("/path/Old"));
}

#[test]
fn entry_created_during_session_is_captured() {
    let env = TestEnv::new();
    env.seed(true, &[("2021.3.5", "/path/A")]);
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[]);
    let editor_session = backend.clone();

    let report = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| {
            editor_session.put(2021, "kProjectBasePath_h7", "/path/New");
            exited()
        },
    )
    .expect("launch must succeed");

    assert_eq!(report.pre_swap, PreSwap::NoEntryToRestore);
    assert_eq!(
        env.store.load().versions.get(&key("2021.3.5")),
        Some("/path/New")
    );
}

#[test]
fn container_is_closed_once_after_capture() {
    let env = TestEnv::new();
    env.seed(true, &[]);
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/Z")]);

    run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| exited(),
    )
    .expect("launch must succeed");

    assert_eq!(backend.opened(), 1);
    assert_eq!(backend.closed(), 1);
    assert_eq!(backend.events().last().map(String::as_str), Some("close"));
}

#[test]
fn missing_executable_never_writes_settings() {
    let env = TestEnv::new();
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/Z")]);
    let mut launched = false;

    let err = run_launch(
        env.request(&env.root.join("nope").join("Unity.exe"), &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| {
            launched = true;
            exited()
        },
    )
    .expect_err("missing executable must abort");

    assert!(matches!(err, LaunchError::TargetNotFound { .. }));
    assert!(!launched);
    assert!(!env.store.path().exists());
    assert_eq!(backend.opened(), 0);
}

#[test]
fn aborted_run_leaves_existing_settings_bytes_unchanged() {
    let env = TestEnv::new();
    env.seed(true, &[("2021.3.5", "/path/A")]);
    let before = fs::read(env.store.path()).expect("must read seeded settings");
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/Z")]);

    let err = run_launch(
        env.request(&env.root.join("nope.exe"), &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| exited(),
    )
    .expect_err("must abort");

    assert!(matches!(err, LaunchError::TargetNotFound { .. }));
    assert_eq!(fs::read(env.store.path()).expect("must reread"), before);
}

#[test]
fn foreign_executable_aborts_before_touching_state() {
    let env = TestEnv::new();
    let path = env.root.join("Blender.exe");
    write_pe_image(
        &path,
        &FixtureVersion::unity_editor(4, 2, 0).with_string("FileDescription", "Blender"),
    )
    .expect("must write fixture");
    let mut backend = MemoryBackend::new().with_family(4, &[(PATH_ENTRY, "/path/Z")]);

    let err = run_launch(
        env.request(&path, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| exited(),
    )
    .expect_err("foreign executable must abort");

    assert!(matches!(err, LaunchError::IdentityMismatch { .. }));
    assert_eq!(backend.opened(), 0);
    assert!(!env.store.path().exists());
}

#[test]
fn missing_container_aborts_as_inaccessible() {
    let env = TestEnv::new();
    let editor = env.editor(2023, 2, 1);
    let mut backend = MemoryBackend::new().with_family(2021, &[]);

    let err = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| exited(),
    )
    .expect_err("missing container must abort");

    assert!(matches!(err, LaunchError::StateInaccessible { .. }));
    assert!(!env.store.path().exists());
}

#[test]
fn denied_container_aborts_as_access_error() {
    let env = TestEnv::new();
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().deny_family(2021);

    let err = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| exited(),
    )
    .expect_err("denied container must abort");

    match err {
        LaunchError::StateAccess { message } => assert!(message.contains("Access is denied")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn launch_failure_closes_container_without_saving() {
    let env = TestEnv::new();
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/Z")]);

    let err = run_launch(
        env.request(&editor, &[]),
        &env.store,
        &mut backend,
        LaunchOptions::default(),
        |_: &LaunchTarget| -> anyhow::Result<ChildExit> { Err(anyhow::anyhow!("spawn refused")) },
    )
    .expect_err("launch failure must abort");

    assert!(matches!(err, LaunchError::LaunchFailed { .. }));
    assert_eq!(backend.closed(), 1);
    assert!(!env.store.path().exists());
}

#[test]
fn repeated_identical_runs_persist_identical_bytes() {
    let env = TestEnv::new();
    env.seed(true, &[("2019.4.40", "/path/Legacy")]);
    let editor = env.editor(2021, 3, 5);
    let mut backend = MemoryBackend::new().with_family(2021, &[(PATH_ENTRY, "/path/B")]);

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        run_launch(
            env.request(&editor, &[]),
            &env.store,
            &mut backend,
            LaunchOptions::default(),
            |_: &LaunchTarget| exited(),
        )
        .expect("launch must succeed");
        snapshots.push(fs::read(env.store.path()).expect("must read settings"));
    }
    assert_eq!(snapshots[0], snapshots[1]);
}

#[cfg(not(windows))]
#[test]
fn child_command_keeps_argument_order() {
    let target = LaunchTarget::new(
        "/opt/unity/Editor/Unity",
        vec![
            "-projectPath".to_string(),
            "/home/dev/Game".to_string(),
            "-batchmode".to_string(),
        ],
        key("2021.3.5"),
    );
    let command = build_child_command(&target);
    assert_eq!(command.get_program(), "/opt/unity/Editor/Unity");
    assert_eq!(
        command.get_args().collect::<Vec<_>>(),
        vec!["-projectPath", "/home/dev/Game", "-batchmode"]
    );
}

#[cfg(unix)]
#[test]
fn launch_and_wait_blocks_until_exit_and_reports_code() {
    let target = LaunchTarget::new(
        "/bin/sh",
        vec!["-c".to_string(), "exit 3".to_string()],
        key("2021.3.5"),
    );
    let exit = launcher::launch_and_wait(&target).expect("shell must run");
    assert_eq!(exit, ChildExit { code: Some(3) });
}

#[test]
fn launch_and_wait_reports_spawn_failure() {
    let env = TestEnv::new();
    let target = LaunchTarget::new(env.root.join("absent.exe"), Vec::new(), key("2021.3.5"));
    let err = launcher::launch_and_wait(&target).expect_err("absent binary must fail");
    assert!(err.to_string().contains("failed to start"), "unexpected error: {err}");
}

#[test]
fn failure_notice_plain_is_prefixed_with_title() {
    assert_eq!(
        render_failure(OutputStyle::Plain, &LaunchError::Usage),
        "UnitySXS: You must supply the path to a Unity editor executable (and optionally arguments for the editor)."
    );
}

#[test]
fn failure_notice_rich_adds_badge() {
    let rendered = render_failure(
        OutputStyle::Rich,
        &LaunchError::StateAccess {
            message: "Access is denied.".to_string(),
        },
    );
    assert!(rendered.contains("[ERROR]"), "unexpected notice: {rendered}");
    assert!(rendered.contains("UnitySXS: "), "unexpected notice: {rendered}");
}

#[test]
fn output_style_follows_stderr_terminal() {
    assert_eq!(resolve_output_style(true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false), OutputStyle::Plain);
}

#[test]
fn verbosity_raises_default_filter() {
    assert_eq!(default_filter(0), "warn");
    assert_eq!(default_filter(1), "info");
    assert_eq!(default_filter(4), "debug");
}

#[test]
fn settings_file_flag_overrides_default_location() {
    let store = settings_store(Some(PathBuf::from("/tmp/custom-sxs.toml")), unresolvable_root)
        .expect("must build");
    assert_eq!(store.path(), Path::new("/tmp/custom-sxs.toml"));
}
