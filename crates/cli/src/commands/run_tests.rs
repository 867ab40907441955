// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use yare::parameterized;

#[test]
fn no_flags_resolves_reference_run() {
    let config = RunArgs::default().resolve(None).unwrap();
    assert_eq!(config, HerdConfig::default());
}

#[test]
fn flags_override_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[semaphore]
key = "from-file"
capacity = 4

[simulation]
actors = 8
work_duration = "1s"
"#
    )
    .unwrap();

    let args = RunArgs {
        config: Some(file.path().to_path_buf()),
        capacity: Some(3),
        jitter: Some(Duration::from_millis(10)),
        seed: Some(9),
        ..RunArgs::default()
    };
    let config = args.resolve(None).unwrap();

    assert_eq!(config.semaphore.key.as_str(), "from-file");
    assert_eq!(config.semaphore.capacity, 3);
    assert_eq!(config.simulation.actors, 8);
    assert_eq!(config.simulation.work_duration, Duration::from_secs(1));
    assert_eq!(config.retry.jitter, Duration::from_millis(10));
    assert_eq!(config.retry.seed, Some(9));
}

#[test]
fn env_url_sits_below_flag() {
    let args = RunArgs {
        backend: Some(BackendArg::Postgres),
        ..RunArgs::default()
    };
    let config = args.resolve(Some("postgres://env/db".into())).unwrap();
    assert_eq!(config.backend.kind, BackendKind::Postgres);
    assert_eq!(config.backend.url.as_deref(), Some("postgres://env/db"));

    let args = RunArgs {
        backend: Some(BackendArg::Postgres),
        database_url: Some("postgres://flag/db".into()),
        ..RunArgs::default()
    };
    let config = args.resolve(Some("postgres://env/db".into())).unwrap();
    assert_eq!(config.backend.url.as_deref(), Some("postgres://flag/db"));
}

#[test]
fn postgres_without_url_is_rejected() {
    let args = RunArgs {
        backend: Some(BackendArg::Postgres),
        ..RunArgs::default()
    };
    assert!(matches!(args.resolve(None), Err(ConfigError::Invalid(_))));
    assert!(matches!(
        args.resolve(Some(String::new())),
        Err(ConfigError::Invalid(_))
    ));
}

#[parameterized(
    zero_capacity = { RunArgs { capacity: Some(0), ..RunArgs::default() } },
    zero_actors = { RunArgs { actors: Some(0), ..RunArgs::default() } },
    zero_ttl = { RunArgs { ttl: Some(0), ..RunArgs::default() } },
    zero_retries = { RunArgs { max_retries: Some(0), ..RunArgs::default() } },
    empty_key = { RunArgs { key: Some(String::new()), ..RunArgs::default() } },
)]
fn invalid_flags_are_rejected(args: RunArgs) {
    assert!(matches!(args.resolve(None), Err(ConfigError::Invalid(_))));
}

#[test]
fn missing_config_file_is_a_read_error() {
    let args = RunArgs {
        config: Some(PathBuf::from("/nonexistent/herd.toml")),
        ..RunArgs::default()
    };
    assert!(matches!(args.resolve(None), Err(ConfigError::Read { .. })));
}

#[tokio::test(start_paused = true)]
async fn memory_backend_runs_reference_scenario_shape() {
    let config = RunArgs {
        actors: Some(3),
        capacity: Some(1),
        max_retries: Some(1),
        work_duration: Some(Duration::from_millis(50)),
        seed: Some(1),
        ..RunArgs::default()
    }
    .resolve(None)
    .unwrap();

    let (report, service) = execute(MemorySemaphoreService::new(), &config).await;
    let report = report.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failure_count(), 2);
    assert_eq!(service.held(&config.semaphore.key), 0);
}
