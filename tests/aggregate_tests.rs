//! Integration tests for tiered configuration loading.
//!
//! Each test builds its own package directory, local directory and
//! in-memory document store, then loads through `PrototypeConfig`.

use prototype_config::error::{StoreError, TierErrorKind};
use prototype_config::fetcher::{CONFIGURATION_COLLECTION, PROTOTYPE_CONFIG_TYPE};
use prototype_config::settings::{CONFIGURATION_SECTION, DIR_KEY, StaticSettings};
use prototype_config::store::{DocumentStore, Filter, SqliteStore};
use prototype_config::{ConfigDocument, LoadError, PrototypeConfig, Tier};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Store that is always unreachable.
struct UnavailableStore;

impl DocumentStore for UnavailableStore {
    fn find(&self, _collection: &str, _filter: &Filter) -> Result<Vec<ConfigDocument>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

struct Fixture {
    _temp: TempDir,
    package_dir: PathBuf,
    local_dir: PathBuf,
    store: SqliteStore,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let package_dir = temp.path().join("package");
        let local_dir = temp.path().join("etc");
        fs::create_dir_all(&package_dir).unwrap();
        fs::create_dir_all(&local_dir).unwrap();
        Self {
            _temp: temp,
            package_dir,
            local_dir,
            store: SqliteStore::open_in_memory().expect("Failed to create in-memory store"),
        }
    }

    fn settings_for(dir: &Path) -> Arc<StaticSettings> {
        Arc::new(StaticSettings::new().with(
            CONFIGURATION_SECTION,
            DIR_KEY,
            dir.to_string_lossy(),
        ))
    }

    fn loader(&self) -> PrototypeConfig {
        self.loader_with_store(Arc::new(self.store.clone()))
    }

    fn loader_with_store(&self, store: Arc<dyn DocumentStore>) -> PrototypeConfig {
        PrototypeConfig::new(Self::settings_for(&self.local_dir), store)
            .with_package_dir(&self.package_dir)
    }

    fn insert(&self, doc: serde_json::Value) {
        self.store.insert(CONFIGURATION_COLLECTION, &doc).unwrap();
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn names(docs: &[ConfigDocument]) -> Vec<&str> {
    docs.iter().map(|d| d["name"].as_str().unwrap()).collect()
}

mod aggregation_tests {
    use super::*;

    #[test]
    fn loads_each_tier_into_its_own_slot() {
        let fx = Fixture::new();
        write(&fx.package_dir, "one.config.json", r#"{"name": "pkg-1"}"#);
        write(&fx.package_dir, "two.config.json", r#"{"name": "pkg-2"}"#);
        write(&fx.local_dir, "local.config.json", r#"{"name": "fs-1"}"#);
        write(&fx.local_dir, "broken.config.json", r#"{"name": "fs-2""#);
        for name in ["db-1", "db-2", "db-3"] {
            fx.insert(json!({"name": name, "active": true, "type": PROTOTYPE_CONFIG_TYPE}));
        }
        fx.insert(json!({"name": "db-off", "active": false, "type": PROTOTYPE_CONFIG_TYPE}));

        let conf = fx.loader().load().expect("load should succeed");

        assert_eq!(names(conf.package()), vec!["pkg-1", "pkg-2"]);
        assert_eq!(names(conf.filesystem()), vec!["fs-1"]);
        assert_eq!(names(conf.database()), vec!["db-1", "db-2", "db-3"]);
        assert_eq!(conf.len(), 6);
    }

    #[test]
    fn empty_sources_give_three_empty_slots() {
        let fx = Fixture::new();
        let conf = fx.loader().load().unwrap();

        for tier in Tier::ALL {
            assert!(conf.tier(tier).is_empty(), "{} should be empty", tier);
        }
        assert!(conf.is_empty());
    }

    #[test]
    fn missing_local_directory_is_not_an_error() {
        let fx = Fixture::new();
        fs::remove_dir(&fx.local_dir).unwrap();
        write(&fx.package_dir, "a.config.json", r#"{"name": "pkg"}"#);

        let conf = fx.loader().load().unwrap();
        assert_eq!(names(conf.package()), vec!["pkg"]);
        assert!(conf.filesystem().is_empty());
    }

    #[test]
    fn tiers_never_leak_into_each_other() {
        let fx = Fixture::new();
        write(&fx.package_dir, "same.config.json", r#"{"name": "from-package"}"#);
        write(&fx.local_dir, "same.config.json", r#"{"name": "from-local"}"#);

        let conf = fx.loader().load().unwrap();
        assert_eq!(names(conf.package()), vec!["from-package"]);
        assert_eq!(names(conf.filesystem()), vec!["from-local"]);
    }

    #[test]
    fn same_named_documents_are_not_merged() {
        let fx = Fixture::new();
        write(&fx.package_dir, "job.config.json", r#"{"name": "job", "interval": 60}"#);
        write(&fx.local_dir, "job.config.json", r#"{"name": "job", "interval": 5}"#);
        fx.insert(json!({"name": "job", "active": true, "type": PROTOTYPE_CONFIG_TYPE, "interval": 1}));

        let conf = fx.loader().load().unwrap();
        let intervals: Vec<(Tier, i64)> = conf
            .iter()
            .map(|(tier, doc)| (tier, doc["interval"].as_i64().unwrap()))
            .collect();
        assert_eq!(
            intervals,
            vec![(Tier::Package, 60), (Tier::Filesystem, 5), (Tier::Database, 1)]
        );
    }

    #[test]
    fn consecutive_loads_are_equal() {
        let fx = Fixture::new();
        let nested = fx.local_dir.join("detectors").join("web");
        fs::create_dir_all(&nested).unwrap();
        write(&fx.local_dir, "b.config.json", r#"{"name": "b"}"#);
        write(&nested, "a.config.json", r#"[{"name": "nested"}]"#);
        write(&fx.package_dir, "p.config.json", r#"{"name": "p", "nested": {"deep": [1, 2]}}"#);
        fx.insert(json!({"name": "d", "active": true, "type": PROTOTYPE_CONFIG_TYPE}));

        let loader = fx.loader();
        let first = loader.load().unwrap();
        let second = loader.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn reload_picks_up_changes_without_touching_previous_result() {
        let fx = Fixture::new();
        write(&fx.local_dir, "a.config.json", r#"{"name": "a"}"#);
        let loader = fx.loader();

        let before = loader.load().unwrap();
        write(&fx.local_dir, "b.config.json", r#"{"name": "b"}"#);
        let after = loader.load().unwrap();

        assert_eq!(names(before.filesystem()), vec!["a"]);
        assert_eq!(names(after.filesystem()), vec!["a", "b"]);
    }

    #[test]
    fn local_directory_is_resolved_on_each_load() {
        let fx = Fixture::new();
        let other = fx.local_dir.parent().unwrap().join("other");
        fs::create_dir_all(&other).unwrap();
        write(&other, "x.config.json", r#"{"name": "other"}"#);

        let loader = PrototypeConfig::new(
            Fixture::settings_for(&other),
            Arc::new(fx.store.clone()),
        )
        .with_package_dir(&fx.package_dir);
        assert_eq!(names(loader.load().unwrap().filesystem()), vec!["other"]);
    }
}

mod filesystem_tier_tests {
    use super::*;

    #[test]
    fn malformed_files_are_dropped_silently() {
        let fx = Fixture::new();
        write(&fx.local_dir, "ok-1.config.json", r#"{"name": "ok-1"}"#);
        write(&fx.local_dir, "ok-2.config.json", r#"{"name": "ok-2"}"#);
        write(&fx.local_dir, "bad-1.config.json", "{");
        write(&fx.local_dir, "bad-2.config.json", "");
        write(&fx.local_dir, "bad-3.config.json", "true");

        let docs = fx.loader().load_from_fs(&fx.local_dir).unwrap();
        assert_eq!(names(&docs), vec!["ok-1", "ok-2"]);
    }

    #[test]
    fn only_config_json_suffix_is_read() {
        let fx = Fixture::new();
        write(&fx.local_dir, "real.config.json", r#"{"name": "real"}"#);
        write(&fx.local_dir, "plain.json", r#"{"name": "plain"}"#);
        write(&fx.local_dir, "real.config.json.orig", r#"{"name": "orig"}"#);
        write(&fx.local_dir, "notes.config", r#"{"name": "notes"}"#);

        let docs = fx.loader().load_from_fs(&fx.local_dir).unwrap();
        assert_eq!(names(&docs), vec!["real"]);
    }

    #[test]
    fn crlf_joined_content_parses() {
        let fx = Fixture::new();
        write(
            &fx.local_dir,
            "windows.config.json",
            "{\r\n\"name\": \"win\r\ndows\",\r\n\"exe_name\": \"detector\"\r\n}",
        );

        let docs = fx.loader().load_from_fs(&fx.local_dir).unwrap();
        assert_eq!(docs, vec![json!({"name": "windows", "exe_name": "detector"})]);
    }

    #[test]
    fn subdirectories_are_scanned() {
        let fx = Fixture::new();
        let deep = fx.package_dir.join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        write(&deep, "deep.config.json", r#"{"name": "deep"}"#);

        let conf = fx.loader().load().unwrap();
        assert_eq!(names(conf.package()), vec!["deep"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_local_directory_fails_filesystem_tier() {
        let fx = Fixture::new();
        let broken = fx.local_dir.join("loop");
        let partner = fx.local_dir.join("loop-partner");
        std::os::unix::fs::symlink(&partner, &broken).unwrap();
        std::os::unix::fs::symlink(&broken, &partner).unwrap();
        write(&fx.package_dir, "a.config.json", r#"{"name": "pkg"}"#);

        let loader = PrototypeConfig::new(
            Fixture::settings_for(&broken),
            Arc::new(fx.store.clone()),
        )
        .with_package_dir(&fx.package_dir);

        let err = loader.load().expect_err("load should fail");
        assert_eq!(err.failed_tiers(), vec![Tier::Filesystem]);
        let failure = err.failure(Tier::Filesystem).unwrap();
        assert!(failure.is_directory_access());
        assert!(matches!(failure.kind, TierErrorKind::DirectoryAccess(_)));
    }

    #[cfg(unix)]
    #[test]
    fn permission_denied_root_fails_filesystem_tier() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        write(&fx.local_dir, "a.config.json", r#"{"name": "a"}"#);
        fs::set_permissions(&fx.local_dir, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass mode bits; the symlink-loop test covers them
        let readable = fs::read_dir(&fx.local_dir).is_ok();
        let result = fx.loader().load();
        fs::set_permissions(&fx.local_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            eprintln!(
                "skipping permission_denied_root_fails_filesystem_tier: {} is readable with mode 000",
                fx.local_dir.display()
            );
            assert!(result.is_ok());
            return;
        }

        let err = result.expect_err("load should fail");
        assert_eq!(err.failed_tiers(), vec![Tier::Filesystem]);
        let failure = err.failure(Tier::Filesystem).unwrap();
        assert!(failure.is_directory_access());
        assert!(err.to_string().contains(&fx.local_dir.display().to_string()));
    }
}

mod database_tier_tests {
    use super::*;

    #[test]
    fn only_active_prototype_configs_are_loaded() {
        let fx = Fixture::new();
        fx.insert(json!({"name": "keep", "active": true, "type": PROTOTYPE_CONFIG_TYPE}));
        fx.insert(json!({"name": "off", "active": false, "type": PROTOTYPE_CONFIG_TYPE}));
        fx.insert(json!({"name": "foreign", "active": true, "type": "source_config"}));
        fx.insert(json!({"name": "untyped", "active": true}));

        let conf = fx.loader().load().unwrap();
        assert_eq!(names(conf.database()), vec!["keep"]);
    }

    #[test]
    fn unavailable_store_fails_database_tier() {
        let fx = Fixture::new();
        write(&fx.package_dir, "a.config.json", r#"{"name": "pkg"}"#);
        write(&fx.local_dir, "b.config.json", r#"{"name": "fs"}"#);

        let err = fx
            .loader_with_store(Arc::new(UnavailableStore))
            .load()
            .expect_err("load should fail");

        assert_eq!(err.failed_tiers(), vec![Tier::Database]);
        let failure = err.failure(Tier::Database).unwrap();
        assert!(failure.is_data_source());
        assert!(!failure.is_directory_access());
        assert!(err.to_string().contains("database tier failed"));
    }

    #[test]
    fn empty_store_is_success() {
        let fx = Fixture::new();
        let docs = fx.loader().load_from_store().unwrap();
        assert!(docs.is_empty());
    }
}

mod error_reporting_tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn simultaneous_failures_are_all_reported() {
        let fx = Fixture::new();
        let broken = fx.local_dir.join("loop");
        let partner = fx.local_dir.join("loop-partner");
        std::os::unix::fs::symlink(&partner, &broken).unwrap();
        std::os::unix::fs::symlink(&broken, &partner).unwrap();

        let loader = PrototypeConfig::new(Fixture::settings_for(&broken), Arc::new(UnavailableStore))
            .with_package_dir(&fx.package_dir);

        let err = loader.load().expect_err("load should fail");
        assert_eq!(err.failed_tiers(), vec![Tier::Filesystem, Tier::Database]);
        assert!(err.failure(Tier::Filesystem).unwrap().is_directory_access());
        assert!(err.failure(Tier::Database).unwrap().is_data_source());
    }

    #[test]
    fn missing_directory_setting_is_fatal() {
        let fx = Fixture::new();
        let loader = PrototypeConfig::new(Arc::new(StaticSettings::new()), Arc::new(fx.store.clone()))
            .with_package_dir(&fx.package_dir);

        match loader.load() {
            Err(LoadError::Settings(_)) => {}
            other => panic!("expected settings error, got {:?}", other),
        }
    }
}

mod trace_tests {
    use super::*;
    use prototype_config::{fetcher, scanner};
    use std::io;
    use std::sync::Mutex;

    /// Writer that appends formatted events to a shared buffer.
    #[derive(Clone)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a TRACE-level subscriber and return everything it logged.
    fn capture<F: FnOnce()>(f: F) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = CaptureWriter(buf.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn scan_reports_count_of_parsed_documents_only() {
        let fx = Fixture::new();
        write(&fx.local_dir, "a.config.json", r#"{"name": "a"}"#);
        write(&fx.local_dir, "b.config.json", r#"{"name": "b"}"#);
        write(&fx.local_dir, "c.config.json", "{ nope");
        write(&fx.local_dir, "d.config.json", "42");
        write(&fx.local_dir, "e.config.json", "");

        let logs = capture(|| {
            let docs = scanner::scan_directory(&fx.local_dir).unwrap();
            assert_eq!(docs.len(), 2);
        });

        assert!(logs.contains("Loading configurations from directory"), "{}", logs);
        assert!(logs.contains("Total documents returned from fs [2]"), "{}", logs);
        assert!(logs.contains("count=2"), "{}", logs);
        assert!(!logs.contains("count=3"), "{}", logs);
        assert!(!logs.contains("count=5"), "{}", logs);
        assert!(!logs.contains("[5]"), "{}", logs);
    }

    #[test]
    fn fetch_reports_count_of_matching_documents() {
        let fx = Fixture::new();
        for name in ["a", "b", "c"] {
            fx.insert(json!({"name": name, "active": true, "type": PROTOTYPE_CONFIG_TYPE}));
        }
        fx.insert(json!({"name": "off", "active": false, "type": PROTOTYPE_CONFIG_TYPE}));

        let logs = capture(|| {
            let docs = fetcher::fetch_active(&fx.store).unwrap();
            assert_eq!(docs.len(), 3);
        });

        assert!(
            logs.contains("Total documents returned from Configuration [3]"),
            "{}",
            logs
        );
        assert!(logs.contains("count=3"), "{}", logs);
        assert!(!logs.contains("count=4"), "{}", logs);
    }
}
