use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use protect_wizard::errors::WizardError;
use protect_wizard::models::{Finding, ScanResult};
use protect_wizard::policy::{FilePolicyStore, PolicyRecord};
use protect_wizard::process::{ExecOutput, ProcessRunner};
use protect_wizard::prompts::ScriptedPrompter;
use protect_wizard::services::{
    Authenticator, Authorization, Authorizer, DepTreeSnapshot, ModuleInspector, Monitor,
    MonitorMeta, MonitorResult, ScanOptions, Scanner,
};
use protect_wizard::wizard::{run_wizard, Collaborators, WizardOptions, WizardOutcome};

const MANIFEST: &str = r#"{
  "name": "demo-app",
  "version": "1.0.0",
  "dependencies": {
    "a": "^1.0.0"
  }
}
"#;

struct FixedScanner(ScanResult);

#[async_trait]
impl Scanner for FixedScanner {
    async fn test(&self, _cwd: &Path, _options: &ScanOptions) -> Result<ScanResult, WizardError> {
        Ok(self.0.clone())
    }
}

struct StaticAuth(AtomicBool);

impl StaticAuth {
    fn new(authenticated: bool) -> Self {
        Self(AtomicBool::new(authenticated))
    }
}

#[async_trait]
impl Authenticator for StaticAuth {
    async fn is_authenticated(&self) -> Result<bool, WizardError> {
        Ok(self.0.load(Ordering::SeqCst))
    }

    async fn authenticate(&self, token: &str) -> Result<bool, WizardError> {
        let ok = token == "t0k";
        self.0.store(ok, Ordering::SeqCst);
        Ok(ok)
    }
}

#[async_trait]
impl Authorizer for StaticAuth {
    async fn action_allowed(&self, _action: &str, _org: Option<&str>) -> Result<Authorization, WizardError> {
        Ok(Authorization::allowed())
    }
}

#[derive(Default)]
struct RecordingMonitor {
    calls: Arc<Mutex<Vec<DepTreeSnapshot>>>,
}

#[async_trait]
impl Monitor for RecordingMonitor {
    async fn register(
        &self,
        _cwd: &Path,
        _meta: &MonitorMeta,
        snapshot: &DepTreeSnapshot,
    ) -> Result<MonitorResult, WizardError> {
        self.calls.lock().unwrap().push(snapshot.clone());
        Ok(MonitorResult {
            id: "snap-1".into(),
            org: Some("acme".into()),
            is_monitored: true,
            trial_started: false,
        })
    }
}

struct FixedInspector;

#[async_trait]
impl ModuleInspector for FixedInspector {
    async fn inspect(&self, _cwd: &Path, target_file: &str) -> Result<DepTreeSnapshot, WizardError> {
        Ok(DepTreeSnapshot {
            name: "demo-app".into(),
            version: "1.0.0".into(),
            package_manager: "npm".into(),
            target_file: target_file.into(),
            dependencies: [("a".to_string(), "2.0.0".to_string())].into_iter().collect(),
        })
    }
}

#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String], _cwd: &Path) -> Result<ExecOutput, WizardError> {
        self.calls.lock().unwrap().push(ExecOutput::describe(program, args));
        Ok(ExecOutput::default())
    }
}

fn finding(id: &str, upgradable: bool) -> Finding {
    serde_json::from_value(json!({
        "id": id,
        "title": "Regular Expression Denial of Service",
        "severity": "high",
        "packageName": "ms",
        "version": "0.7.1",
        "from": ["demo-app@1.0.0", "a@1.0.0", "ms@0.7.1"],
        "upgradePath": if upgradable { json!([false, "a@2.0.0", false]) } else { json!([]) },
        "isUpgradable": upgradable,
        "isPatchable": false,
    }))
    .unwrap()
}

fn scan_with(findings: Vec<Finding>) -> ScanResult {
    ScanResult {
        ok: findings.is_empty(),
        unique_count: findings.len(),
        vulnerabilities: findings,
        dependency_count: 3,
        ..Default::default()
    }
}

const PRIOR_POLICY: &str = r#"# Snyk (https://snyk.io) policy file, patches or ignores known vulnerabilities.
version: v1.25.0
ignore:
  'npm:old:20160101':
    - 'b@1.0.0 > old@0.1.0':
        reason: vendored copy
        expires: '2031-01-01T00:00:00Z'
        source: api
        ignoredBy:
          email: dev@example.test
patch: {}
exclude:
  global:
    - vendor/**
"#;

fn project(lockfile: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("package.json"), MANIFEST).unwrap();
    std::fs::create_dir(dir.path().join("node_modules")).unwrap();
    if lockfile {
        std::fs::write(dir.path().join("package-lock.json"), "{\"lockfileVersion\": 2}\n").unwrap();
    }
    dir
}

fn options(dir: &TempDir) -> WizardOptions {
    let mut options = WizardOptions::new(dir.path().to_path_buf());
    options.tap = true;
    options.app_url = "https://app.test".into();
    options
}

fn collaborators(
    scan: ScanResult,
    authenticated: bool,
    answers: serde_json::Value,
    runner: Arc<RecordingRunner>,
    monitor: RecordingMonitor,
) -> Collaborators {
    Collaborators {
        scanner: Box::new(FixedScanner(scan)),
        authenticator: Box::new(StaticAuth::new(authenticated)),
        authorizer: Box::new(StaticAuth::new(true)),
        monitor: Box::new(monitor),
        policy_store: Box::new(FilePolicyStore),
        runner,
        prompter: Box::new(ScriptedPrompter::from_value(&answers).unwrap()),
        inspector: Some(Box::new(FixedInspector)),
    }
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let dir = project(false);
    let manifest_path = dir.path().join("package.json");
    let mtime_before = std::fs::metadata(&manifest_path).unwrap().modified().unwrap();

    let mut opts = options(&dir);
    opts.dry_run = true;
    let runner = Arc::new(RecordingRunner::default());
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", true)]),
        true,
        json!({ "npm:ms:20170412": "update" }),
        runner.clone(),
        RecordingMonitor::default(),
    );

    let outcome = run_wizard(&opts, &mut c).await.unwrap();
    match outcome {
        WizardOutcome::DryRun { summary } => assert!(summary.ends_with("This was a dry run: nothing changed")),
        other => panic!("Expected dry run outcome, got {:?}", other),
    }

    assert_eq!(std::fs::read_to_string(&manifest_path).unwrap(), MANIFEST);
    assert_eq!(std::fs::metadata(&manifest_path).unwrap().modified().unwrap(), mtime_before);
    assert!(!dir.path().join(".snyk").exists());
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_live_ignore_writes_single_rule() {
    let dir = project(false);
    let mut opts = options(&dir);
    opts.skip_monitor = true;
    let runner = Arc::new(RecordingRunner::default());
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", false)]),
        true,
        json!({
            "npm:ms:20170412": "ignore",
            "npm:ms:20170412-reason": "not reachable",
            "npm:ms:20170412-expires": "2030-01-31",
            "misc-add-test": false,
        }),
        runner.clone(),
        RecordingMonitor::default(),
    );

    let outcome = run_wizard(&opts, &mut c).await.unwrap();
    assert!(outcome.text().contains("git add .snyk"));

    let text = std::fs::read_to_string(dir.path().join(".snyk")).unwrap();
    let policy = PolicyRecord::parse(&text).unwrap();
    let rules = &policy.ignore["npm:ms:20170412"];
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].path, "a@1.0.0 > ms@0.7.1");
    assert_eq!(rules[0].meta.reason.as_deref(), Some("not reachable"));
    assert!(rules[0].meta.expires.unwrap().to_rfc3339().starts_with("2030-01-31"));
    assert!(policy.patch.is_empty());

    // No lockfile and nothing opted in: no installs, manifest untouched.
    assert!(runner.calls.lock().unwrap().is_empty());
    assert_eq!(std::fs::read_to_string(dir.path().join("package.json")).unwrap(), MANIFEST);
}

#[tokio::test]
async fn test_live_update_installs_and_monitors() {
    let dir = project(true);
    let runner = Arc::new(RecordingRunner::default());
    let monitor = RecordingMonitor::default();
    let snapshots = monitor.calls.clone();
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", true)]),
        true,
        json!({ "npm:ms:20170412": "update", "misc-add-test": true }),
        runner.clone(),
        monitor,
    );

    let outcome = run_wizard(&options(&dir), &mut c).await.unwrap();
    assert!(matches!(outcome, WizardOutcome::Applied { .. }));
    assert!(outcome.text().contains("https://app.test/org/acme/monitor/snap-1"));

    let calls = runner.calls.lock().unwrap().clone();
    assert_eq!(calls[0], "npm install --save a@2.0.0");
    assert_eq!(calls[1], "npm install --save-dev snyk");

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("package.json")).unwrap()).unwrap();
    assert_eq!(manifest["scripts"]["test"], "snyk test");
    assert_eq!(manifest["devDependencies"]["snyk"], "*");

    let snapshots = snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].target_file, "package-lock.json");
}

#[tokio::test]
async fn test_json_mode_returns_answers() {
    let dir = project(false);
    let mut opts = options(&dir);
    opts.json = true;
    let runner = Arc::new(RecordingRunner::default());
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", true)]),
        true,
        json!({ "npm:ms:20170412": "update" }),
        runner.clone(),
        RecordingMonitor::default(),
    );

    let outcome = run_wizard(&opts, &mut c).await.unwrap();
    let WizardOutcome::Answers { json } = outcome else {
        panic!("Expected answers outcome");
    };
    assert_eq!(json["answers"][0]["vulnId"], "npm:ms:20170412");
    assert_eq!(json["answers"][0]["choice"], "update");
    assert_eq!(json["misc"]["addTest"], true);
    assert!(!dir.path().join(".snyk").exists());
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_node_modules() {
    let dir = project(false);
    std::fs::remove_dir(dir.path().join("node_modules")).unwrap();
    let mut c = collaborators(
        scan_with(vec![]),
        true,
        json!({}),
        Arc::new(RecordingRunner::default()),
        RecordingMonitor::default(),
    );

    let err = run_wizard(&options(&dir), &mut c).await.unwrap_err();
    assert!(matches!(err, WizardError::MissingDependencies(_)));
    assert!(err.classify().precondition);
}

#[tokio::test]
async fn test_unsupported_package_manager() {
    let dir = project(false);
    let mut opts = options(&dir);
    opts.package_manager = Some("maven".into());
    let mut c = collaborators(
        scan_with(vec![]),
        true,
        json!({}),
        Arc::new(RecordingRunner::default()),
        RecordingMonitor::default(),
    );

    let err = run_wizard(&opts, &mut c).await.unwrap_err();
    assert!(matches!(err, WizardError::UnsupportedPackageManager(ref name) if name == "Maven"));
}

#[tokio::test]
async fn test_unauthenticated_in_ci() {
    let dir = project(false);
    let mut opts = options(&dir);
    opts.ci = true;
    let mut c = collaborators(
        scan_with(vec![]),
        false,
        json!({}),
        Arc::new(RecordingRunner::default()),
        RecordingMonitor::default(),
    );
    let err = run_wizard(&opts, &mut c).await.unwrap_err();
    assert!(matches!(err, WizardError::MisconfiguredAuthInCi));

    opts.ci = false;
    let err = run_wizard(&opts, &mut c).await.unwrap_err();
    assert!(matches!(err, WizardError::Authentication(_)));
}

#[tokio::test]
async fn test_dry_run_keeps_existing_policy_file() {
    let dir = project(false);
    let policy_path = dir.path().join(".snyk");
    std::fs::write(&policy_path, PRIOR_POLICY).unwrap();
    let mtime_before = std::fs::metadata(&policy_path).unwrap().modified().unwrap();

    let mut opts = options(&dir);
    opts.dry_run = true;
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", false)]),
        true,
        json!({ "npm:ms:20170412": "ignore", "npm:ms:20170412-reason": "later" }),
        Arc::new(RecordingRunner::default()),
        RecordingMonitor::default(),
    );

    let outcome = run_wizard(&opts, &mut c).await.unwrap();
    assert!(matches!(outcome, WizardOutcome::DryRun { .. }));
    assert!(outcome.text().contains("npm:ms:20170412"));

    assert_eq!(std::fs::read_to_string(&policy_path).unwrap(), PRIOR_POLICY);
    assert_eq!(std::fs::metadata(&policy_path).unwrap().modified().unwrap(), mtime_before);
}

#[tokio::test]
async fn test_live_run_keeps_untouched_rules_on_disk() {
    let dir = project(false);
    let policy_path = dir.path().join(".snyk");
    std::fs::write(&policy_path, PRIOR_POLICY).unwrap();
    let before = PolicyRecord::parse(PRIOR_POLICY).unwrap();

    let mut opts = options(&dir);
    opts.skip_monitor = true;
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", false)]),
        true,
        json!({
            "npm:ms:20170412": "ignore",
            "npm:ms:20170412-reason": "not reachable",
            "misc-add-test": false,
        }),
        Arc::new(RecordingRunner::default()),
        RecordingMonitor::default(),
    );

    let outcome = run_wizard(&opts, &mut c).await.unwrap();
    assert!(outcome.text().contains("successfully updated"));

    let saved = PolicyRecord::parse(&std::fs::read_to_string(&policy_path).unwrap()).unwrap();
    assert_eq!(saved.ignore["npm:old:20160101"], before.ignore["npm:old:20160101"]);
    assert_eq!(
        saved.ignore["npm:old:20160101"][0].meta.extra["source"],
        serde_yaml::Value::from("api")
    );
    assert_eq!(saved.extra["exclude"], before.extra["exclude"]);
    assert_eq!(saved.ignore["npm:ms:20170412"].len(), 1);
}

#[tokio::test]
async fn test_token_entered_at_prompt_continues_run() {
    let dir = project(false);
    let mut opts = options(&dir);
    opts.dry_run = true;
    let mut c = collaborators(
        scan_with(vec![finding("npm:ms:20170412", true)]),
        false,
        json!({ "misc-auth-token": "t0k", "npm:ms:20170412": "update" }),
        Arc::new(RecordingRunner::default()),
        RecordingMonitor::default(),
    );

    let outcome = run_wizard(&opts, &mut c).await.unwrap();
    assert!(matches!(outcome, WizardOutcome::DryRun { .. }));
}

