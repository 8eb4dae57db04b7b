use chrono::{DateTime, Utc};
use tracing::debug;

use crate::package_manager::PackageManagerKind;
use crate::remediation::RemediationTasks;
use super::record::PolicyRecord;

/// Upgrades to install; produced by `update` tasks instead of policy rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub manager: PackageManagerKind,
    pub packages: Vec<String>,
    pub live: bool,
}

impl InstallPlan {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub policy: PolicyRecord,
    pub install: InstallPlan,
}

/// Merge the patch and ignore tasks into `prior`. Rules for findings not in
/// `tasks` are left exactly as they were. Performs no I/O; the result is the
/// same whether or not the run is live.
pub fn synthesize(
    prior: PolicyRecord,
    tasks: &RemediationTasks,
    live: bool,
    manager: PackageManagerKind,
    now: DateTime<Utc>,
) -> Synthesis {
    let mut policy = prior;

    for task in &tasks.patch {
        policy.add_patch(&task.finding.id, &task.policy_path(), now);
    }

    for task in &tasks.ignore {
        policy.add_ignore(
            &task.finding.id,
            &task.policy_path(),
            task.decision.reason.clone(),
            task.decision.expires,
            now,
        );
    }

    let mut packages: Vec<String> = Vec::new();
    for task in &tasks.update {
        if let Some(target) = task.finding.upgrade_target() {
            if !packages.iter().any(|p| p == target) {
                packages.push(target.to_string());
            }
        }
    }

    debug!(
        patches = tasks.patch.len(),
        ignores = tasks.ignore.len(),
        upgrades = packages.len(),
        live,
        "Policy synthesized"
    );

    Synthesis {
        policy,
        install: InstallPlan {
            manager,
            packages,
            live,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Answers, Decision, Finding};
    use crate::remediation::answers_to_tasks;
    use chrono::TimeZone;

    fn finding(id: &str, via: &str, target: Option<&str>) -> Finding {
        Finding {
            id: id.to_string(),
            title: String::new(),
            severity: Default::default(),
            package_name: "pkg".into(),
            version: "1.0.0".into(),
            from: vec!["app@1.0.0".into(), via.into()],
            upgrade_path: vec![None, target.map(str::to_string)],
            is_upgradable: target.is_some(),
            is_patchable: true,
            patches: vec![],
            grouped: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_untouched_rules_preserved() {
        let mut prior = PolicyRecord::create();
        let earlier = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        prior.add_ignore("old", "x@1.0.0", Some("legacy".into()), None, earlier);
        prior.add_patch("old-patch", "y@1.0.0", earlier);
        let before = prior.clone();

        let mut answers = Answers::new();
        answers.insert(finding("new", "a@1.0.0", None), Decision::new(Action::Patch));
        let result = synthesize(prior, &answers_to_tasks(answers), false, PackageManagerKind::Npm, now());

        assert_eq!(result.policy.ignore["old"], before.ignore["old"]);
        assert_eq!(result.policy.patch["old-patch"], before.patch["old-patch"]);
        assert_eq!(result.policy.patch["new"][0].meta.patched, Some(now()));
    }

    #[test]
    fn test_ignore_rule_carries_reason_and_expiry() {
        let expires = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let mut answers = Answers::new();
        answers.insert(
            finding("v1", "a@1.0.0", None),
            Decision::ignore(Some("not reachable".into()), Some(expires)),
        );
        let result = synthesize(PolicyRecord::create(), &answers_to_tasks(answers), true, PackageManagerKind::Npm, now());
        let rule = &result.policy.ignore["v1"][0];
        assert_eq!(rule.path, "a@1.0.0");
        assert_eq!(rule.meta.reason.as_deref(), Some("not reachable"));
        assert_eq!(rule.meta.expires, Some(expires));
        assert!(result.install.is_empty());
    }

    #[test]
    fn test_updates_become_install_plan_not_rules() {
        let mut answers = Answers::new();
        answers.insert(finding("v1", "a@1.0.0", Some("a@2.0.0")), Decision::new(Action::Update));
        answers.insert(finding("v2", "a@1.0.0", Some("a@2.0.0")), Decision::new(Action::Update));
        let result = synthesize(PolicyRecord::create(), &answers_to_tasks(answers), true, PackageManagerKind::Yarn, now());
        assert!(result.policy.is_empty());
        assert_eq!(result.install.packages, vec!["a@2.0.0".to_string()]);
        assert_eq!(result.install.manager, PackageManagerKind::Yarn);
        assert!(result.install.live);
    }

    #[test]
    fn test_dry_run_and_live_policies_match() {
        let build = |live| {
            let mut answers = Answers::new();
            answers.insert(finding("v1", "a@1.0.0", None), Decision::new(Action::Patch));
            synthesize(PolicyRecord::create(), &answers_to_tasks(answers), live, PackageManagerKind::Npm, now())
        };
        assert_eq!(build(false).policy.patch, build(true).policy.patch);
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let text = r#"version: v1.25.0
ignore:
  'npm:ms:20170412':
    - 'debug@2.2.0 > ms@0.7.1':
        reason: vendor review
        expires: '2030-01-01T00:00:00Z'
        source: api
        reasonType: wont-fix
        ignoredBy:
          email: dev@example.test
exclude:
  global:
    - vendor/**
"#;
        let prior = PolicyRecord::parse(text).unwrap();
        let before = prior.ignore["npm:ms:20170412"].clone();

        let mut answers = Answers::new();
        answers.insert(finding("other", "a@1.0.0", None), Decision::new(Action::Patch));
        let result = synthesize(prior, &answers_to_tasks(answers), true, PackageManagerKind::Npm, now());

        let saved = PolicyRecord::parse(&result.policy.to_yaml().unwrap()).unwrap();
        let rule = &saved.ignore["npm:ms:20170412"][0];
        assert_eq!(saved.ignore["npm:ms:20170412"], before);
        assert_eq!(rule.meta.extra["source"], serde_yaml::Value::from("api"));
        assert_eq!(rule.meta.extra["ignoredBy"]["email"], serde_yaml::Value::from("dev@example.test"));
        assert!(saved.extra.contains_key("exclude"));
        assert_eq!(saved.patch["other"].len(), 1);
    }
}
