use console::style;

use crate::policy::{display, PolicyRecord};
use crate::services::MonitorResult;

pub const DRY_RUN_NOTICE: &str = "This was a dry run: nothing changed";

/// Closing text after a live run.
pub fn applied_summary(
    new_policy: bool,
    policy_file: &str,
    tool: &str,
    app_url: &str,
    monitor: Option<&MonitorResult>,
) -> String {
    let mut out = String::new();
    if new_policy {
        out.push_str(&format!(
            "\nYour policy file has been created with the actions you've selected, \
             add it to your source control (`git add {}`).",
            policy_file
        ));
    } else {
        out.push_str(&format!(
            "\nYour {} policy file has been successfully updated.",
            policy_file
        ));
    }
    out.push_str(&format!("\nTo review your policy, run `{} policy`.\n\n", tool));

    let Some(result) = monitor else {
        return out;
    };

    let leader = result
        .org
        .as_deref()
        .map(|org| format!("/org/{}", org))
        .unwrap_or_default();
    let base = app_url.trim_end_matches('/');
    let monitor_url = format!("{}{}/monitor/{}", base, leader, result.id);
    let manage_url = format!("{}{}/manage", base, leader);

    out.push_str(&format!(
        "You can see a snapshot of your dependencies here:\n{}\n\n",
        monitor_url
    ));
    if result.is_monitored {
        out.push_str("We'll notify you when relevant new vulnerabilities are disclosed.\n\n");
    } else {
        out.push_str(&format!(
            "{}\n",
            style(format!(
                "Project is inactive, so notifications are turned off.\nActivate this project here: {}",
                manage_url
            ))
            .red()
            .bold()
        ));
    }
    if result.trial_started {
        out.push_str(&format!(
            "{}\n\n",
            style(format!(
                "You're over the free plan usage limit, \nand are now on a free 14-day premium trial.\nView plans here: {}",
                manage_url
            ))
            .yellow()
        ));
    }
    out
}

/// Closing text after a dry run: the policy that would have been written.
pub fn dry_run_summary(policy: &PolicyRecord) -> String {
    format!("{}\n\n{}", display(policy), DRY_RUN_NOTICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitored(org: Option<&str>, active: bool, trial: bool) -> MonitorResult {
        MonitorResult {
            id: "abc-123".into(),
            org: org.map(str::to_string),
            is_monitored: active,
            trial_started: trial,
        }
    }

    #[test]
    fn test_new_policy_text() {
        console::set_colors_enabled(false);
        let text = applied_summary(true, ".snyk", "snyk", "https://snyk.io", None);
        assert!(text.contains("add it to your source control (`git add .snyk`)"));
        assert!(text.contains("run `snyk policy`"));
        assert!(!text.contains("snapshot"));
    }

    #[test]
    fn test_updated_policy_with_org() {
        console::set_colors_enabled(false);
        let result = monitored(Some("acme"), true, false);
        let text = applied_summary(false, ".snyk", "snyk", "https://snyk.io/", Some(&result));
        assert!(text.contains("successfully updated"));
        assert!(text.contains("https://snyk.io/org/acme/monitor/abc-123"));
        assert!(text.contains("We'll notify you"));
    }

    #[test]
    fn test_inactive_and_trial_notices() {
        console::set_colors_enabled(false);
        let result = monitored(None, false, true);
        let text = applied_summary(false, ".snyk", "snyk", "https://snyk.io", Some(&result));
        assert!(text.contains("https://snyk.io/monitor/abc-123"));
        assert!(text.contains("Activate this project here: https://snyk.io/manage"));
        assert!(text.contains("14-day premium trial"));
    }

    #[test]
    fn test_dry_run_summary_ends_with_notice() {
        console::set_colors_enabled(false);
        let text = dry_run_summary(&PolicyRecord::create());
        assert!(text.ends_with(DRY_RUN_NOTICE));
    }
}
