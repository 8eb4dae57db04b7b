use serde_json::Value;

use crate::package_manager::PackageManagerKind;
use super::document::Scripts;

pub const NO_TEST_PLACEHOLDER: &str = "echo \"Error: no test specified\" && exit 1";

/// Prefix `cmd` onto an existing script unless it is already there.
fn prepend_command(existing: Option<&str>, cmd: &str, separator: &str) -> String {
    match existing {
        Some(content) if !content.is_empty() => {
            if content.contains(cmd) {
                content.to_string()
            } else {
                format!("{}{}{}", cmd, separator, content)
            }
        }
        _ => cmd.to_string(),
    }
}

fn get<'a>(scripts: &'a Scripts, name: &str) -> Option<&'a str> {
    scripts.get(name).and_then(Value::as_str)
}

fn major_version(version: &str) -> Option<u64> {
    version.trim().trim_start_matches('v').split('.').next()?.parse().ok()
}

/// Ensure `<tool>-protect` exists and is hooked into the install lifecycle.
///
/// yarn and npm >= 5 run `prepare` after install; older npm only runs
/// `prepublish`. A legacy `postinstall` hook is neutralised to `true`.
pub fn add_protect_scripts(
    existing: &Scripts,
    manager_version: &str,
    manager: PackageManagerKind,
    tool: &str,
) -> Scripts {
    let mut scripts = existing.clone();
    let script_name = format!("{}-protect", tool);
    scripts.insert(script_name.clone(), Value::String(format!("{} protect", tool)));

    let legacy_cmd = format!("npm run {}", script_name);
    if let Some(postinstall) = get(&scripts, "postinstall") {
        if postinstall.contains(&legacy_cmd) {
            let neutralised = postinstall.replacen(&legacy_cmd, "true", 1);
            scripts.insert("postinstall".to_string(), Value::String(neutralised));
        }
    }

    let hook = match manager {
        PackageManagerKind::Yarn => "prepare",
        PackageManagerKind::Npm => match major_version(manager_version) {
            Some(major) if major >= 5 => "prepare",
            _ => "prepublish",
        },
    };
    let cmd = format!("{} run {}", manager.command(), script_name);
    let content = prepend_command(get(&scripts, hook), &cmd, "; ");
    scripts.insert(hook.to_string(), Value::String(content));
    scripts
}

/// Run `<tool> test` as part of the test script. The npm placeholder is
/// replaced outright.
pub fn add_test_script(existing: &Scripts, tool: &str) -> Scripts {
    let mut scripts = existing.clone();
    let cmd = format!("{} test", tool);
    let content = match get(&scripts, "test") {
        Some(test) if test != NO_TEST_PLACEHOLDER => prepend_command(Some(test), &cmd, " && "),
        _ => cmd,
    };
    scripts.insert("test".to_string(), Value::String(content));
    scripts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripts(pairs: &[(&str, &str)]) -> Scripts {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn test_npm_5_uses_prepare() {
        let out = add_protect_scripts(&Scripts::new(), "5.0.0", PackageManagerKind::Npm, "snyk");
        assert_eq!(get(&out, "prepare"), Some("npm run snyk-protect"));
        assert_eq!(get(&out, "prepublish"), None);
        assert_eq!(get(&out, "snyk-protect"), Some("snyk protect"));
    }

    #[test]
    fn test_npm_4_uses_prepublish() {
        let out = add_protect_scripts(&Scripts::new(), "4.9.9", PackageManagerKind::Npm, "snyk");
        assert_eq!(get(&out, "prepublish"), Some("npm run snyk-protect"));
        assert_eq!(get(&out, "prepare"), None);
    }

    #[test]
    fn test_yarn_always_prepare() {
        for version in ["1.22.0", "0.1.0", "garbage"] {
            let out = add_protect_scripts(&Scripts::new(), version, PackageManagerKind::Yarn, "snyk");
            assert_eq!(get(&out, "prepare"), Some("yarn run snyk-protect"));
        }
    }

    #[test]
    fn test_npm_version_with_newline() {
        let out = add_protect_scripts(&Scripts::new(), "6.14.4\n", PackageManagerKind::Npm, "snyk");
        assert_eq!(get(&out, "prepare"), Some("npm run snyk-protect"));
    }

    #[test]
    fn test_prefixes_existing_hook() {
        let existing = scripts(&[("prepare", "npm run build")]);
        let out = add_protect_scripts(&existing, "6.0.0", PackageManagerKind::Npm, "snyk");
        assert_eq!(get(&out, "prepare"), Some("npm run snyk-protect; npm run build"));
    }

    #[test]
    fn test_protect_injection_idempotent() {
        let existing = scripts(&[("prepare", "npm run build"), ("test", "mocha")]);
        let once = add_protect_scripts(&existing, "6.0.0", PackageManagerKind::Npm, "snyk");
        let twice = add_protect_scripts(&once, "6.0.0", PackageManagerKind::Npm, "snyk");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_legacy_postinstall_neutralised() {
        let existing = scripts(&[("postinstall", "npm run snyk-protect && node setup.js")]);
        let out = add_protect_scripts(&existing, "6.0.0", PackageManagerKind::Npm, "snyk");
        assert_eq!(get(&out, "postinstall"), Some("true && node setup.js"));
        assert_eq!(get(&out, "prepare"), Some("npm run snyk-protect"));
    }

    #[test]
    fn test_test_script_replaces_placeholder() {
        let existing = scripts(&[("test", NO_TEST_PLACEHOLDER)]);
        assert_eq!(get(&add_test_script(&existing, "snyk"), "test"), Some("snyk test"));
    }

    #[test]
    fn test_test_script_prefixes_once() {
        let existing = scripts(&[("test", "mocha")]);
        let once = add_test_script(&existing, "snyk");
        assert_eq!(get(&once, "test"), Some("snyk test && mocha"));
        assert_eq!(add_test_script(&once, "snyk"), once);
    }

    #[test]
    fn test_test_script_added_when_missing() {
        assert_eq!(get(&add_test_script(&Scripts::new(), "snyk"), "test"), Some("snyk test"));
    }
}
