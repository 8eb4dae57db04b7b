use console::style;

use super::record::{PathRule, PolicyRecord};

/// Human-readable rendering of a policy, as shown by `policy` and by dry runs.
pub fn display(policy: &PolicyRecord) -> String {
    let filename = policy
        .filename
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unsaved)".to_string());
    let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.to_rfc2822()).unwrap_or_else(|| "never".to_string())
    };

    let mut res = format!(
        "{}\n",
        style(format!("Current policy, read from {} file", filename)).bold()
    );
    res.push_str(&format!("Modified: {}\n", stamp(policy.modified)));
    res.push_str(&format!("Created:  {}\n", stamp(policy.created)));

    let patches = render_rules("Patch vulnerability", policy.patch.iter());
    let ignores = render_rules("Ignore", policy.ignore.iter());
    res.push_str(&patches.join("\n"));
    if !patches.is_empty() && !ignores.is_empty() {
        res.push_str("\n\n------------------------\n");
    }
    res.push_str(&ignores.join("\n"));
    res
}

fn render_rules<'a>(
    title: &str,
    rules: impl Iterator<Item = (&'a String, &'a Vec<PathRule>)>,
) -> Vec<String> {
    rules
        .enumerate()
        .map(|(i, (id, paths))| {
            let body: String = paths.iter().map(render_path).collect();
            format!(
                "{} in the following paths:\n{}",
                style(format!("\n#{} {} {}", i + 1, title, vuln_url(id))).bold(),
                body.trim_end()
            )
        })
        .collect()
}

fn render_path(rule: &PathRule) -> String {
    let mut out = rule.path.clone();
    if let Some(reason) = &rule.meta.reason {
        out.push_str(&format!("\nReason: {}", reason));
        if let Some(expires) = rule.meta.expires {
            out.push_str(&format!("\nExpires: {}", expires.to_rfc2822()));
        }
        out.push('\n');
    }
    out.push('\n');
    out
}

fn vuln_url(id: &str) -> String {
    format!("https://snyk.io/vuln/{}", id)
}
