use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// A labelled spinner that clears itself when dropped, so an early `?`
/// return never leaves it on screen.
pub struct ProgressScope {
    bar: ProgressBar,
}

impl ProgressScope {
    pub fn start(label: impl Into<String>, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        };
        bar.set_message(label.into());
        Self { bar }
    }
}

impl Drop for ProgressScope {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_inside_scope(seen: &mut Option<ProgressBar>) -> Result<(), String> {
        let scope = ProgressScope::start("Working...", false);
        *seen = Some(scope.bar.clone());
        "not a number".parse::<u32>().map_err(|e| e.to_string())?;
        Ok(())
    }

    #[test]
    fn test_cleared_on_drop() {
        let scope = ProgressScope::start("Updating package.json...", false);
        assert!(!scope.bar.is_finished());
        assert_eq!(scope.bar.message(), "Updating package.json...");
        let bar = scope.bar.clone();
        drop(scope);
        assert!(bar.is_finished());
    }

    #[test]
    fn test_cleared_on_error_path() {
        let mut seen = None;
        assert!(fails_inside_scope(&mut seen).is_err());
        assert!(seen.unwrap().is_finished());
    }
}
