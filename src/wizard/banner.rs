use console::{style, Term};
use tui_banner::{Align, Banner, ColorMode, Fill, Gradient, GradientDirection, Palette};

const BRAND: u8 = 99; // violet
const DIM: u8 = 240;

const TAGLINE: &str = "Vulnerability remediation wizard";

const INTRO: &[&str] = &[
    "This wizard walks through every vulnerable path found in your project.",
    "For each one you can upgrade the dependency, patch it in place, or",
    "ignore it for a while with a reason that is kept in the policy file.",
    "Nothing is written until all questions are answered.",
];

/// Render the startup banner into a string. `width` is the terminal width.
pub fn render_banner(width: usize) -> String {
    let palette = Palette::from_hex(&[
        "#D7AFFF", // lilac
        "#AF87FF", // violet
        "#5F5FD7", // indigo
    ]);
    let gradient = Gradient::new(palette.colors().to_vec(), GradientDirection::Diagonal);

    let mut out = match Banner::new("PROTECT") {
        Ok(b) => b
            .gradient(gradient)
            .fill(Fill::Keep)
            .align(Align::Center)
            .trim_vertical(true)
            .color_mode(ColorMode::TrueColor)
            .width(width)
            .render(),
        // Fallback if the FIGlet font fails
        Err(_) => format!("{}\n", style("PROTECT").color256(BRAND).bold()),
    };

    let version = format!(
        "v{} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );
    out.push_str(&format!("{}\n", style(version).color256(DIM)));
    out.push_str(&format!("{}\n\n", style(TAGLINE).white().bold()));
    for line in INTRO {
        out.push_str(&format!("  {}\n", style(line).dim()));
    }
    out
}

pub fn show_banner() {
    let (_, cols) = Term::stdout().size();
    println!();
    println!("{}", render_banner(cols as usize));
}
