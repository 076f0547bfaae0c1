//! Terminal styling
//!
//! Styling uses the [Colored crate](https://docs.rs/colored/latest/colored/),
//!     but only when the `color` Cargo feature is enabled.
//! Without the feature [paint] returns its input unchanged, so callers never
//!     need to branch on the feature themselves:
//!
//! ```
//! use sgml_stdext::color::{paint, Style};
//! println!["{}: {}", paint("Error", Style::Error), paint("bad", Style::Bold)];
//! ```

/// The handful of styles used when printing diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Bold,
    Error,
    Warning,
    Context,
    Margin,
}

/// Apply a style to some text.
#[cfg(feature = "color")]
pub fn paint<S: AsRef<str>>(text: S, style: Style) -> String {
    use colored::Colorize;
    let text = text.as_ref();
    match style {
        Style::Bold => text.bold(),
        Style::Error => text.bright_red().bold(),
        Style::Warning => text.bright_yellow().bold(),
        Style::Context => text.yellow(),
        Style::Margin => text.bright_cyan(),
    }
    .to_string()
}

/// Apply a style to some text.
#[cfg(not(feature = "color"))]
pub fn paint<S: AsRef<str>>(text: S, _style: Style) -> String {
    text.as_ref().to_string()
}
