//! Terminal capability detection and chart drawing

use owo_colors::{OwoColorize, colors::css};

/// Whether stdout accepts colour
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Width of the terminal, if known
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Narrow terminals (< 60 columns) get stacked output
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(|w| w < 60)
}

/// A horizontal bar `width` cells wide, filled to `fraction`.
///
/// Fractions outside `0..=1` (and NaN) are clamped.
pub fn bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (fraction * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Colouring for dashboard output
pub trait Colorize {
    /// Within the goal (green)
    fn success(&self) -> String;
    /// Getting close (amber)
    fn warning(&self) -> String;
    /// Over the goal (red)
    fn alert(&self) -> String;
    /// Secondary text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn alert(&self) -> String {
        if supports_color() {
            self.fg::<css::Crimson>().bold().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn alert(&self) -> String {
        self.as_str().alert()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
