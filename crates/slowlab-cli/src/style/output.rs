//! Output helper functions for consistent styled messages.

use super::colors::SemanticStyle;

/// Prints an error message with an X mark to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".error(), msg);
}

/// Warnings go to stderr so JSON output stays parseable.
pub fn print_warn(msg: &str) {
    eprintln!("{} {}", "⚠".warning(), msg);
}

/// Prints a bold section heading.
pub fn print_heading(title: &str) {
    println!("{}", title.header());
}

/// Prints an indented, dimmed line.
pub fn print_indented(line: &str) {
    println!("  {}", line.muted());
}

pub fn print_spacer() {
    println!();
}
