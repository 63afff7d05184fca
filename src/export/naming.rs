//! Output file naming

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^0-9a-zA-Z_]+").expect("valid pattern");
}

/// Replaces every run of characters other than ASCII alphanumerics and
/// underscores with a single underscore
///
/// An empty result becomes `group`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name.trim(), "_");
    if cleaned.is_empty() {
        "group".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Label for a sampling distance
///
/// Whole distances print without a decimal point, other distances print
/// as the shortest exact decimal. `None` (vertices only) gives `verts`.
pub fn distance_label(distance: Option<f64>) -> String {
    match distance {
        None => "verts".to_string(),
        Some(d) if d.is_finite() && (d - d.trunc()).abs() < 1e-9 && d.abs() < 1e15 => {
            format!("{}", d.trunc() as i64)
        },
        Some(d) => format!("{}", d),
    }
}

/// `<group>_<label>_node.<extension>` with the group sanitised
pub fn output_file_name(group: &str, label: &str, extension: &str) -> String {
    format!("{}_{}_node.{}", sanitize_name(group), label, extension)
}
