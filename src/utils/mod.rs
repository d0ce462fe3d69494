//! Small shared helpers.

use std::sync::OnceLock;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

static WARNED: OnceLock<Mutex<FxHashSet<String>>> = OnceLock::new();

/// Logs a warning at most once per `key` for the process lifetime.
/// Degraded-path warnings fire every frame otherwise.
pub fn warn_once(key: &str, message: &str) {
    let warned = WARNED.get_or_init(|| Mutex::new(FxHashSet::default()));
    let mut warned = warned.lock();
    if warned.insert(key.to_string()) {
        log::warn!("{message}");
    }
}

/// Extracts the source lines around `line` (1-based) with line numbers
/// and a marker, for shader compile diagnostics.
#[must_use]
pub fn shader_error_context(code: &str, line: u32, radius: u32) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let line = (line.max(1) as usize).min(lines.len().max(1));
    let from = line.saturating_sub(radius as usize + 1);
    let to = (line + radius as usize).min(lines.len());
    let mut out = String::new();
    for (i, text) in lines[from..to].iter().enumerate() {
        let number = from + i + 1;
        let marker = if number == line { ">" } else { " " };
        out.push_str(&format!("{marker}{number:4}: {text}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::shader_error_context;

    #[test]
    fn error_context_marks_the_failing_line() {
        let code = "a\nb\nc\nd\ne";
        let context = shader_error_context(code, 3, 1);
        assert!(context.contains(">   3: c"));
        assert!(context.contains("    2: b"));
        assert!(context.contains("    4: d"));
        assert!(!context.contains("a\n"));
    }

    #[test]
    fn error_context_clamps_to_source_bounds() {
        let code = "only";
        let context = shader_error_context(code, 40, 2);
        assert_eq!(context.lines().count(), 1);
    }
}
