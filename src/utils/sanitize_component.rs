// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Produce filesystem-safe path components shared across the app.

/// Produce a filesystem-safe path component.
///
/// # Steps
/// - Transliterate Unicode to ASCII with `deunicode` (e.g., "Å" → "A").
/// - Allow ASCII alphanumerics plus `-`, `_`, and `.`; treat other characters as `_`.
/// - Collapse runs of `_` and `.`; trim leading/trailing `_` and trailing dots.
/// - Guard against reserved/empty names, falling back to `meal`.
///
/// Meal names like "Mum's lasagne (v2)" become `Mum_s_lasagne_v2`, which is
/// safe to use as a file stem on Windows and Unix.
pub fn sanitize_component(value: &str) -> String {
    // Step 1: transliterate to ASCII to avoid multi-byte surprises.
    let transliterated = deunicode::deunicode(value);
    let mut out = String::with_capacity(transliterated.len());
    let mut last: Option<char> = None;

    // Step 2: map characters into the allowed set and collapse runs of `_` and `.`.
    for ch in transliterated.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            ch
        } else {
            '_'
        };

        match mapped {
            '_' => {
                if last != Some('_') {
                    out.push('_');
                    last = Some('_');
                }
            }
            '.' => {
                if last != Some('.') {
                    out.push('.');
                    last = Some('.');
                }
            }
            c => {
                out.push(c);
                last = Some(c);
            }
        }
    }

    // Additional cleanup: avoid a stray underscore immediately before a dot.
    while let Some(pos) = out.find("_.") {
        out.remove(pos);
    }

    // Trim trailing dots which can be problematic on Windows, and separators
    // left over from surrounding punctuation or whitespace.
    while out.ends_with('.') || out.ends_with('_') {
        out.pop();
    }
    while out.starts_with('_') {
        out.remove(0);
    }

    if out.is_empty() || out == "." || out == ".." {
        return "meal".to_string();
    }

    // Protect against Windows reserved device names for the basename.
    let (basename, ext) = match out.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base.to_string(), Some(ext.to_string())),
        _ => (out.clone(), None),
    };

    let upper = basename.to_ascii_uppercase();
    let is_reserved = matches!(
        upper.as_str(),
        "CON"
            | "PRN"
            | "AUX"
            | "NUL"
            | "COM1"
            | "COM2"
            | "COM3"
            | "COM4"
            | "COM5"
            | "COM6"
            | "COM7"
            | "COM8"
            | "COM9"
            | "LPT1"
            | "LPT2"
            | "LPT3"
            | "LPT4"
            | "LPT5"
            | "LPT6"
            | "LPT7"
            | "LPT8"
            | "LPT9"
    );

    if is_reserved {
        let mut new_base = basename;
        new_base.push('_');
        out = if let Some(ext) = ext {
            format!("{new_base}.{ext}")
        } else {
            new_base
        };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::sanitize_component;

    #[test]
    fn sanitize_component_transliterates_accents() {
        assert_eq!(sanitize_component("Crème brûlée"), "Creme_brulee");
    }

    #[test]
    fn sanitize_component_drops_surrounding_punctuation() {
        assert_eq!(sanitize_component("Mum's lasagne (v2)"), "Mum_s_lasagne_v2");
        assert_eq!(sanitize_component("  Soup!  "), "Soup");
    }

    #[test]
    fn sanitize_component_deduplicates_dots_and_trims_trailing_ones() {
        assert_eq!(sanitize_component("stew..v1..."), "stew.v1");
    }

    #[test]
    fn sanitize_component_appends_suffix_for_windows_reserved_basenames() {
        assert_eq!(sanitize_component("CON"), "CON_");
        assert_eq!(sanitize_component("aux.html"), "aux_.html");
    }

    #[test]
    fn sanitize_component_falls_back_for_blank_names() {
        assert_eq!(sanitize_component("..."), "meal");
        assert_eq!(sanitize_component("   "), "meal");
        assert_eq!(sanitize_component(""), "meal");
    }
}
