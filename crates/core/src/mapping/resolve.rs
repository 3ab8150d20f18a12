//! Field resolution chain: explicit value, then catalog code, then default.

/// Which link of the chain produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSource {
    Explicit,
    Catalog,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: CodeSource,
}

/// Resolve one outbound code.
///
/// Explicit values are sent verbatim (trimmed). Catalog codes and defaults
/// are left-zero-padded to `width` when numeric.
pub fn resolve_code(
    explicit: Option<&str>,
    catalog: Option<&str>,
    default: &str,
    width: Option<usize>,
) -> Resolved {
    let pad = |code: &str| match width {
        Some(width) => left_pad_code(code, width),
        None => code.to_string(),
    };

    if let Some(value) = non_blank(explicit) {
        return Resolved { value: value.to_string(), source: CodeSource::Explicit };
    }
    if let Some(value) = non_blank(catalog) {
        return Resolved { value: pad(value), source: CodeSource::Catalog };
    }
    Resolved { value: pad(default.trim()), source: CodeSource::Default }
}

/// Left-pad a numeric code with zeros. Non-numeric and already-wide codes
/// are returned unchanged.
pub fn left_pad_code(code: &str, width: usize) -> String {
    let code = code.trim();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return code.to_string();
    }
    format!("{code:0>width$}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
