//! Normalization of raw generated text into a bounded single-line message.

/// Maximum characters kept in a sanitized message.
pub const MAX_MESSAGE_CHARS: usize = 200;

pub(crate) fn is_line_separator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// Unicode format characters (category Cf): bidi controls, zero-width marks, BOM.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

fn is_printable(c: char) -> bool {
    !c.is_control() && !is_format_char(c)
}

/// Normalize raw text into a safe single-line message.
///
/// Steps, in order: normalize line separators, keep the first line, strip
/// non-printable characters, truncate to [`MAX_MESSAGE_CHARS`], trim.
/// Returns `None` if nothing is left; callers must treat that as a
/// generation failure.
///
/// Idempotent: `sanitize(&sanitize(x)?) == sanitize(x)`.
pub fn sanitize(raw: &str) -> Option<String> {
    // "\r\n" collapses to one separator; only the first line survives anyway.
    let first_line = raw.split(is_line_separator).next().unwrap_or("");

    let printable: String = first_line.chars().filter(|c| is_printable(*c)).collect();
    let truncated: String = printable.chars().take(MAX_MESSAGE_CHARS).collect();
    let trimmed = truncated.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Remove quoting and code-fence markup the model was asked not to add.
///
/// Drops code-fence lines, then every remaining backtick and double quote,
/// then trims, so a fenced reply reduces to its content line.
pub fn strip_markup(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .chars()
        .filter(|c| *c != '`' && *c != '"')
        .collect::<String>()
        .trim()
        .to_string()
}

/// `strip_markup` followed by `sanitize`.
pub fn clean_reply(raw: &str) -> Option<String> {
    sanitize(&strip_markup(raw))
}
