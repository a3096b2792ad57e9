use std::borrow::Cow;

/// Makes user text safe to print: control characters (ESC included) could
/// otherwise drive the terminal, so they are replaced before rendering.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '\t' | '\n' | '\r' => ' ',
                c if c.is_control() => char::REPLACEMENT_CHARACTER,
                c => c,
            })
            .collect(),
    )
}

/// Fixed-width bar for a fraction in `0.0..=1.0`.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(sanitize("Buy milk <b>"), Cow::Borrowed("Buy milk <b>")));
    }

    #[test]
    fn escape_sequences_are_neutralised() {
        let clean = sanitize("\u{1b}[2Jwiped\tout\n");
        assert!(!clean.contains('\u{1b}'));
        assert_eq!(clean, "\u{fffd}[2Jwiped out ");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(1.0, 4), "████");
        assert_eq!(progress_bar(3.0, 4), "████");
    }
}
