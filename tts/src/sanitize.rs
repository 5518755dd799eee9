// Text sanitizer: everything headed for a synthesis back-end passes
// through here first. Markup, control characters and anything outside
// the supported scripts would otherwise leak into the spoken output.

const MAX_TEXT_CHARS: usize = 1000;

/// Strip markup, restrict to Thai/ASCII letters, digits and basic
/// punctuation, collapse whitespace and cap the length.
pub fn sanitize_text(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());

    // Only a bracket pair counts as markup; a lone `<` is ordinary
    // text (e.g. "ราคา < 100 บาท") and its remainder must survive.
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        push_allowed(&mut stripped, &rest[..open]);
        let tail = &rest[open..];
        match tail.find('>') {
            Some(close) => rest = &tail[close + 1..],
            None => {
                push_allowed(&mut stripped, tail);
                rest = "";
            }
        }
    }
    push_allowed(&mut stripped, rest);

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() > MAX_TEXT_CHARS {
        let head: String = collapsed.chars().take(MAX_TEXT_CHARS).collect();
        format!("{head}...")
    } else {
        collapsed
    }
}

fn push_allowed(out: &mut String, segment: &str) {
    out.extend(segment.chars().filter(|c| is_allowed(*c)));
}

fn is_allowed(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
        || c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '.' | ',' | '!' | '?' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_tags() {
        assert_eq!(sanitize_text("<b>hello</b> world"), "hello world");
        assert_eq!(sanitize_text("a <span class=\"x\">b</span>"), "a b");
    }

    #[test]
    fn unmatched_open_bracket_keeps_the_rest_of_the_text() {
        assert_eq!(sanitize_text("ราคา < 100 บาท"), "ราคา 100 บาท");
        assert_eq!(sanitize_text("a < b"), "a b");
        // A pair later in the text still strips as markup.
        assert_eq!(sanitize_text("x <b>y</b> then <unclosed"), "x y then unclosed");
    }

    #[test]
    fn keeps_thai_and_basic_punctuation() {
        assert_eq!(sanitize_text("สวัสดีครับ! ราคา 99 บาท?"), "สวัสดีครับ! ราคา 99 บาท?");
    }

    #[test]
    fn drops_emoji_and_symbols() {
        assert_eq!(sanitize_text("deal 🎉🎉 @ #1"), "deal 1");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(sanitize_text("a\n\n b\t\tc"), "a b c");
    }

    #[test]
    fn caps_length_at_one_thousand_chars() {
        let long = "ก".repeat(2000);
        let cleaned = sanitize_text(&long);
        assert_eq!(cleaned.chars().count(), MAX_TEXT_CHARS + 3);
        assert!(cleaned.ends_with("..."));
    }
}
