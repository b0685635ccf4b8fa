//! Escaping of caller-controlled text before it is embedded in SOQL or SOSL
//!
//! Every string literal that reaches query text goes through one of these
//! functions. Field and object names never do: those come from the fixed
//! catalog and are checked separately.

/// Escape a value for use inside a single-quoted SOQL string literal.
pub fn escape_soql(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        push_soql_char(&mut escaped, c);
    }
    escaped
}

/// Escape a value for use as the operand of a SOQL `LIKE`.
///
/// Same as [`escape_soql`], plus the `%` and `_` wildcards so the caller's text
/// is matched literally.
pub fn escape_soql_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("\\%"),
            '_' => escaped.push_str("\\_"),
            other => push_soql_char(&mut escaped, other),
        }
    }
    escaped
}

fn push_soql_char(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\'' => out.push_str("\\'"),
        '"' => out.push_str("\\\""),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        other => out.push(other),
    }
}

/// Characters with meaning inside a SOSL `FIND {...}` clause
const SOSL_RESERVED: &[char] = &[
    '?', '&', '|', '!', '{', '}', '[', ']', '(', ')', '^', '~', '*', ':', '\\', '"', '\'', '+', '-',
];

/// Escape a search term for a SOSL `FIND {...}` clause.
///
/// Reserved characters are backslash-escaped; line breaks and tabs collapse to
/// a single space because SOSL terms cannot span lines.
pub fn escape_sosl(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 8);
    for c in term.chars() {
        if SOSL_RESERVED.contains(&c) {
            escaped.push('\\');
            escaped.push(c);
        } else if c.is_control() {
            if !escaped.ends_with(' ') {
                escaped.push(' ');
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// True if some quote in `text` is preceded by an even number of backslashes.
    fn has_unescaped_quote(text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        chars.iter().enumerate().any(|(i, c)| {
            if *c != '\'' {
                return false;
            }
            let backslashes = chars[..i].iter().rev().take_while(|c| **c == '\\').count();
            backslashes % 2 == 0
        })
    }

    #[test]
    fn test_escape_quotes_and_backslashes() {
        assert_eq!(escape_soql("O'Brien"), "O\\'Brien");
        assert_eq!(escape_soql("a\\b"), "a\\\\b");
        assert_eq!(escape_soql("\\'"), "\\\\\\'");
        assert_eq!(escape_soql("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape_soql("line1\nline2\tx"), "line1\\nline2\\tx");
    }

    #[test]
    fn test_like_escapes_wildcards() {
        assert_eq!(escape_soql_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_soql_like("O'Neil"), "O\\'Neil");
    }

    #[test]
    fn test_sosl_escaping() {
        assert_eq!(escape_sosl("Acme"), "Acme");
        assert_eq!(escape_sosl("a-b"), "a\\-b");
        assert_eq!(escape_sosl("x} RETURNING User(Id"), "x\\} RETURNING User\\(Id");
        assert_eq!(escape_sosl("it's"), "it\\'s");
        assert_eq!(escape_sosl("one\n\ntwo"), "one two");
    }

    #[test]
    fn test_injection_attempt_stays_inside_literal() {
        let escaped = escape_soql("x' OR Name != '");
        assert!(!has_unescaped_quote(&escaped));
    }

    proptest! {
        #[test]
        fn prop_soql_never_leaves_unescaped_quote(value in ".*") {
            prop_assert!(!has_unescaped_quote(&escape_soql(&value)));
        }

        #[test]
        fn prop_like_never_leaves_unescaped_quote(value in ".*") {
            prop_assert!(!has_unescaped_quote(&escape_soql_like(&value)));
        }

        #[test]
        fn prop_sosl_never_leaves_unescaped_brace(value in ".*") {
            let escaped = escape_sosl(&value);
            let chars: Vec<char> = escaped.chars().collect();
            for (i, c) in chars.iter().enumerate() {
                if *c == '}' || *c == '\'' {
                    let backslashes = chars[..i].iter().rev().take_while(|c| **c == '\\').count();
                    prop_assert!(backslashes % 2 == 1);
                }
            }
        }
    }
}
