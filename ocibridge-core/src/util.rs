use std::borrow::Cow;

/// Truncates long SQL text for error messages and logs.
#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Largest char boundary of `value` not greater than `index`.
pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    let mut index = index;
    while !value.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub fn consume_while<'s>(input: &mut &'s str, predicate: impl FnMut(&char) -> bool) -> &'s str {
    let len = input
        .chars()
        .take_while(predicate)
        .map(char::len_utf8)
        .sum::<usize>();
    if len == 0 {
        return "";
    }
    let result = &input[..len];
    *input = &input[len..];
    result
}

/// Escapes the characters that are significant in HTML, quotes included.
pub fn html_escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut result = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Case insensitive substring search (ASCII folding, as SQL identifiers are).
pub fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape() {
        assert_eq!(html_escape("plain"), "plain");
        assert_eq!(
            html_escape(r#"Error <b>"x"</b> & 'y'"#),
            "Error &lt;b&gt;&quot;x&quot;&lt;/b&gt; &amp; &#039;y&#039;"
        );
    }

    #[test]
    fn consume() {
        let mut input = "driver:rest";
        assert_eq!(consume_while(&mut input, |c| *c != ':'), "driver");
        assert_eq!(input, ":rest");
        assert_eq!(consume_while(&mut input, |c| c.is_alphabetic()), "");
    }

    #[test]
    fn truncate() {
        let long = "x".repeat(600);
        let short = format!("{}", truncate_long!(long));
        assert_eq!(short.len(), 500);
        assert!(short.ends_with("..."));
        assert_eq!(format!("{}", truncate_long!("SELECT 1")), "SELECT 1");
    }

    #[test]
    fn ignore_case() {
        assert!(contains_ignore_ascii_case("select * from t where id = :ID", ":id"));
        assert!(!contains_ignore_ascii_case("select 1 from dual", ":id"));
    }
}
