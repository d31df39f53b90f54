//! Minimal comma separated values support for the activity log. Only what the log needs: quoted
//! fields with doubled quotes, one record per line.

/// Quotes a field when it contains a separator or a quote. Line breaks are flattened to spaces
/// since a row must fit on one line.
pub fn escape_field(value: &str) -> String {
    let value = value.replace(['\r', '\n'], " ");
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

pub fn join_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits one line into fields. Returns `None` for an unterminated quote.
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::{escape_field, join_row, split_row};

    #[test]
    fn test_plain_fields_are_untouched() {
        assert_eq!(join_row(["a", "b c", "1.5"]), "a,b c,1.5");
        assert_eq!(split_row("a,b c,1.5").unwrap(), vec!["a", "b c", "1.5"]);
    }

    #[test]
    fn test_quoted_fields() {
        let title = r#"Say "hi", world"#;
        assert_eq!(escape_field(title), r#""Say ""hi"", world""#);

        let row = join_row(["chrome.exe", title, "3.0"]);
        assert_eq!(
            split_row(&row).unwrap(),
            vec!["chrome.exe", title, "3.0"]
        );
    }

    #[test]
    fn test_line_breaks_are_flattened() {
        assert_eq!(escape_field("one\ntwo"), "one two");
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(split_row(r#"a,"broken"#).is_none());
    }

    #[test]
    fn test_empty_trailing_field() {
        assert_eq!(split_row("a,,").unwrap(), vec!["a", "", ""]);
    }
}
