use super::StageReport;

/// Stack scan over raw characters. Parentheses inside quoted values are
/// text, not structure, so quote state is tracked the same way the
/// tokenizer pairs quotes.
pub(crate) fn check(text: &str) -> StageReport {
    let mut report = StageReport::default();
    let mut open: Vec<usize> = Vec::new();
    let mut quote: Option<char> = None;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => open.push(i),
            (None, ')') => {
                if open.pop().is_none() {
                    report.error_at(i, i + 1, "Unmatched closing parenthesis".to_string());
                }
            }
            (None, _) => {}
        }
    }

    for i in open {
        report.error_at(i, i + 1, "Unclosed opening parenthesis".to_string());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(text: &str) -> Vec<(usize, String)> {
        check(text)
            .highlights
            .into_iter()
            .map(|h| (h.start, h.message))
            .collect()
    }

    #[test]
    fn test_unclosed_open() {
        assert_eq!(
            starts("(a AND b"),
            vec![(0, "Unclosed opening parenthesis".to_string())]
        );
    }

    #[test]
    fn test_unmatched_close() {
        assert_eq!(
            starts("a AND b)"),
            vec![(7, "Unmatched closing parenthesis".to_string())]
        );
    }

    #[test]
    fn test_each_offender_is_reported_at_its_position() {
        let found = starts(") (( )");
        assert_eq!(
            found,
            vec![
                (0, "Unmatched closing parenthesis".to_string()),
                (2, "Unclosed opening parenthesis".to_string()),
            ]
        );
    }

    #[test]
    fn test_parentheses_inside_quotes_are_ignored() {
        assert!(check(r#"a equals "Sports (HD" AND b equals ')'"#).check.valid);
    }

    #[test]
    fn test_works_on_unparseable_input() {
        assert_eq!(starts("@@ ( ## ((")[0].0, 3);
        assert_eq!(check("@@ ( ## ((").check.errors.len(), 3);
    }
}
