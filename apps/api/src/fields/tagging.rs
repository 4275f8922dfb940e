//! Token-classification helpers: windowing input text for a fixed-length
//! model and decoding per-token BIO labels back into entity spans.
#![cfg_attr(not(feature = "ner"), allow(dead_code))]

use crate::fields::entities::Entity;

/// Per-token model output, aligned with the tokenizer encoding.
#[derive(Debug, Clone)]
pub struct TokenTag<'a> {
    pub label: &'a str,
    /// Byte offsets into the window text.
    pub offsets: (usize, usize),
    pub word_id: Option<u32>,
    pub special: bool,
}

struct OpenSpan {
    kind: String,
    start: usize,
    end: usize,
}

fn split_label(label: &str) -> (Option<char>, &str) {
    if let Some(kind) = label.strip_prefix("B-") {
        (Some('B'), kind)
    } else if let Some(kind) = label.strip_prefix("I-") {
        (Some('I'), kind)
    } else {
        (None, label)
    }
}

fn close(text: &str, open: &mut Option<OpenSpan>, spans: &mut Vec<Entity>) {
    if let Some(span) = open.take() {
        if let Some(slice) = text.get(span.start..span.end) {
            let trimmed = slice.trim();
            if !trimmed.is_empty() {
                spans.push(Entity::new(trimmed, span.kind));
            }
        }
    }
}

/// Merges tagged tokens into entity spans over `text`.
///
/// Sub-word tokens extend whatever span their word opened. `B-X`, a change of
/// entity kind, or `O` closes the open span.
pub fn decode_spans(text: &str, tokens: &[TokenTag<'_>]) -> Vec<Entity> {
    let mut spans = Vec::new();
    let mut open: Option<OpenSpan> = None;
    let mut prev_word: Option<u32> = None;

    for token in tokens {
        if token.special {
            continue;
        }
        let continues_word = token.word_id.is_some() && token.word_id == prev_word;
        prev_word = token.word_id;

        if continues_word {
            if let Some(span) = open.as_mut() {
                span.end = token.offsets.1;
            }
            continue;
        }

        let (prefix, kind) = split_label(token.label);
        if kind.eq_ignore_ascii_case("O") {
            close(text, &mut open, &mut spans);
            continue;
        }

        match open.as_mut() {
            Some(span) if prefix != Some('B') && span.kind == kind => {
                span.end = token.offsets.1;
            }
            _ => {
                close(text, &mut open, &mut spans);
                open = Some(OpenSpan {
                    kind: kind.to_string(),
                    start: token.offsets.0,
                    end: token.offsets.1,
                });
            }
        }
    }
    close(text, &mut open, &mut spans);
    spans
}

/// Splits `text` into line-aligned windows of at most `max_bytes` bytes.
/// Returns `(byte offset, window)` pairs; lines longer than the limit are cut
/// at the last whitespace (or char boundary) that fits.
pub fn split_windows(text: &str, max_bytes: usize) -> Vec<(usize, &str)> {
    let mut windows = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let rest = &text[start..];
        if rest.len() <= max_bytes {
            windows.push((start, rest));
            break;
        }

        let mut limit = max_bytes;
        while !rest.is_char_boundary(limit) {
            limit -= 1;
        }
        let head = &rest[..limit];
        let cut = head
            .rfind('\n')
            .or_else(|| head.rfind(char::is_whitespace))
            .map(|i| i + rest[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(limit.max(1));
        let cut = if rest.is_char_boundary(cut) {
            cut
        } else {
            rest.char_indices().nth(1).map(|(i, _)| i).unwrap_or(rest.len())
        };

        windows.push((start, &rest[..cut]));
        start += cut;
    }
    windows
}

/// Like `split_windows`, but halves any window `fits` rejects until every
/// window fits. A window that cannot be split further is kept as is.
pub fn fit_windows<F>(text: &str, max_bytes: usize, mut fits: F) -> Vec<(usize, &str)>
where
    F: FnMut(&str) -> bool,
{
    let mut pending = split_windows(text, max_bytes);
    pending.reverse();
    let mut windows = Vec::with_capacity(pending.len());

    while let Some((offset, window)) = pending.pop() {
        if window.len() <= 1 || fits(window) {
            windows.push((offset, window));
            continue;
        }
        let parts = split_windows(window, window.len() / 2);
        if parts.len() <= 1 {
            windows.push((offset, window));
            continue;
        }
        pending.extend(parts.into_iter().rev().map(|(o, w)| (offset + o, w)));
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(label: &str, offsets: (usize, usize), word_id: u32) -> TokenTag<'_> {
        TokenTag {
            label,
            offsets,
            word_id: Some(word_id),
            special: false,
        }
    }

    fn special() -> TokenTag<'static> {
        TokenTag {
            label: "O",
            offsets: (0, 0),
            word_id: None,
            special: true,
        }
    }

    #[test]
    fn test_decode_merges_b_and_i_tokens() {
        let text = "Jane Doe works at Acme Corp";
        let tokens = vec![
            special(),
            tag("B-PER", (0, 4), 0),
            tag("I-PER", (5, 8), 1),
            tag("O", (9, 14), 2),
            tag("O", (15, 17), 3),
            tag("B-ORG", (18, 22), 4),
            tag("I-ORG", (23, 27), 5),
            special(),
        ];
        let spans = decode_spans(text, &tokens);
        assert_eq!(
            spans,
            vec![Entity::new("Jane Doe", "PER"), Entity::new("Acme Corp", "ORG")]
        );
    }

    #[test]
    fn test_decode_subword_inherits_span() {
        let text = "Visited Kyoto";
        // "Kyoto" split into "Ky" + "##oto"; the second piece is mislabeled O.
        let tokens = vec![
            tag("O", (0, 7), 0),
            tag("B-GPE", (8, 10), 1),
            tag("O", (10, 13), 1),
        ];
        assert_eq!(decode_spans(text, &tokens), vec![Entity::new("Kyoto", "GPE")]);
    }

    #[test]
    fn test_decode_b_tag_starts_new_span() {
        let text = "Ann Bob";
        let tokens = vec![tag("B-PER", (0, 3), 0), tag("B-PER", (4, 7), 1)];
        assert_eq!(
            decode_spans(text, &tokens),
            vec![Entity::new("Ann", "PER"), Entity::new("Bob", "PER")]
        );
    }

    #[test]
    fn test_decode_kind_change_splits() {
        let text = "May 2020 Paris";
        let tokens = vec![
            tag("DATE", (0, 3), 0),
            tag("DATE", (4, 8), 1),
            tag("GPE", (9, 14), 2),
        ];
        assert_eq!(
            decode_spans(text, &tokens),
            vec![Entity::new("May 2020", "DATE"), Entity::new("Paris", "GPE")]
        );
    }

    #[test]
    fn test_decode_all_outside_yields_nothing() {
        let tokens = vec![tag("O", (0, 5), 0)];
        assert!(decode_spans("hello", &tokens).is_empty());
    }

    #[test]
    fn test_windows_cover_text_in_order() {
        let text = "line one\nline two\nline three\n";
        let windows = split_windows(text, 12);
        let rebuilt: String = windows.iter().map(|(_, w)| *w).collect();
        assert_eq!(rebuilt, text);
        for (offset, window) in &windows {
            assert!(window.len() <= 12);
            assert_eq!(&text[*offset..*offset + window.len()], *window);
        }
        assert_eq!(windows[0].1, "line one\n");
    }

    #[test]
    fn test_windows_split_long_line_on_whitespace() {
        let text = "alpha beta gamma";
        let windows = split_windows(text, 8);
        assert_eq!(windows[0], (0, "alpha "));
        let rebuilt: String = windows.iter().map(|(_, w)| *w).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_windows_respect_char_boundaries() {
        let text = "ééééé";
        let windows = split_windows(text, 3);
        let rebuilt: String = windows.iter().map(|(_, w)| *w).collect();
        assert_eq!(rebuilt, text);
        assert!(windows.iter().all(|(_, w)| w.len() <= 3));
    }

    #[test]
    fn test_windows_of_empty_text() {
        assert!(split_windows("", 10).is_empty());
    }

    /// Stand-in for a tokenizer where every non-space character is a token.
    fn under_tokens(limit: usize) -> impl FnMut(&str) -> bool {
        move |w: &str| w.chars().filter(|c| !c.is_whitespace()).count() <= limit
    }

    #[test]
    fn test_fit_windows_resplits_dense_window() {
        let text = format!("{}\n{}", "-".repeat(60), "Jane Doe. ".repeat(4));
        let windows = fit_windows(&text, 100, under_tokens(50));

        assert_eq!(split_windows(&text, 100).len(), 2);
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[3], (61, "Jane Doe. Jane Doe. Jane Doe. Jane Doe. "));

        let mut check = under_tokens(50);
        for (offset, window) in &windows {
            assert!(check(window), "{window:?}");
            assert_eq!(&text[*offset..*offset + window.len()], *window);
        }
        let rebuilt: String = windows.iter().map(|(_, w)| *w).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_fit_windows_leaves_fitting_windows_alone() {
        let text = "line one\nline two\n";
        assert_eq!(fit_windows(text, 12, |_| true), split_windows(text, 12));
    }

    #[test]
    fn test_fit_windows_stops_at_single_chars() {
        assert_eq!(fit_windows("ab", 10, |_| false), vec![(0, "a"), (1, "b")]);
        assert_eq!(fit_windows("é", 10, |_| false), vec![(0, "é")]);
    }
}
