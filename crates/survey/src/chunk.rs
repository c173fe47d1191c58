/// Length of `text` the way Telegram measures it: UTF-16 code units.
pub fn telegram_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split `text` into parts of at most `max_units` UTF-16 code units.
///
/// Lines are kept whole whenever they fit; only a single line longer than
/// `max_units` is cut, and never inside a character.  Nothing is dropped or
/// trimmed: concatenating the parts yields `text` again.
pub fn chunk_message(text: &str, max_units: usize) -> Vec<String> {
    let max_units = max_units.max(2);
    if telegram_len(text) <= max_units {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = telegram_len(line);
        if current_len > 0 && current_len + line_len > max_units {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_units {
            for c in line.chars() {
                if current_len + c.len_utf16() > max_units {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(c);
                current_len += c.len_utf16();
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(width: usize, count: usize) -> String {
        (0..count)
            .map(|i| {
                let body = format!("line {i} ");
                let pad = "x".repeat(width - 1 - body.len());
                format!("{body}{pad}\n")
            })
            .collect()
    }

    #[test]
    fn exactly_at_limit_is_one_chunk() {
        let text = "y".repeat(4000);
        assert_eq!(chunk_message(&text, 4000), vec![text]);

        let text = lines_of(100, 40);
        assert_eq!(text.chars().count(), 4000);
        assert_eq!(chunk_message(&text, 4000).len(), 1);
    }

    #[test]
    fn one_over_limit_splits_on_line_boundary() {
        let mut text = lines_of(100, 40);
        text.push('z');
        assert_eq!(text.chars().count(), 4001);

        let chunks = chunk_message(&text, 4000);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 4000);
        }
        assert!(chunks[0].ends_with('\n'));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn overlong_line_is_hard_split() {
        let text = "é".repeat(4001);
        let chunks = chunk_message(&text, 4000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4000);
        assert_eq!(chunks[1], "é");
    }

    #[test]
    fn mixed_lines_never_exceed_limit() {
        let text = format!("short\n{}\nanother short\n{}", "a".repeat(25), "b".repeat(7));
        let chunks = chunk_message(&text, 10);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn astral_characters_count_as_two_units() {
        let text = "😀".repeat(2500);
        assert_eq!(text.chars().count(), 2500);
        assert_eq!(telegram_len(&text), 5000);

        let chunks = chunk_message(&text, 4000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(telegram_len(&chunks[0]), 4000);
        assert_eq!(telegram_len(&chunks[1]), 1000);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn odd_limit_never_splits_a_surrogate_pair() {
        let text = format!("a{}", "😀".repeat(4));
        let chunks = chunk_message(&text, 4);
        assert_eq!(chunks, vec!["a😀", "😀😀", "😀"]);
        assert!(chunks.iter().all(|c| telegram_len(c) <= 4));
    }
}
