//! Fixed-column word wrapping.

/// Wraps `text` so that no line exceeds `columns` characters.
///
/// Existing line breaks are kept and blank lines survive as empty strings.
/// Runs of whitespace collapse to a single space. A word longer than
/// `columns` is split across lines.
pub(crate) fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word_chars: Vec<char> = word.chars().collect();

            // Split words that cannot fit on any line.
            while word_chars.len() > columns {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word_chars.split_off(columns);
                lines.push(word_chars.into_iter().collect());
                word_chars = rest;
            }
            if word_chars.is_empty() {
                continue;
            }

            let needed = if current_len == 0 {
                word_chars.len()
            } else {
                current_len + 1 + word_chars.len()
            };
            if needed > columns {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word_chars.len();
            current.extend(word_chars);
        }

        if current_len > 0 {
            lines.push(current);
        }
    }

    lines
}
