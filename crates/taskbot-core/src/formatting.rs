use crate::task::Task;

/// Render tasks as numbered lines: `"{index}. {text} (created: {created_at})"`.
pub fn format_task_list(tasks: &[Task]) -> String {
    tasks
        .iter()
        .enumerate()
        .map(|(idx, t)| format!("{}. {} (created: {})", idx + 1, t.text(), t.created_at()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split `text` into chunks of at most `limit` bytes, breaking on line
/// boundaries where possible. A single over-long line is cut on a char
/// boundary.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut chunk = String::new();

    for line in text.split('\n') {
        let sep = usize::from(!chunk.is_empty());
        if chunk.len() + sep + line.len() <= limit {
            if sep == 1 {
                chunk.push('\n');
            }
            chunk.push_str(line);
            continue;
        }

        if !chunk.is_empty() {
            out.push(std::mem::take(&mut chunk));
        }

        let mut rest = line;
        while rest.len() > limit {
            let (head, tail) = split_utf8_prefix(rest, limit);
            out.push(head.to_string());
            rest = tail;
        }
        chunk.push_str(rest);
    }

    if !chunk.is_empty() {
        out.push(chunk);
    }
    out
}

fn split_utf8_prefix(s: &str, max_bytes: usize) -> (&str, &str) {
    let mut end = max_bytes.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    if end == 0 {
        // First char is wider than the limit; take it whole to make progress.
        end = s.chars().next().map(|c| c.len_utf8()).unwrap_or(s.len());
    }
    s.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn numbers_tasks_from_one() {
        let tasks = vec![
            Task::new(3, "first".into(), UserId(1), "2024-01-01T09:00:00.000000".into()),
            Task::new(9, "second".into(), UserId(1), "2024-01-02T09:00:00.000000".into()),
        ];
        assert_eq!(
            format_task_list(&tasks),
            "1. first (created: 2024-01-01T09:00:00.000000)\n\
2. second (created: 2024-01-02T09:00:00.000000)"
        );
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(split_message("a\nb", 100), vec!["a\nb".to_string()]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn cuts_overlong_lines_on_char_boundaries() {
        let text = "ééééé"; // 10 bytes
        let chunks = split_message(text, 3);
        assert!(chunks.iter().all(|c| c.len() <= 3));
        assert_eq!(chunks.concat(), text);
    }
}
