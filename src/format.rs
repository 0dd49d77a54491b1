//! Line and stanza layout for generated lyrics.

const LINE_BREAK_AFTER: [char; 4] = ['.', '!', '?', ','];
const LINES_PER_STANZA: usize = 4;

/// Break after punctuation, collapse newline runs, and blank-line every fourth line.
pub fn format_as_song(text: &str) -> String {
    let mut broken = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        broken.push(ch);
        if LINE_BREAK_AFTER.contains(&ch) {
            broken.push('\n');
        }
    }

    let mut collapsed = String::with_capacity(broken.len());
    for ch in broken.chars() {
        if ch == '\n' && collapsed.ends_with('\n') {
            continue;
        }
        collapsed.push(ch);
    }

    let mut lines = Vec::new();
    for (idx, line) in collapsed.split('\n').enumerate() {
        lines.push(line);
        if (idx + 1) % LINES_PER_STANZA == 0 {
            lines.push("");
        }
    }

    lines.join("\n")
}
