// Fenced code block extraction

/// One fenced block found in a Markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// First word of the info string
    pub kind: String,
    /// Remaining info-string words (e.g. `nocheck`)
    pub attributes: Vec<String>,
    /// Block body without the trailing newline
    pub content: String,
    /// 1-based line of the opening fence
    pub line: usize,
}

struct Opening {
    marker: char,
    len: usize,
    indent: usize,
    info: String,
    line: usize,
}

/// Extract every fenced block with a non-empty info string
///
/// Follows the CommonMark fence rules closely enough for documentation:
/// up to three spaces of indentation, ``` or ~~~ runs of three or more, and
/// an unclosed fence running to the end of the document.
pub fn extract_fences(markdown: &str) -> Vec<Fence> {
    let mut fences = Vec::new();
    let mut open: Option<(Opening, Vec<&str>)> = None;

    for (index, line) in markdown.lines().enumerate() {
        match open.take() {
            None => open = parse_opening(line, index + 1).map(|o| (o, Vec::new())),
            Some((opening, mut body)) => {
                if is_closing(line, &opening) {
                    push_fence(&mut fences, opening, &body);
                } else {
                    body.push(strip_indent(line, opening.indent));
                    open = Some((opening, body));
                }
            }
        }
    }
    if let Some((opening, body)) = open {
        push_fence(&mut fences, opening, &body);
    }
    fences
}

fn push_fence(fences: &mut Vec<Fence>, opening: Opening, body: &[&str]) {
    let (kind, attributes) = parse_info(&opening.info);
    if kind.is_empty() {
        return;
    }
    fences.push(Fence {
        kind,
        attributes,
        content: body.join("\n"),
        line: opening.line,
    });
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn parse_opening(line: &str, line_no: usize) -> Option<Opening> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(Opening {
        marker,
        len,
        indent,
        info: info.to_string(),
        line: line_no,
    })
}

fn is_closing(line: &str, opening: &Opening) -> bool {
    let indent = leading_spaces(line);
    if indent > 3 {
        return false;
    }
    let rest = line[indent..].trim_end();
    rest.len() >= opening.len && rest.chars().all(|c| c == opening.marker)
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let strip = leading_spaces(line).min(indent);
    &line[strip..]
}

/// `bash nocheck`, `{.bash nocheck}` and `{ .bash title="x" }` all work
fn parse_info(info: &str) -> (String, Vec<String>) {
    let info = info
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(info);
    let mut words = info.split_whitespace();
    let kind = words
        .next()
        .map(|w| w.trim_start_matches('.').to_string())
        .unwrap_or_default();
    (kind, words.map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_fences() {
        let doc = "# Title\n\n```bash\necho hi\necho there\n```\n\ntext\n\n~~~~ py nocheck\nprint(1)\n~~~~\n";
        let fences = extract_fences(doc);
        assert_eq!(fences.len(), 2);
        assert_eq!(fences[0].kind, "bash");
        assert_eq!(fences[0].content, "echo hi\necho there");
        assert_eq!(fences[0].line, 3);
        assert_eq!(fences[1].kind, "py");
        assert_eq!(fences[1].attributes, vec!["nocheck"]);
    }

    #[test]
    fn test_no_info_string_skipped() {
        assert!(extract_fences("```\nplain\n```\n").is_empty());
    }

    #[test]
    fn test_shorter_or_other_marker_does_not_close() {
        let doc = "````md\n```\ninner\n~~~\n````\n";
        let fences = extract_fences(doc);
        assert_eq!(fences.len(), 1);
        assert_eq!(fences[0].content, "```\ninner\n~~~");
    }

    #[test]
    fn test_indented_fence_strips_indent() {
        let doc = "  ```sh\n  ls\n    pwd\n  ```\n";
        let fences = extract_fences(doc);
        assert_eq!(fences[0].content, "ls\n  pwd");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let fences = extract_fences("```sh\nls\n");
        assert_eq!(fences[0].content, "ls");
    }

    #[test]
    fn test_braced_info() {
        let fences = extract_fences("```{.sh nocheck}\nls\n```\n");
        assert_eq!(fences[0].kind, "sh");
        assert_eq!(fences[0].attributes, vec!["nocheck"]);
    }

    #[test]
    fn test_empty_block() {
        let fences = extract_fences("```sh\n```\n");
        assert_eq!(fences[0].content, "");
    }
}
