/// Line index over a file's text for offset → (line, column) lookups,
/// context snippets and comment detection.
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    content: &'a str,
    line_starts: Vec<usize>,
    /// Lexer state at the start of each line.
    line_states: Vec<Lex>,
}

/// Just enough lexing to tell code from comments: string literals hide
/// comment markers, block comments and template strings span lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

impl<'a> SourceText<'a> {
    pub fn new(content: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));

        let mut line_states = Vec::with_capacity(line_starts.len());
        let mut state = Lex::Code;
        for (i, &start) in line_starts.iter().enumerate() {
            line_states.push(state);
            let end = line_starts.get(i + 1).copied().unwrap_or(content.len());
            state = scan(&content[start..end], state);
        }
        Self {
            content,
            line_starts,
            line_states,
        }
    }

    /// Whether the byte at `offset` sits inside a `//`, `/* */` or `# ` comment.
    pub fn in_comment(&self, offset: usize) -> bool {
        let offset = offset.min(self.content.len());
        let line = self.line_of(offset);
        let start = self.line_starts[line - 1];
        match self.content.get(start..offset) {
            Some(prefix) => matches!(
                scan(prefix, self.line_states[line - 1]),
                Lex::LineComment | Lex::BlockComment
            ),
            None => false,
        }
    }

    pub fn content(&self) -> &'a str {
        self.content
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line of a byte offset: newlines before it, plus one.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// 1-based (line, column); the column counts characters since the last newline.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let line = self.line_of(offset);
        let start = self.line_starts[line - 1];
        let column = self
            .content
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start)
            + 1;
        (line, column)
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line(&self, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.content.len());
        self.content[start..end].trim_end_matches('\r')
    }

    /// `context` lines either side of `line`, the target marked with `>`.
    pub fn snippet(&self, line: usize, context: usize) -> String {
        let first = line.saturating_sub(context).max(1);
        let last = (line + context).min(self.line_count());
        (first..=last)
            .map(|n| {
                let marker = if n == line { '>' } else { ' ' };
                format!("{marker} {n:>4} | {}", self.line(n))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn scan(text: &str, mut state: Lex) -> Lex {
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;
    while let Some(ch) = chars.next() {
        state = match state {
            Lex::LineComment if ch == '\n' => Lex::Code,
            Lex::LineComment => Lex::LineComment,
            Lex::BlockComment if ch == '*' && chars.peek() == Some(&'/') => {
                chars.next();
                Lex::Code
            }
            Lex::BlockComment => Lex::BlockComment,
            Lex::Str(quote) => match ch {
                '\\' => {
                    chars.next();
                    Lex::Str(quote)
                }
                '\n' if quote != '`' => Lex::Code,
                c if c == quote => Lex::Code,
                _ => Lex::Str(quote),
            },
            Lex::Code => match ch {
                '/' if chars.peek() == Some(&'/') => Lex::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    Lex::BlockComment
                }
                '\'' | '"' | '`' => Lex::Str(ch),
                // `# note` is a comment, `#field` is a private class member
                '#' if prev.map_or(true, char::is_whitespace)
                    && !chars.peek().is_some_and(|c| c.is_alphanumeric() || *c == '_') =>
                {
                    Lex::LineComment
                }
                _ => Lex::Code,
            },
        };
        prev = Some(ch);
    }
    state
}
