use crate::{RCaronError, SourceFile};

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Render an error as `error[Code] name:line:col: message` plus the offending
/// source line and a caret.
pub fn render_error(source: &SourceFile, err: &RCaronError) -> String {
    let Some(span) = err.span else {
        return format!("error[{}] {}: {}", err.code, source.name, err.message);
    };
    let text = source.text.as_str();
    let start = floor_char_boundary(text, span.start.0 as usize);
    let (line, col) = source.text.line_col(start as u32);
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[start..]
        .find('\n')
        .map(|i| start + i)
        .unwrap_or(text.len());
    let line_text = text[line_start..line_end].trim_end_matches('\r');

    let mut out = format!(
        "error[{}] {}:{}:{}: {}",
        err.code,
        source.name,
        line + 1,
        col + 1,
        err.message
    );
    out.push('\n');
    out.push_str("  | ");
    out.push_str(line_text);
    out.push('\n');
    out.push_str("  | ");
    out.extend(std::iter::repeat_n(' ', col as usize));
    let width = text[start..floor_char_boundary(text, span.end.0 as usize).max(start)]
        .chars()
        .take_while(|c| *c != '\n')
        .count()
        .max(1);
    out.extend(std::iter::repeat_n('^', width));
    out
}

pub fn render_errors(source: &SourceFile, errors: &[RCaronError]) -> String {
    let mut out = String::new();
    for (idx, e) in errors.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&render_error(source, e));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, Span};

    #[test]
    fn renders_line_column_and_caret() {
        let src = SourceFile::new("main.rcaron", "$a = 1;\n$b = $c;\n");
        let err = RCaronError::at(ErrorCode::VariableNotFound, "Variable '$c' not found", Span::new(13, 15));
        let out = render_error(&src, &err);
        assert!(out.starts_with("error[VariableNotFound] main.rcaron:2:6:"), "{out}");
        assert!(out.ends_with("     ^^"), "{out}");
    }
}
