use crate::parser::blocks::{split_row, table_span, Dialect};

/// Rewrite every pipe table as tab-delimited lines, dropping the separator row.
/// All other lines pass through untouched.
pub fn tables_to_tabs<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let delim = Dialect::Pipe.delimiter();
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let Some(span) = table_span(lines, i, Dialect::Pipe) else {
            out.push(lines[i].as_ref().to_string());
            i += 1;
            continue;
        };
        out.push(split_row(lines[i].as_ref(), delim).join("\t"));
        for row in &lines[i + Dialect::Pipe.body_offset()..i + span] {
            out.push(split_row(row.as_ref(), delim).join("\t"));
        }
        i += span;
    }

    out
}
