//! Renders the instruction trace into the final program text.

use tapec_types::{Instruction, TraceOp};

/// Indent step applied per scope nesting level.
const INDENT_STEP: usize = 2;

/// Formats a trace into annotated program text: one line per
/// instruction group, indented by scope nesting plus the group's
/// recorded operation depth, with the group's label as a trailing
/// comment.
pub struct CodePrinter<'a> {
    trace: &'a [TraceOp],
}

impl<'a> CodePrinter<'a> {
    pub fn new(trace: &'a [TraceOp]) -> Self {
        Self { trace }
    }

    pub fn print(&self) -> String {
        let mut indent = 0usize;
        let mut lines = Vec::new();

        for op in self.trace {
            match op {
                TraceOp::ScopeOpen => indent += INDENT_STEP,
                TraceOp::ScopeClose => indent = indent.saturating_sub(INDENT_STEP),
                TraceOp::Group { code, label, level } => {
                    let comment = sanitize_comment(label);
                    let content = [code.as_str(), comment.as_str()]
                        .iter()
                        .filter(|part| !part.is_empty())
                        .copied()
                        .collect::<Vec<_>>()
                        .join("  ");
                    if content.is_empty() {
                        continue;
                    }
                    let columns = indent + level.saturating_sub(1);
                    lines.push(format!("{}{}", " ".repeat(columns), content));
                }
            }
        }

        lines.join("\n")
    }
}

/// Replace every character that coincides with a tape instruction by an
/// underscore, so a label can never be mistaken for code or corrupt
/// line-oriented diffing.
fn sanitize_comment(comment: &str) -> String {
    comment
        .chars()
        .map(|c| {
            if Instruction::is_instruction_char(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitizes_instruction_characters() {
        assert_eq!(sanitize_comment("a >= b"), "a __ b");
        assert_eq!(sanitize_comment("copy x to temporary[4]"), "copy x to temporary_4_");
        assert_eq!(sanitize_comment("while count"), "while count");
    }

    #[test]
    fn test_indents_by_scope_and_level() {
        let trace = vec![
            TraceOp::group(">+", "declare a", 1),
            TraceOp::ScopeOpen,
            TraceOp::group("", "if a", 1),
            TraceOp::group("[-]", "reset", 2),
            TraceOp::ScopeClose,
            TraceOp::group("<", "endif a", 1),
        ];
        let text = CodePrinter::new(&trace).print();
        assert_eq!(
            text,
            ">+  declare a\n  if a\n   [-]  reset\n<  endif a"
        );
    }

    #[test]
    fn test_drops_empty_entries() {
        let trace = vec![
            TraceOp::group("", "", 1),
            TraceOp::group("+", "inc", 1),
        ];
        assert_eq!(CodePrinter::new(&trace).print(), "+  inc");
    }
}
