use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::error::GenError;
use crate::markers::{
    classify, line_begins_with, line_is, Directive, LineKind, END_FOREACH, FOREACH_PREFIX,
};
use crate::value::{parse_list, Value};
use crate::SourceLine;

/// `{{name}}` placeholder inside a loop body.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?P<name>\w+)\}\}").expect("placeholder pattern is valid"));

/// State of the loop currently being captured.
#[derive(Debug)]
struct LoopContext {
    opened_at: usize,
    vars: Vec<String>,
    items: Vec<Value>,
    captured: Vec<SourceLine>,
}

/// Unrolls `foreach` / `endforeach` regions.
///
/// Only one loop may be open at a time. Every other line, directives
/// included, is passed through untouched.
#[derive(Debug, Default)]
pub struct LoopExpander {
    active: Option<LoopContext>,
    output: Vec<SourceLine>,
}

impl LoopExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the expander over a whole template.
    pub fn expand(lines: Vec<SourceLine>) -> Result<Vec<SourceLine>, GenError> {
        let mut expander = Self::new();
        for line in lines {
            expander.feed(line)?;
        }
        expander.finish()
    }

    /// Processes one template line.
    pub fn feed(&mut self, line: SourceLine) -> Result<(), GenError> {
        if line_begins_with(&line.text, FOREACH_PREFIX) {
            return match classify(&line.text) {
                LineKind::Directive(Directive::Foreach { vars, list }) => {
                    self.open(&line, vars, &list)
                }
                _ => Err(GenError::MalformedDirective {
                    line: line.number,
                    content: line.text.trim().to_string(),
                }),
            };
        }

        if line_is(&line.text, END_FOREACH) {
            return self.close(&line);
        }

        match self.active.as_mut() {
            Some(ctx) => ctx.captured.push(line),
            None => self.output.push(line),
        }
        Ok(())
    }

    /// Returns the expanded lines, failing if a loop is still open.
    pub fn finish(self) -> Result<Vec<SourceLine>, GenError> {
        if let Some(ctx) = self.active {
            return Err(GenError::UnclosedForeach {
                line: ctx.opened_at,
            });
        }
        Ok(self.output)
    }

    fn open(&mut self, line: &SourceLine, vars: Vec<String>, list: &str) -> Result<(), GenError> {
        if let Some(ctx) = &self.active {
            return Err(GenError::NestedForeach {
                line: line.number,
                opened_at: ctx.opened_at,
                content: line.text.trim().to_string(),
            });
        }

        let items = parse_list(list).map_err(|reason| GenError::InvalidList {
            line: line.number,
            reason,
        })?;

        for (index, item) in items.iter().enumerate() {
            let found = item.as_bindings().len();
            if found != vars.len() {
                return Err(GenError::LoopArity {
                    line: line.number,
                    index,
                    expected: vars.len(),
                    found,
                });
            }
        }

        debug!(
            "foreach {:?} over {} element(s) at line {}",
            vars,
            items.len(),
            line.number
        );
        self.active = Some(LoopContext {
            opened_at: line.number,
            vars,
            items,
            captured: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self, line: &SourceLine) -> Result<(), GenError> {
        let ctx = self
            .active
            .take()
            .ok_or_else(|| GenError::UnmatchedEndForeach {
                line: line.number,
                content: line.text.trim().to_string(),
            })?;

        for item in &ctx.items {
            let bindings: HashMap<&str, String> = ctx
                .vars
                .iter()
                .map(String::as_str)
                .zip(item.as_bindings().into_iter().map(Value::to_string))
                .collect();
            for captured in &ctx.captured {
                self.output.push(SourceLine {
                    number: captured.number,
                    text: substitute(&captured.text, &bindings),
                });
            }
        }

        debug!(
            "endforeach at line {}: {} line(s) x {} element(s)",
            line.number,
            ctx.captured.len(),
            ctx.items.len()
        );
        Ok(())
    }
}

/// Replaces every `{{name}}` whose name is bound; other braces are left as they are.
pub fn substitute(text: &str, bindings: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |cap: &Captures| match bindings.get(&cap["name"]) {
            Some(value) => value.clone(),
            None => cap[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_lines;

    fn texts(lines: &[SourceLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_expand_cardinality() {
        let template = "before\n// -- foreach x in [1, 2, 3] --\na{{x}}\nb{{x}}\n// -- endforeach --\nafter";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(
            texts(&expanded),
            vec!["before", "a1", "b1", "a2", "b2", "a3", "b3", "after"]
        );
    }

    #[test]
    fn test_expand_multiple_variables() {
        let template = "// -- foreach a, b in [(1, \"x\"), (2, \"y\")] --\n{{a}}-{{b}}\n// -- endforeach --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(texts(&expanded), vec!["1-x", "2-y"]);
    }

    #[test]
    fn test_expand_string_scalars() {
        let template = "    // -- foreach name in ['RightOf', 'LeftOf'] --\n    void Position{{name}}();\n    // -- endforeach --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(
            texts(&expanded),
            vec!["    void PositionRightOf();", "    void PositionLeftOf();"]
        );
    }

    #[test]
    fn test_expanded_lines_keep_template_numbers() {
        let template = "x\n// -- foreach v in [1, 2] --\n{{v}}\n// -- endforeach --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        let numbers: Vec<usize> = expanded.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 3, 3]);
    }

    #[test]
    fn test_other_directives_pass_through() {
        let template = "// -- begin types --\n// -- A : B --\n// -- end types --\n// -- write controls --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(texts(&expanded), template.lines().collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_placeholders_untouched() {
        let template = "// -- foreach x in ['v'] --\n{{x}} {{y}} { {x} }\n// -- endforeach --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(texts(&expanded), vec!["v {{y}} { {x} }"]);
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let template = "// -- foreach a, b in [('{{b}}', 'z')] --\n{{a}}{{b}}\n// -- endforeach --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(texts(&expanded), vec!["{{b}}z"]);
    }

    #[test]
    fn test_empty_list_drops_body() {
        let template = "a\n// -- foreach x in [] --\n{{x}}\n// -- endforeach --\nb";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(texts(&expanded), vec!["a", "b"]);
    }

    #[test]
    fn test_unmatched_endforeach() {
        let result = LoopExpander::expand(source_lines("a\n// -- endforeach --"));
        assert!(matches!(
            result,
            Err(GenError::UnmatchedEndForeach { line: 2, .. })
        ));
    }

    #[test]
    fn test_nested_foreach_rejected() {
        let template = "// -- foreach x in [1] --\n// -- foreach y in [2] --\n{{y}}\n// -- endforeach --\n// -- endforeach --";
        let result = LoopExpander::expand(source_lines(template));
        assert!(matches!(
            result,
            Err(GenError::NestedForeach {
                line: 2,
                opened_at: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_unclosed_foreach() {
        let result = LoopExpander::expand(source_lines("// -- foreach x in [1] --\n{{x}}"));
        assert!(matches!(result, Err(GenError::UnclosedForeach { line: 1 })));
    }

    #[test]
    fn test_malformed_header() {
        let result = LoopExpander::expand(source_lines("ok\n// -- foreach x of [1] --"));
        match result {
            Err(GenError::MalformedDirective { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "// -- foreach x of [1] --");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_loop_variable_rejected() {
        let result = LoopExpander::expand(source_lines(
            "// -- foreach a, a in [(1, 2)] --\n{{a}}\n// -- endforeach --",
        ));
        match result {
            Err(GenError::MalformedDirective { line, content }) => {
                assert_eq!(line, 1);
                assert_eq!(content, "// -- foreach a, a in [(1, 2)] --");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_expand_float_and_wide_literals() {
        let template = "// -- foreach v in [1e3, .5, 1e16, 99999999999999999999] --\n{{v}}\n// -- endforeach --";
        let expanded = LoopExpander::expand(source_lines(template)).unwrap();
        assert_eq!(
            texts(&expanded),
            vec!["1000.0", "0.5", "1e+16", "99999999999999999999"]
        );
    }

    #[test]
    fn test_invalid_list_expression() {
        let result = LoopExpander::expand(source_lines("// -- foreach x in [open('f')] --"));
        assert!(matches!(result, Err(GenError::InvalidList { line: 1, .. })));
    }

    #[test]
    fn test_arity_mismatch() {
        let template = "// -- foreach a, b in [(1, 2), 3] --\n// -- endforeach --";
        let result = LoopExpander::expand(source_lines(template));
        assert!(matches!(
            result,
            Err(GenError::LoopArity {
                index: 1,
                expected: 2,
                found: 1,
                ..
            })
        ));
    }
}
