use log::{debug, info};

use crate::control::{ControlDef, RenderStyle};
use crate::error::GenError;
use crate::markers::{classify, Directive, LineKind};
use crate::SourceLine;

/// Where the compiler is in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerState {
    /// Lines are written straight to the output.
    Normal,
    /// Inside `begin types` / `end types`, collecting constructor bodies.
    CollectingTypes { opened_at: usize },
    /// Inside `begin control copy` / `end control copy`.
    CollectingCopy { opened_at: usize },
}

/// Line-by-line compiler for the loop-expanded template.
///
/// Type sections declare controls, the copy section provides the body every
/// control shares, and `write controls` emits one block per control.
/// Directives that make no sense in the current state are ignored.
pub struct FlatCompiler<'s> {
    state: CompilerState,
    pending: Vec<String>,
    controls: Vec<ControlDef>,
    copy_body: String,
    style: &'s RenderStyle,
    output: String,
}

impl<'s> FlatCompiler<'s> {
    pub fn new(style: &'s RenderStyle) -> Self {
        Self {
            state: CompilerState::Normal,
            pending: Vec::new(),
            controls: Vec::new(),
            copy_body: String::new(),
            style,
            output: String::new(),
        }
    }

    /// Compiles a whole line sequence and returns the generated text.
    pub fn compile(lines: &[SourceLine], style: &'s RenderStyle) -> Result<String, GenError> {
        let mut compiler = Self::new(style);
        for line in lines {
            compiler.feed(line)?;
        }
        compiler.finish()
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> CompilerState {
        self.state
    }

    /// Controls declared so far, in declaration order.
    #[cfg(test)]
    pub(crate) fn controls(&self) -> &[ControlDef] {
        &self.controls
    }

    #[cfg(test)]
    pub(crate) fn copy_body(&self) -> &str {
        &self.copy_body
    }

    /// Processes one line.
    pub fn feed(&mut self, line: &SourceLine) -> Result<(), GenError> {
        let directive = match classify(&line.text) {
            LineKind::Plain => {
                self.push_plain(line);
                return Ok(());
            }
            LineKind::Directive(directive) => directive,
            LineKind::Unknown => {
                return Err(GenError::MalformedDirective {
                    line: line.number,
                    content: line.text.trim().to_string(),
                })
            }
        };

        match (self.state, directive) {
            (CompilerState::Normal, Directive::BeginTypes) => {
                info!("Begin types ...");
                self.pending.clear();
                self.state = CompilerState::CollectingTypes {
                    opened_at: line.number,
                };
            }
            (CompilerState::Normal, Directive::BeginCopy) => {
                info!("Begin control copy ...");
                self.pending.clear();
                self.state = CompilerState::CollectingCopy {
                    opened_at: line.number,
                };
            }
            (CompilerState::Normal, Directive::WriteAll) => {
                info!("Write controls ... ({} control(s))", self.controls.len());
                for control in &self.controls {
                    control.render(&self.copy_body, self.style, &mut self.output);
                }
            }
            (CompilerState::CollectingTypes { .. }, Directive::TypeEntry { name, base }) => {
                self.flush_pending();
                debug!("control {} : {} at line {}", name, base, line.number);
                self.controls.push(ControlDef::new(name, base));
            }
            (CompilerState::CollectingTypes { .. }, Directive::EndTypes) => {
                self.flush_pending();
                self.pending.clear();
                self.state = CompilerState::Normal;
            }
            (CompilerState::CollectingCopy { .. }, Directive::EndCopy) => {
                self.copy_body = self.pending.join("\n");
                self.pending.clear();
                self.state = CompilerState::Normal;
            }
            (state, directive) => {
                debug!(
                    "ignoring {:?} in state {:?} at line {}",
                    directive, state, line.number
                );
            }
        }
        Ok(())
    }

    /// Returns the generated text, failing if a section was left open.
    pub fn finish(self) -> Result<String, GenError> {
        match self.state {
            CompilerState::Normal => Ok(self.output),
            CompilerState::CollectingTypes { opened_at } => Err(GenError::UnclosedSection {
                section: "types",
                line: opened_at,
            }),
            CompilerState::CollectingCopy { opened_at } => Err(GenError::UnclosedSection {
                section: "control copy",
                line: opened_at,
            }),
        }
    }

    fn push_plain(&mut self, line: &SourceLine) {
        match self.state {
            CompilerState::Normal => {
                self.output.push_str(&line.text);
                self.output.push('\n');
            }
            CompilerState::CollectingTypes { .. } | CompilerState::CollectingCopy { .. } => {
                self.pending.push(line.text.clone());
            }
        }
    }

    /// Moves pending lines into the most recent control.
    ///
    /// Only happens when there is something to move and a control to receive it.
    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(last) = self.controls.last_mut() {
            last.body = self.pending.join("\n");
            self.pending.clear();
        }
    }
}
