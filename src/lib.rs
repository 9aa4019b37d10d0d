//! Flat source generator.
//!
//! A template is turned into a generated source file in two passes:
//!
//! 1. [`LoopExpander`] unrolls every `// -- foreach ... --` region, filling in
//!    `{{name}}` placeholders from a literal list.
//! 2. [`FlatCompiler`] collects the control declarations of the types section
//!    and the shared copy body, and writes one block per control wherever
//!    `// -- write controls --` appears.
//!
//! The result is prefixed with [`NOTICE_BANNER`].

use log::info;

pub mod compiler;
pub mod config;
pub mod control;
pub mod error;
pub mod generator;
pub mod iteration;
pub mod markers;
pub mod value;

pub use compiler::{CompilerState, FlatCompiler};
pub use config::{ConfigError, GeneratorConfig, JobConfig};
pub use control::{ControlDef, RenderStyle};
pub use error::GenError;
pub use generator::FileGenerator;
pub use iteration::LoopExpander;

/// Header written at the top of every generated file.
pub const NOTICE_BANNER: &str = "//\n\
// NOTICE: This file is generated. Do not edit this file manually, please edit the template instead.\n\
//\n";

/// A template line and its 1-based line number in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Splits template text into numbered lines. Accepts `\n` and `\r\n`.
pub fn source_lines(text: &str) -> Vec<SourceLine> {
    text.lines()
        .enumerate()
        .map(|(i, line)| SourceLine {
            number: i + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Runs the full pipeline over template text and returns the generated file contents.
pub fn generate_source(template: &str, style: &RenderStyle) -> Result<String, GenError> {
    let lines = source_lines(template);
    info!("Expanding loops over {} line(s) ...", lines.len());
    let expanded = LoopExpander::expand(lines)?;

    info!("Compiling {} line(s) ...", expanded.len());
    let body = FlatCompiler::compile(&expanded, style)?;

    let mut generated = String::with_capacity(NOTICE_BANNER.len() + body.len());
    generated.push_str(NOTICE_BANNER);
    generated.push_str(&body);
    Ok(generated)
}
