use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Malformed directive at line {line}: {content}")]
    MalformedDirective { line: usize, content: String },

    #[error("Invalid foreach list at line {line}: {reason}")]
    InvalidList { line: usize, reason: String },

    #[error("endforeach without matching foreach at line {line}: {content}")]
    UnmatchedEndForeach { line: usize, content: String },

    #[error("Nested foreach is not supported (line {line}, loop opened at line {opened_at}): {content}")]
    NestedForeach {
        line: usize,
        opened_at: usize,
        content: String,
    },

    #[error("foreach opened at line {line} is never closed")]
    UnclosedForeach { line: usize },

    #[error("foreach at line {line} declares {expected} variable(s) but element {index} provides {found}")]
    LoopArity {
        line: usize,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{section} section opened at line {line} is never closed")]
    UnclosedSection { section: &'static str, line: usize },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}
