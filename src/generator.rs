use log::{error, info};
use std::{fs, io, path::Path};

use crate::control::RenderStyle;
use crate::error::GenError;
use crate::generate_source;

/// Reads a template, runs the pipeline and writes the generated file.
pub struct FileGenerator {
    style: RenderStyle,
    dry_run: bool,
}

impl FileGenerator {
    pub fn new(style: RenderStyle, dry_run: bool) -> Self {
        Self { style, dry_run }
    }

    /// Ensures that the specified directory exists, creating it if necessary.
    fn ensure_dir_exists(path: &Path) -> Result<(), GenError> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| GenError::io(path, e))?;
        }
        Ok(())
    }

    /// Generates `output_path` from `template_path` and returns the generated text.
    ///
    /// The output file is only touched once the whole template compiled, so a
    /// broken template leaves a previous output in place. In dry-run mode
    /// nothing is written.
    pub fn generate(&self, template_path: &Path, output_path: &Path) -> Result<String, GenError> {
        if output_path.file_name().is_none() {
            error!("Output path must have a filename: {:?}", output_path);
            return Err(GenError::io(
                output_path,
                io::Error::new(io::ErrorKind::InvalidInput, "output path must have a filename"),
            ));
        }

        info!("Reading template {:?}", template_path);
        let template = fs::read_to_string(template_path).map_err(|e| {
            error!("Failed to read template file: {:?}", template_path);
            GenError::io(template_path, e)
        })?;

        let generated = generate_source(&template, &self.style)?;

        if self.dry_run {
            info!("[DRY RUN] Would write: {:?}", output_path);
            return Ok(generated);
        }

        if let Some(parent) = output_path.parent() {
            Self::ensure_dir_exists(parent)?;
        }
        fs::write(output_path, &generated).map_err(|e| {
            error!("Failed to write generated file: {:?}", output_path);
            GenError::io(output_path, e)
        })?;
        info!("{:?}", output_path);
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NOTICE_BANNER;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const TEMPLATE: &str = "\
namespace Demo
{
    // -- begin types --
    // -- Btn : Button
        public Btn() { }
    // -- end types --
    // -- begin control copy --
    // -- foreach dir in ['Left', 'Right'] --
        public void Move{{dir}}() { }
    // -- endforeach --
    // -- end control copy --
    // -- write controls --
}
";

    #[test]
    fn test_generate_file() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("Demo.template.cs");
        let output_path = dir.path().join("gen").join("Demo.cs");
        let mut file = File::create(&template_path).unwrap();
        write!(file, "{}", TEMPLATE).unwrap();

        let generator = FileGenerator::new(RenderStyle::default(), false);
        let returned = generator.generate(&template_path, &output_path).unwrap();

        let written = fs::read_to_string(&output_path).unwrap();
        assert_eq!(written, returned);
        assert_eq!(
            written,
            format!(
                "{}namespace Demo\n{{\n\n    public class Btn : Button\n    {{\n        public Btn() {{ }}\n        public void MoveLeft() {{ }}\n        public void MoveRight() {{ }}\n    }}\n}}\n",
                NOTICE_BANNER
            )
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("t.template.cs");
        let output_path = dir.path().join("out").join("t.cs");
        fs::write(&template_path, "plain\n").unwrap();

        let generator = FileGenerator::new(RenderStyle::default(), true);
        let generated = generator.generate(&template_path, &output_path).unwrap();

        assert!(generated.ends_with("plain\n"));
        assert!(!output_path.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_overwrites_existing_output() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("t.template.cs");
        let output_path = dir.path().join("t.cs");
        fs::write(&template_path, "new\n").unwrap();
        fs::write(&output_path, "old contents\n").unwrap();

        FileGenerator::new(RenderStyle::default(), false)
            .generate(&template_path, &output_path)
            .unwrap();

        let written = fs::read_to_string(&output_path).unwrap();
        assert_eq!(written, format!("{}new\n", NOTICE_BANNER));
    }

    #[test]
    fn test_broken_template_keeps_previous_output() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("t.template.cs");
        let output_path = dir.path().join("t.cs");
        fs::write(&template_path, "a\n// -- endforeach --\n").unwrap();
        fs::write(&output_path, "previous\n").unwrap();

        let result = FileGenerator::new(RenderStyle::default(), false)
            .generate(&template_path, &output_path);

        assert!(matches!(
            result,
            Err(GenError::UnmatchedEndForeach { line: 2, .. })
        ));
        assert_eq!(fs::read_to_string(&output_path).unwrap(), "previous\n");
    }

    #[test]
    fn test_missing_template() {
        let dir = tempdir().unwrap();
        let result = FileGenerator::new(RenderStyle::default(), false)
            .generate(&dir.path().join("missing.cs"), &dir.path().join("out.cs"));
        match result {
            Err(GenError::Io { path, source }) => {
                assert!(path.ends_with("missing.cs"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_output_path_without_filename() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("t.template.cs");
        fs::write(&template_path, "x\n").unwrap();
        let result = FileGenerator::new(RenderStyle::default(), false)
            .generate(&template_path, Path::new("/"));
        assert!(matches!(result, Err(GenError::Io { .. })));
    }
}
