use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flatgen::config::{GeneratorConfig, DEFAULT_CONFIG_FILE};
use flatgen::FileGenerator;
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Base output directory (overrides the config directory)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Include job names (exact, glob with one '*', or regex:pattern)
    #[arg(long, global = true)]
    include: Vec<String>,

    /// Exclude job names (exact, glob with one '*', or regex:pattern)
    #[arg(long, global = true)]
    exclude: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new flatgen project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Generate files from templates (default command)
    Generate,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { ref path }) => {
            init_project(path)?;
        }
        Some(Commands::Generate) | None => {
            generate(&cli)?;
        }
    }

    Ok(())
}

fn init_project(path: &Path) -> Result<()> {
    info!("Initializing flatgen project at {:?}", path);

    let config_path = path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }
    std::fs::create_dir_all(path)?;

    let config_content = r#"jobs:
  - name: controls
    template: controls.template.cs
    output: controls.cs
    enabled: true

render:
  declaration: "    public class {name} : {base}"
  open: "    {"
  close: "    }"
"#;
    std::fs::write(&config_path, config_content)?;

    let template_content = r#"using System.Windows.Forms;

namespace Controls
{
    // -- begin types --
    // -- Btn : Button --
        public Btn(string text, Control parent) {
            this.Text = text;
            parent.Controls.Add(this);
        }
    // -- Tb : TextBox --
        public Tb(Control parent) {
            parent.Controls.Add(this);
        }
    // -- end types --

    // -- begin control copy --
    // -- foreach name, amount in [('Right', 1), ('Left', -1)] --
        public void Nudge{{name}}() {
            this.Left += {{amount}};
        }
    // -- endforeach --
    // -- end control copy --
    // -- write controls --
}
"#;
    std::fs::write(path.join("controls.template.cs"), template_content)?;

    info!("✓ Project initialized successfully!");
    info!("  Run: flatgen -c {:?}", config_path);

    Ok(())
}

fn generate(cli: &Cli) -> Result<()> {
    info!("Loading config from {:?}", cli.config);
    let config = GeneratorConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;

    let base = cli.config.parent().unwrap_or(Path::new(".")).to_path_buf();
    let output_base = cli.output.clone().unwrap_or_else(|| base.clone());

    if cli.dry_run {
        info!("=== DRY RUN MODE ===");
    }

    let generator = FileGenerator::new(config.render.clone(), cli.dry_run);
    let mut generated = 0;

    for job in &config.jobs {
        let name = job.display_name();
        if !job.enabled {
            info!("Skipping disabled job: {}", name);
            continue;
        }

        if job.name.is_some() && should_filter(&name, &cli.include, &cli.exclude) {
            info!("Skipping job: {}", name);
            continue;
        }

        let template_path = job.template_path(&base);
        let output_path = job.output_path(&output_base);
        info!("Generating {}: {:?} -> {:?}", name, template_path, output_path);
        generator
            .generate(&template_path, &output_path)
            .with_context(|| format!("Failed to generate {:?} from {:?}", output_path, template_path))?;
        generated += 1;
    }

    if generated == 0 {
        warn!("No job was run");
    }

    if cli.dry_run {
        info!("=== DRY RUN COMPLETE ===");
    }
    info!("Done");

    Ok(())
}

fn should_filter(name: &str, include: &[String], exclude: &[String]) -> bool {
    // With include patterns, the name must match at least one
    if !include.is_empty() && !include.iter().any(|p| matches_pattern(name, p)) {
        return true;
    }

    exclude.iter().any(|p| matches_pattern(name, p))
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    if let Some(regex_pattern) = pattern.strip_prefix("regex:") {
        return match regex::Regex::new(regex_pattern) {
            Ok(re) => re.is_match(name),
            Err(e) => {
                warn!("Invalid filter regex '{}': {}", regex_pattern, e);
                false
            }
        };
    }

    if let Some((prefix, suffix)) = pattern.split_once('*') {
        if !suffix.contains('*') {
            return name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix);
        }
    }

    name == pattern
}
