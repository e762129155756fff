// texsel-gen: print the texture-select fragment stage for a given
// capacity, tier, and shading language.
//
//   texsel-gen --capacity 32 --tier case-dispatch --lang glsl
//   texsel-gen --config select.json --output select.wgsl

use std::path::PathBuf;

use clap::Parser;
use log::info;
use texsel_core::{generate_fragment_stage, CapabilityTier, SelectConfig, ShaderLanguage};

#[derive(Parser, Debug)]
#[command(name = "texsel-gen", about = "Generate the texture-select fragment stage")]
struct Cli {
    /// Number of texture slots (overrides the config file)
    #[arg(long)]
    capacity: Option<u32>,
    /// direct-index or case-dispatch (overrides the config file)
    #[arg(long)]
    tier: Option<CapabilityTier>,
    /// Shading language: wgsl or glsl
    #[arg(long, default_value = "wgsl")]
    lang: ShaderLanguage,
    /// JSON file holding a SelectConfig
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the source here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Cli {
    /// Config file (or defaults) with explicit flags applied on top.
    fn select_config(&self) -> Result<SelectConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                SelectConfig::from_json_str(&json).map_err(|e| format!("{}: {e}", path.display()))?
            }
            None => SelectConfig::default(),
        };
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(tier) = self.tier {
            config.tier = tier;
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = cli.select_config()?;
    let source = generate_fragment_stage(&config, cli.lang).map_err(|e| e.to_string())?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &source).map_err(|e| format!("{}: {e}", path.display()))?;
            info!(
                "Wrote {} {} stage ({} slots) to {}",
                config.tier,
                cli.lang,
                config.capacity,
                path.display()
            );
        }
        None => print!("{source}"),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("texsel-gen: {e}");
        std::process::exit(1);
    }
}
