use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use w32asm::{AsmConfig, Assembler};

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble w32 source into a hex word listing")]
struct Opts {
    /// Input assembly file (one instruction or label per line)
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Output listing, one 8-digit hex word per line
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Reject out-of-range values, duplicate labels and extra operands
    #[arg(long)]
    strict: bool,
    /// Assembler settings as JSON; --strict is applied on top
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Also write the label table as JSON
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,
}

fn load_config(path: Option<&Path>, strict: bool) -> Result<AsmConfig> {
    let mut cfg = match path {
        Some(p) => {
            let text = fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", p.display()))?
        }
        None => AsmConfig::default(),
    };
    if strict {
        cfg.strict_ranges = true;
        cfg.reject_duplicate_labels = true;
        cfg.reject_extra_operands = true;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let cfg = load_config(opts.config.as_deref(), opts.strict)?;
    debug!(?cfg, "config");

    let text = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let program = Assembler::new(cfg)
        .assemble(&text)
        .with_context(|| format!("assembling {}", opts.input.display()))?;

    fs::write(&opts.output, program.to_hex())
        .with_context(|| format!("writing {}", opts.output.display()))?;
    if let Some(path) = &opts.symbols {
        let json = serde_json::to_string_pretty(&program.labels)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "assembled {} instructions -> {}",
        program.len(),
        opts.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strict_flag_overrides_config_file() {
        let path = std::env::temp_dir()
            .join(format!("w32asm_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "comment_marker": ";" }"#).unwrap();
        let cfg = load_config(Some(&path), true);
        std::fs::remove_file(&path).unwrap();
        let cfg = cfg.unwrap();
        assert_eq!(cfg.comment_marker, ';');
        assert!(cfg.strict_ranges && cfg.reject_duplicate_labels && cfg.reject_extra_operands);
    }

    #[test]
    fn default_config_without_file() {
        assert_eq!(load_config(None, false).unwrap(), AsmConfig::default());
    }

    #[test]
    fn positional_args_are_required() {
        assert!(Opts::try_parse_from(["w32asm", "in.s"]).is_err());
        let o = Opts::try_parse_from(["w32asm", "in.s", "out.hex", "--strict"]).unwrap();
        assert_eq!(o.output, PathBuf::from("out.hex"));
        assert!(o.strict);
    }
}
