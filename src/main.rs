use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ssqscraper::{
    config::Config,
    decode::{decode, EncodingPolicy},
    parse::parse_detail,
    progress::LogProgress,
    run,
    store::load_records,
    HttpSource,
};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "ssqscraper", about = "Download Shuangseqiu draw results")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the newest draws and write them to the save directory.
    Download {
        /// YAML file with settings; flags and SSQ_* env vars win over it.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory for the output file (default ./data/).
        #[arg(long)]
        save_dir: Option<PathBuf>,
        /// Encoding for draw pages: a charset label, or "auto".
        #[arg(long)]
        encoding: Option<String>,
        /// Number of newest draws to fetch.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Parse a saved draw page and print it as JSON.
    Parse {
        file: PathBuf,
        #[arg(long, default_value = "gb18030")]
        encoding: String,
    },
    /// Print one line per draw from an output file.
    Show { file: PathBuf },
}

fn main() -> Result<()> {
    // ─── init logging ────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    match Cli::parse().command {
        Command::Download {
            config,
            save_dir,
            encoding,
            limit,
        } => {
            let mut cfg = match config {
                Some(path) => Config::from_yaml_file(&path)?,
                None => Config::default(),
            };
            cfg.apply_env()?;
            if let Some(dir) = save_dir {
                cfg.save_dir = dir;
            }
            if let Some(enc) = encoding {
                cfg.encoding = enc;
            }
            if let Some(limit) = limit {
                cfg.limit = limit;
            }

            let source = HttpSource::new().context("building HTTP client")?;
            let summary = run(&cfg, &source, &mut LogProgress::default())?;
            info!(
                records = summary.records,
                failed = summary.failures.len(),
                urls = summary.urls,
                "wrote {}",
                summary.output.display()
            );
        }

        Command::Parse { file, encoding } => {
            let bytes = fs::read(&file).with_context(|| format!("reading {:?}", file))?;
            let policy = EncodingPolicy::from_label(&encoding)?;
            let html = decode(&bytes, policy, None)?;
            let record = parse_detail(&html)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Show { file } => {
            for r in load_records(&file)? {
                let sales = r
                    .sales_amount
                    .map_or_else(|| "-".to_string(), |v| format!("{:.0}", v));
                println!("{}  {}  sales {}", r.date, r.numbers_line(), sales);
            }
        }
    }

    Ok(())
}
