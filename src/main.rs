use std::{
    io::{stdout, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use serde_json::Value;
use simple_logger::SimpleLogger;

mod classify;
mod clean;
mod document;
mod osm;
mod sample;
mod shape;
mod stats;
mod util;

use crate::{
    classify::{classify, KeyBuckets},
    shape::Shaper,
};

#[derive(Parser)]
#[command(name = "osmclean")]
#[command(bin_name = "osmclean")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every k-th node, way and relation to a smaller extract
    Sample {
        #[arg(short, long)]
        in_file: PathBuf,

        #[arg(short, long)]
        out_file: PathBuf,

        #[arg(short, default_value = "10")]
        k: NonZeroUsize,
    },
    /// Print tag frequencies and the keys sorted into each bucket
    Audit {
        #[arg(short, long)]
        in_file: PathBuf,

        /// Save the bucket keys for later `clean` runs
        #[arg(long)]
        buckets_out: Option<PathBuf>,

        /// Also print the distinct values of each bucket
        #[arg(long)]
        values: bool,
    },
    /// Shape and clean every node and way into a JSON array
    Clean {
        #[arg(short, long)]
        in_file: PathBuf,

        #[arg(short, long)]
        out_file: PathBuf,

        /// Bucket keys written by `audit`; classified from the input when missing
        #[arg(short, long)]
        buckets: Option<PathBuf>,
    },
    /// Count contributors, fast food chains and cuisines in a cleaned JSON array
    Stats {
        #[arg(short, long)]
        in_file: PathBuf,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// List the fast food chains serving this cuisine
        #[arg(short, long)]
        cuisine: Vec<String>,
    },
}

fn main() -> Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let cli = Cli::parse();

    match &cli.command {
        Commands::Sample {
            in_file,
            out_file,
            k,
        } => {
            info!("Sampling every {k}th element of {in_file:?}");
            let mut out = util::create(out_file)?;
            let summary = sample::sample(util::open(in_file)?, &mut out, *k)?;
            out.flush()?;
            info!(
                "Kept {} of {} elements in {out_file:?}",
                summary.kept, summary.seen
            );
        }
        Commands::Audit {
            in_file,
            buckets_out,
            values,
        } => {
            info!("Auditing tags of {in_file:?}");
            let (buckets, audit) = classify(util::load_elements(in_file)?)?;
            stats::to_audit(&buckets, &audit, *values, stdout().lock())?;

            if let Some(path) = buckets_out {
                let mut out = util::create(path)?;
                serde_json::to_writer_pretty(&mut out, &buckets)?;
                out.flush()?;
                info!("Saved {} bucket keys to {path:?}", buckets.len());
            }
        }
        Commands::Clean {
            in_file,
            out_file,
            buckets,
        } => {
            let buckets = load_buckets(in_file, buckets.as_deref())?;
            let shaper = Shaper::new(&buckets);

            info!("Shaping {in_file:?}");
            let mut docs = Vec::new();
            for element in util::load_elements(in_file)? {
                if let Some(doc) = shaper.shape(element?) {
                    docs.push(doc);
                }
            }
            info!("Shaped {} documents", docs.len());

            let report = clean::clean_all(&mut docs);
            for (rule, count) in &report.changed {
                info!("{rule}: {count} documents changed");
            }
            for flagged in &report.flagged {
                warn!("{}: {} left as is, {}", flagged.id, flagged.rule, flagged.error);
            }

            util::write_json_array(&docs, util::create(out_file)?)
                .with_context(|| format!("cannot write {out_file:?}"))?;
            info!("Wrote {} documents to {out_file:?}", docs.len());
        }
        Commands::Stats {
            in_file,
            limit,
            cuisine,
        } => {
            let docs: Vec<Value> = util::read_json(in_file)?;
            stats::to_stats(&docs, *limit, cuisine, stdout().lock())?;
        }
    }

    Ok(())
}

fn load_buckets(in_file: &Path, saved: Option<&Path>) -> Result<KeyBuckets> {
    if let Some(path) = saved {
        info!("Loading bucket keys from {path:?}");
        return util::read_json(path);
    }

    info!("Classifying tag keys of {in_file:?}");
    let (buckets, _) = classify(util::load_elements(in_file)?)?;
    info!("Found {} bucket keys", buckets.len());

    Ok(buckets)
}
