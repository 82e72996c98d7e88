use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{
    ChunkSelectionConfig, ConfigMode, RandomChunkConfig, SectionSelectionConfig, load_config,
};
use crate::constants::config::{
    CHUNKS_BASENAME, DEFAULT_CONFIG_DIR, RANDOM_CHUNKS_BASENAME, SECTIONS_BASENAME,
};
use crate::coverage::GreedyStrategy;
use crate::pipeline::{SampleStatus, curate_chunks, curate_random_chunks, curate_sections};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Rescan,
    Lazy,
}

impl From<StrategyArg> for GreedyStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Rescan => GreedyStrategy::Rescan,
            StrategyArg::Lazy => GreedyStrategy::Lazy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "select_sections",
    disable_help_subcommand = true,
    about = "Select representative sections per sample",
    long_about = "Draw a seeded, evenly spaced set of sections from every sample folder and copy them, or write a stack around each one.",
    after_help = "Settings come from <config-dir>/select_representative_sections_{local,template,test}.json; flags override the file."
)]
struct SelectSectionsCli {
    #[arg(long, default_value = DEFAULT_CONFIG_DIR, help = "Directory holding config files")]
    config_dir: PathBuf,
    #[arg(long, help = "Read the *_test.json config instead of local/template")]
    test_mode: bool,
    #[arg(long, value_parser = parse_positive_usize, help = "Sections per sample")]
    sample_size: Option<usize>,
    #[arg(long, value_name = "PATH", help = "Destination folder")]
    out_path: Option<PathBuf>,
    #[arg(
        long = "folder",
        value_name = "PATH",
        help = "Section folder override, repeat as needed"
    )]
    folders: Vec<PathBuf>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "BOOL",
        help = "Write a stack around each selected section (`--make-zstacks=false` forces copy mode)"
    )]
    make_zstacks: Option<bool>,
    #[arg(long, value_parser = parse_positive_usize, help = "Stack depth in sections")]
    z_stack_number: Option<usize>,
    #[arg(long, help = "Underscore-token index of the sample key in folder names")]
    sample_id_token: Option<usize>,
}

#[derive(Debug, Parser)]
#[command(
    name = "select_chunks",
    disable_help_subcommand = true,
    about = "Select chunk pairs that cover the most atlas regions",
    long_about = "Pick atlas chunks by greedy region set cover, fill the remaining budget with a fixed-seed random draw, and copy each atlas chunk with its image chunk.",
    after_help = "Settings come from <config-dir>/select_representative_chunks_{local,template,test}.json; flags override the file."
)]
struct SelectChunksCli {
    #[arg(long, default_value = DEFAULT_CONFIG_DIR, help = "Directory holding config files")]
    config_dir: PathBuf,
    #[arg(long, help = "Read the *_test.json config instead of local/template")]
    test_mode: bool,
    #[arg(long, help = "Number of chunk pairs to select")]
    number_of_chunks: Option<usize>,
    #[arg(long, value_enum, help = "Greedy search strategy")]
    strategy: Option<StrategyArg>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "BOOL",
        help = "Drop region id 0 before selection (`--ignore-background=false` keeps it)"
    )]
    ignore_background: Option<bool>,
    #[arg(long, value_name = "PATH", help = "Image chunk folder")]
    chunk_dir: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Atlas chunk folder")]
    atlas_chunk_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "select_random_chunks",
    disable_help_subcommand = true,
    about = "Select an evenly spread, shuffled subset of chunks",
    long_about = "Pick chunks at evenly spaced positions, shuffle the emission order with a fixed seed, and copy them with a rank prefix.",
    after_help = "Settings come from <config-dir>/select_random_chunks_{local,template,test}.json; flags override the file."
)]
struct SelectRandomChunksCli {
    #[arg(long, default_value = DEFAULT_CONFIG_DIR, help = "Directory holding config files")]
    config_dir: PathBuf,
    #[arg(long, help = "Read the *_test.json config instead of local/template")]
    test_mode: bool,
    #[arg(long, help = "Number of chunks to select")]
    num_files_to_select: Option<usize>,
    #[arg(long, help = "Seed for the emission-order shuffle")]
    seed: Option<u64>,
    #[arg(long, value_name = "PATH", help = "Image chunk folder")]
    chunk_dir: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Destination folder")]
    out_dir: Option<PathBuf>,
}

impl SelectSectionsCli {
    fn apply_to(self, config: &mut SectionSelectionConfig) {
        if let Some(sample_size) = self.sample_size {
            config.sample_size = sample_size;
        }
        if let Some(out_path) = self.out_path {
            config.out_path = out_path;
        }
        if !self.folders.is_empty() {
            config.folder_paths = self.folders;
        }
        if let Some(make_zstacks) = self.make_zstacks {
            config.make_zstacks = make_zstacks;
        }
        if let Some(depth) = self.z_stack_number {
            config.z_stack_number = depth;
        }
        if let Some(token) = self.sample_id_token {
            config.sample_id_token = token;
        }
    }
}

impl SelectChunksCli {
    fn apply_to(self, config: &mut ChunkSelectionConfig) {
        if let Some(budget) = self.number_of_chunks {
            config.number_of_chunks = budget;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy.into();
        }
        if let Some(ignore_background) = self.ignore_background {
            config.ignore_background = ignore_background;
        }
        if let Some(chunk_dir) = self.chunk_dir {
            config.chunk_dir = chunk_dir;
        }
        if let Some(atlas_chunk_dir) = self.atlas_chunk_dir {
            config.atlas_chunk_dir = atlas_chunk_dir;
        }
    }
}

impl SelectRandomChunksCli {
    fn apply_to(self, config: &mut RandomChunkConfig) {
        if let Some(count) = self.num_files_to_select {
            config.num_files_to_select = count;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(chunk_dir) = self.chunk_dir {
            config.chunk_dir = chunk_dir;
        }
        if let Some(out_dir) = self.out_dir {
            config.out_dir = out_dir;
        }
    }
}

fn config_mode(test_mode: bool) -> ConfigMode {
    if test_mode {
        ConfigMode::Test
    } else {
        ConfigMode::Standard
    }
}

/// Run section selection with CLI args (program name excluded).
pub fn run_select_sections<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<SelectSectionsCli, _>(
        std::iter::once("select_sections".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut config: SectionSelectionConfig =
        load_config(&cli.config_dir, SECTIONS_BASENAME, config_mode(cli.test_mode))?;
    cli.apply_to(&mut config);
    let config = config.validated()?;

    let report = curate_sections(&config)?;
    println!("=== section selection ===");
    for sample in &report.samples {
        let status = match &sample.status {
            SampleStatus::Sampled => "sampled".to_string(),
            SampleStatus::NotEnoughSections => "not enough sections (all used)".to_string(),
            SampleStatus::Skipped { reason } => format!("skipped: {reason}"),
        };
        println!(
            "{:<16} pool={:<5} selected={:<4} written={:<4} {}",
            sample.sample_key,
            sample.pool_len,
            sample.selected.len(),
            sample.written.len(),
            status
        );
    }
    println!(
        "{} files written to {}",
        report.written_count(),
        config.out_path.display()
    );
    println!("manifest: {}", report.manifest.display());
    Ok(())
}

/// Run coverage chunk selection with CLI args (program name excluded).
pub fn run_select_chunks<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<SelectChunksCli, _>(
        std::iter::once("select_chunks".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut config: ChunkSelectionConfig =
        load_config(&cli.config_dir, CHUNKS_BASENAME, config_mode(cli.test_mode))?;
    cli.apply_to(&mut config);
    let config = config.validated()?;

    let report = curate_chunks(&config)?;
    let coverage = &report.coverage;
    println!("=== chunk selection ===");
    println!(
        "pool chunks: {} | selected: {} (greedy {}, fill {})",
        coverage.pool_chunks,
        coverage.selected_chunks,
        coverage.greedy_chunks,
        coverage.filled_chunks
    );
    println!(
        "regions covered: {}/{} ({:.2}%)",
        coverage.covered_regions,
        coverage.distinct_regions,
        coverage.fraction * 100.0
    );
    println!(
        "chunks per covered region: min={} max={}",
        coverage.min_per_region, coverage.max_per_region
    );
    println!("manifest: {}", report.manifest.display());
    Ok(())
}

/// Run random spread chunk selection with CLI args (program name excluded).
pub fn run_select_random_chunks<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<SelectRandomChunksCli, _>(
        std::iter::once("select_random_chunks".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut config: RandomChunkConfig = load_config(
        &cli.config_dir,
        RANDOM_CHUNKS_BASENAME,
        config_mode(cli.test_mode),
    )?;
    cli.apply_to(&mut config);
    let config = config.validated()?;

    let report = curate_random_chunks(&config)?;
    println!("=== random chunk selection ===");
    if report.clamped {
        println!("requested more chunks than available; selected all");
    }
    println!(
        "{} chunks copied to {}",
        report.copied.len(),
        config.out_dir.display()
    );
    println!("manifest: {}", report.manifest.display());
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

/// Parse `args` into `T`; `None` means help or version text was printed.
fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    let err = match T::try_parse_from(args) {
        Ok(cli) => return Ok(Some(cli)),
        Err(err) => err,
    };
    let informational = matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    );
    if !informational {
        return Err(Box::new(err));
    }
    err.print()?;
    Ok(None)
}
