use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use chart_schema::{LaneMode, Song};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use midi_import::{ImportOptions, OctaveReport};
use rhythm_core::config::GameConfig;
use rhythm_core::gameplay::Difficulty;

mod play;

#[derive(Debug, Parser)]
#[command(name = "rhythm")]
#[command(about = "MIDI chart converter and headless rhythm game runner", long_about = None)]
struct Cli {
    /// -v for debug, -vv for trace. RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Lanes {
    #[value(name = "4")]
    Four,
    #[value(name = "6")]
    Six,
}

impl From<Lanes> for LaneMode {
    fn from(lanes: Lanes) -> Self {
        match lanes {
            Lanes::Four => LaneMode::Four,
            Lanes::Six => LaneMode::Six,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Speed {
    Easy,
    Normal,
    Hard,
}

impl From<Speed> for Difficulty {
    fn from(speed: Speed) -> Self {
        match speed {
            Speed::Easy => Difficulty::Easy,
            Speed::Normal => Difficulty::Normal,
            Speed::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the octave histogram of the first track with notes.
    Analyze { input: PathBuf },
    /// Convert a MIDI file into a chart.
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Defaults to the recommended window when neither bound is given.
        #[arg(long)]
        min_octave: Option<i32>,
        #[arg(long)]
        max_octave: Option<i32>,
        /// Keep every note instead of one per onset.
        #[arg(long)]
        all_notes: bool,
        #[arg(long, default_value_t = midi_import::DEFAULT_TIME_SCALE)]
        time_scale: f64,
        #[arg(long, value_enum, default_value = "4")]
        lanes: Lanes,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
    /// Autoplay a chart on a virtual clock and print the result.
    Play {
        chart: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Overrides the difficulty from the config.
        #[arg(long, value_enum)]
        difficulty: Option<Speed>,
        /// Also print every frame snapshot as a JSON line.
        #[arg(long)]
        snapshots: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze { input } => {
            let report = midi_import::analyze_file(&input)
                .with_context(|| format!("analyze failed: {}", input.display()))?;
            print_report(&report, &mut io::stdout().lock())?;
        }
        Command::Convert {
            input,
            output,
            min_octave,
            max_octave,
            all_notes,
            time_scale,
            lanes,
            timeout_ms,
        } => {
            if !(time_scale > 0.0) {
                anyhow::bail!("--time-scale must be positive, got {time_scale}");
            }
            let mut options = ImportOptions {
                min_octave,
                max_octave,
                melody_only: !all_notes,
                time_scale,
                lane_mode: lanes.into(),
                ..ImportOptions::default()
            };
            let timeout = Duration::from_millis(timeout_ms);
            if min_octave.is_none() && max_octave.is_none() {
                let report = midi_import::analyze_file_with_timeout(&input, timeout)
                    .with_context(|| format!("convert failed: {}", input.display()))?;
                options = options.with_recommended_range(&report);
            }

            let song = midi_import::import_file_with_timeout(&input, &options, timeout)
                .with_context(|| format!("convert failed: {}", input.display()))?;

            let json = song.to_json_pretty().context("failed to serialize chart")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
            println!(
                "wrote {} notes (octaves {}..{}) to {}",
                song.notes.len(),
                fmt_bound(options.min_octave),
                fmt_bound(options.max_octave),
                out_path.display()
            );
        }
        Command::Play {
            chart,
            config,
            fps,
            difficulty,
            snapshots,
        } => {
            let text = fs::read_to_string(&chart)
                .with_context(|| format!("failed to read chart: {}", chart.display()))?;
            let song = Song::from_json_str(&text)
                .with_context(|| format!("failed to parse chart json: {}", chart.display()))?;
            let config = match config {
                Some(path) => GameConfig::load(path)?,
                None => GameConfig::default(),
            };

            let options = play::PlayOptions {
                fps,
                difficulty: difficulty.map(Difficulty::from),
                snapshots,
            };
            play::autoplay(song, &config, &options, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn print_report(report: &OctaveReport, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Octave | Notes |      %")?;
    writeln!(out, "-------|-------|-------")?;
    for stat in &report.octave_stats {
        writeln!(out, "{:6} | {:5} | {:6.1}", stat.octave, stat.count, stat.percentage)?;
    }
    writeln!(
        out,
        "total: {} notes, octaves {}..{}",
        report.total_notes, report.min_octave, report.max_octave
    )?;
    writeln!(
        out,
        "recommended: {}..{} ({} notes)",
        report.recommended_min_octave,
        report.recommended_max_octave,
        report.recommended_count()
    )?;
    Ok(())
}

fn fmt_bound(bound: Option<i32>) -> String {
    bound.map_or_else(|| "*".to_string(), |b| b.to_string())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("chart.json");
    out
}
