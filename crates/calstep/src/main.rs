use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use calendar_core::campaign::Campaign;
use calendar_core::clock::CalendarState;
use calendar_core::io::setup::{build_campaign, CampaignFile};
use calendar_core::{rng, walk_days, weather};
use clap::Parser;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "calstep",
    about = "Batch runner that walks a campaign calendar and writes NDJSON day frames"
)]
struct Args {
    /// Path to the campaign JSON document.
    #[arg(long = "campaign-file", value_name = "PATH")]
    campaign_file: PathBuf,

    /// Seed for the weather stream; defaults to one derived from the campaign id.
    #[arg(long, value_name = "NUMBER", conflicts_with = "weather_seed")]
    seed: Option<u64>,

    /// Alias for `--seed`.
    #[arg(long = "weather-seed", value_name = "NUMBER", conflicts_with = "seed")]
    weather_seed: Option<u64>,

    /// Number of days to walk.
    #[arg(long)]
    days: u32,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,

    /// Keep the stored weather table instead of generating the walked range.
    #[arg(long = "no-weather")]
    no_weather: bool,

    /// Optional path to write the campaign, advanced past the walk, as JSON.
    #[arg(long = "emit-state", value_name = "PATH")]
    emit_state: Option<PathBuf>,
}

/// Walk `days` days of `campaign`, returning the final state and one NDJSON
/// line per day.
fn run(
    campaign: &Campaign,
    days: u32,
    seed: Option<u64>,
    with_weather: bool,
) -> Result<(CalendarState, Vec<String>)> {
    let mut state = campaign.state()?.clone();
    if with_weather {
        let start = state.today();
        let mut stream = rng::weather_stream(&campaign.id, start, seed);
        let generated = weather::generate(&campaign.config, start, days, &mut stream)
            .with_context(|| format!("weather generation failed for {}", campaign.id))?;
        debug!(campaign = %campaign.id, %start, entries = generated.len(), "weather generated");
        state = state.merge_weather(generated);
    }

    let (end, frames) = walk_days(&state, &campaign.config, &campaign.events, days)?;
    let lines = frames
        .iter()
        .map(|frame| frame.to_ndjson())
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok((end, lines))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let file = CampaignFile::load_from_path(&args.campaign_file)
        .with_context(|| format!("failed to read campaign {:?}", args.campaign_file))?;
    let mut campaign = build_campaign(file)?;
    info!(campaign = %campaign.id, days = args.days, "walking calendar");

    let (end, lines) = run(
        &campaign,
        args.days,
        args.seed.or(args.weather_seed),
        !args.no_weather,
    )?;

    let frame_file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut frame_writer = BufWriter::new(frame_file);
    for line in &lines {
        frame_writer.write_all(line.as_bytes())?;
    }
    frame_writer.flush()?;

    if let Some(path) = &args.emit_state {
        campaign.state = Some(end.clone());
        let file = File::create(path)
            .with_context(|| format!("failed to create state file at {:?}", path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &campaign)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    info!(campaign = %campaign.id, today = %end.today(), frames = lines.len(), "walk complete");
    Ok(())
}
