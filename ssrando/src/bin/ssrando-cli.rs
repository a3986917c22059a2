use anyhow::{Result, bail};
use clap::Parser;
use log::info;
use rand::{RngCore, SeedableRng};
use ssrando::randomize::{Randomization, Randomizer};
use ssrando::settings::{RandomizerSettings, load_randomizer_settings};
use ssrando_game::GameData;
use std::path::PathBuf;

#[derive(Parser)]
struct Args {
    #[arg(long)]
    data: PathBuf,

    #[arg(long)]
    settings: PathBuf,

    #[arg(long)]
    random_seed: Option<usize>,

    #[arg(long)]
    max_attempts: Option<usize>,

    #[arg(long)]
    output_spoiler_log: Option<PathBuf>,
}

fn get_randomization(
    args: &Args,
    settings: &RandomizerSettings,
    game_data: &GameData,
) -> Result<Randomization> {
    let randomizer = Randomizer::new(game_data, settings)?;
    let root_seed = match args.random_seed {
        Some(s) => s,
        None => (rand::rngs::StdRng::from_entropy().next_u64() & 0xFFFFFFFF) as usize,
    };
    let mut rng_seed = [0u8; 32];
    rng_seed[..8].copy_from_slice(&root_seed.to_le_bytes());
    let mut rng = rand::rngs::StdRng::from_seed(rng_seed);
    let max_attempts = args.max_attempts.or(settings.max_attempts).unwrap_or(100);
    for attempt_num in 1..=max_attempts {
        let seed = (rng.next_u64() & 0xFFFFFFFF) as usize;
        info!("Attempt {attempt_num}/{max_attempts}: seed={seed}");
        match randomizer.randomize(seed) {
            Ok(randomization) => {
                return Ok(randomization);
            }
            Err(e) => {
                info!("Attempt {attempt_num}/{max_attempts}: Randomization failed: {e}");
            }
        }
    }
    bail!("Exhausted randomization attempts");
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let game_data = GameData::load(&args.data)?;
    let settings = load_randomizer_settings(&args.settings)?;

    let randomization = get_randomization(&args, &settings, &game_data)?;
    let spoiler_log = &randomization.spoiler_log;
    println!("Seed: {}", randomization.seed);
    for region in &spoiler_log.regions {
        println!("{}:", region.region);
        for item_loc in &region.checks {
            println!("  {}: {}", item_loc.check, item_loc.item);
        }
    }
    if !spoiler_log.unreachable.is_empty() {
        println!("Unreachable:");
        for item_loc in &spoiler_log.unreachable {
            println!("  {} - {}: {}", item_loc.region, item_loc.check, item_loc.item);
        }
    }

    if let Some(output_spoiler_log_path) = &args.output_spoiler_log {
        println!(
            "Writing spoiler log to {}",
            output_spoiler_log_path.display()
        );
        let spoiler_str = serde_json::to_string_pretty(spoiler_log)?;
        std::fs::write(output_spoiler_log_path, spoiler_str)?;
    }

    Ok(())
}
