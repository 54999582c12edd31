use std::{
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use clap::{Parser, Subcommand};
use keepsake_core::{
    AnimationBackend, AppConfig, DirectoryAssets, FileStorage, KeepsakeError, MediaMap,
    ProgressStore, SceneEnv, SceneInput, SceneRegistry, SceneRouter, Timeline,
};
use tracing_subscriber::EnvFilter;

fn main() -> keepsake_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Play {
            seed,
            script,
            instant,
            max_secs,
        } => run_play(config, seed, script.as_deref(), instant, max_secs),
        Commands::Lyrics { file } => run_lyrics(&file),
        Commands::Progress { action } => run_progress(&config, action),
    }
}

fn load_config(path: Option<&Path>) -> keepsake_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => {
            let config = AppConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn open_store(config: &AppConfig) -> ProgressStore {
    let storage = FileStorage::new(&config.storage.directory);
    ProgressStore::open(Box::new(storage), config.storage.key.clone())
}

fn run_play(
    mut config: AppConfig,
    seed: Option<u64>,
    script: Option<&Path>,
    instant: bool,
    max_secs: u64,
) -> keepsake_core::Result<()> {
    if instant {
        config.animation = AnimationBackend::Instant;
    }
    let steps = match script {
        Some(path) => parse_script(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    tracing::info!(steps = steps.len(), ?seed, "starting playback");

    let assets = Rc::new(DirectoryAssets::new(&config.assets.root));
    let resolver = Rc::new(MediaMap::load(&*assets, &config.assets.media_map));
    let frame = config.song.frame_interval();
    let progress = open_store(&config);

    let mut env = SceneEnv::new(config, assets, resolver);
    if let Some(seed) = seed {
        env = env.with_seed(seed);
    }
    let mut router = SceneRouter::new(env, SceneRegistry::standard(), progress);

    let limit = Duration::from_secs(max_secs);
    let mut pending = steps.into_iter().peekable();
    let mut now = Duration::ZERO;
    router.start(now);

    while now <= limit && !router.is_finished() {
        while let Some((_, input)) = pending.next_if(|(at, _)| *at <= now) {
            router.dispatch(input);
        }
        router.tick(now);
        now += frame;
    }

    tracing::info!(
        scene = %router.current(),
        elapsed_ms = now.as_millis() as u64,
        unused_steps = pending.count(),
        "playback stopped"
    );
    println!("{}", serde_json::to_string_pretty(router.view())?);
    Ok(())
}

/// One `<at_ms> <input>` step per line; blank lines and `#` comments are
/// skipped. Steps are returned in time order.
fn parse_script(text: &str) -> keepsake_core::Result<Vec<(Duration, SceneInput)>> {
    let mut steps = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;
        let (at, input) = line.split_once(char::is_whitespace).ok_or_else(|| {
            KeepsakeError::msg(format!("script line {number}: expected `<ms> <input>`"))
        })?;
        let at: u64 = at
            .parse()
            .map_err(|_| KeepsakeError::msg(format!("script line {number}: bad time `{at}`")))?;
        steps.push((Duration::from_millis(at), input.parse::<SceneInput>()?));
    }
    steps.sort_by_key(|(at, _)| *at);
    Ok(steps)
}

fn run_lyrics(file: &PathBuf) -> keepsake_core::Result<()> {
    tracing::info!(?file, "parsing lyrics");
    let text = std::fs::read_to_string(file)?;
    let timeline = Timeline::parse(&text);
    tracing::info!(lines = timeline.len(), "lyrics parsed");
    println!("{}", serde_json::to_string_pretty(&timeline)?);
    Ok(())
}

fn run_progress(config: &AppConfig, action: ProgressAction) -> keepsake_core::Result<()> {
    let mut store = open_store(config);
    let record = match action {
        ProgressAction::Show => store.snapshot(),
        ProgressAction::Reset => {
            tracing::info!(key = store.key(), "resetting progress");
            store.reset()
        }
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Timed scene-by-scene keepsake experience", long_about = None)]
struct Cli {
    /// JSON configuration file. Missing fields take their defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the experience headless on a simulated clock.
    Play {
        /// Seed every random choice so runs replay identically.
        #[arg(long)]
        seed: Option<u64>,
        /// Scripted input, one `<at_ms> <input>` step per line.
        #[arg(long)]
        script: Option<PathBuf>,
        /// Skip animations and jump straight to end states.
        #[arg(long)]
        instant: bool,
        /// Stop after this much simulated time even if the gift was not reached.
        #[arg(long, default_value_t = 600)]
        max_secs: u64,
    },
    /// Parse a timed lyrics file and print it as JSON.
    Lyrics {
        /// Path to the lyrics file.
        file: PathBuf,
    },
    /// Inspect or reset the stored progress record.
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum ProgressAction {
    /// Print the stored record.
    Show,
    /// Restore defaults.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_parse_in_time_order() {
        let steps = parse_script(
            "# unlock\n\
             1200 submit snowflake\n\
             \n\
             300 hint\n",
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                (Duration::from_millis(300), SceneInput::Hint),
                (
                    Duration::from_millis(1_200),
                    SceneInput::Submit("snowflake".into())
                ),
            ]
        );
    }

    #[test]
    fn bad_script_lines_are_reported() {
        assert!(parse_script("soon tap").is_err());
        assert!(parse_script("100").is_err());
        assert!(parse_script("100 dance").is_err());
    }
}
