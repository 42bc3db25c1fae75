use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clangen_front::{
    CliDriver, FrontConfig, InMemorySim, JsonFileStore, LineClient, Preferences, QueuedNotifier,
    ScreenContext, SimRuntime,
};
use clangen_front::metrics::FrontMetrics;
use clangen_front::render::RendererSettings;

const DEFAULT_CONFIG: &str = "clangen-front.json";
const USAGE: &str = "usage: clangen-front [--demo] [--config <file>]";

struct Args {
    demo: bool,
    config: PathBuf,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        demo: false,
        config: PathBuf::from(DEFAULT_CONFIG),
    };
    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--demo" => args.demo = true,
            "--config" => {
                args.config = raw.next().map(PathBuf::from).ok_or(USAGE)?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("unexpected argument `{other}`\n{USAGE}")),
        }
    }
    Ok(args)
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = FrontConfig::load(&args.config)?;
    let logger = config.build_logger()?;
    let ctx = ScreenContext::from_config(&config, Arc::new(QueuedNotifier::new()))
        .with_logger(logger.clone())
        .with_metrics(FrontMetrics::shared());

    let prefs = match config.prefs_path.as_ref() {
        Some(path) => Preferences::new(JsonFileStore::open(path)?),
        None => Preferences::in_memory(),
    };

    let mut driver = if args.demo {
        let sim = Arc::new(InMemorySim::demo());
        CliDriver::new(sim.clone(), prefs, ctx).with_demo(sim)
    } else {
        let mut client = LineClient::spawn(&config.runtime_command)?;
        if let Some(logger) = logger {
            client = client.with_logger(logger);
        }
        let runtime: Arc<dyn SimRuntime> = Arc::new(client);
        CliDriver::new(runtime, prefs, ctx)
    };

    // Piped output has no terminal size; keep the default width.
    if let Ok((width, _)) = crossterm::terminal::size() {
        driver = driver.with_renderer_settings(RendererSettings {
            width,
            ..RendererSettings::default()
        });
    }

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut output = io::stdout();
    driver.run(input, &mut output).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("clangen-front: {err}");
            ExitCode::FAILURE
        }
    }
}
