pub mod algorithm;
pub mod error;
pub mod input;
pub mod models;
pub mod render;
pub mod scene;
pub mod session;
pub mod telemetry;
pub mod trials;

use std::path::PathBuf;

use error::SessionError;
use input::{InputSource, LiveInput, ScriptedInput};
use models::config::{load_config, SessionConfig};
use session::Session;

/// Command line: `pointlab [config.json] [--script frames.json]`.
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Args {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--script" {
            parsed.script = args.next().map(PathBuf::from);
        } else if parsed.config.is_none() {
            parsed.config = Some(PathBuf::from(arg));
        } else {
            log::warn!("run: ignoring extra argument {arg}");
        }
    }
    parsed
}

pub fn run() -> Result<(), SessionError> {
    env_logger::init();

    let args = parse_args(std::env::args().skip(1));
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };

    let mut source: Box<dyn InputSource> = match &args.script {
        Some(path) => Box::new(ScriptedInput::load(path)?),
        None => Box::new(LiveInput::start(config.input_mode)?),
    };

    let mut session = Session::create(config)?;
    let outcome = session.run(source.as_mut())?;
    log::info!(
        "run: session ended outcome={:?} dir={}",
        outcome,
        session.dir().display()
    );
    Ok(())
}
