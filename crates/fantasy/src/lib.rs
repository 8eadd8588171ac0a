use anyhow::{bail, Result};
use fantasy_console::{Cartridge, ConsoleApp, ConsoleProfile, HeadlessContext, SessionOptions};
use fantasy_sdl2::{SdlContext, SdlInitInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Default,
    Alt,
}

impl ProfileKind {
    pub fn profile(self) -> ConsoleProfile {
        match self {
            ProfileKind::Default => ConsoleProfile::default_profile(),
            ProfileKind::Alt => ConsoleProfile::alt_profile(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    Sdl,
    Headless { frames: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub profile: ProfileKind,
    pub frontend: Frontend,
}

impl Default for Command {
    fn default() -> Self {
        Self {
            profile: ProfileKind::Alt,
            frontend: Frontend::Sdl,
        }
    }
}

pub const USAGE: &str = "usage: fantasy [run] [demo] [--profile default|alt] [--headless FRAMES]";

/// Parse the arguments after the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut command = Command::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "run" | "demo" => {}
            "--profile" => {
                let value = args.next();
                let value: Option<&str> = value.as_ref().map(|v| v.as_ref());
                command.profile = match value {
                    Some("default") => ProfileKind::Default,
                    Some("alt") => ProfileKind::Alt,
                    Some(other) => bail!("unknown profile '{other}'"),
                    None => bail!("--profile needs a value"),
                };
            }
            "--headless" => {
                let frames = match args.next() {
                    Some(value) => value.as_ref().parse::<u64>()?,
                    None => bail!("--headless needs a frame count"),
                };
                command.frontend = Frontend::Headless { frames };
            }
            other => bail!("unexpected argument '{other}'"),
        }
    }
    Ok(command)
}

pub fn run(command: &Command) -> Result<()> {
    let app = ConsoleApp::new(
        command.profile.profile(),
        Cartridge::demo(),
        SessionOptions::default(),
    );
    match command.frontend {
        Frontend::Sdl => run_sdl(app),
        Frontend::Headless { frames } => run_headless(app, frames),
    }
}

pub fn run_sdl(app: ConsoleApp) -> Result<()> {
    let init_info = SdlInitInfo::for_app(&app);
    SdlContext::run(init_info, app)?;
    Ok(())
}

pub fn run_headless(mut app: ConsoleApp, frames: u64) -> Result<()> {
    let ran = HeadlessContext::run(&mut app, frames);
    for line in app.session_mut().take_transcript() {
        log::info!("script: {line}");
    }
    log::info!(
        "ran {ran} frames, session {:?}",
        app.session().state()
    );
    Ok(())
}
