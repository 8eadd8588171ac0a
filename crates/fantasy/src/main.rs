fn main() {
    env_logger::init();

    let command = match fantasy::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n{}", fantasy::USAGE);
            std::process::exit(1);
        }
    };

    log::info!(
        "running demo cartridge with {:?} profile ({:?})",
        command.profile,
        command.frontend
    );
    if let Err(err) = fantasy::run(&command) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
