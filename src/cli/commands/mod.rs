use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("kunci")
        .about("Credential management and authentication API")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("KUNCI_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("store-url")
                .short('s')
                .long("store-url")
                .help("Account store connection string")
                .default_value("redis://localhost:6379")
                .env("KUNCI_STORE_URL"),
        )
        .arg(
            Arg::new("max-fails")
                .long("max-fails")
                .help("Failed login attempts allowed before an account is locked")
                .default_value("5")
                .env("KUNCI_MAX_FAILS")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new("lock-seconds")
                .long("lock-seconds")
                .help("Account lock duration in seconds, also the failure-counting window")
                .default_value("900")
                .env("KUNCI_LOCK_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("KUNCI_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
