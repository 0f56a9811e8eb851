
use chrono::{ Local, Timelike };
use env_logger::Env;
use std::io::Write;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log to stderr; `RUST_LOG` or `--log-filter` pick the verbosity.
pub fn init_logging(cli_filter: Option<&str>) {
    let env = Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(filter) = cli_filter {
        builder.parse_filters(filter);
    }
    builder.format(|buf, record| {
        let now = Local::now();
        writeln!(buf, "{:02}:{:02}:{:02}| {:<5} {}",
            now.hour(),
            now.minute(),
            now.second(),
            record.level(),
            record.args()
        )
    });
    builder.init();
}
