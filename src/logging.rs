use env_logger::Env;

/// `RUST_LOG` wins; otherwise `info` and up.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}
