use shopfront::SceneConfig;

/// Build the scene configuration from CLI args and environment.
///
/// Supported:
///   --seed <n>
///   --seed=<n>
///   --debug-proxies
///   SHOPFRONT_SEED environment variable
///   SHOPFRONT_DEBUG_PROXIES environment variable (any value but `0`)
pub fn read_config_from_cli_env() -> SceneConfig {
    parse(std::env::args().skip(1), |key| std::env::var(key).ok())
}

fn parse(
    args: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> SceneConfig {
    let mut config = SceneConfig::default();
    let mut seed: Option<String> = None;
    let mut pending_seed = false;

    for arg in args {
        if pending_seed {
            pending_seed = false;
            seed = Some(arg);
        } else if arg == "--seed" {
            pending_seed = true;
        } else if let Some(val) = arg.strip_prefix("--seed=") {
            seed = Some(val.to_string());
        } else if arg == "--debug-proxies" {
            config.debug_proxies = true;
        }
    }

    let seed = seed.or_else(|| env("SHOPFRONT_SEED"));
    if let Some(raw) = seed {
        match raw.trim().parse::<u64>() {
            Ok(value) => config.decoration_seed = value,
            Err(err) => log::warn!("ignoring decoration seed `{raw}`: {err}"),
        }
    }
    if env("SHOPFRONT_DEBUG_PROXIES").is_some_and(|v| v != "0") {
        config.debug_proxies = true;
    }

    config
}
