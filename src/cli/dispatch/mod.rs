use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        store_url: matches
            .get_one("store-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --store-url"))?,
        max_fails: matches.get_one::<i64>("max-fails").copied().unwrap_or(5),
        lock_seconds: matches
            .get_one::<u64>("lock-seconds")
            .copied()
            .unwrap_or(900),
    })
}
