//! Common utilities for integration tests

use cli_lib::{Outcome, ReplCommand, Session, SystemConfig};

/// Configuration with fixed timings
pub fn test_config(delay_ms: u64, latency_ms: u64) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.debounce.delay_ms = delay_ms;
    config.api.latency_ms = latency_ms;
    config.repl.keystroke_ms = 50;
    config
}

/// Session with locations already loaded
pub async fn session(config: &SystemConfig) -> Session {
    let session = Session::new(config).unwrap();
    session.load_locations().await.unwrap();
    session
}

/// Parse and execute one line, returning the printed text
pub async fn exec(session: &Session, line: &str) -> String {
    let command: ReplCommand = line.parse().unwrap();
    match session.execute(command).await.unwrap() {
        Outcome::Continue(text) => text,
        Outcome::Quit => panic!("unexpected quit for '{}'", line),
    }
}
