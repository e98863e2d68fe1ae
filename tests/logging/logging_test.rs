//! Installs a global subscriber, so it runs in its own test binary.

use parsebridge::config::LoggingSettings;
use parsebridge::logging;

#[test]
fn test_init_installs_once() {
    let settings = LoggingSettings {
        filter: "parsebridge=debug".to_string(),
        ansi: false,
    };
    logging::init(&settings).unwrap();

    let err = logging::init(&settings).unwrap_err();
    assert!(err.to_string().starts_with("failed to install tracing subscriber"));
}
