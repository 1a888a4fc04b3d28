use slotscan_core::watchers::WatcherKind;
use slotscan_daemon::config::{load_config, load_config_with_env, DaemonConfig};
use slotscan_logger::{LogFormat, LogOutput};
use solana_sdk::commitment_config::CommitmentLevel;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn load(file: &NamedTempFile) -> anyhow::Result<DaemonConfig> {
    let path = file
        .path()
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("temp path is not utf-8"))?;
    load_config(path)
}

#[test]
fn loads_a_full_file() -> anyhow::Result<()> {
    let file = write_config(
        r#"
[scanner.solana]
rpc-url = "https://api.devnet.solana.com"
commitment = "finalized"

[scanner.scan]
page-limit = 200
max-records-per-scan = 2000
concurrency = 8
poll-interval-secs = 30

[scanner.supply-cache]
ttl-secs = 120

[daemon]
watchers = ["whale-movements"]

[daemon.log]
level = "debug"
format = "json"
output = "stdout"
"#,
    )?;

    let config = load(&file)?;

    assert_eq!(config.scanner.solana.rpc_url, "https://api.devnet.solana.com");
    assert_eq!(config.scanner.solana.commitment, CommitmentLevel::Finalized);
    assert_eq!(config.scanner.scan.page_limit, 200);
    assert_eq!(config.scanner.scan.max_records_per_scan, 2000);
    assert_eq!(config.scanner.scan.concurrency, 8);
    assert_eq!(config.scanner.scan.poll_interval_secs, 30);
    assert_eq!(config.scanner.supply_cache.ttl_secs, 120);
    assert_eq!(config.daemon.watchers, vec![WatcherKind::WhaleMovements]);
    assert_eq!(config.daemon.log.level, "debug");
    assert_eq!(config.daemon.log.format, LogFormat::Json);
    assert_eq!(config.daemon.log.output, LogOutput::Stdout);
    Ok(())
}

#[test]
fn missing_sections_fall_back_to_defaults() -> anyhow::Result<()> {
    let file = write_config(
        r#"
[scanner.scan]
concurrency = 3
"#,
    )?;

    let config = load(&file)?;

    assert_eq!(config.scanner.scan.concurrency, 3);
    assert_eq!(config.scanner.scan.page_limit, 100);
    assert_eq!(config.scanner.scan.max_records_per_scan, 1000);
    assert_eq!(config.scanner.channels.event_buffer, 256);
    assert_eq!(config.daemon.watchers, WatcherKind::ALL.to_vec());
    assert_eq!(config.daemon.log.output, LogOutput::Stderr);
    Ok(())
}

#[test]
fn invalid_values_are_rejected() -> anyhow::Result<()> {
    let out_of_range = write_config("[scanner.scan]\nconcurrency = 0\n")?;
    assert!(load(&out_of_range).is_err());

    let unknown_commitment = write_config("[scanner.solana]\ncommitment = \"eventual\"\n")?;
    assert!(load(&unknown_commitment).is_err());

    let unknown_watcher = write_config("[daemon]\nwatchers = [\"rug-pulls\"]\n")?;
    assert!(load(&unknown_watcher).is_err());
    Ok(())
}

fn env(vars: &[(&str, &str)]) -> config::Map<String, String> {
    vars.iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn load_with_env(file: &NamedTempFile, vars: &[(&str, &str)]) -> anyhow::Result<DaemonConfig> {
    let path = file
        .path()
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("temp path is not utf-8"))?;
    load_config_with_env(path, Some(env(vars)))
}

#[test]
fn environment_overrides_the_file() -> anyhow::Result<()> {
    let file = write_config("[scanner.whale]\nthreshold = 1000\n")?;

    let config = load_with_env(&file, &[("SLOTSCAN__SCANNER__WHALE__THRESHOLD", "75000")])?;

    assert_eq!(config.scanner.whale.threshold, 75_000);
    Ok(())
}

#[test]
fn environment_overrides_hyphenated_keys() -> anyhow::Result<()> {
    let file = write_config(
        r#"
[scanner.solana]
rpc-url = "http://127.0.0.1:8899"

[scanner.scan]
page-limit = 200
poll-interval-secs = 30
"#,
    )?;

    let config = load_with_env(
        &file,
        &[
            ("SLOTSCAN__SCANNER__SCAN__PAGE_LIMIT", "400"),
            ("SLOTSCAN__SCANNER__SCAN__MAX_RECORDS_PER_SCAN", "2500"),
            ("SLOTSCAN__SCANNER__SCAN__POLL_INTERVAL_SECS", "15"),
            ("SLOTSCAN__SCANNER__SOLANA__RPC_URL", "https://api.devnet.solana.com"),
            ("SLOTSCAN__SCANNER__SUPPLY_CACHE__TTL_SECS", "90"),
            ("SLOTSCAN__SCANNER__CHANNELS__EVENT_BUFFER", "64"),
        ],
    )?;

    assert_eq!(config.scanner.scan.page_limit, 400);
    assert_eq!(config.scanner.scan.max_records_per_scan, 2500);
    assert_eq!(config.scanner.scan.poll_interval_secs, 15);
    assert_eq!(config.scanner.solana.rpc_url, "https://api.devnet.solana.com");
    assert_eq!(config.scanner.supply_cache.ttl_secs, 90);
    assert_eq!(config.scanner.channels.event_buffer, 64);
    Ok(())
}

#[test]
fn unrelated_variables_are_ignored() -> anyhow::Result<()> {
    let file = write_config("[scanner.scan]\npage-limit = 200\n")?;

    let config = load_with_env(&file, &[("OTHER__SCANNER__SCAN__PAGE_LIMIT", "400")])?;

    assert_eq!(config.scanner.scan.page_limit, 200);
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_config("/nonexistent/slotscan.toml").is_err());
}
