use std::num::NonZeroUsize;

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::Value;

#[derive(Debug, Default)]
struct FakeTerminalClient;

impl pipstream::TerminalClient for FakeTerminalClient {
    fn stdout_is_terminal(&self) -> bool {
        false
    }

    fn stderr_is_terminal(&self) -> bool {
        false
    }
}

async fn run_with_parsed_args(args: pipstream::Args) -> anyhow::Result<String> {
    let mut output = Vec::new();
    pipstream::run_with_clients(args, &mut output, &FakeTerminalClient).await?;
    Ok(String::from_utf8(output)?)
}

async fn run_with_argv<const N: usize>(argv: [&str; N]) -> anyhow::Result<String> {
    let parsed_args = pipstream::Args::try_parse_from(argv)?;
    run_with_parsed_args(parsed_args).await
}

fn json_lines(stdout: &str) -> anyhow::Result<Vec<Value>> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
        .collect()
}

fn event_tags(lines: &[Value]) -> Vec<&str> {
    lines
        .iter()
        .filter_map(|line| line["event"].as_str())
        .collect()
}

#[tokio::test]
async fn discover_prints_every_device_when_exhaustive() -> anyhow::Result<()> {
    let stdout = run_with_argv([
        "pipstream",
        "--log-level",
        "off",
        "--output",
        "pretty",
        "--scan",
        "7|Alpha;9|-",
        "discover",
        "--exhaustive",
    ])
    .await?;

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        vec![
            "Ready.",
            "Discovered PIP: Alpha (id 7)",
            "Discovered PIP: Unknown PIP (id 9)",
            "Discovery complete.",
            "",
            "Discovered devices:",
        ],
        lines[..6].to_vec()
    );
    assert!(stdout.contains("Unknown PIP"));

    Ok(())
}

#[tokio::test]
async fn discover_stops_at_first_match_by_default() -> anyhow::Result<()> {
    let simulator = pipstream::SimulatorArgs::builder()
        .scan_fixture("7|Alpha;9|Beta")?
        .build();
    let args = pipstream::Args::new(pipstream::Command::Discover(
        pipstream::DiscoverArgs::first_match(),
    ))
    .with_simulator(simulator)
    .with_output(pipstream::OutputFormat::Json);

    let stdout = run_with_parsed_args(args).await?;

    let lines = json_lines(&stdout)?;
    assert_eq!(
        vec!["ready", "discovered", "discovery_complete", "devices"],
        event_tags(&lines)
    );
    assert_eq!(Some(1), lines[3]["devices"].as_array().map(Vec::len));
    assert_eq!(Some(7), lines[1]["device"]["id"].as_u64());

    Ok(())
}

#[tokio::test]
async fn stream_emits_json_events_and_summary() -> anyhow::Result<()> {
    let stdout = run_with_argv([
        "pipstream",
        "--log-level",
        "off",
        "--scan",
        "7|Alpha",
        "--samples",
        "1:1,1:2,0:1,1:9",
        "--sample-interval",
        "1ms",
        "stream",
        "--max-samples",
        "3",
    ])
    .await?;

    let lines = json_lines(&stdout)?;
    assert_eq!(
        vec![
            "ready",
            "discovered",
            "discovery_complete",
            "connected",
            "trend",
            "trend",
            "trend",
            "disconnected",
            "summary",
        ],
        event_tags(&lines)
    );
    let trends: Vec<&str> = lines
        .iter()
        .filter_map(|line| line["state"].as_str())
        .collect();
    assert_eq!(vec!["relaxing", "stressing", "inactive"], trends);

    let summary = &lines[8];
    assert_eq!(Some(3), summary["samples"].as_u64());
    assert_eq!(Some("sample_limit"), summary["stop_reason"].as_str());
    assert_eq!(Some(1), summary["tally"]["inactive"].as_u64());
    assert_eq!(Some(0), summary["tally"]["steady"].as_u64());

    Ok(())
}

#[tokio::test]
async fn stream_prints_pretty_status_and_summary() -> anyhow::Result<()> {
    let simulator = pipstream::SimulatorArgs::builder()
        .scan_fixture("7|Alpha")?
        .samples("1:1,1:0")?
        .sample_interval(std::time::Duration::from_millis(1))
        .build();
    let args = pipstream::Args::new(pipstream::Command::Stream(pipstream::StreamArgs::new(
        NonZeroUsize::new(2),
    )))
    .with_simulator(simulator)
    .with_output(pipstream::OutputFormat::Pretty);

    let stdout = run_with_parsed_args(args).await?;

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        vec![
            "Ready.",
            "Discovered PIP: Alpha (id 7)",
            "Discovery complete.",
            "Connecting to Alpha...",
            "Connected. (id 7)",
            "Streaming: Relaxing",
            "Streaming: Steady",
            "Disconnecting...",
            "Disconnected.",
            "",
            "Stream summary:",
        ],
        lines[..11].to_vec()
    );
    assert!(stdout.contains("sample limit reached"));

    Ok(())
}

#[tokio::test]
async fn stream_fails_when_the_device_refuses_the_connection() {
    let result = run_with_argv([
        "pipstream",
        "--log-level",
        "off",
        "--output",
        "json",
        "--scan",
        "7|Alpha",
        "--connect-status",
        "-3",
        "stream",
    ])
    .await;

    let error = result.expect_err("a failing connect status should end the run");
    assert_eq!("connection to Alpha failed: status -3", error.to_string());
}

#[tokio::test]
async fn stream_reports_nothing_discovered_after_discovery_timeout() {
    let result = run_with_argv([
        "pipstream",
        "--log-level",
        "off",
        "--output",
        "json",
        "--scan",
        "7|Alpha",
        "--discovery-delay",
        "10s",
        "stream",
        "--discovery-timeout",
        "20ms",
    ])
    .await;

    let error = result.expect_err("an empty scan should end the run");
    assert_eq!(
        Some(&pipstream::SessionError::NothingDiscovered),
        error.downcast_ref::<pipstream::SessionError>()
    );
}

#[test]
fn simulator_builder_rejects_invalid_fixture() {
    let result = pipstream::SimulatorArgs::builder().scan_fixture("invalid-record");

    assert!(matches!(
        result,
        Err(pipstream::FixtureError::InvalidRecordFieldCount)
    ));
}
