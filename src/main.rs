// ── Safety policy ────────────────────────────────────────────────────────────
// The demo drives the library through its safe API only.
#![deny(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use native_progress::ProgressBarOptions;
use tracing_subscriber::EnvFilter;

/// Show a native progress window whose progress advances on a timer.
#[derive(Debug, Parser)]
#[command(name = "native-progress-demo", version)]
struct Cli {
    /// Which flow to run.
    #[arg(value_enum, default_value_t = Scenario::Simple)]
    scenario: Scenario,

    /// JSON file overriding the scenario's title, message, progress and buttons.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Milliseconds between progress steps.
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// No buttons until the bar is full.
    Simple,
    /// A Cancel button from the start.
    Button,
    /// Cancel appears once progress reaches 10.
    AppearingButton,
    /// Cancel disappears once progress reaches 10.
    DisappearingButton,
    /// Cancel and Done side by side.
    MultipleButtons,
}

impl Scenario {
    fn options(self) -> ProgressBarOptions {
        let buttons: &[&str] = match self {
            Self::Simple | Self::AppearingButton => &[],
            Self::Button | Self::DisappearingButton => &["Cancel"],
            Self::MultipleButtons => &["Cancel", "Done"],
        };
        ProgressBarOptions {
            title: "Hi! ハロー・ワールド".to_owned(),
            message: "Deleting all kinds of files! ハロー・ワールド".to_owned(),
            progress: 10,
            buttons: buttons.iter().map(|&s| s.to_owned()).collect(),
        }
    }

    /// Progress added per tick.
    fn step(self) -> i32 {
        match self {
            Self::AppearingButton | Self::DisappearingButton => 1,
            _ => 5,
        }
    }
}

fn load_options(cli: &Cli) -> Result<ProgressBarOptions, Box<dyn std::error::Error>> {
    match &cli.options {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(ProgressBarOptions::from_json(&json)?)
        }
        None => Ok(cli.scenario.options()),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(windows)]
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    use std::{ops::ControlFlow, time::Duration};

    use native_progress::{
        platform::win32::{dpi, message_loop},
        Button, ProgressBar,
    };

    let options = load_options(cli)?;
    dpi::enable_per_monitor_awareness();

    let bar = ProgressBar::from_options(&options, |bar, index| {
        let label = bar.button_labels().get(index).cloned().unwrap_or_default();
        tracing::info!(%label, "button clicked");
        bar.close();
    })
    .on_close(|| tracing::info!("progress bar closed"))
    .show()?;

    let scenario = cli.scenario;
    let mut finished = false;
    message_loop::run(Duration::from_millis(cli.interval_ms), || {
        if bar.is_closed() {
            return ControlFlow::Break(());
        }

        let progress = bar.progress();
        if progress >= 100 {
            if !finished {
                finished = true;
                bar.set_message("All done.");
                bar.set_buttons(vec![Button::new("Done", |bar| {
                    tracing::info!("Done button clicked");
                    bar.close();
                })]);
            }
            return ControlFlow::Continue(());
        }

        if progress == 10 {
            match scenario {
                Scenario::AppearingButton => bar.set_buttons(vec![Button::close("Cancel")]),
                Scenario::DisappearingButton => bar.set_buttons(Vec::new()),
                _ => {}
            }
        }
        bar.set_progress(progress + scenario.step());
        ControlFlow::Continue(())
    })?;

    Ok(())
}

#[cfg(not(windows))]
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(cli)?;
    Err(format!(
        "cannot show {:?}: native progress windows need Windows",
        options.title
    )
    .into())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_simple() {
        let cli = Cli::try_parse_from(["native-progress-demo"]).expect("parse");
        assert_eq!(cli.scenario, Scenario::Simple);
        assert_eq!(cli.interval_ms, 200);
        assert!(cli.options.is_none());
    }

    #[test]
    fn scenario_names_are_kebab_case() {
        let cli = Cli::try_parse_from([
            "native-progress-demo",
            "disappearing-button",
            "--interval-ms",
            "50",
        ])
        .expect("parse");
        assert_eq!(cli.scenario, Scenario::DisappearingButton);
        assert_eq!(cli.interval_ms, 50);
    }

    #[test]
    fn scenario_buttons() {
        assert!(Scenario::Simple.options().buttons.is_empty());
        assert!(Scenario::AppearingButton.options().buttons.is_empty());
        assert_eq!(
            Scenario::Button.options().buttons,
            vec!["Cancel".to_owned()]
        );
        assert_eq!(
            Scenario::MultipleButtons.options().buttons,
            vec!["Cancel".to_owned(), "Done".to_owned()]
        );
    }

    #[test]
    fn every_scenario_starts_at_ten() {
        for s in Scenario::value_variants() {
            assert_eq!(s.options().progress, 10);
            assert!(s.step() > 0);
        }
    }
}
