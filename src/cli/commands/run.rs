//! `run`: drive the experience in real time.
//!
//! A fixed-rate tick feeds wall-clock time (scaled by `--speed`) to the
//! sequencer. Operator commands arrive on stdin, one per line:
//!
//! | input         | action                                  |
//! |---------------|-----------------------------------------|
//! | empty, `n`    | tap to continue                         |
//! | `p <0..1>`    | set progress of a user-controlled phase |
//! | `c <name>`    | select a category                       |
//! | `r`           | reset and start again                   |
//! | `e`           | end the run                             |
//! | `q`           | quit                                    |

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::BridgeClient;
use crate::cli::args::{InputArgs, RunArgs};
use crate::config::ExperienceConfig;
use crate::cost::Category;
use crate::cost::model::format_money;
use crate::effects::console::{ConsoleNarrator, console_port};
use crate::error::{InputError, InvisibleCostError};
use crate::experience::Experience;
use crate::observability::{EventEmitter, init_metrics};

use super::load_config;

/// Slowest accepted `--speed`.
const MIN_SPEED: f64 = 0.01;
/// Fastest accepted `--speed`.
const MAX_SPEED: f64 = 1000.0;

/// Shortest tick period `tokio::time::interval` is given.
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Operator command read from stdin.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Advance,
    Progress(f64),
    Select(Category),
    Restart,
    End,
    Quit,
}

fn parse_control(line: &str) -> Result<Control, String> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(v, r)| (v, r.trim()));

    match verb {
        "" | "n" | "next" => Ok(Control::Advance),
        "r" | "restart" => Ok(Control::Restart),
        "e" | "end" => Ok(Control::End),
        "q" | "quit" => Ok(Control::Quit),
        "p" | "progress" => rest
            .parse::<f64>()
            .map(Control::Progress)
            .map_err(|_| format!("expected a number after '{verb}', got '{rest}'")),
        "c" | "category" => rest
            .parse::<Category>()
            .map(Control::Select)
            .map_err(|e| e.to_string()),
        other => Err(format!("unknown command '{other}'")),
    }
}

/// Runs the experience until it completes, the operator quits or
/// `cancel` fires.
///
/// # Errors
///
/// Returns a usage error for bad timing flags, a config error for an
/// invalid file, a phase error for an unusable timeline, or an input
/// error for rejected visitor input.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), InvisibleCostError> {
    check_timing(args.speed, args.auto_continue)?;

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "metrics listener started");
    }

    let config = load_config(args.config.as_deref())?;
    let events = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    });

    let narrator = ConsoleNarrator::new(
        args.assets
            .clone()
            .or_else(|| config.narration.assets_dir.clone()),
        config.narration.scripts.clone(),
        config.narration.words_per_second,
        args.speed,
    );
    let mut port = console_port(narrator);

    let bridge = connect_bridge(args, &config, &cancel, &events).await;
    if let Some(client) = &bridge {
        port = port.with_scene(Arc::new(client.renderer()));
    }

    let mut experience = Experience::from_config(&config, port)?.with_events(events);
    preselect(&mut experience, &args.input)?;
    experience.start();

    let (tx, mut controls) = mpsc::unbounded_channel();
    let stdin_task = tokio::spawn(read_controls(tx, cancel.clone()));
    let mut stdin_open = true;

    let mut ticker = tokio::time::interval(tick_period(config.experience.tick_hz)?);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut interrupted = false;

    while !experience.sequencer().is_complete() {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("run cancelled");
                interrupted = true;
                break;
            }
            control = controls.recv(), if stdin_open => {
                let Some(control) = control else {
                    debug!("stdin closed");
                    stdin_open = false;
                    continue;
                };
                if control == Control::Quit {
                    info!("quit requested");
                    interrupted = true;
                    break;
                }
                apply(&mut experience, control, &args.input)?;
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f64() * args.speed;
                last_tick = now;
                experience.update(dt);
                auto_continue(&mut experience, args.auto_continue);
            }
        }
    }

    if interrupted {
        experience.end();
    }
    print_summary(&experience, interrupted);

    stdin_task.abort();
    // releases the renderer's sender so the writer can drain
    drop(experience);
    if let Some(client) = bridge {
        client.shutdown().await;
    }
    Ok(())
}

fn check_timing(speed: f64, auto_continue: Option<f64>) -> Result<(), InvisibleCostError> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(InvisibleCostError::Usage(format!(
            "--speed must be between {MIN_SPEED} and {MAX_SPEED}, got {speed}"
        )));
    }
    if let Some(secs) = auto_continue
        && (!secs.is_finite() || secs < 0.0)
    {
        return Err(InvisibleCostError::Usage(format!(
            "--auto-continue must be zero or more seconds, got {secs}"
        )));
    }
    Ok(())
}

/// Interval between ticks, never shorter than [`MIN_TICK_PERIOD`].
fn tick_period(tick_hz: f64) -> Result<Duration, InvisibleCostError> {
    Duration::try_from_secs_f64(1.0 / tick_hz)
        .map(|period| period.max(MIN_TICK_PERIOD))
        .map_err(|_| {
            InvisibleCostError::Usage(format!("tick rate {tick_hz} Hz has no usable period"))
        })
}

async fn connect_bridge(
    args: &RunArgs,
    config: &ExperienceConfig,
    cancel: &CancellationToken,
    events: &Arc<EventEmitter>,
) -> Option<BridgeClient> {
    let configured = config.bridge.as_ref();
    let address = args
        .bridge
        .as_deref()
        .or_else(|| configured.map(|b| b.address.as_str()))?;
    let timeout = configured.map_or(Duration::from_secs(2), |b| b.connect_timeout);

    match BridgeClient::connect(address, timeout, cancel.clone(), Arc::clone(events)).await {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "render bridge unavailable, continuing without it");
            None
        }
    }
}

/// Applies the category and input flags before (re)starting.
fn preselect(experience: &mut Experience, input: &InputArgs) -> Result<(), InputError> {
    let Some(category) = input.category()? else {
        return Ok(());
    };
    experience.select_category(category);
    if input.has_volume() {
        experience.submit_input(input.to_input(category)?)?;
    }
    Ok(())
}

fn apply(
    experience: &mut Experience,
    control: Control,
    input: &InputArgs,
) -> Result<(), InvisibleCostError> {
    match control {
        Control::Advance => {
            experience.advance();
        }
        Control::Progress(progress) => {
            experience.set_phase_progress(progress);
        }
        Control::Select(category) => experience.select_category(category),
        Control::Restart => {
            experience.reset();
            preselect(experience, input)?;
            experience.start();
        }
        Control::End => {
            experience.end();
        }
        Control::Quit => {}
    }
    Ok(())
}

fn auto_continue(experience: &mut Experience, after: Option<f64>) {
    let Some(secs) = after else {
        return;
    };
    let sequencer = experience.sequencer();
    let state = sequencer.state();
    if state.is_active()
        && !sequencer.current().is_boundary()
        && sequencer.current().is_user_controlled()
        && state.phase_elapsed() >= secs
    {
        debug!(phase = %sequencer.current().name, "auto-continue");
        experience.advance();
    }
}

async fn read_controls(tx: mpsc::UnboundedSender<Control>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => match parse_control(&line) {
                Ok(control) => {
                    if tx.send(control).is_err() {
                        break;
                    }
                }
                Err(message) => warn!("{message}"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}

fn print_summary(experience: &Experience, interrupted: bool) {
    let state = experience.sequencer().state();
    let outcome = if interrupted { "ended early" } else { "complete" };
    println!(
        "experience {outcome} after {:.1}s",
        state.total_elapsed()
    );
    if let Some(category) = experience.category() {
        println!("  category: {category}");
    }
    if let Some(breakdown) = experience.cost_breakdown() {
        println!("  total cost: {}", format_money(breakdown.total_cost));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectsPort, RecordingEffects};

    #[test]
    fn test_parse_controls() {
        assert_eq!(parse_control(""), Ok(Control::Advance));
        assert_eq!(parse_control("  n "), Ok(Control::Advance));
        assert_eq!(parse_control("p 0.5"), Ok(Control::Progress(0.5)));
        assert_eq!(
            parse_control("c finance"),
            Ok(Control::Select(Category::InvoiceProcessing))
        );
        assert_eq!(parse_control("r"), Ok(Control::Restart));
        assert_eq!(parse_control("q"), Ok(Control::Quit));
        assert!(parse_control("p half").is_err());
        assert!(parse_control("c nowhere").is_err());
        assert!(parse_control("jump").is_err());
    }

    #[test]
    fn test_timing_flags_are_bounded() {
        assert!(check_timing(1.0, None).is_ok());
        assert!(check_timing(MAX_SPEED, Some(0.0)).is_ok());
        for speed in [0.0, -1.0, 1e-300, 1e10, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(check_timing(speed, None), Err(InvisibleCostError::Usage(_))),
                "speed {speed}"
            );
        }
        assert!(check_timing(1.0, Some(-1.0)).is_err());
        assert!(check_timing(1.0, Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_tick_period_is_never_zero() {
        assert_eq!(tick_period(4.0).unwrap(), Duration::from_millis(250));
        assert_eq!(tick_period(1e10).unwrap(), MIN_TICK_PERIOD);
        assert!(tick_period(1e-300).is_err());
        assert!(tick_period(0.0).is_err());
        assert!(tick_period(-1.0).is_err());
    }

    #[test]
    fn test_auto_continue_only_in_user_controlled_phases() {
        let mut exp = Experience::invisible_cost(EffectsPort::silent());
        exp.start();
        assert_eq!(exp.sequencer().current().name, "industry_selection");

        auto_continue(&mut exp, Some(2.0));
        assert_eq!(exp.sequencer().current().name, "industry_selection");
        exp.update(2.0);
        auto_continue(&mut exp, Some(2.0));
        assert_eq!(exp.sequencer().current().name, "building_tension");

        exp.update(1.0);
        auto_continue(&mut exp, Some(0.0));
        assert_eq!(exp.sequencer().current().name, "building_tension");
    }

    #[test]
    fn test_restart_reapplies_flags() {
        let recorder = RecordingEffects::new();
        let mut exp = Experience::invisible_cost(recorder.port());
        let input = InputArgs {
            category: Some("health".into()),
            monthly_volume: Some(1_000.0),
            customers: None,
            avg_customer_size: None,
            staff: None,
            hourly_rate: 50.0,
            overhead: 1.5,
            automation: "manual".into(),
            channel: None,
        };
        preselect(&mut exp, &input).unwrap();
        exp.start();
        apply(&mut exp, Control::Restart, &input).unwrap();

        assert!(exp.sequencer().state().is_active());
        assert_eq!(exp.category(), Some(Category::ClaimsProcessing));
        assert!(exp.cost_breakdown().is_some());
    }

    #[test]
    fn test_bad_automation_is_an_input_error() {
        let mut exp = Experience::invisible_cost(EffectsPort::silent());
        let input = InputArgs {
            category: Some("it".into()),
            monthly_volume: Some(10.0),
            customers: None,
            avg_customer_size: None,
            staff: None,
            hourly_rate: 50.0,
            overhead: 1.5,
            automation: "robotic".into(),
            channel: None,
        };
        assert!(matches!(
            preselect(&mut exp, &input),
            Err(InputError::UnknownOption { .. })
        ));
    }
}
