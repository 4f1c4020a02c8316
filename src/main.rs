// Copyright (c) 2026 rezky_nightky

mod backdrop;
mod cell;
mod config;
mod debounce;
mod frame;
mod logging;
mod palette;
mod rain;
mod scheduler;
mod surface;
mod terminal;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use anyhow::{Context, Result};
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::backdrop::{Backdrop, BindingState};
use crate::config::{color_enabled_stdout, Args, Settings, DEFAULT_PARAMS_USAGE};
use crate::palette::ColorMode;
use crate::rain::Rain;
use crate::scheduler::FrameClock;
use crate::terminal::{restore_terminal_best_effort, Screen, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

/// Longest wait between loop iterations when no frame or timer is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn install_restore_handlers() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn parse_args() -> Args {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(DEFAULT_PARAMS_USAGE);
    cmd = cmd.help_template(if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    });
    cmd.build();
    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches_from(env::args_os());
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn print_bitcolor(args: &Args) -> Result<()> {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let or_unset = |v: &str| {
        if v.is_empty() {
            "(unset)".to_string()
        } else {
            v.to_string()
        }
    };

    println!("BITCOLOR CHECK:");
    println!("  COLORTERM: {}", or_unset(&colorterm));
    println!("  TERM: {}", or_unset(&term));
    println!("  auto_detected: {}", ColorMode::detect().label());
    let effective = args.color_mode()?;
    if args.colormode.is_some() {
        println!("  forced: {}", effective.label());
    }
    println!("  effective: {}", effective.label());
    Ok(())
}

#[derive(Debug, Default)]
struct PerfStats {
    elapsed: Duration,
    painted: u64,
    skipped: u64,
    rebuilds: u64,
    draws: u64,
    draw_sum: Duration,
    draw_max: Duration,
}

impl PerfStats {
    fn print(&self, target_fps: f64) {
        let elapsed_s = self.elapsed.as_secs_f64().max(0.000_001);
        let draws = self.draws.max(1) as f64;
        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", target_fps);
        println!("  avg_fps: {:.3}", self.painted as f64 / elapsed_s);
        println!("  painted_frames: {}", self.painted);
        println!("  skipped_frames: {}", self.skipped);
        println!("  rebuilds: {}", self.rebuilds);
        println!(
            "  avg_draw_ms: {:.3}",
            self.draw_sum.as_secs_f64() * 1000.0 / draws
        );
        println!("  max_draw_ms: {:.3}", self.draw_max.as_secs_f64() * 1000.0);
    }
}

enum Control {
    Continue,
    Quit,
}

fn handle_event(
    ev: Event,
    settings: &Settings,
    backdrop: &mut Backdrop,
    screen: &mut Screen,
    clock: &mut FrameClock,
) -> Control {
    match ev {
        Event::Resize(cols, rows) => {
            screen.set_viewport(cols, rows);
            backdrop.notify_resize(Instant::now());
        }
        Event::Key(k) if k.kind == KeyEventKind::Press => {
            if settings.screensaver {
                return Control::Quit;
            }
            match (k.code, k.modifiers) {
                (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => return Control::Quit,
                (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Control::Quit,
                (KeyCode::Char('p'), _) => match backdrop.state() {
                    BindingState::Running => backdrop.stop(clock),
                    BindingState::Idle => backdrop.start(screen, clock),
                },
                (KeyCode::Char(' '), _) => {
                    backdrop.restart(screen, clock);
                }
                _ => {}
            }
        }
        _ => {}
    }
    Control::Continue
}

fn run(settings: &Settings) -> Result<PerfStats> {
    let mut term = Terminal::new(settings.color_mode).context("failed to initialize terminal")?;
    let (cols, rows) = term.size().context("failed to read terminal size")?;

    let mut screen = Screen::new(cols, rows, settings.rain.cell_px, settings.rain.shade);
    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut backdrop = Backdrop::new(Rain::new(settings.rain.clone(), rng), settings.debounce);

    let start_time = Instant::now();
    let end_time = settings.duration.map(|d| start_time + d);
    let mut clock = FrameClock::new(settings.fps, start_time);
    let mut stats = PerfStats::default();
    let mut due = Vec::new();

    tracing::debug!(
        period_us = clock.period().as_micros() as u64,
        cols,
        rows,
        "frame clock ready"
    );
    backdrop.start(&mut screen, &mut clock);

    'outer: loop {
        let now = Instant::now();
        if end_time.is_some_and(|end| now >= end) {
            tracing::debug!("duration elapsed");
            break;
        }

        let mut timeout = clock.time_until_due(now).unwrap_or(IDLE_POLL);
        if let Some(at) = backdrop.resize_deadline() {
            timeout = timeout.min(at.saturating_duration_since(now));
        }
        if let Some(end) = end_time {
            timeout = timeout.min(end.saturating_duration_since(now));
        }

        if Terminal::poll_event(timeout)? {
            loop {
                let ev = Terminal::read_event()?;
                if let Control::Quit =
                    handle_event(ev, settings, &mut backdrop, &mut screen, &mut clock)
                {
                    break 'outer;
                }
                if !Terminal::poll_event(Duration::ZERO)? {
                    break;
                }
            }
        }

        let now = Instant::now();
        backdrop.poll_resize(now, &mut screen, &mut clock);

        clock.drain_due(now, &mut due);
        let mut painted = false;
        for handle in due.drain(..) {
            painted |= backdrop.on_frame(handle, &mut screen, &mut clock);
        }

        if painted {
            if let Some(frame) = screen.frame_mut() {
                let draw_start = Instant::now();
                term.draw(frame)?;
                let took = draw_start.elapsed();
                stats.draws += 1;
                stats.draw_sum += took;
                stats.draw_max = stats.draw_max.max(took);
            }
        }
    }

    backdrop.stop(&mut clock);
    let clock_stats = clock.stats();
    tracing::debug!(
        requested = clock_stats.requested,
        cancelled = clock_stats.cancelled,
        fired = clock_stats.fired,
        outstanding = clock.outstanding(),
        viewport = ?backdrop.viewport(),
        "frame clock totals"
    );

    stats.elapsed = start_time.elapsed();
    stats.painted = backdrop.rain().painted_frames();
    stats.skipped = backdrop.rain().skipped_frames();
    stats.rebuilds = backdrop.rebuilds();
    Ok(stats)
}

fn main() -> Result<()> {
    install_restore_handlers();
    let args = parse_args();

    if args.check_bitcolor {
        return print_bitcolor(&args);
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", env!("BINRAIN_BUILD"));
        let sha = env!("BINRAIN_GIT_SHA");
        if !sha.is_empty() {
            println!("Commit: {}", sha);
        }
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        return Ok(());
    }

    let settings = args.settings()?;
    let _log_guard = logging::init(args.log_file.as_deref())?;
    tracing::info!(
        cell_px = settings.rain.cell_px,
        fade = settings.rain.fade_alpha,
        reset_threshold = settings.rain.reset_threshold,
        fps = settings.fps,
        color_mode = settings.color_mode.label(),
        "starting"
    );

    let stats = run(&settings)?;
    tracing::info!(painted = stats.painted, rebuilds = stats.rebuilds, "exiting");

    if settings.perf_stats {
        stats.print(settings.fps);
    }
    Ok(())
}
