// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use unicode_width::UnicodeWidthChar;

use crate::palette::ColorMode;
use crate::rain::{RainParams, DEFAULT_CELL_PX, DEFAULT_FADE_ALPHA, DEFAULT_RESET_THRESHOLD};
use crate::surface::Rgb;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  binrain --cell-size 14 --fade 0.05 --reset-threshold 0.975 --debounce-ms 100 --fps 60 --chars 01 --ink 333333 --shade 000000";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

#[derive(Parser, Debug, Clone)]
#[command(name = "binrain", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        long = "cell-size",
        default_value_t = DEFAULT_CELL_PX,
        help_heading = "RAIN",
        help = "Pixels per character cell (min 1 max 256)"
    )]
    pub cell_size: u32,

    #[arg(
        long = "fade",
        default_value_t = DEFAULT_FADE_ALPHA,
        help_heading = "RAIN",
        help = "Opacity of the per-frame shade overlay (min 0 max 1)"
    )]
    pub fade: f32,

    #[arg(
        long = "reset-threshold",
        default_value_t = DEFAULT_RESET_THRESHOLD,
        help_heading = "RAIN",
        help = "Off-screen column restarts when a random draw exceeds this (min 0 max 1)"
    )]
    pub reset_threshold: f64,

    #[arg(
        long = "chars",
        default_value = "01",
        help_heading = "RAIN",
        help = "Glyph alphabet"
    )]
    pub chars: String,

    #[arg(
        long = "seed",
        help_heading = "RAIN",
        help = "Seed for the glyph and reset draws (default: OS entropy)"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "ink",
        default_value = "333333",
        help_heading = "APPEARANCE",
        help = "Glyph colour as hex RGB"
    )]
    pub ink: Rgb,

    #[arg(
        long = "shade",
        default_value = "000000",
        help_heading = "APPEARANCE",
        help = "Background and fade colour as hex RGB"
    )]
    pub shade: Rgb,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: detected from COLORTERM/TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "TIMING",
        help = "Frame rate (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "debounce-ms",
        default_value_t = 100,
        help_heading = "TIMING",
        help = "Quiet period before a resize rebuilds the grid (min 0 max 10000)"
    )]
    pub debounce_ms: u64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "perf-stats",
        help_heading = "GENERAL",
        help = "Print frame statistics on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write logs to this file (filter with RUST_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

/// Validated runtime configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub rain: RainParams,
    pub debounce: Duration,
    pub fps: f64,
    pub color_mode: ColorMode,
    pub duration: Option<Duration>,
    pub seed: Option<u64>,
    pub screensaver: bool,
    pub perf_stats: bool,
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> Result<f64> {
    if !v.is_finite() {
        bail!("failed to apply {} {} (must be a finite number)", name, v);
    }
    if v < min || v > max {
        bail!("failed to apply {} {} (min {} max {})", name, v, min, max);
    }
    Ok(v)
}

fn require_u64_range(name: &str, v: u64, min: u64, max: u64) -> Result<u64> {
    if v < min || v > max {
        bail!("failed to apply {} {} (min {} max {})", name, v, min, max);
    }
    Ok(v)
}

impl Args {
    pub fn color_mode(&self) -> Result<ColorMode> {
        match self.colormode {
            Some(bits) => match ColorMode::from_bits(bits) {
                Some(m) => Ok(m),
                None => bail!("invalid --colormode: {} (allowed: 0,16,8,256,24,32)", bits),
            },
            None => Ok(ColorMode::detect()),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        let cell_px = require_u64_range("--cell-size", self.cell_size as u64, 1, 256)? as u32;
        let fade = require_f64_range("--fade", self.fade as f64, 0.0, 1.0)? as f32;
        let reset_threshold =
            require_f64_range("--reset-threshold", self.reset_threshold, 0.0, 1.0)?;
        let fps = require_f64_range("--fps", self.fps, 1.0, 240.0)?;
        let debounce_ms = require_u64_range("--debounce-ms", self.debounce_ms, 0, 10_000)?;

        let glyphs: Vec<char> = self.chars.chars().filter(|c| !c.is_control()).collect();
        if glyphs.is_empty() {
            bail!("--chars: at least one printable character is required");
        }
        if let Some(c) = glyphs.iter().find(|c| c.width() != Some(1)) {
            bail!("--chars: {:?} does not fit in a single terminal column", c);
        }

        let duration = match self.duration {
            Some(s) if s.is_finite() && s <= 0.0 => None,
            Some(s) => Some(Duration::from_secs_f64(require_f64_range(
                "--duration",
                s,
                0.1,
                86400.0,
            )?)),
            None => None,
        };

        Ok(Settings {
            rain: RainParams {
                cell_px,
                fade_alpha: fade,
                reset_threshold,
                glyphs,
                ink: self.ink,
                shade: self.shade,
            },
            debounce: Duration::from_millis(debounce_ms),
            fps,
            color_mode: self.color_mode()?,
            duration,
            seed: self.seed,
            screensaver: self.screensaver,
            perf_stats: self.perf_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let argv = std::iter::once("binrain").chain(extra.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_rain_defaults() {
        let s = parse(&["--colormode", "24"]).settings().unwrap();
        assert_eq!(s.rain, RainParams::default());
        assert_eq!(s.debounce, Duration::from_millis(100));
        assert_eq!(s.fps, 60.0);
        assert_eq!(s.color_mode, ColorMode::TrueColor);
        assert!(s.duration.is_none());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = parse(&["--fps", "0"]).settings().unwrap_err();
        assert_eq!(err.to_string(), "failed to apply --fps 0 (min 1 max 240)");

        assert!(parse(&["--fade", "1.5"]).settings().is_err());
        assert!(parse(&["--reset-threshold=-0.1"]).settings().is_err());
        assert!(parse(&["--cell-size", "0"]).settings().is_err());
        assert!(parse(&["--colormode", "12"]).settings().is_err());
        assert!(parse(&["--chars", ""]).settings().is_err());
    }

    #[test]
    fn glyphs_must_be_one_column_wide() {
        let err = parse(&["--chars", "01雨"]).settings().unwrap_err();
        assert!(err.to_string().contains("single terminal column"), "{err}");
        assert!(parse(&["--chars", "0\u{301}"]).settings().is_err());

        let s = parse(&["--chars", "01ab", "--colormode", "0"])
            .settings()
            .unwrap();
        assert_eq!(s.rain.glyphs, vec!['0', '1', 'a', 'b']);
    }

    #[test]
    fn non_positive_duration_disables_the_timer() {
        let s = parse(&["--duration", "0", "--colormode", "0"])
            .settings()
            .unwrap();
        assert!(s.duration.is_none());

        let s = parse(&["--duration", "2.5", "--colormode", "0"])
            .settings()
            .unwrap();
        assert_eq!(s.duration, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn colours_parse_from_hex() {
        let a = parse(&["--ink", "#00ff41", "--shade", "111"]);
        assert_eq!(a.ink, Rgb::new(0, 0xff, 0x41));
        assert_eq!(a.shade, Rgb::new(0x11, 0x11, 0x11));
        assert!(Args::try_parse_from(["binrain", "--ink", "green"]).is_err());
    }
}
