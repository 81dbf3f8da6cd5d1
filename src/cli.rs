use clap::Parser;
use std::path::PathBuf;

use crate::config;

#[derive(Parser, Debug)]
#[command(name = "pitchwheel", about = "Pitch-driven audio visualizer video generator")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Video width in pixels
    #[arg(long, default_value_t = config::default_width())]
    pub width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = config::default_height())]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = config::default_fps())]
    pub fps: u32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = config::default_crf())]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value_t = config::default_codec())]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// Samples per analysed frame (power of two, 32-16384)
    #[arg(long, default_value_t = config::default_analyser_size())]
    pub analyser_size: usize,

    /// Seconds per 128-sample block. Defaults to 128 / sample rate.
    #[arg(long)]
    pub block_time: Option<f32>,

    /// Write each frame's draw commands as JSON lines to this file instead
    /// of encoding video
    #[arg(long, value_name = "PATH")]
    pub dump_commands: Option<PathBuf>,

    /// Config file (defaults to ./pitchwheel.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Apply config values wherever the command line kept its default.
    pub fn merge(&mut self, cfg: config::Config) {
        if self.width == config::default_width() { self.width = cfg.output.width; }
        if self.height == config::default_height() { self.height = cfg.output.height; }
        if self.fps == config::default_fps() { self.fps = cfg.output.fps; }
        if self.crf == config::default_crf() { self.crf = cfg.output.crf; }
        if self.codec == config::default_codec() { self.codec = cfg.output.codec; }
        if self.analyser_size == config::default_analyser_size() {
            self.analyser_size = cfg.analyser.size;
        }
        if self.block_time.is_none() {
            self.block_time = cfg.analyser.block_time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = Cli::try_parse_from(["pitchwheel", "song.wav"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("song.wav")));
        assert_eq!(cli.output, PathBuf::from("output.mp4"));
        assert_eq!((cli.width, cli.height, cli.fps), (1280, 720, 30));
        assert_eq!(cli.analyser_size, 256);
        assert!(cli.dump_commands.is_none());
    }

    #[test]
    fn config_fills_only_defaults() {
        let mut cli =
            Cli::try_parse_from(["pitchwheel", "song.wav", "--width", "640", "--fps", "60"]).unwrap();
        let cfg: config::Config = toml::from_str(
            "[output]\nwidth = 1920\nheight = 1080\nfps = 24\n[analyser]\nsize = 512\nblock_time = 0.002667",
        )
        .unwrap();
        cli.merge(cfg);
        assert_eq!(cli.width, 640);
        assert_eq!(cli.height, 1080);
        assert_eq!(cli.fps, 60);
        assert_eq!(cli.analyser_size, 512);
        assert_eq!(cli.block_time, Some(0.002667));
    }
}
