mod audio;
mod cli;
mod config;
mod encode;
mod pitch;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use audio::analyser::{self, Analyser};
use cli::Cli;
use encode::ffmpeg::{EncoderSettings, FfmpegEncoder};
use pitch::PitchReading;
use render::frame::FrameRenderer;
use render::raster::RasterSurface;
use render::surface::{RecordingSurface, Surface};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(ref path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            cli.merge(cfg);
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.clone().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    if cli.width == 0 || cli.height == 0 || cli.fps == 0 {
        anyhow::bail!("Width, height and fps must all be positive");
    }
    analyser::validate_size(cli.analyser_size)?;

    log::info!("pitchwheel - pitch-driven audio visualizer");
    log::info!("Input: {}", input.display());
    log::info!("Resolution: {}x{} @ {}fps", cli.width, cli.height, cli.fps);

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = audio::decode::decode_audio(&input)?;
    let analyser = Analyser::new(&audio_data, cli.analyser_size, cli.block_time)?;

    let total_frames = analyser.frame_count(cli.fps);
    log::info!("Total frames: {}, Duration: {:.1}s", total_frames, analyser.duration());

    let renderer = FrameRenderer::new(cli.width, cli.height);
    let pb = progress_bar(total_frames);

    // 2. Render
    match cli.dump_commands {
        Some(ref path) => {
            log::info!("Output: {} (draw commands)", path.display());
            dump_commands(path, &analyser, &renderer, cli.fps, total_frames, &pb)?;
            pb.finish_with_message("Rendering complete");
        }
        None => {
            log::info!("Output: {}", cli.output.display());
            let settings = EncoderSettings {
                width: cli.width,
                height: cli.height,
                fps: cli.fps,
                codec: cli.codec.clone(),
                pix_fmt: cli.pix_fmt.clone(),
                crf: cli.crf,
                bitrate: cli.bitrate.clone(),
            };
            log::info!("Starting FFmpeg encoder...");
            let mut encoder = FfmpegEncoder::new(&cli.output, &input, &settings)?;
            encode_video(&mut encoder, &analyser, &renderer, cli.fps, total_frames, &pb)?;
            pb.finish_with_message("Rendering complete");

            log::info!("Finishing encoding...");
            encoder.finish()?;
        }
    }

    log::info!("Done!");
    Ok(())
}

fn progress_bar(total_frames: usize) -> ProgressBar {
    let pb = ProgressBar::new(total_frames as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

fn frame_time(frame_idx: usize, fps: u32) -> f64 {
    frame_idx as f64 / fps as f64
}

/// Analyse one frame and draw it. Drawing errors are logged; whatever was
/// drawn before the failure is kept.
fn draw_frame<S: Surface>(
    analyser: &Analyser,
    renderer: &FrameRenderer,
    frame_idx: usize,
    fps: u32,
    surface: &mut S,
) {
    let elapsed = frame_time(frame_idx, fps);
    let frame = analyser.frame_at(elapsed);
    let reading = PitchReading::analyze(frame.samples(), analyser.block_time());

    log::debug!(
        "frame {}: freq {:?} oct {:?} note {:?} amp-min {:.3} amp-max {:.3} now {:.3}s",
        frame_idx,
        reading.frequency.ok(),
        reading.class.ok().map(|c| c.octave),
        reading.class.ok().map(|c| c.note),
        reading.amplitude.min,
        reading.amplitude.max,
        elapsed
    );
    if let Some(problem) = reading.problem() {
        log::debug!("frame {}: {}", frame_idx, problem);
    }

    if let Err(err) = renderer.render(&reading, elapsed as f32, surface) {
        log::warn!("frame {}: drawing stopped early: {}", frame_idx, err);
    }
}

fn encode_video(
    encoder: &mut FfmpegEncoder,
    analyser: &Analyser,
    renderer: &FrameRenderer,
    fps: u32,
    total_frames: usize,
    pb: &ProgressBar,
) -> Result<()> {
    let batch_size = (rayon::current_num_threads() * 2).max(1);
    let mut start = 0;

    while start < total_frames {
        let end = (start + batch_size).min(total_frames);

        let batch: Vec<Vec<u8>> = (start..end)
            .into_par_iter()
            .map(|frame_idx| {
                let mut surface = RasterSurface::new(renderer.width, renderer.height);
                draw_frame(analyser, renderer, frame_idx, fps, &mut surface);
                surface.into_pixels()
            })
            .collect();

        for pixels in &batch {
            encoder.write_frame(pixels)?;
        }
        pb.set_position(end as u64);
        start = end;
    }

    Ok(())
}

fn dump_commands(
    path: &Path,
    analyser: &Analyser,
    renderer: &FrameRenderer,
    fps: u32,
    total_frames: usize,
    pb: &ProgressBar,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for frame_idx in 0..total_frames {
        let mut surface = RecordingSurface::new();
        draw_frame(analyser, renderer, frame_idx, fps, &mut surface);
        serde_json::to_writer(&mut writer, surface.commands())
            .with_context(|| format!("Failed to serialize frame {}", frame_idx))?;
        writer.write_all(b"\n")?;
        pb.set_position(frame_idx as u64 + 1);
    }

    writer.flush().context("Failed to flush draw command dump")?;
    log::info!("Wrote {} frames of draw commands", total_frames);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio::decode::AudioData;
    use render::surface::DrawCommand;

    fn tone(freq: f32, seconds: f32, sample_rate: u32) -> AudioData {
        let len = (seconds * sample_rate as f32) as usize;
        AudioData {
            samples: (0..len)
                .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
                .collect(),
            sample_rate,
        }
    }

    #[test]
    fn frame_times_follow_fps() {
        assert_eq!(frame_time(0, 30), 0.0);
        assert_eq!(frame_time(15, 30), 0.5);
    }

    #[test]
    fn every_frame_closes_its_scopes() {
        let audio = tone(441.0, 0.5, 44_100);
        let analyser = Analyser::new(&audio, 2048, None).unwrap();
        let renderer = FrameRenderer::new(320, 240);

        for frame_idx in 0..15 {
            let mut surface = RecordingSurface::new();
            draw_frame(&analyser, &renderer, frame_idx, 30, &mut surface);
            assert_eq!(surface.depth(), 0);
            let commands = surface.into_commands();
            assert!(matches!(commands.first(), Some(DrawCommand::Background { .. })));
            let pushes = commands.iter().filter(|c| matches!(c, DrawCommand::Push)).count();
            let pops = commands.iter().filter(|c| matches!(c, DrawCommand::Pop)).count();
            assert_eq!((pushes, pops), (2, 2));
        }
    }

    #[test]
    fn dump_writes_one_line_per_frame() {
        let audio = tone(441.0, 0.2, 44_100);
        let analyser = Analyser::new(&audio, 256, None).unwrap();
        let renderer = FrameRenderer::new(160, 120);
        let path = std::env::temp_dir().join(format!("pitchwheel-dump-{}.jsonl", std::process::id()));

        dump_commands(&path, &analyser, &renderer, 30, 6, &ProgressBar::hidden()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value[0]["op"], "background");
        }
    }
}
