use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Video settings for one encode.
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    /// When set, `-b:v` replaces `-crf`.
    pub bitrate: Option<String>,
}

/// Streams raw RGBA frames into an ffmpeg child process and muxes the
/// source audio alongside them.
pub struct FfmpegEncoder {
    child: Child,
    frame_bytes: usize,
    frames_written: usize,
}

fn build_args(output: &Path, audio: &Path, settings: &EncoderSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-f",
        "rawvideo",
        "-pixel_format",
        "rgba",
        "-video_size",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(format!("{}x{}", settings.width, settings.height).into());
    args.push("-framerate".into());
    args.push(settings.fps.to_string().into());
    args.push("-i".into());
    args.push("pipe:0".into());
    args.push("-i".into());
    args.push(audio.as_os_str().to_owned());
    args.push("-c:v".into());
    args.push(settings.codec.clone().into());
    args.push("-pix_fmt".into());
    args.push(settings.pix_fmt.clone().into());

    match settings.bitrate {
        Some(ref br) => {
            args.push("-b:v".into());
            args.push(br.clone().into());
        }
        None => {
            args.push("-crf".into());
            args.push(settings.crf.to_string().into());
            args.push("-preset".into());
            args.push("medium".into());
        }
    }

    for arg in ["-c:a", "aac", "-b:a", "192k", "-shortest"] {
        args.push(arg.into());
    }
    args.push(output.as_os_str().to_owned());
    args
}

impl FfmpegEncoder {
    pub fn new(output: &Path, audio: &Path, settings: &EncoderSettings) -> Result<Self> {
        let args = build_args(output, audio, settings);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width,
            settings.height,
            settings.fps,
            settings.codec
        );

        Ok(Self {
            child,
            frame_bytes: settings.width as usize * settings.height as usize * 4,
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_bytes {
            anyhow::bail!(
                "Frame has {} bytes, encoder expects {}",
                rgba_pixels.len(),
                self.frame_bytes
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin
            .write_all(rgba_pixels)
            .with_context(|| format!("Failed to write frame {} to ffmpeg", self.frames_written))?;
        self.frames_written += 1;
        Ok(())
    }

    /// Close the stream and wait for ffmpeg. Returns the number of frames
    /// written.
    pub fn finish(mut self) -> Result<usize> {
        // Closing stdin signals end of stream.
        drop(self.child.stdin.take());

        let result = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete ({} frames)", self.frames_written);
        Ok(self.frames_written)
    }
}
