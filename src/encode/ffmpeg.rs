use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{Container, EncodedVideo, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{PinError, PinResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::Surface;

/// Environment variable overriding the ffmpeg executable.
pub const FFMPEG_ENV: &str = "PINFORGE_FFMPEG";

const STDOUT_CHUNK: usize = 64 * 1024;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Executable to run.
    pub program: OsString,
    /// Fixed container, or `None` to negotiate from the local encoder list.
    pub container: Option<Container>,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            program: ffmpeg_program(),
            container: None,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that spawns `ffmpeg`, streams raw frames to stdin and collects the encoded container
/// from stdout as ordered chunks.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<Vec<Vec<u8>>>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    container: Option<Container>,
    last_idx: Option<FrameIndex>,
    frame_count: u64,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            container: None,
            last_idx: None,
            frame_count: 0,
        }
    }

    /// Container chosen by the last `begin`.
    pub fn container(&self) -> Option<Container> {
        self.container
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(h) = self.stdout_drain.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stderr_drain.take() {
            let _ = h.join();
        }
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.kill();
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> PinResult<()> {
        if self.child.is_some() {
            return Err(PinError::capture("ffmpeg sink is already recording"));
        }
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(PinError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PinError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(PinError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        let container = match self.opts.container {
            Some(c) => c,
            None => negotiate_container(&self.opts.program)?,
        };

        let mut cmd = Command::new(&self.opts.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, flattened to opaque in push_frame.
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);
        cmd.args(output_args(container));
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            PinError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PinError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| PinError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PinError::capture("failed to open ffmpeg stderr (unexpected)"))?;

        let stdout_drain = std::thread::spawn(move || {
            let mut chunks = Vec::new();
            loop {
                let mut buf = vec![0u8; STDOUT_CHUNK];
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                buf.truncate(n);
                chunks.push(buf);
            }
            Ok(chunks)
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(?container, width = cfg.width, height = cfg.height, "ffmpeg started");

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.container = Some(container);
        self.last_idx = None;
        self.frame_count = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Surface) -> PinResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PinError::capture("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(PinError::capture(
                "ffmpeg sink received out-of-order frame index",
            ));
        }

        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(PinError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, frame.data(), self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PinError::capture("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            PinError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.last_idx = Some(idx);
        self.frame_count += 1;
        Ok(())
    }

    fn end(&mut self) -> PinResult<EncodedVideo> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| PinError::capture("ffmpeg sink not started"))?;
        self.cfg = None;

        let status = child.wait().map_err(|e| {
            PinError::capture(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let chunks = match self.stdout_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PinError::capture("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| PinError::capture(format!("ffmpeg stdout read failed: {e}")))?,
            None => Vec::new(),
        };
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PinError::capture("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| PinError::capture(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PinError::capture(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let container = self
            .container
            .ok_or_else(|| PinError::capture("ffmpeg sink has no container"))?;
        let bytes = chunks.concat();
        if bytes.is_empty() {
            return Err(PinError::capture("ffmpeg produced no output"));
        }
        Ok(EncodedVideo {
            container,
            bytes,
            frame_count: self.frame_count,
        })
    }

    fn abort(&mut self) {
        self.kill();
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn output_args(container: Container) -> [&'static str; 8] {
    match container {
        // Pipes are not seekable, so the moov atom goes up front in a fragmented file.
        Container::Mp4 => [
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
        ],
        Container::WebM => [
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-deadline",
            "realtime",
            "-f",
            "webm",
        ],
    }
}

/// Executable named by `PINFORGE_FFMPEG`, else `ffmpeg`.
pub fn ffmpeg_program() -> OsString {
    std::env::var_os(FFMPEG_ENV).unwrap_or_else(|| OsString::from("ffmpeg"))
}

/// Ask the local ffmpeg which containers it can produce.
pub fn negotiate_container(program: &OsStr) -> PinResult<Container> {
    let out = Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| PinError::capture(format!("failed to query ffmpeg encoders: {e}")))?;
    let listing = String::from_utf8_lossy(&out.stdout);
    let container = pick_container(&listing).ok_or_else(|| {
        PinError::capture("ffmpeg has neither libx264 nor libvpx-vp9; cannot record video")
    })?;
    if container == Container::WebM {
        tracing::warn!("libx264 unavailable; recording WebM instead of MP4");
    }
    Ok(container)
}

/// Prefer MP4 when an H.264 encoder is listed, else WebM when VP9 is.
pub fn pick_container(encoders_listing: &str) -> Option<Container> {
    let names: Vec<&str> = encoders_listing
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then_some(name)
        })
        .collect();
    if names.contains(&"libx264") {
        Some(Container::Mp4)
    } else if names.contains(&"libvpx-vp9") {
        Some(Container::WebM)
    } else {
        None
    }
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> PinResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(PinError::capture(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (s[0] as u16 + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (s[1] as u16 + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (s[2] as u16 + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when the configured ffmpeg can be invoked.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new(ffmpeg_program())
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
