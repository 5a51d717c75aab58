use image::DynamicImage;
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("ffmpeg not found in PATH; install ffmpeg to sample video frames")]
    ToolMissing,

    #[error("ffmpeg exceeded the {0:?} budget and was killed")]
    Timeout(Duration),

    #[error("ffmpeg failed: {stderr}")]
    Extraction { stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// A missing or hung extractor invalidates every later comparison, so the
    /// whole run stops. Anything else is a problem with one input file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::ToolMissing | FrameError::Timeout(_))
    }
}

/// One still image sampled from a video, tagged with its 0-based sample position.
pub struct SampledFrame {
    pub ordinal: usize,
    pub image: DynamicImage,
}

/// Samples evenly spaced stills from a video by shelling out to `ffmpeg`.
/// Snapshots land in a throwaway directory that is removed when sampling ends.
pub struct FrameSampler {
    frame_count: usize,
    skip_seconds: u64,
    timeout: Duration,
}

impl FrameSampler {
    pub fn new(frame_count: usize, skip_seconds: u64, timeout: Duration) -> Self {
        Self {
            frame_count,
            skip_seconds,
            timeout,
        }
    }

    pub fn sample(&self, video: &Path) -> Result<Vec<SampledFrame>, FrameError> {
        let snap_dir = TempDir::new()?;
        let pattern = snap_dir.path().join("frame_%04d.png");

        let mut child = Command::new("ffmpeg")
            .args(self.args(video, &pattern))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => FrameError::ToolMissing,
                _ => FrameError::Io(err),
            })?;

        // drain stderr off-thread so a chatty ffmpeg cannot fill the pipe
        // and stall until the deadline
        let stderr_pipe = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr_pipe {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        let status = match wait_with_deadline(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FrameError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            let stderr = stderr_reader.join().unwrap_or_default();
            return Err(FrameError::Extraction {
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(load_frames(snap_dir.path(), self.frame_count))
    }

    fn args(&self, video: &Path, pattern: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.extend(["-hide_banner", "-loglevel", "error", "-ss"].map(OsString::from));
        args.push(self.skip_seconds.to_string().into());
        args.push("-i".into());
        args.push(video.as_os_str().to_os_string());
        args.extend(["-vf", "fps=1"].map(OsString::from));
        args.push("-frames:v".into());
        args.push(self.frame_count.to_string().into());
        args.push("-y".into());
        args.push(pattern.as_os_str().to_os_string());
        args
    }
}

/// Poll the child until it exits or the deadline passes. Returns None on timeout.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Collect the numbered snapshots ffmpeg wrote, stopping at the first gap.
/// A snapshot that fails to decode is skipped; its ordinal stays reserved.
fn load_frames(dir: &Path, frame_count: usize) -> Vec<SampledFrame> {
    let mut frames = Vec::new();
    for i in 1..=frame_count {
        let path = dir.join(format!("frame_{i:04}.png"));
        if !path.exists() {
            break;
        }
        match image::open(&path) {
            Ok(image) => frames.push(SampledFrame {
                ordinal: i - 1,
                image,
            }),
            Err(err) => log::warn!("undecodable frame {}: {err}", path.display()),
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn fatal_classification() {
        assert!(FrameError::ToolMissing.is_fatal());
        assert!(FrameError::Timeout(Duration::from_secs(60)).is_fatal());
        assert!(
            !FrameError::Extraction {
                stderr: "moov atom not found".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn args_sample_at_one_fps_from_the_offset() {
        let sampler = FrameSampler::new(10, 30, Duration::from_secs(60));
        let args = sampler.args(Path::new("clip.mp4"), Path::new("/tmp/frame_%04d.png"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "30");
        let frames = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[frames + 1], "10");
        assert!(args.contains(&"fps=1".to_string()));
        // seek must come before the input for fast seeking
        assert!(ss < args.iter().position(|a| a == "-i").unwrap());
    }

    #[test]
    fn load_frames_stops_at_the_first_gap() {
        let temp_dir = TempDir::new().unwrap();
        let img = ImageBuffer::from_pixel(8, 8, Rgb([128u8, 128, 128]));
        for i in [1usize, 2, 4] {
            img.save(temp_dir.path().join(format!("frame_{i:04}.png")))
                .unwrap();
        }

        let frames = load_frames(temp_dir.path(), 10);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].ordinal, 0);
        assert_eq!(frames[1].ordinal, 1);
    }

    #[test]
    fn load_frames_skips_undecodable_snapshots() {
        let temp_dir = TempDir::new().unwrap();
        let img = ImageBuffer::from_pixel(8, 8, Rgb([10u8, 20, 30]));
        img.save(temp_dir.path().join("frame_0001.png")).unwrap();
        std::fs::write(temp_dir.path().join("frame_0002.png"), b"not a png").unwrap();
        img.save(temp_dir.path().join("frame_0003.png")).unwrap();

        let frames = load_frames(temp_dir.path(), 10);
        let ordinals: Vec<usize> = frames.iter().map(|f| f.ordinal).collect();
        assert_eq!(ordinals, vec![0, 2]);
    }
}
