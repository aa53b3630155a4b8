use crate::error::{PreviewError, Result};
use crate::surface::RenderSurface;
use cutline_core::{MediaRef, PlaybackFrame, TimeUs};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Player position may lag the clock by this much before we seek.
pub const MAX_DRIFT: TimeUs = TimeUs(100_000);

/// What the player must do to match a frame.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Load(MediaRef),
    Seek(TimeUs),
    SetPause(bool),
}

/// Render surface backed by an mpv process driven over its JSON IPC socket.
pub struct MpvSurface {
    process: Option<Child>,
    socket_path: PathBuf,
    loaded: Option<MediaRef>,
    paused: bool,
}

impl Default for MpvSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MpvSurface {
    pub fn new() -> Self {
        let socket_path = std::env::temp_dir().join(format!("cutline-mpv-{}", std::process::id()));
        Self {
            process: None,
            socket_path,
            loaded: None,
            paused: true,
        }
    }

    /// Start mpv idle with an IPC server and wait for its socket.
    pub fn start(&mut self) -> Result<()> {
        self.stop();

        let child = Command::new("mpv")
            .args([
                "--idle=yes",
                "--keep-open=yes",
                "--pause=yes",
                "--osc=no",
                "--osd-level=0",
                "--title=cutline-preview",
                &format!("--input-ipc-server={}", self.socket_path.display()),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PreviewError::MpvSpawn(e.to_string()))?;
        self.process = Some(child);
        tracing::info!(socket = %self.socket_path.display(), "mpv started");

        for _ in 0..50 {
            if self.socket_path.exists() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        Err(PreviewError::MpvSpawn("mpv socket did not appear".into()))
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.socket_path);
        self.loaded = None;
        self.paused = true;
    }

    fn send_command(&self, command: serde_json::Value) -> Result<serde_json::Value> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|e| PreviewError::MpvIpc(format!("connect failed: {e}")))?;
        stream.set_read_timeout(Some(Duration::from_secs(2)))?;

        let msg = format!("{}\n", command);
        stream.write_all(msg.as_bytes())?;

        let mut reader = BufReader::new(stream);
        let mut response = String::new();
        reader.read_line(&mut response)?;

        let value: serde_json::Value = serde_json::from_str(&response)?;
        match value.get("error").and_then(|e| e.as_str()) {
            Some("success") | None => Ok(value),
            Some(err) => Err(PreviewError::MpvIpc(err.to_string())),
        }
    }

    fn position(&self) -> Option<TimeUs> {
        let resp = self
            .send_command(json!({ "command": ["get_property", "time-pos"] }))
            .ok()?;
        resp.get("data")
            .and_then(|d| d.as_f64())
            .and_then(TimeUs::try_from_seconds)
    }

    fn run(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Load(media) => {
                self.send_command(json!({ "command": ["loadfile", media.as_str()] }))?;
                self.loaded = Some(media);
            }
            Action::Seek(t) => {
                self.send_command(json!({ "command": ["seek", t.as_seconds(), "absolute"] }))?;
            }
            Action::SetPause(paused) => {
                self.send_command(json!({ "command": ["set_property", "pause", paused] }))?;
                self.paused = paused;
            }
        }
        Ok(())
    }
}

impl RenderSurface for MpvSurface {
    fn present(&mut self, frame: &PlaybackFrame) -> Result<()> {
        let same_media = frame
            .active
            .as_ref()
            .is_some_and(|a| self.loaded.as_ref() == Some(&a.media_ref));
        let position = if same_media { self.position() } else { None };

        for action in plan(self.loaded.as_ref(), self.paused, position, frame) {
            tracing::trace!(?action, "mpv");
            self.run(action)?;
        }
        Ok(())
    }
}

impl Drop for MpvSurface {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Commands that bring a player in state (`loaded`, `paused`, `position`)
/// in line with `frame`.
fn plan(
    loaded: Option<&MediaRef>,
    paused: bool,
    position: Option<TimeUs>,
    frame: &PlaybackFrame,
) -> Vec<Action> {
    let mut actions = Vec::new();

    let Some(active) = &frame.active else {
        if !paused {
            actions.push(Action::SetPause(true));
        }
        return actions;
    };

    if loaded != Some(&active.media_ref) {
        actions.push(Action::Load(active.media_ref.clone()));
        actions.push(Action::Seek(active.local_offset));
    } else {
        let drift = position.map(|p| (p.0 - active.local_offset.0).abs());
        if drift.map_or(true, |d| d > MAX_DRIFT.0) {
            actions.push(Action::Seek(active.local_offset));
        }
    }

    let want_paused = !frame.is_playing;
    if want_paused != paused {
        actions.push(Action::SetPause(want_paused));
    }
    actions
}
