use std::io;
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("could not run {cmd}: {source}")]
    Spawn {
        cmd: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{cmd} exited with {status}")]
    Status {
        cmd: &'static str,
        status: ExitStatus,
    },
}

/// Answers "is any application playing sound right now".
pub trait AudioProbe {
    fn is_active(&mut self) -> Result<bool, AudioError>;
}

/// Run a detection command and hand back its stdout. `quiet_codes` are exit codes
/// that mean "nothing found" rather than failure.
fn capture(cmd: &'static str, args: &[&str], quiet_codes: &[i32]) -> Result<String, AudioError> {
    let mut command = Command::new(cmd);
    command.args(args);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        // CREATE_NO_WINDOW: no console flash every poll.
        command.creation_flags(0x0800_0000);
    }
    let output = command
        .output()
        .map_err(|source| AudioError::Spawn { cmd, source })?;
    let quiet = output
        .status
        .code()
        .is_some_and(|c| quiet_codes.contains(&c));
    if !output.status.success() && !quiet {
        return Err(AudioError::Status {
            cmd,
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// PulseAudio / PipeWire: any sink input means something is playing.
pub struct PactlProbe;

const PACTL: &str = "pactl";

impl AudioProbe for PactlProbe {
    fn is_active(&mut self) -> Result<bool, AudioError> {
        let out = capture(PACTL, &["list", "sink-inputs"], &[])?;
        Ok(has_active_streams(&out))
    }
}

pub fn has_active_streams(pactl_output: &str) -> bool {
    pactl_output.contains("Sink Input #")
}

/// Windows media and call apps. A running one counts as audio.
const WINDOWS_PLAYERS: [&str; 17] = [
    "chrome",
    "firefox",
    "msedge",
    "spotify",
    "vlc",
    "wmplayer",
    "winamp",
    "foobar2000",
    "musicbee",
    "aimp",
    "potplayer",
    "mpc-hc",
    "mpc-be",
    "discord",
    "teams",
    "zoom",
    "skype",
];

/// Windows: look for a known player in the process list.
pub struct TasklistProbe;

const TASKLIST: &str = "tasklist";

impl AudioProbe for TasklistProbe {
    fn is_active(&mut self) -> Result<bool, AudioError> {
        let out = capture(TASKLIST, &["/fo", "csv", "/nh"], &[])?;
        Ok(has_player_task(&out))
    }
}

/// `tasklist /fo csv /nh` lines look like `"vlc.exe","4242","Console",...`.
pub fn has_player_task(tasklist_output: &str) -> bool {
    tasklist_output.lines().any(|line| {
        let image = line.split(',').next().unwrap_or("").trim().trim_matches('"');
        let name = if image.to_ascii_lowercase().ends_with(".exe") {
            &image[..image.len() - 4]
        } else {
            image
        };
        WINDOWS_PLAYERS.iter().any(|p| p.eq_ignore_ascii_case(name))
    })
}

/// macOS media and call apps, by process name.
const MAC_PLAYERS: [&str; 20] = [
    "Music",
    "Spotify",
    "VLC",
    "QuickTime Player",
    "iTunes",
    "Google Chrome",
    "Firefox",
    "Safari",
    "Discord",
    "zoom.us",
    "Microsoft Teams",
    "FaceTime",
    "Skype",
    "Plex",
    "IINA",
    "Elmedia Player",
    "JustAudioPlayer",
    "Audirvana",
    "Swinsian",
    "Vox",
];

/// macOS: one `pgrep` over all known players.
pub struct PgrepProbe;

const PGREP: &str = "pgrep";

impl AudioProbe for PgrepProbe {
    fn is_active(&mut self) -> Result<bool, AudioError> {
        let pattern = MAC_PLAYERS.join("|");
        // pgrep exits 1 when nothing matched.
        let out = capture(PGREP, &["-il", &pattern], &[1])?;
        Ok(has_player_process(&out))
    }
}

/// `pgrep -l` lines are `<pid> <name>`. The pattern is a substring match,
/// so only exact names count.
pub fn has_player_process(pgrep_output: &str) -> bool {
    pgrep_output.lines().any(|line| {
        let name = line
            .trim()
            .split_once(char::is_whitespace)
            .map_or("", |(_, name)| name.trim());
        MAC_PLAYERS.iter().any(|p| p.eq_ignore_ascii_case(name))
    })
}

/// Platforms without a probe: never any music.
pub struct NullProbe;

impl AudioProbe for NullProbe {
    fn is_active(&mut self) -> Result<bool, AudioError> {
        Ok(false)
    }
}

pub fn platform_probe() -> Box<dyn AudioProbe + Send> {
    if cfg!(target_os = "linux") {
        Box::new(PactlProbe)
    } else if cfg!(windows) {
        Box::new(TasklistProbe)
    } else if cfg!(target_os = "macos") {
        Box::new(PgrepProbe)
    } else {
        log::info!("No audio probe for this platform, dancing is off");
        Box::new(NullProbe)
    }
}

impl<P: AudioProbe + ?Sized> AudioProbe for Box<P> {
    fn is_active(&mut self) -> Result<bool, AudioError> {
        (**self).is_active()
    }
}

/// Reports only changes of a boolean signal. Starts out "silent".
#[derive(Debug, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    pub fn update(&mut self, value: bool) -> Option<bool> {
        if value == self.last {
            return None;
        }
        self.last = value;
        Some(value)
    }
}

/// Poll `probe` every `interval` on a background thread and call `on_edge`
/// whenever the answer changes. Probe errors count as silence. The thread
/// ends once `on_edge` returns `false`.
pub fn spawn_monitor<P, E>(
    mut probe: P,
    interval: Duration,
    mut on_edge: E,
) -> io::Result<JoinHandle<()>>
where
    P: AudioProbe + Send + 'static,
    E: FnMut(bool) -> bool + Send + 'static,
{
    thread::Builder::new()
        .name("audio-monitor".into())
        .spawn(move || {
            let mut edges = EdgeDetector::default();
            loop {
                let active = probe.is_active().unwrap_or_else(|e| {
                    log::debug!("Audio probe failed: {e}");
                    false
                });
                if let Some(active) = edges.update(active) {
                    log::debug!("Audio {}", if active { "started" } else { "stopped" });
                    if !on_edge(active) {
                        log::debug!("Audio monitor: receiver gone, stopping");
                        return;
                    }
                }
                thread::sleep(interval);
            }
        })
}
