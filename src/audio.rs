//! Audio system for background music and sound effects
//!
//! Playback needs an output device and an `assets/audio` directory. Without
//! either, the manager still tracks the music and sound toggles so the rest
//! of the host behaves the same.

use falling_bricks::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sfx {
    Move,
    Lock,
    Clear,
    GameOver,
}

impl Sfx {
    fn filename(&self) -> &'static str {
        match self {
            Sfx::Move => "click.wav",
            Sfx::Lock => "lock.wav",
            Sfx::Clear => "clear.wav",
            Sfx::GameOver => "game_over.wav",
        }
    }

    /// Sound for a game event, if it has one
    pub fn for_event(event: GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::Move => Some(Sfx::Move),
            GameEvent::Lock => Some(Sfx::Lock),
            GameEvent::Clear(_) => Some(Sfx::Clear),
            GameEvent::GameOver => Some(Sfx::GameOver),
            GameEvent::Countdown(_) | GameEvent::Go | GameEvent::Combo | GameEvent::LevelUp => None,
        }
    }
}

/// Audio manager handles all sound playback
pub struct AudioManager {
    output: Option<output::Output>,
    music_enabled: bool,
    sound_enabled: bool,
    /// Music should be running (a round is in progress)
    music_wanted: bool,
    music_volume: f32,
    sound_volume: f32,
}

impl AudioManager {
    /// Create an audio manager, opening the output device when available
    pub fn new(music_enabled: bool, sound_enabled: bool) -> Self {
        let output = output::Output::open();
        if output.is_none() {
            tracing::warn!("Audio output or assets unavailable, playing silently");
        }

        Self {
            output,
            music_enabled,
            sound_enabled,
            music_wanted: false,
            music_volume: 0.25,
            sound_volume: 0.5,
        }
    }

    /// Whether a device and the asset directory were found
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Set music volume (0.0 to 1.0)
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if let Some(output) = &self.output {
            output.set_music_volume(self.music_volume);
        }
    }

    /// Set sound effect volume (0.0 to 1.0)
    pub fn set_sound_volume(&mut self, volume: f32) {
        self.sound_volume = volume.clamp(0.0, 1.0);
    }

    /// Flip music on or off, returning the new state
    pub fn toggle_music(&mut self) -> bool {
        self.music_enabled = !self.music_enabled;
        tracing::info!("Music {}", if self.music_enabled { "on" } else { "off" });
        if let Some(output) = &self.output {
            output.set_music_paused(!self.music_enabled);
        }
        self.music_enabled
    }

    /// Flip sound effects on or off, returning the new state
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        tracing::info!("Sound {}", if self.sound_enabled { "on" } else { "off" });
        self.sound_enabled
    }

    /// Start a random track and keep shuffling tracks until stopped
    pub fn start_music(&mut self) {
        self.music_wanted = true;
        if let Some(output) = &mut self.output {
            output.play_random_track(self.music_volume, !self.music_enabled);
        }
    }

    /// Stop background music
    pub fn stop_music(&mut self) {
        self.music_wanted = false;
        if let Some(output) = &mut self.output {
            output.stop_music();
        }
    }

    /// Hold the music while the game is paused
    pub fn pause_music(&mut self, paused: bool) {
        if let Some(output) = &self.output {
            output.set_music_paused(paused || !self.music_enabled);
        }
    }

    /// Queue the next track once the current one ends (call every frame)
    pub fn tick(&mut self) {
        if !self.music_wanted {
            return;
        }
        if let Some(output) = &mut self.output {
            if output.music_finished() {
                output.play_random_track(self.music_volume, !self.music_enabled);
            }
        }
    }

    /// Play a sound effect
    pub fn play_sfx(&mut self, sfx: Sfx) {
        if !self.sound_enabled || self.sound_volume <= 0.0 {
            return;
        }
        if let Some(output) = &self.output {
            output.play_sfx(sfx.filename(), self.sound_volume);
        }
    }

    /// Stop every sound and play the game over jingle
    pub fn game_over(&mut self) {
        self.stop_music();
        self.play_sfx(Sfx::GameOver);
    }
}

mod output {
    use rand::seq::SliceRandom;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    /// Open rodio stream plus the asset files it plays
    pub struct Output {
        _stream: OutputStream,
        stream_handle: OutputStreamHandle,
        music_sink: Option<Sink>,
        assets_path: PathBuf,
        tracks: Vec<PathBuf>,
    }

    impl Output {
        pub fn open() -> Option<Self> {
            let (stream, stream_handle) = OutputStream::try_default().ok()?;
            let assets_path = find_assets_path()?;
            let tracks = list_tracks(&assets_path.join("music"));

            Some(Self {
                _stream: stream,
                stream_handle,
                music_sink: None,
                assets_path,
                tracks,
            })
        }

        pub fn set_music_volume(&self, volume: f32) {
            if let Some(sink) = &self.music_sink {
                sink.set_volume(volume);
            }
        }

        pub fn set_music_paused(&self, paused: bool) {
            if let Some(sink) = &self.music_sink {
                if paused {
                    sink.pause();
                } else {
                    sink.play();
                }
            }
        }

        pub fn play_random_track(&mut self, volume: f32, paused: bool) {
            self.stop_music();
            let Some(path) = self.tracks.choose(&mut rand::thread_rng()) else {
                return;
            };
            let Ok(file) = File::open(path) else { return };
            let Ok(sink) = Sink::try_new(&self.stream_handle) else { return };
            let Ok(decoder) = Decoder::new(BufReader::new(file)) else { return };

            sink.set_volume(volume);
            sink.append(decoder);
            if paused {
                sink.pause();
            }
            tracing::debug!("Playing {}", path.display());
            self.music_sink = Some(sink);
        }

        pub fn stop_music(&mut self) {
            if let Some(sink) = self.music_sink.take() {
                sink.stop();
            }
        }

        pub fn music_finished(&self) -> bool {
            self.music_sink.as_ref().is_none_or(Sink::empty)
        }

        pub fn play_sfx(&self, filename: &str, volume: f32) {
            let path = self.assets_path.join("sounds").join(filename);
            if let Ok(file) = File::open(&path) {
                if let Ok(decoder) = Decoder::new(BufReader::new(file)) {
                    if let Ok(sink) = Sink::try_new(&self.stream_handle) {
                        sink.set_volume(volume);
                        sink.append(decoder);
                        sink.detach(); // Let it play and clean up automatically
                    }
                }
            }
        }
    }

    fn find_assets_path() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("assets/audio"),
            std::env::current_exe().ok()?.parent()?.join("assets/audio"),
        ];

        paths
            .iter()
            .find(|p| p.join("sounds").exists())
            .cloned()
    }

    pub(super) fn list_tracks(dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut tracks: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "mp3" || ext == "wav" || ext == "ogg")
            })
            .collect();
        tracks.sort();
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_sounds() {
        assert_eq!(Sfx::for_event(GameEvent::Move), Some(Sfx::Move));
        assert_eq!(Sfx::for_event(GameEvent::Clear(3)), Some(Sfx::Clear));
        assert_eq!(Sfx::for_event(GameEvent::GameOver), Some(Sfx::GameOver));
        assert_eq!(Sfx::for_event(GameEvent::Countdown(2)), None);
    }

    #[test]
    fn test_toggles() {
        let mut audio = AudioManager::new(true, true);
        assert!(!audio.toggle_music());
        assert!(!audio.music_enabled());
        assert!(!audio.toggle_sound());
        assert!(audio.toggle_sound());
        assert!(audio.sound_enabled());
    }

    #[test]
    fn test_missing_assets_play_silently() {
        // The crate root has no assets/audio directory
        let mut audio = AudioManager::new(true, true);
        assert!(!audio.has_output());
        audio.start_music();
        audio.tick();
        audio.pause_music(true);
        audio.play_sfx(Sfx::Lock);
        audio.game_over();
        assert!(audio.music_enabled());
    }

    #[test]
    fn test_playlist_keeps_audio_files() {
        let dir = std::env::temp_dir().join(format!("falling-bricks-tracks-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.ogg", "a.mp3", "notes.txt", "c.wav"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let tracks = output::list_tracks(&dir);
        let names: Vec<_> = tracks
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, vec!["a.mp3", "b.ogg", "c.wav"]);
        assert!(output::list_tracks(&dir.join("missing")).is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
