//! Stem separation collaborator.

use std::io;
use std::path::{Path, PathBuf};

use crate::logging::JobLogger;
use crate::models::SeparationModel;
use crate::runner::{ProcessError, ProcessRunner, ProgressRange, ToolCommand};

/// Stem isolated in two-stem mode.
pub const TWO_STEM_TARGET: &str = "vocals";

/// File extensions a separator writes stems with.
const STEM_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

/// One separation run.
#[derive(Debug, Clone)]
pub struct SeparationRequest<'a> {
    /// Transcoded MP3 to split.
    pub input: &'a Path,
    /// Root output directory.
    pub output_dir: &'a Path,
    /// Folder name for this track's stems.
    pub track_name: &'a str,
    pub model: SeparationModel,
    pub two_stems: bool,
}

impl SeparationRequest<'_> {
    /// Where the stems land: `<output_dir>/<model id>/<track name>`.
    pub fn stem_dir(&self) -> PathBuf {
        self.output_dir.join(self.model.id()).join(self.track_name)
    }
}

/// Splits a track into stems.
pub trait Separator: Send + Sync {
    /// Run the separation and return the stem directory.
    fn separate(
        &self,
        request: &SeparationRequest<'_>,
        progress: ProgressRange,
        logger: &JobLogger,
    ) -> Result<PathBuf, ProcessError>;

    /// Get the name of this separator (for logging).
    fn name(&self) -> &'static str;
}

/// `demucs` command line separator.
#[derive(Debug, Clone)]
pub struct DemucsSeparator {
    base: ToolCommand,
    runner: ProcessRunner,
}

impl DemucsSeparator {
    /// `command` is the program followed by fixed leading arguments,
    /// e.g. `["python3", "-m", "demucs"]`. Empty falls back to `demucs`.
    pub fn new(command: &[String]) -> Self {
        Self {
            base: ToolCommand::from_parts(command).unwrap_or_else(|| ToolCommand::new("demucs")),
            runner: ProcessRunner::new(),
        }
    }

    /// `<cmd> <input> -o <dir> -n <model> [--two-stems vocals] --filename <track>/{stem}.{ext}`
    pub fn build_command(&self, request: &SeparationRequest<'_>) -> ToolCommand {
        let mut cmd = self
            .base
            .clone()
            .path_arg(request.input)
            .arg("-o")
            .path_arg(request.output_dir)
            .args(["-n", request.model.id()]);

        if request.two_stems {
            cmd = cmd.args(["--two-stems", TWO_STEM_TARGET]);
        }

        cmd.arg("--filename").arg(filename_template(request.track_name))
    }
}

impl Default for DemucsSeparator {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Separator for DemucsSeparator {
    fn separate(
        &self,
        request: &SeparationRequest<'_>,
        progress: ProgressRange,
        logger: &JobLogger,
    ) -> Result<PathBuf, ProcessError> {
        let cmd = self.build_command(request);
        self.runner.run(&cmd, progress.offset, progress.span, logger)?;
        Ok(request.stem_dir())
    }

    fn name(&self) -> &'static str {
        "demucs"
    }
}

/// Track folder pinned to `track_name`; braces in the name are escaped
/// for demucs' format-string expansion.
fn filename_template(track_name: &str) -> String {
    let escaped = track_name.replace('{', "{{").replace('}', "}}");
    format!("{}/{{stem}}.{{ext}}", escaped)
}

/// Stem audio files in `dir`, sorted by name.
pub fn list_stems(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_stem = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| STEM_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
        if is_stem {
            stems.push(path);
        }
    }
    stems.sort();
    Ok(stems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn request<'a>(input: &'a Path, out: &'a Path, two_stems: bool) -> SeparationRequest<'a> {
        SeparationRequest {
            input,
            output_dir: out,
            track_name: "song",
            model: SeparationModel::Htdemucs,
            two_stems,
        }
    }

    #[test]
    fn builds_full_separation_command() {
        let req = request(Path::new("/out/song_320k.mp3"), Path::new("/out"), false);
        let cmd = DemucsSeparator::default().build_command(&req);
        assert_eq!(
            cmd.to_string(),
            "demucs /out/song_320k.mp3 -o /out -n htdemucs --filename song/{stem}.{ext}"
        );
    }

    #[test]
    fn two_stem_mode_isolates_vocals() {
        let req = request(Path::new("in.mp3"), Path::new("out"), true);
        let cmd = DemucsSeparator::default().build_command(&req);
        let line = cmd.to_string();
        assert!(line.contains("--two-stems vocals"));
    }

    #[test]
    fn command_prefix_is_kept() {
        let prefix = vec!["python3".to_string(), "-m".to_string(), "demucs".to_string()];
        let req = request(Path::new("in.mp3"), Path::new("out"), false);
        let cmd = DemucsSeparator::new(&prefix).build_command(&req);
        assert_eq!(cmd.program(), "python3");
        assert_eq!(&cmd.get_args()[..3], &["-m", "demucs", "in.mp3"]);
    }

    #[test]
    fn template_escapes_braces() {
        assert_eq!(filename_template("a{b}"), "a{{b}}/{stem}.{ext}");
    }

    #[test]
    fn stem_dir_layout() {
        let req = SeparationRequest {
            model: SeparationModel::Mdx,
            ..request(Path::new("in.mp3"), Path::new("/music"), false)
        };
        assert_eq!(req.stem_dir(), PathBuf::from("/music/mdx/song"));
    }

    #[test]
    fn lists_only_audio_files() {
        let dir = tempdir().unwrap();
        for name in ["vocals.wav", "drums.WAV", "bass.mp3", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("other.wav")).unwrap();

        let names: Vec<String> = list_stems(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["bass.mp3", "drums.WAV", "vocals.wav"]);
    }
}
