//! Document to PDF conversion

use crate::process::{run_with_timeout, ProcessError};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Converter reported success but produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("Invalid converter input {0}")]
    InvalidInput(PathBuf),

    #[error("Invalid converter working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Converts a rendered document into another format
pub trait DocumentConverter {
    /// Convert `input` to `format`, writing into `out_dir`
    ///
    /// Returns the path of the produced file. Must give up once `timeout`
    /// has elapsed.
    fn convert(
        &self,
        input: &Path,
        format: &str,
        out_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, ConvertError>;
}

/// Where a converter names its output: `<out_dir>/<input stem>.<format>`
pub fn converted_path(input: &Path, format: &str, out_dir: &Path) -> Result<PathBuf, ConvertError> {
    let stem = input
        .file_stem()
        .ok_or_else(|| ConvertError::InvalidInput(input.to_path_buf()))?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format);
    Ok(out_dir.join(name))
}

/// LibreOffice in headless mode
///
/// Each conversion gets its own user profile inside `out_dir`, so parallel
/// exports never contend for the shared profile lock.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn profile_url(out_dir: &Path) -> Result<String, ConvertError> {
        let absolute = out_dir
            .canonicalize()
            .map_err(|source| ConvertError::WorkDir {
                path: out_dir.to_path_buf(),
                source,
            })?;
        let profile = absolute.join("lo-profile");
        Url::from_directory_path(&profile)
            .map(String::from)
            .map_err(|_| ConvertError::InvalidInput(profile))
    }
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl DocumentConverter for SofficeConverter {
    fn convert(
        &self,
        input: &Path,
        format: &str,
        out_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, ConvertError> {
        let expected = converted_path(input, format, out_dir)?;

        let mut command = Command::new(&self.program);
        command
            .arg("--headless")
            .arg(format!("-env:UserInstallation={}", Self::profile_url(out_dir)?))
            .arg("--convert-to")
            .arg(format)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);
        debug!(input = %input.display(), format, "converting document");

        let output = run_with_timeout(command, timeout)?;
        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr, "converter diagnostics");
        }

        if !expected.is_file() {
            return Err(ConvertError::MissingOutput(expected));
        }
        info!(
            output = %expected.display(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "document converted"
        );
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_converted_path() {
        let path = converted_path(Path::new("/tmp/x/form_1.fodt"), "pdf", Path::new("/out")).unwrap();
        assert_eq!(path, PathBuf::from("/out/form_1.pdf"));
    }

    #[test]
    fn test_converted_path_without_name() {
        assert!(matches!(
            converted_path(Path::new("/"), "pdf", Path::new("/out")),
            Err(ConvertError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_profile_url_is_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        let url = SofficeConverter::profile_url(dir.path()).unwrap();
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("lo-profile/"));
    }

    #[cfg(unix)]
    mod fake_program {
        use super::*;
        use pretty_assertions::assert_eq;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-soffice");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn input(dir: &Path) -> PathBuf {
            let path = dir.join("form_1.fodt");
            std::fs::write(&path, "<doc/>").unwrap();
            path
        }

        #[test]
        fn test_convert_returns_output_path() {
            let bin = tempfile::tempdir().unwrap();
            let work = tempfile::tempdir().unwrap();
            // $6 is the output directory, $7 the input
            let program = script(
                bin.path(),
                r#"name=$(basename "$7"); touch "$6/${name%.*}.$4""#,
            );

            let output = SofficeConverter::new(program)
                .convert(&input(work.path()), "pdf", work.path(), Duration::from_secs(10))
                .unwrap();
            assert_eq!(output, work.path().join("form_1.pdf"));
            assert!(output.is_file());
        }

        #[test]
        fn test_convert_with_diagnostics_succeeds() {
            let bin = tempfile::tempdir().unwrap();
            let work = tempfile::tempdir().unwrap();
            let program = script(
                bin.path(),
                r#"echo 'javaldx: Could not find a Java Runtime Environment!' >&2
name=$(basename "$7"); touch "$6/${name%.*}.$4""#,
            );

            let output = SofficeConverter::new(program)
                .convert(&input(work.path()), "pdf", work.path(), Duration::from_secs(10))
                .unwrap();
            assert!(output.is_file());
        }

        #[test]
        fn test_convert_without_output() {
            let bin = tempfile::tempdir().unwrap();
            let work = tempfile::tempdir().unwrap();
            let program = script(bin.path(), "exit 0");

            let err = SofficeConverter::new(program)
                .convert(&input(work.path()), "pdf", work.path(), Duration::from_secs(10))
                .unwrap_err();
            assert!(matches!(err, ConvertError::MissingOutput(_)));
        }

        #[test]
        fn test_convert_failure() {
            let bin = tempfile::tempdir().unwrap();
            let work = tempfile::tempdir().unwrap();
            let program = script(bin.path(), "echo 'source file could not be loaded' >&2; exit 1");

            let err = SofficeConverter::new(program)
                .convert(&input(work.path()), "pdf", work.path(), Duration::from_secs(10))
                .unwrap_err();
            assert!(matches!(
                err,
                ConvertError::Process(ProcessError::Failed { .. })
            ));
            assert!(err.to_string().contains("could not be loaded"));
        }

        #[test]
        fn test_convert_timeout() {
            let bin = tempfile::tempdir().unwrap();
            let work = tempfile::tempdir().unwrap();
            let program = script(bin.path(), "exec sleep 30");

            let err = SofficeConverter::new(program)
                .convert(&input(work.path()), "pdf", work.path(), Duration::from_millis(200))
                .unwrap_err();
            assert!(matches!(
                err,
                ConvertError::Process(ProcessError::TimedOut { .. })
            ));
        }
    }
}
