// tools/castella-cli/src/backend/mod.rs
// External tool collaborators: PyInstaller packaging and UPX compression.

pub mod compress;
pub mod package;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("E_BACKEND_MISSING_EXECUTABLE no se encontró '{program}' en el PATH")]
    MissingExecutable { program: String },

    #[error("E_BACKEND_EXIT '{program}' terminó con código {code}\n  STDOUT:\n{stdout}\n  STDERR:\n{stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("E_BACKEND_ARTIFACT no se encontró el ejecutable esperado '{}'", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("E_BACKEND_IO {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BackendError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BackendError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Executables the backend shells out to.
#[derive(Clone, Debug)]
pub struct Toolchain {
    pub python: String,
    pub upx: String,
}

impl Toolchain {
    pub fn new(python: impl Into<String>, upx: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            upx: upx.into(),
        }
    }
}

pub fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Name of the file PyInstaller produces for `stem` on this platform.
pub fn executable_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_string()
    }
}

/// Absolute path of `program`, searching PATH when it is a bare name.
pub fn locate(program: &str) -> Result<PathBuf, BackendError> {
    which::which(program).map_err(|_| BackendError::MissingExecutable {
        program: program.to_string(),
    })
}

/// Runs `command` to completion, turning a spawn failure or a non-zero exit
/// into a [`BackendError`].
pub(crate) fn run_captured(mut command: Command, program: &str, cwd: &Path) -> Result<Output, BackendError> {
    debug!(program, cwd = %cwd.display(), "running external tool");
    let output = command.current_dir(cwd).output().map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            BackendError::MissingExecutable {
                program: program.to_string(),
            }
        } else {
            BackendError::io(format!("no se pudo ejecutar '{program}'"), err)
        }
    })?;
    if !output.status.success() {
        return Err(BackendError::NonZeroExit {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output)
}
