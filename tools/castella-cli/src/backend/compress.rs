// tools/castella-cli/src/backend/compress.rs
// Optional UPX pass over a finished executable.

use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use super::{locate, run_captured, BackendError, Toolchain};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compression {
    Compressed,
    /// Nothing was done; the reason is user-facing.
    Skipped(String),
}

/// Runs `upx <artifact>`. A missing artifact or a missing compressor skips
/// the step; a compressor that runs and fails is an error.
pub fn compress(toolchain: &Toolchain, artifact: &Path) -> Result<Compression, BackendError> {
    if !artifact.is_file() {
        let reason = format!("el archivo '{}' no existe", artifact.display());
        warn!(artifact = %artifact.display(), "nothing to compress");
        return Ok(Compression::Skipped(reason));
    }
    let upx = match locate(&toolchain.upx) {
        Ok(path) => path,
        Err(err) => {
            warn!(program = %toolchain.upx, "compressor not found");
            return Ok(Compression::Skipped(err.to_string()));
        }
    };
    let mut command = Command::new(&upx);
    command.arg(artifact);
    let workdir = artifact.parent().unwrap_or(Path::new("."));
    run_captured(command, &toolchain.upx, workdir)?;
    info!(artifact = %artifact.display(), "compressed with UPX");
    Ok(Compression::Compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = Toolchain::new("python3", "upx");
        let result = compress(&toolchain, &dir.path().join("nada")).unwrap();
        assert!(matches!(result, Compression::Skipped(reason) if reason.contains("no existe")));
    }

    #[test]
    fn missing_compressor_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("app");
        std::fs::write(&artifact, "bin").unwrap();
        let toolchain = Toolchain::new("python3", "castella-no-such-upx");
        let result = compress(&toolchain, &artifact).unwrap();
        assert!(matches!(result, Compression::Skipped(reason) if reason.contains("castella-no-such-upx")));
    }
}
