// tools/castella-cli/src/backend/package.rs
// Bundles generated Python into a single-file executable with PyInstaller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use super::{executable_name, run_captured, BackendError, Toolchain};

pub const SCRATCH_SCRIPT: &str = "castella_temp_script.py";
const SCRATCH_SPEC: &str = "castella_temp_script.spec";
const BUILD_DIR: &str = "build";
const FALLBACK_STEM: &str = "compiled_app";

/// PyInstaller project name: the output's base name without extension.
pub fn project_stem(output: &Path) -> String {
    output
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(FALLBACK_STEM)
        .to_string()
}

/// Writes `python_source` into `workdir`, runs PyInstaller there and moves
/// the produced executable to `output`. Returns the artifact's absolute path.
pub fn package(
    toolchain: &Toolchain,
    python_source: &str,
    output: &Path,
    workdir: &Path,
) -> Result<PathBuf, BackendError> {
    let stem = project_stem(output);
    clean_scratch(workdir, &stem);
    let result = build_and_move(toolchain, python_source, output, workdir, &stem);
    clean_scratch(workdir, &stem);
    result
}

fn build_and_move(
    toolchain: &Toolchain,
    python_source: &str,
    output: &Path,
    workdir: &Path,
    stem: &str,
) -> Result<PathBuf, BackendError> {
    let script = workdir.join(SCRATCH_SCRIPT);
    fs::write(&script, python_source)
        .map_err(|err| BackendError::io(format!("no se pudo escribir '{}'", script.display()), err))?;
    debug!(script = %script.display(), bytes = python_source.len(), "scratch script written");

    let mut command = Command::new(&toolchain.python);
    command.args([
        "-m",
        "PyInstaller",
        "--onefile",
        "--clean",
        "--name",
        stem,
        "--distpath",
        ".",
        SCRATCH_SCRIPT,
    ]);
    info!(project = stem, "running PyInstaller");
    let out = run_captured(command, &toolchain.python, workdir)?;
    let stderr = String::from_utf8_lossy(&out.stderr);
    if !stderr.trim().is_empty() {
        debug!(stderr = %stderr.trim_end(), "PyInstaller output");
    }

    let artifact = workdir.join(executable_name(stem));
    if !artifact.is_file() {
        return Err(BackendError::MissingArtifact { path: artifact });
    }
    let target = if output.is_absolute() {
        output.to_path_buf()
    } else {
        workdir.join(output)
    };
    if artifact != target {
        move_file(&artifact, &target)?;
    }
    fs::canonicalize(&target)
        .map_err(|err| BackendError::io(format!("no se pudo resolver '{}'", target.display()), err))
}

fn move_file(from: &Path, to: &Path) -> Result<(), BackendError> {
    if to.is_file() {
        fs::remove_file(to)
            .map_err(|err| BackendError::io(format!("no se pudo reemplazar '{}'", to.display()), err))?;
    }
    let moved = fs::rename(from, to).or_else(|_| {
        fs::copy(from, to)?;
        fs::remove_file(from)
    });
    moved.map_err(|err| {
        BackendError::io(
            format!("no se pudo mover '{}' a '{}'", from.display(), to.display()),
            err,
        )
    })
}

/// Removes the scratch script, both spec files and the build directory.
/// Failures are logged and never abort the build.
pub fn clean_scratch(workdir: &Path, stem: &str) {
    for name in [SCRATCH_SCRIPT.to_string(), SCRATCH_SPEC.to_string(), format!("{stem}.spec")] {
        let path = workdir.join(&name);
        if path.is_file() {
            if let Err(err) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %err, "could not remove scratch file");
            }
        }
    }
    if let Err(err) = remove_dir_guarded(workdir, &workdir.join(BUILD_DIR)) {
        warn!(error = %err, "could not remove build directory");
    }
}

/// Deletes `dir` recursively only when it lies strictly inside `workdir`.
/// Returns whether anything was removed.
pub fn remove_dir_guarded(workdir: &Path, dir: &Path) -> io::Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let root = fs::canonicalize(workdir)?;
    let target = fs::canonicalize(dir)?;
    if target == root || !target.starts_with(&root) {
        warn!(dir = %target.display(), "refusing to remove directory outside the working directory");
        return Ok(false);
    }
    fs::remove_dir_all(&target)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_comes_from_the_output_name() {
        assert_eq!(project_stem(Path::new("dist/app.exe")), "app");
        assert_eq!(project_stem(Path::new("programa")), "programa");
        assert_eq!(project_stem(Path::new("")), FALLBACK_STEM);
    }

    #[test]
    fn cleanup_removes_scratch_files_and_build_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in [SCRATCH_SCRIPT, SCRATCH_SPEC, "app.spec", "keep.txt"] {
            fs::write(root.join(name), "x").unwrap();
        }
        fs::create_dir_all(root.join(BUILD_DIR).join("app")).unwrap();

        clean_scratch(root, "app");

        assert!(!root.join(SCRATCH_SCRIPT).exists());
        assert!(!root.join(SCRATCH_SPEC).exists());
        assert!(!root.join("app.spec").exists());
        assert!(!root.join(BUILD_DIR).exists());
        assert!(root.join("keep.txt").exists());
    }

    #[test]
    fn guard_refuses_workdir_and_outside_paths() {
        let outer = tempfile::tempdir().unwrap();
        let work = outer.path().join("work");
        let sibling = outer.path().join("sibling");
        fs::create_dir_all(&work).unwrap();
        fs::create_dir_all(&sibling).unwrap();

        assert!(!remove_dir_guarded(&work, &work).unwrap());
        assert!(!remove_dir_guarded(&work, &work.join("..")).unwrap());
        assert!(!remove_dir_guarded(&work, &sibling).unwrap());
        assert!(work.exists() && sibling.exists());

        let inner = work.join("build");
        fs::create_dir_all(&inner).unwrap();
        assert!(remove_dir_guarded(&work, &inner).unwrap());
        assert!(!inner.exists());
    }

    #[test]
    fn missing_python_fails_and_leaves_no_scratch_script() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = Toolchain::new("castella-no-such-python", "upx");
        let err = package(&toolchain, "print(1)\n", Path::new("app"), dir.path()).unwrap_err();
        assert!(matches!(err, BackendError::MissingExecutable { .. }));
        assert!(!dir.path().join(SCRATCH_SCRIPT).exists());
    }

    #[test]
    fn move_replaces_an_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::write(&from, "nuevo").unwrap();
        fs::write(&to, "viejo").unwrap();
        move_file(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "nuevo");
        assert!(!from.exists());
    }
}
