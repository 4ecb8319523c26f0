// tools/castella-cli/src/cli/mod.rs
pub mod build;
pub mod doctor;
pub mod translate;

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = "castella";

/// The path as given when it exists, otherwise the path with `.castella`
/// appended unless it already carries that extension.
pub fn resolve_input(path: &Path) -> PathBuf {
    if path.exists() || has_source_extension(path) {
        return path.to_path_buf();
    }
    let mut with_ext = path.as_os_str().to_os_string();
    with_ext.push(".");
    with_ext.push(SOURCE_EXTENSION);
    PathBuf::from(with_ext)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

pub fn read_source(path: &Path) -> Result<(PathBuf, String), String> {
    let resolved = resolve_input(path);
    if !resolved.is_file() {
        let cwd = env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        return Err(format!(
            "E_CLI_INPUT El archivo de entrada '{}' no existe o no es un archivo válido. Directorio actual de ejecución: '{}'",
            resolved.display(),
            cwd
        ));
    }
    let source = fs::read_to_string(&resolved)
        .map_err(|e| format!("E_CLI_READ Error al leer el archivo '{}': {}", resolved.display(), e))?;
    Ok((resolved, source))
}

/// Asks on stdout and reads one trimmed line from stdin. End of input reads
/// as an empty answer.
pub fn prompt(question: &str) -> Result<String, String> {
    print!("{question}");
    io::stdout().flush().map_err(|e| format!("E_CLI_PROMPT {e}"))?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| format!("E_CLI_PROMPT {e}"))?;
    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_appended_only_when_needed() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("programa");
        assert_eq!(resolve_input(&plain), dir.path().join("programa.castella"));

        let explicit = dir.path().join("programa.CASTELLA");
        assert_eq!(resolve_input(&explicit), explicit);

        let other = dir.path().join("notas.txt");
        assert_eq!(resolve_input(&other), dir.path().join("notas.txt.castella"));

        fs::write(&other, "x = 1;").unwrap();
        assert_eq!(resolve_input(&other), other);
    }

    #[test]
    fn missing_input_names_the_resolved_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("nada")).unwrap_err();
        assert!(err.starts_with("E_CLI_INPUT"));
        assert!(err.contains("nada.castella"));
    }
}
