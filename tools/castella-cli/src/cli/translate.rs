// tools/castella-cli/src/cli/translate.rs
use std::fs;
use std::path::{Path, PathBuf};

use castella_lang::{translate_with, Grammar, PreambleMode, TranslateOptions, TranslationError};
use tracing::{debug, info};

use super::read_source;

pub struct TranslateArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub no_preamble: bool,
    pub diag_json: Option<PathBuf>,
}

pub fn run(grammar: &Grammar, args: TranslateArgs) -> Result<(), String> {
    let (path, source) = read_source(&args.input)?;
    let options = TranslateOptions {
        preamble: if args.no_preamble {
            PreambleMode::Omit
        } else {
            PreambleMode::Full
        },
        ..TranslateOptions::default()
    };
    let python = match translate_with(grammar, &source, &options) {
        Ok(python) => python,
        Err(err) => {
            if let Some(diag_path) = args.diag_json.as_deref() {
                write_diagnostic(diag_path, &err)?;
            }
            return Err(report(&path, &err));
        }
    };
    debug!(bytes = python.len(), "translation finished");

    match args.output {
        Some(out) => {
            fs::write(&out, &python)
                .map_err(|e| format!("E_CLI_WRITE {}: {}", out.display(), e))?;
            info!(input = %path.display(), output = %out.display(), "python source written");
        }
        None => {
            print!("{python}");
            if !python.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

/// `CODE file:line:col reason` followed by the full message.
pub fn report(path: &Path, err: &TranslationError) -> String {
    format!("{}\n{}", err.format(&path.display().to_string()), err)
}

fn write_diagnostic(path: &Path, err: &TranslationError) -> Result<(), String> {
    let json = err
        .diagnostic()
        .to_json()
        .map_err(|e| format!("E_CLI_DIAG_JSON {e}"))?;
    fs::write(path, format!("{json}\n")).map_err(|e| format!("E_CLI_DIAG_WRITE {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use castella_lang::build_grammar;

    #[test]
    fn writes_output_file_without_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("hola.castella");
        let output = dir.path().join("hola.py");
        fs::write(&input, "imprimir(\"hola\");").unwrap();

        let args = TranslateArgs {
            input: dir.path().join("hola"),
            output: Some(output.clone()),
            no_preamble: true,
            diag_json: None,
        };
        run(&build_grammar(), args).unwrap();
        assert_eq!(fs::read_to_string(output).unwrap(), "print(\"hola\")\n");
    }

    #[test]
    fn failure_writes_diagnostic_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("malo.castella");
        let diag = dir.path().join("diag.json");
        fs::write(&input, "@dec\nx = 1;").unwrap();

        let args = TranslateArgs {
            input,
            output: None,
            no_preamble: false,
            diag_json: Some(diag.clone()),
        };
        let err = run(&build_grammar(), args).unwrap_err();
        assert!(err.starts_with("E_STRUCT_ORPHAN_DECORATOR"));

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(diag).unwrap()).unwrap();
        assert_eq!(value["kind"], "structural");
        assert_eq!(value["construct"], "@dec");
    }
}
