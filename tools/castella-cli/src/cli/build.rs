// tools/castella-cli/src/cli/build.rs
// translate -> PyInstaller -> optional UPX.

use std::env;
use std::path::{Path, PathBuf};

use castella_lang::{translate, Grammar};
use clap::ValueEnum;
use tracing::{info, warn};

use super::doctor::preflight;
use super::translate::report;
use super::{prompt, read_source};
use crate::backend::compress::{compress, Compression};
use crate::backend::package::package;
use crate::backend::{executable_name, Toolchain};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum CompressMode {
    /// Ask when UPX is available.
    Auto,
    Yes,
    No,
    /// Fail the build when UPX is missing.
    Required,
}

pub struct BuildArgs {
    pub input: Option<PathBuf>,
    pub output: Option<String>,
    pub compress: CompressMode,
}

pub fn run(grammar: &Grammar, toolchain: &Toolchain, args: BuildArgs) -> Result<PathBuf, String> {
    println!("=== COMPILADOR CASTELLA ===");
    println!("\n--- Verificando dependencias esenciales ---");
    let checks = preflight(toolchain);
    print!("{}", checks.render());
    if !checks.ready() {
        return Err("E_BUILD_DEPENDENCIES No se pudieron resolver todas las dependencias necesarias (Python y/o PyInstaller). Por favor, instálalas y asegúrate de que estén accesibles en tu PATH.".to_string());
    }
    if args.compress == CompressMode::Required && !checks.compressor_available() {
        return Err(format!(
            "E_BUILD_UPX La compresión fue solicitada pero '{}' no está disponible en el PATH.",
            toolchain.upx
        ));
    }

    let input = match args.input {
        Some(path) => path,
        None => {
            let answer = prompt("Introduce la ruta al archivo Castella (.castella): ")?;
            if answer.is_empty() {
                return Err("E_BUILD_INPUT No se especificó una ruta para el archivo Castella de entrada.".to_string());
            }
            PathBuf::from(answer)
        }
    };
    let (path, source) = read_source(&input)?;
    let output = match args.output {
        Some(name) => name,
        None => ask_output_name(&path)?,
    };

    let python = translate(grammar, &source).map_err(|err| report(&path, &err))?;
    info!(input = %path.display(), bytes = python.len(), "translated");

    println!("\n--- Iniciando proceso de generación de binario ---");
    let workdir = env::current_dir().map_err(|e| format!("E_BUILD_CWD {e}"))?;
    let artifact = package(toolchain, &python, Path::new(&output), &workdir).map_err(|e| e.to_string())?;
    println!("Binario generado: {}", artifact.display());

    if wants_compression(args.compress, checks.compressor_available(), &artifact)? {
        println!("\n--- Iniciando proceso de compresión con UPX ---");
        match compress(toolchain, &artifact).map_err(|e| e.to_string())? {
            Compression::Compressed => println!("Binario comprimido: {}", artifact.display()),
            Compression::Skipped(reason) if args.compress == CompressMode::Required => {
                return Err(format!("E_BUILD_UPX {reason}"));
            }
            Compression::Skipped(reason) => warn!(%reason, "compression skipped"),
        }
    }
    println!("\n=== Proceso completado. ===");
    Ok(artifact)
}

/// Default is the input's stem, with `.exe` on Windows.
pub fn default_output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    executable_name(stem)
}

/// On Windows a name without `.exe` gets it appended.
pub fn normalize_output_name(name: &str) -> String {
    if cfg!(windows) && !name.to_ascii_lowercase().ends_with(".exe") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

fn ask_output_name(input: &Path) -> Result<String, String> {
    let default_name = default_output_name(input);
    let answer = prompt(&format!(
        "Introduce el nombre deseado para el ejecutable generado (Enter para '{default_name}'): "
    ))?;
    if answer.is_empty() {
        println!("Usando nombre por defecto: '{default_name}'");
        return Ok(default_name);
    }
    Ok(normalize_output_name(&answer))
}

fn wants_compression(mode: CompressMode, available: bool, artifact: &Path) -> Result<bool, String> {
    match mode {
        CompressMode::No => Ok(false),
        CompressMode::Yes | CompressMode::Required => Ok(true),
        CompressMode::Auto if !available => {
            println!("\nUPX no encontrado. La compresión de binarios no está disponible.");
            Ok(false)
        }
        CompressMode::Auto => {
            let name = artifact
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let answer = prompt(&format!("\n¿Deseas comprimir el binario '{name}' con UPX? (s/n): "))?;
            Ok(matches!(answer.to_lowercase().as_str(), "s" | "si" | "sí"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_is_the_input_stem() {
        let name = default_output_name(Path::new("dir/juego.castella"));
        if cfg!(windows) {
            assert_eq!(name, "juego.exe");
        } else {
            assert_eq!(name, "juego");
        }
    }

    #[test]
    fn explicit_modes_do_not_prompt() {
        let artifact = Path::new("app");
        assert!(!wants_compression(CompressMode::No, true, artifact).unwrap());
        assert!(wants_compression(CompressMode::Yes, false, artifact).unwrap());
        assert!(wants_compression(CompressMode::Required, true, artifact).unwrap());
        assert!(!wants_compression(CompressMode::Auto, false, artifact).unwrap());
    }

    #[test]
    fn output_name_keeps_user_choice_off_windows() {
        let name = normalize_output_name("salida");
        if cfg!(windows) {
            assert_eq!(name, "salida.exe");
        } else {
            assert_eq!(name, "salida");
        }
    }
}
