// tools/castella-cli/src/cli/doctor.rs
// Pre-flight checks for the external tools `build` needs.

use std::path::Path;
use std::process::Command;

use serde::Serialize;
use serde_json::json;

use crate::backend::{locate, run_captured, Toolchain};

#[derive(Clone, Debug, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub program: String,
    pub ok: bool,
    pub required: bool,
    pub detail: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Preflight {
    pub checks: Vec<Check>,
}

impl Preflight {
    /// Every required tool is present.
    pub fn ready(&self) -> bool {
        self.checks.iter().all(|check| check.ok || !check.required)
    }

    pub fn compressor_available(&self) -> bool {
        self.checks.iter().any(|check| check.name == "upx" && check.ok)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let mark = match (check.ok, check.required) {
                (true, _) => "ok",
                (false, true) => "falta",
                (false, false) => "opcional",
            };
            out.push_str(&format!("[{mark}] {} ({}): {}\n", check.name, check.program, check.detail));
        }
        out
    }
}

pub fn preflight(toolchain: &Toolchain) -> Preflight {
    let python = match locate(&toolchain.python) {
        Ok(path) => Check {
            name: "python",
            program: toolchain.python.clone(),
            ok: true,
            required: true,
            detail: path.display().to_string(),
        },
        Err(err) => Check {
            name: "python",
            program: toolchain.python.clone(),
            ok: false,
            required: true,
            detail: format!("{err}. El intérprete de Python es necesario para ejecutar PyInstaller."),
        },
    };
    let pyinstaller = if python.ok {
        pyinstaller_check(toolchain)
    } else {
        Check {
            name: "pyinstaller",
            program: toolchain.python.clone(),
            ok: false,
            required: true,
            detail: "no se puede verificar sin Python".to_string(),
        }
    };
    let upx = match locate(&toolchain.upx) {
        Ok(path) => Check {
            name: "upx",
            program: toolchain.upx.clone(),
            ok: true,
            required: false,
            detail: path.display().to_string(),
        },
        Err(_) => Check {
            name: "upx",
            program: toolchain.upx.clone(),
            ok: false,
            required: false,
            detail: "La compresión de binarios no estará disponible. Descárgalo e instálalo desde https://upx.github.io/.".to_string(),
        },
    };
    Preflight {
        checks: vec![python, pyinstaller, upx],
    }
}

fn pyinstaller_check(toolchain: &Toolchain) -> Check {
    let mut command = Command::new(&toolchain.python);
    command.args(["-m", "PyInstaller", "--version"]);
    let (ok, detail) = match run_captured(command, &toolchain.python, Path::new(".")) {
        Ok(output) => (true, String::from_utf8_lossy(&output.stdout).trim().to_string()),
        Err(_) => (false, "Instálalo con: pip install pyinstaller".to_string()),
    };
    Check {
        name: "pyinstaller",
        program: format!("{} -m PyInstaller", toolchain.python),
        ok,
        required: true,
        detail,
    }
}

pub fn run(toolchain: &Toolchain, as_json: bool) -> Result<(), String> {
    let report = preflight(toolchain);
    if as_json {
        let value = json!({ "ready": report.ready(), "checks": report.checks });
        println!("{value}");
    } else {
        print!("{}", report.render());
    }
    if report.ready() {
        Ok(())
    } else {
        Err("E_DOCTOR_MISSING No se pudieron resolver todas las dependencias necesarias (Python y/o PyInstaller).".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_python_fails_both_required_checks() {
        let toolchain = Toolchain::new("castella-no-such-python", "castella-no-such-upx");
        let report = preflight(&toolchain);
        assert!(!report.ready());
        assert!(!report.compressor_available());
        let names: Vec<_> = report.checks.iter().map(|check| check.name).collect();
        assert_eq!(names, ["python", "pyinstaller", "upx"]);
        assert!(report.render().contains("[falta] python (castella-no-such-python)"));
        assert!(report.render().contains("[opcional] upx"));
    }

    #[test]
    fn missing_optional_tool_keeps_ready() {
        let report = Preflight {
            checks: vec![
                Check {
                    name: "python",
                    program: "python3".into(),
                    ok: true,
                    required: true,
                    detail: String::new(),
                },
                Check {
                    name: "upx",
                    program: "upx".into(),
                    ok: false,
                    required: false,
                    detail: String::new(),
                },
            ],
        };
        assert!(report.ready());
        assert!(!report.compressor_available());
    }
}
