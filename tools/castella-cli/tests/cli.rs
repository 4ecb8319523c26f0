use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;

#[test]
fn translate_prints_python_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hola.castella");
    fs::write(&input, "si (verdadero) { imprimir(1); }\n").unwrap();

    let mut cmd = cargo_bin_cmd!("castella");
    cmd.arg("translate").arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("# -*- coding: utf-8 -*-\n"))
        .stdout(predicate::str::ends_with("\n\nif True:\n    print(1)\n"));
}

#[test]
fn translate_appends_extension_and_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("suma.castella"), "funcion suma(a, b) { retornar a + b; }").unwrap();
    let out = dir.path().join("suma.py");

    let mut cmd = cargo_bin_cmd!("castella");
    cmd.current_dir(dir.path())
        .arg("translate")
        .arg("suma")
        .arg("--no-preamble")
        .arg("-o")
        .arg(&out);
    cmd.assert().success().stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(out).unwrap(), "def suma(a, b):\n    return a + b\n");
}

#[test]
fn translate_blank_file_prints_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("vacio.castella");
    fs::write(&input, "  \n\t\n").unwrap();

    let mut cmd = cargo_bin_cmd!("castella");
    cmd.arg("translate").arg(&input);
    cmd.assert()
        .success()
        .stdout("# Código Castella vacío o solo con espacios en blanco.\n");
}

#[test]
fn syntax_error_exits_with_code_and_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("malo.castella");
    let diag = dir.path().join("diag.json");
    fs::write(&input, "si verdadero { pasar; }").unwrap();

    let mut cmd = cargo_bin_cmd!("castella");
    cmd.arg("translate").arg(&input).arg("--diag-json").arg(&diag);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("E_SYNTAX_UNEXPECTED_TOKEN"))
        .stderr(predicate::str::contains("Se esperaba uno de: LPAR"));

    let json = fs::read_to_string(diag).unwrap();
    assert!(json.contains("\"code\":\"E_SYNTAX_UNEXPECTED_TOKEN\""));
    assert!(json.contains("\"line\":1"));
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("castella");
    cmd.current_dir(dir.path()).arg("translate").arg("nada");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nada.castella"));
}

#[test]
fn doctor_reports_missing_python() {
    let mut cmd = cargo_bin_cmd!("castella");
    cmd.env("CASTELLA_PYTHON", "castella-no-such-python")
        .env("CASTELLA_UPX", "castella-no-such-upx")
        .arg("doctor");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("[falta] python (castella-no-such-python)"))
        .stderr(predicate::str::contains("E_DOCTOR_MISSING"));
}

#[test]
fn build_stops_before_packaging_without_python() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.castella"), "imprimir(1);").unwrap();

    let mut cmd = cargo_bin_cmd!("castella");
    cmd.current_dir(dir.path())
        .env("CASTELLA_PYTHON", "castella-no-such-python")
        .args(["build", "app", "app_bin", "--compress", "no"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("E_BUILD_DEPENDENCIES"));
    assert!(!dir.path().join("castella_temp_script.py").exists());
}
