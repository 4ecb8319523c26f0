// lang/examples/translate_source.rs
use castella_lang::{build_grammar, translate, translate_with, PreambleMode, TranslateOptions};

fn main() {
    let source = "funcion suma(a, b) { retornar a + b; }\nimprimir(suma(2, 3));";
    println!("--- Castella ---\n{}", source);

    let grammar = build_grammar();
    let options = TranslateOptions {
        preamble: PreambleMode::Omit,
        ..TranslateOptions::default()
    };
    match translate_with(&grammar, source, &options) {
        Ok(python) => println!("\n--- Python (cuerpo) ---\n{}", python),
        Err(err) => eprintln!("{}", err.format("example.castella")),
    }

    match translate(&grammar, "si (x { }") {
        Ok(python) => println!("{}", python),
        Err(err) => println!("\n--- Diagnóstico ---\n{}", err),
    }
}
