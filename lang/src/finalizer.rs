// lang/src/finalizer.rs
// Assembles the generated program: preamble, one blank line, body, and a
// single trailing newline.

use serde::{Deserialize, Serialize};

/// Returned for empty or whitespace-only source.
pub const EMPTY_SOURCE_PLACEHOLDER: &str = "# Código Castella vacío o solo con espacios en blanco.";

/// Imports for everything the language surface can reach, emitted whether or
/// not the program uses them.
pub const PREAMBLE: &[&str] = &[
    "# -*- coding: utf-8 -*-",
    "# Traducción de Castella a Python",
    "# Imports necesarios para tipos y librerías traducidas/utilizadas",
    "import sys",
    "import os",
    "import shutil",
    "import subprocess",
    "import re",
    "from typing import Optional, Union, Any, List, Dict, Tuple, Set, Callable",
    "import math",
    "import numpy as np",
    "import matplotlib.pyplot as plt",
    "try:",
    "    import tensorflow as tf",
    "except ImportError:",
    "    class tf: # Placeholder if tf is not installed",
    "        class Tensor: pass",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreambleMode {
    #[default]
    Full,
    Omit,
}

/// Joins body lines into the final source text. Trailing whitespace is
/// removed from every line and trailing blank lines collapse into one newline.
pub fn finalize(body: &[String], mode: PreambleMode) -> String {
    let mut lines: Vec<&str> = Vec::with_capacity(PREAMBLE.len() + body.len() + 2);
    if mode == PreambleMode::Full {
        lines.extend(PREAMBLE.iter().copied());
        lines.push("");
    }
    lines.extend(body.iter().flat_map(|line| line.split('\n')).map(str::trim_end));
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines.push("");
    lines.join("\n")
}

/// True when the source holds nothing to translate.
pub fn is_blank(source: &str) -> bool {
    source.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn full_mode_separates_preamble_with_one_blank_line() {
        let out = finalize(&owned(&["x = 1"]), PreambleMode::Full);
        let expected = format!("{}\n\nx = 1\n", PREAMBLE.join("\n"));
        assert_eq!(out, expected);
        assert!(out.starts_with("# -*- coding: utf-8 -*-\n"));
    }

    #[test]
    fn omit_mode_emits_body_only() {
        let out = finalize(&owned(&["if True:", "    print(1)"]), PreambleMode::Omit);
        assert_eq!(out, "if True:\n    print(1)\n");
    }

    #[test]
    fn trailing_blank_lines_collapse_to_one_newline() {
        let out = finalize(&owned(&["a = 1   ", "", "  ", ""]), PreambleMode::Omit);
        assert_eq!(out, "a = 1\n");
    }

    #[test]
    fn empty_body_keeps_preamble_only() {
        let out = finalize(&[], PreambleMode::Full);
        assert!(out.ends_with("        class Tensor: pass\n"));
        assert_eq!(finalize(&[], PreambleMode::Omit), "");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t\r\n"));
        assert!(!is_blank(" x "));
    }
}
