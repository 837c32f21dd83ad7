//! LaTeX source generation for a single equation.

use crate::models::MathMode;

const PREAMBLE: &str = r"\documentclass[varwidth,border=2pt]{standalone}
\usepackage{amsmath,amssymb}
\usepackage{bm}
\usepackage{mathtools}
\begin{document}
";

const POSTAMBLE: &str = r"
\end{document}
";

/// Wrap `tex` in the math delimiters for `mode` and embed it in the
/// standalone document template.
pub fn build_document(tex: &str, mode: MathMode) -> String {
    let (open, close) = mode.delimiters();
    let mut doc =
        String::with_capacity(PREAMBLE.len() + open.len() + tex.len() + close.len() + POSTAMBLE.len());
    doc.push_str(PREAMBLE);
    doc.push_str(open);
    doc.push_str(tex);
    doc.push_str(close);
    doc.push_str(POSTAMBLE);
    doc
}
