//! Target-language keyword tables and identifier sanitization.
//!
//! ASN.1 identifiers allow hyphens and may collide with reserved words of
//! the emitted language. Sanitization maps hyphens to underscores and
//! escapes keywords by appending a trailing underscore, so a declared name
//! round-trips into a legal target identifier. The tables are process-wide
//! read-only constants.

/// Python 3 reserved words.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// C reserved words (C99).
const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

fn escape_keyword(name: String, keywords: &[&str]) -> String {
    if keywords.contains(&name.as_str()) {
        name + "_"
    } else {
        name
    }
}

/// Makes an ASN.1 type or value identifier a valid Python identifier.
pub fn sanitize_python_identifier(name: &str) -> String {
    escape_keyword(name.replace('-', "_"), PYTHON_KEYWORDS)
}

/// Makes an ASN.1 module identifier a valid lower-case Python module name.
pub fn sanitize_python_module(name: &str) -> String {
    sanitize_python_identifier(name).to_lowercase()
}

/// Makes an ASN.1 symbol name a valid C identifier; multi-word builtin
/// names also lose their spaces.
pub fn sanitize_c_identifier(name: &str) -> String {
    escape_keyword(name.replace([' ', '-'], "_"), C_KEYWORDS)
}
