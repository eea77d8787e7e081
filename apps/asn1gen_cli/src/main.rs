//! asn1gen - standalone binary.
//!
//! A thin wrapper around [`asn1gen_cli::run_cli`], handling error display
//! and exit codes. All command logic lives in the library crate for
//! testability.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Error (message printed to stderr)

use asn1gen_cli::style::Style;

fn main() {
    if let Err(e) = asn1gen_cli::run_cli() {
        eprintln!("{}: {}", Style::bold_red("error"), e);
        std::process::exit(1);
    }
}
