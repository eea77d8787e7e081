//! The back-end contract and shared emission services.
//!
//! A back end is constructed with a semantic module, an output sink and the
//! list of referenced modules, and exposes [`Backend::generate_code`]. It
//! may assume the module has been resolved; the traversal contract it must
//! honor is the dependency-component, declaration-then-definition walk (see
//! [`asn1gen_language::analysis::dependency_sort`]).

pub mod pyasn1;
pub mod quickder;

use asn1gen_language::sema::SemaError;
use chrono::{DateTime, Local};
use std::fmt;
use std::io;
use std::path::Path;

/// A code-generation failure: a resolution error surfaced by the semantic
/// layer, or an I/O error from the sink.
#[derive(Debug)]
pub enum GenError {
    Sema(SemaError),
    Io(io::Error),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::Sema(error) => write!(f, "{}", error),
            GenError::Io(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::Sema(error) => Some(error),
            GenError::Io(error) => Some(error),
        }
    }
}

impl From<SemaError> for GenError {
    fn from(error: SemaError) -> Self {
        GenError::Sema(error)
    }
}

impl From<io::Error> for GenError {
    fn from(error: io::Error) -> Self {
        GenError::Io(error)
    }
}

/// The contract every back end implements.
pub trait Backend {
    /// Emits the whole module to the sink the back end was built with.
    fn generate_code(&mut self) -> Result<(), GenError>;
}

/// The one-line header stamped at the top of every generated file: tool,
/// version, source basename and the source's last-modification time, in the
/// target language's line-comment syntax.
pub fn banner(
    tool: &str,
    version: &str,
    source: &Path,
    comment_prefix: &str,
) -> io::Result<String> {
    let modified: DateTime<Local> = std::fs::metadata(source)?.modified()?.into();
    let basename = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    Ok(format!(
        "{} Auto-generated by {} v{} from {} (last modified {})",
        comment_prefix,
        tool,
        version,
        basename,
        modified.format("%Y-%m-%d %H:%M:%S")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn banner_names_tool_version_and_basename() {
        let mut source = tempfile::NamedTempFile::new().unwrap();
        writeln!(source, "M DEFINITIONS ::= BEGIN END").unwrap();
        let line = banner("asn1gen", "0.4.2", source.path(), "#").unwrap();
        assert!(line.starts_with("# Auto-generated by asn1gen v0.4.2 from "));
        assert!(line.contains("(last modified "));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn banner_fails_for_missing_source() {
        let missing = Path::new("definitely/not/here.asn1");
        assert!(banner("asn1gen", "0.4.2", missing, "//").is_err());
    }
}
