//! Source-language detection from file extensions.

use std::fmt;
use std::path::Path;

/// Languages with a definition-aware chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Rust,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Scala,
    Shell,
}

impl Language {
    /// Look up a language by file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" | "pyw" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cc" | "cpp" | "cxx" | "c++" | "hh" | "hpp" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            "scala" | "sc" => Language::Scala,
            "sh" | "bash" | "zsh" => Language::Shell,
            _ => return None,
        };
        Some(lang)
    }

    /// Infer the language of `path`; `None` means generic chunking.
    pub fn from_path(path: &str) -> Option<Self> {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::Shell => "shell",
        }
    }

    /// Regex matching a line that opens a top-level definition.
    pub(crate) fn definition_pattern(&self) -> &'static str {
        match self {
            Language::Python => r"^(async\s+def|def|class)\s+\w+",
            Language::JavaScript | Language::TypeScript => {
                r"^(export\s+)?(default\s+)?(async\s+)?(function\*?|class|interface|type|enum|const|let)\s+\w+"
            }
            Language::Java | Language::CSharp => {
                r"^\s{0,4}(public|private|protected|internal|static|abstract|final|sealed|partial|\s)*(class|interface|enum|record|struct|void|[\w<>\[\],]+)\s+\w+\s*[({]"
            }
            Language::C | Language::Cpp => {
                r"^(template\s*<.*>\s*)?(class|struct|namespace|enum|[\w:*&<>][\w:*&<> ]*\s+[\w:*&]+\s*\()"
            }
            Language::Go => r"^(func|type)\s+",
            Language::Rust => {
                r"^(pub(\([^)]*\))?\s+)?(async\s+)?(unsafe\s+)?(fn|struct|enum|trait|impl|mod|macro_rules!)\b"
            }
            Language::Ruby => r"^\s*(def|class|module)\s+",
            Language::Php => r"^\s*((abstract|final)\s+)?(function|class|interface|trait)\s+\w+",
            Language::Swift => {
                r"^\s*((public|private|internal|open|fileprivate)\s+)?(func|class|struct|enum|protocol|extension)\s+\w+"
            }
            Language::Kotlin => r"^\s*((public|private|internal|data|sealed|open)\s+)*(fun|class|object|interface)\s+\w+",
            Language::Scala => r"^\s*(def|class|object|trait|case\s+class)\s+\w+",
            Language::Shell => r"^(function\s+\w+|\w+\s*\(\)\s*\{)",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
