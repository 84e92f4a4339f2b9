//! Source language detection and per-language line patterns.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Languages the engine knows how to scan or validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python.
    Python,
    /// Rust.
    Rust,
    /// JavaScript, including JSX.
    JavaScript,
    /// TypeScript.
    TypeScript,
    /// TypeScript with JSX.
    Tsx,
    /// Go.
    Go,
    /// Java.
    Java,
    /// C.
    C,
    /// C++.
    Cpp,
    /// JSON.
    Json,
    /// YAML.
    Yaml,
    /// TOML.
    Toml,
    /// Anything else.
    Unknown,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Go => "go",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "rust" | "rs" => Ok(Self::Rust),
            "javascript" | "js" | "jsx" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "go" | "golang" => Ok(Self::Go),
            "java" => Ok(Self::Java),
            "c" => Ok(Self::C),
            "cpp" | "c++" | "cxx" => Ok(Self::Cpp),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "unknown" | "text" => Ok(Self::Unknown),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

impl Language {
    /// Detects the language from a file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "py" | "pyi" | "pyw" => Self::Python,
            "rs" => Self::Rust,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "go" => Self::Go,
            "java" => Self::Java,
            "c" | "h" => Self::C,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Self::Cpp,
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => Self::Unknown,
        }
    }

    /// Whether a line is an import/include-style statement in this language.
    ///
    /// Unknown languages accept any of the common forms.
    pub fn is_import_line(self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        match self {
            Self::Python => PYTHON_IMPORT.is_match(line),
            Self::Rust => RUST_IMPORT.is_match(line),
            Self::JavaScript | Self::TypeScript | Self::Tsx => JS_IMPORT.is_match(line),
            Self::Go => GO_IMPORT.is_match(line),
            Self::Java => JAVA_IMPORT.is_match(line),
            Self::C | Self::Cpp => C_INCLUDE.is_match(line),
            Self::Json | Self::Yaml | Self::Toml => false,
            Self::Unknown => [
                &*PYTHON_IMPORT,
                &*RUST_IMPORT,
                &*JS_IMPORT,
                &*JAVA_IMPORT,
                &*C_INCLUDE,
            ]
            .iter()
            .any(|re| re.is_match(line)),
        }
    }

    /// Extracts the name of a top-level declaration, if the line declares one.
    ///
    /// Only unindented lines count as top level.
    pub fn top_level_declaration(self, line: &str) -> Option<String> {
        if line.starts_with(char::is_whitespace) {
            return None;
        }
        let re: &Regex = match self {
            Self::Python => &PYTHON_DECL,
            Self::Rust => &RUST_DECL,
            Self::JavaScript | Self::TypeScript | Self::Tsx => &JS_DECL,
            Self::Go => &GO_DECL,
            Self::Java => &JAVA_DECL,
            Self::C | Self::Cpp => &C_DECL,
            Self::Json | Self::Yaml | Self::Toml | Self::Unknown => return None,
        };
        let caps = re.captures(line)?;
        caps.name("name")
            .or_else(|| caps.name("var"))
            .map(|m| m.as_str().to_string())
    }

    /// Whether default parameter values exist in this language.
    pub fn supports_default_params(self) -> bool {
        matches!(
            self,
            Self::Python | Self::JavaScript | Self::TypeScript | Self::Tsx | Self::Cpp
        )
    }

    /// Keywords that are never counted as renameable identifiers.
    pub fn is_keyword(word: &str) -> bool {
        KEYWORDS.binary_search(&word).is_ok()
    }
}

static PYTHON_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(import\s+[\w.]+(\s+as\s+\w+)?(\s*,\s*[\w.]+(\s+as\s+\w+)?)*|from\s+[\w.]+\s+import\s+.+)$")
        .unwrap()
});

static RUST_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((pub(\([\w:]+\))?\s+)?use\s+[\w:{}*,\s]+;|extern\s+crate\s+\w+(\s+as\s+\w+)?;|(pub\s+)?mod\s+\w+;)$")
        .unwrap()
});

static JS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(import\s.+|import\s*\(.+|export\s+\*\s+from\s.+|export\s+\{[^}]*\}\s+from\s.+|(const|let|var)\s+[\w{}\s,]+=\s*require\(.+\);?|require\(.+\);?)$"#,
    )
    .unwrap()
});

static GO_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(import\s+(\w+\s+)?"[^"]+"|import\s*\(|\)|(\w+\s+|_\s+|\.\s+)?"[\w./-]+")$"#).unwrap()
});

static JAVA_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(import\s+(static\s+)?[\w.]+(\.\*)?;|package\s+[\w.]+;)$").unwrap()
});

static C_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^#\s*include\s*[<"][^>"]+[>"]$"#).unwrap());

static PYTHON_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(async\s+def|def|class)\s+(?P<name>[A-Za-z_]\w*)|^(?P<var>[A-Z_][A-Z0-9_]*)\s*=")
        .unwrap()
});

static RUST_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(pub(\([\w:]+\))?\s+)?(async\s+|const\s+|unsafe\s+)*(fn|struct|enum|trait|type|const|static|mod|union)\s+(?P<name>[A-Za-z_]\w*)",
    )
    .unwrap()
});

static JS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(export\s+(default\s+)?)?(async\s+)?(function\*?|class|const|let|var|interface|type|enum)\s+(?P<name>[A-Za-z_$][\w$]*)",
    )
    .unwrap()
});

static GO_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(func(\s+\([^)]*\))?|type|var|const)\s+(?P<name>[A-Za-z_]\w*)").unwrap()
});

static JAVA_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((public|protected|private|abstract|final|static|sealed)\s+)*(class|interface|enum|record)\s+(?P<name>[A-Za-z_]\w*)",
    )
    .unwrap()
});

static C_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(static\s+|inline\s+|extern\s+|const\s+)*(struct|class|enum|union|[A-Za-z_][\w:<>]*[\s*&]+)\s*(?P<name>[A-Za-z_]\w*)\s*[({]",
    )
    .unwrap()
});

/// Sorted for binary search.
static KEYWORDS: &[&str] = &[
    "as", "async", "await", "bool", "break", "case", "catch", "char", "class", "const",
    "continue", "def", "default", "del", "do", "double", "elif", "else", "enum", "except",
    "export", "extends", "false", "final", "finally", "float", "fn", "for", "from", "func",
    "function", "go", "if", "impl", "import", "in", "int", "interface", "is", "lambda", "let",
    "long", "loop", "match", "mod", "mut", "new", "nil", "none", "not", "null", "or", "package",
    "pass", "private", "protected", "pub", "public", "raise", "return", "self", "static",
    "struct", "super", "switch", "this", "throw", "trait", "true", "try", "type", "use", "var",
    "void", "while", "with", "yield",
];
