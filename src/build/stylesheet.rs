//! LESS to CSS compilation.
//!
//! Supports the subset of LESS that plain sites lean on: `@name: value;`
//! variables and `//` line comments. Nested rules are valid modern CSS, so
//! they are left for lightningcss to flatten for older browsers.
//!
//! Quoted strings and `/* */` comments are never searched for variables.

use std::collections::HashMap;
use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::{Captures, Regex};

#[derive(thiserror::Error, Debug)]
pub enum StylesheetError {
    #[error("undefined variable @{0}")]
    UndefinedVariable(String),

    #[error("CSS syntax error: {0}")]
    Parse(String),

    #[error("failed to minify: {0}")]
    Minify(String),

    #[error("failed to print CSS: {0}")]
    Print(String),
}

static VARIABLE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@([A-Za-z_][\w-]*)[ \t]*:[ \t]*([^;\n]*?)[ \t]*;[ \t]*\r?$\n?")
        .expect("variable declaration regex is valid")
});

static VARIABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([A-Za-z_][\w-]*)").expect("variable reference regex is valid")
});

/// Comments and strings, matched left to right so a `//` inside a string
/// or a quote inside a comment is never misread.
static OPAQUE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?P<block>/\*[\s\S]*?\*/)|(?P<string>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')|(?P<lead>^|[\s;{}])//[^\n]*"#,
    )
    .expect("opaque text regex is valid")
});

/// Stand-in for a masked string: `\x01<index>\x01`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x01(\d+)\x01").expect("placeholder regex is valid"));

/// At-rules that look like variable references but belong to CSS.
const AT_RULES: &[&str] = &[
    "charset",
    "container",
    "counter-style",
    "font-face",
    "font-feature-values",
    "font-palette-values",
    "import",
    "keyframes",
    "layer",
    "media",
    "namespace",
    "page",
    "property",
    "scope",
    "starting-style",
    "supports",
    "viewport",
    "-webkit-keyframes",
    "-moz-keyframes",
];

/// Browsers the output must work in; nesting is lowered for them.
fn targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(100 << 16),
        firefox: Some(100 << 16),
        safari: Some(15 << 16),
        ..Browsers::default()
    })
}

/// Compile a LESS source to CSS.
pub fn compile_less(source: &str, filename: &str, minify: bool) -> Result<String, StylesheetError> {
    let css = preprocess(source)?;

    let mut stylesheet = StyleSheet::parse(
        &css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| StylesheetError::Parse(e.to_string()))?;

    // Nesting is lowered while printing, so plain output skips this
    let targets = targets();
    if minify {
        stylesheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| StylesheetError::Minify(e.to_string()))?;
    }

    let output = stylesheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| StylesheetError::Print(e.to_string()))?;

    Ok(output.code)
}

/// Resolve LESS variables and comments, leaving plain CSS.
fn preprocess(source: &str) -> Result<String, StylesheetError> {
    let (source, strings) = mask(source);

    // Declarations resolve in order, so a value can use earlier variables
    let mut variables: HashMap<String, String> = HashMap::new();
    for caps in VARIABLE_DECLARATION.captures_iter(&source) {
        let value = substitute(&caps[2], &variables)?;
        variables.insert(caps[1].to_string(), value);
    }

    let body = VARIABLE_DECLARATION.replace_all(&source, "");
    let css = substitute(&body, &variables)?;
    Ok(unmask(&css, &strings))
}

/// Drop comments and swap quoted strings for placeholders.
fn mask(source: &str) -> (String, Vec<String>) {
    let mut strings = Vec::new();
    let masked = OPAQUE_TEXT.replace_all(source, |caps: &Captures| {
        if let Some(string) = caps.name("string") {
            strings.push(string.as_str().to_string());
            format!("\x01{}\x01", strings.len() - 1)
        } else if let Some(lead) = caps.name("lead") {
            lead.as_str().to_string()
        } else {
            String::new()
        }
    });
    (masked.into_owned(), strings)
}

/// Put masked strings back.
fn unmask(css: &str, strings: &[String]) -> String {
    PLACEHOLDER
        .replace_all(css, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| strings.get(index))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Replace `@name` references with their values.
fn substitute(text: &str, variables: &HashMap<String, String>) -> Result<String, StylesheetError> {
    let mut undefined = None;
    let result = VARIABLE_REFERENCE.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        match variables.get(name) {
            Some(value) => value.clone(),
            None => {
                if !AT_RULES.contains(&name) && undefined.is_none() {
                    undefined = Some(name.to_string());
                }
                caps[0].to_string()
            }
        }
    });

    match undefined {
        Some(name) => Err(StylesheetError::UndefinedVariable(name)),
        None => Ok(result.into_owned()),
    }
}
