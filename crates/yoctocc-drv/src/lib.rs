//! yoctocc-drv - Compiler driver.
//!
//! Orchestrates the pipeline for one translation unit:
//!
//! ```text
//! source file → tokenize → parse → generate → .s file
//! ```
//!
//! The core phases are pure and report failures as
//! [`yoctocc_util::Diagnostic`]s; this crate does the file I/O at both
//! ends, renders diagnostics against the source file, and logs phase
//! progress.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use tracing::info;
use yoctocc_util::SourceFile;

/// One compiler invocation.
#[derive(Clone, Debug)]
pub struct Config {
    /// Source file to compile.
    pub source_file: PathBuf,
    /// Where the assembly goes.
    pub output_file: PathBuf,
}

/// Compiles `config.source_file` and writes the assembly to
/// `config.output_file`.
///
/// The output file is written only after the whole pipeline has
/// succeeded, so a failed compile never leaves a partial `.s` behind.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let text = fs::read_to_string(&config.source_file)
        .with_context(|| format!("failed to read {}", config.source_file.display()))?;
    let file = SourceFile::new(config.source_file.display().to_string(), text);

    let lines = compile(&file).map_err(|diag| anyhow!("{}", diag.render(&file)))?;

    info!("writing {}", config.output_file.display());
    let mut output = String::new();
    for line in &lines {
        output.push_str(line);
        output.push('\n');
    }
    fs::write(&config.output_file, output)
        .with_context(|| format!("failed to write {}", config.output_file.display()))?;

    Ok(())
}

/// The pure pipeline: source text to assembly lines.
pub fn compile(file: &SourceFile) -> yoctocc_util::Result<Vec<String>> {
    info!("tokenizing {}", file.name());
    let tokens = yoctocc_lex::tokenize(file.src())?;

    info!("parsing {}", file.name());
    let mut program = yoctocc_par::parse(&tokens)?;

    info!("generating {}", file.name());
    yoctocc_gen::generate(&mut program, file.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_pipeline() {
        let file = SourceFile::new("t.c", "int main() { return 42; }");
        let lines = compile(&file).unwrap();
        assert_eq!(lines[0], ".intel_syntax noprefix");
        assert!(lines.contains(&"    mov rax, 42".to_string()));
    }

    #[test]
    fn test_compile_error_renders_location() {
        let file = SourceFile::new("t.c", "int main() {\n  return nope;\n}\n");
        let diag = compile(&file).unwrap_err();
        assert_eq!(
            diag.render(&file),
            "Error at t.c 2:10: Undefined variable: nope"
        );
    }
}
