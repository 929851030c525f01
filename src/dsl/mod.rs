pub mod ast;
pub mod compiler;
pub mod error;
pub mod literal;
pub mod script;

use ast::CompiledCommand;
use error::CompileError;

use crate::registry::Registry;
use crate::settings::Settings;

/// Compile one command of a script.
///
/// This is the primary entry point for the command pipeline:
/// command → tokenize → resolve + bind → fold → `CompiledCommand`
pub fn compile_command(
    registry: &Registry,
    command: &str,
    settings: &Settings,
) -> Result<CompiledCommand, CompileError> {
    let tokens = script::tokenize(command, settings.lowercase);
    compiler::Compiler::new(registry)
        .with_unknown_words(settings.unknown_words)
        .compile(&tokens)
}

/// Words of `command` the compiler skips, whether or not it compiles.
pub fn skipped_words(registry: &Registry, command: &str, settings: &Settings) -> Vec<String> {
    let tokens = script::tokenize(command, settings.lowercase);
    compiler::Compiler::new(registry).skipped(&tokens)
}
