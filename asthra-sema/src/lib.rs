// Asthra front-end semantic analysis: type descriptors, symbol tables and
// the analyzer passes, plus the source-to-typed-AST pipeline entry the
// driver calls.

use std::collections::HashMap;

use asthra_ast::{NodeId, Program};
use asthra_diagnostics::{Diagnostic, Severity};
use asthra_parser::Parser;

pub mod symbols;
pub mod types;

mod analyzer;
pub use analyzer::Analyzer;
pub use symbols::{global_alias_registry, ModuleAliasRegistry, ScopeStack, Symbol, SymbolKind};
pub use types::{TypeId, TypeKind, TypeTable};

/// Driver-supplied analysis configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub max_errors: usize,
    /// Pre-populated module aliases (alias, module path).
    pub module_aliases: Vec<(String, String)>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_errors: asthra_diagnostics::DEFAULT_MAX_ERRORS,
            module_aliases: Vec::new(),
        }
    }
}

/// Parsed-and-analyzed compilation unit: the AST, the unit's type table,
/// resolved types for every typed expression, and the diagnostic list in
/// source order.
#[derive(Debug)]
pub struct AnalyzedProgram {
    pub program: Program,
    pub types: TypeTable,
    pub expr_types: HashMap<NodeId, TypeId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalyzedProgram {
    /// The unit failed iff any error-level diagnostic was recorded;
    /// warnings do not fail a unit.
    pub fn success(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn exit_status(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn type_of(&self, id: NodeId) -> Option<TypeId> {
        self.expr_types.get(&id).copied()
    }
}

/// Run the whole front-end pipeline over one source buffer:
/// lex → parse (with recovery) → analyze. User errors land in the
/// diagnostic list; Err is reserved for driver-fatal conditions.
pub fn analyze_source(
    source: &str,
    file_name: &str,
    options: AnalyzerOptions,
) -> anyhow::Result<AnalyzedProgram> {
    let mut parser = Parser::new(source, file_name);
    let (program, mut diagnostics) = parser.parse_with_recovery();

    let mut analyzer = Analyzer::new(source, file_name, options.max_errors);
    for (alias, module) in &options.module_aliases {
        analyzer.aliases.register(alias, module);
    }
    analyzer.analyze(&program);

    diagnostics.extend(analyzer.diagnostics.into_diagnostics());

    Ok(AnalyzedProgram {
        program,
        types: analyzer.types,
        expr_types: analyzer.expr_types,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_clean_unit() {
        let source = "pub fn main(none) -> void { let x: i32 = 0; return (); }";
        let analyzed = analyze_source(source, "main.asthra", AnalyzerOptions::default()).unwrap();

        assert!(analyzed.success(), "diagnostics: {:?}", analyzed.diagnostics);
        assert_eq!(analyzed.exit_status(), 0);
    }

    #[test]
    fn test_pipeline_reports_type_mismatch() {
        let source = "pub fn main(none) -> void { let x: i32 = \"nope\"; return (); }";
        let analyzed = analyze_source(source, "main.asthra", AnalyzerOptions::default()).unwrap();

        assert!(!analyzed.success());
        assert_eq!(analyzed.exit_status(), 1);
        assert!(analyzed
            .diagnostics
            .iter()
            .any(|d| d.code == asthra_diagnostics::error_codes::TYPE_MISMATCH));
    }

    #[test]
    fn test_prepopulated_aliases_reach_the_shared_table() {
        let options = AnalyzerOptions {
            module_aliases: vec![("io".to_string(), "stdlib/io".to_string())],
            ..Default::default()
        };
        let analyzed =
            analyze_source("pub fn main(none) -> void { return (); }", "m.asthra", options)
                .unwrap();
        assert!(analyzed.success());

        // Aliases land in the process-wide registry shared across units
        assert_eq!(
            global_alias_registry().resolve("io").as_deref(),
            Some("stdlib/io")
        );
    }
}
