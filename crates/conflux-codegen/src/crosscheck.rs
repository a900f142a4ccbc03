//! Structural/textual agreement check.
//!
//! The merge result exists twice: as the structural [`MergedComponent`]
//! and as rendered source text. Both feed different consumers (tooling
//! reads the structure, the compiler reads the text), so they must agree
//! on final content. This module re-reads the lists out of the rendered
//! text and compares them against the structure.

use tracing::debug;

use conflux_engine::MergedComponent;

use crate::error::CodegenError;

/// Verify that `rendered` (the output of [`crate::render_component`])
/// agrees with `component` on the module and supertype lists.
pub fn verify_component(
    component: &MergedComponent,
    rendered: &str,
) -> Result<(), CodegenError> {
    if component.kind.merges_modules() {
        let rendered_modules = parse_module_list(component, rendered)?;
        let structural: Vec<String> =
            component.modules.iter().map(|m| m.to_string()).collect();
        if rendered_modules != structural {
            return Err(CodegenError::ListMismatch {
                component: component.origin.to_string(),
                list: "module".to_string(),
                structural,
                rendered: rendered_modules,
            });
        }
    }

    let rendered_supertypes = parse_supertype_list(component, rendered)?;
    let structural: Vec<String> = std::iter::once(component.origin.to_string())
        .chain(component.supertypes.iter().map(|s| s.to_string()))
        .collect();
    if rendered_supertypes != structural {
        return Err(CodegenError::ListMismatch {
            component: component.origin.to_string(),
            list: "supertype".to_string(),
            structural,
            rendered: rendered_supertypes,
        });
    }

    debug!(component = %component.origin, "structural and textual rewrites agree");
    Ok(())
}

fn parse_module_list(
    component: &MergedComponent,
    rendered: &str,
) -> Result<Vec<String>, CodegenError> {
    let missing = |section: &str| CodegenError::MissingSection {
        component: component.origin.to_string(),
        section: section.to_string(),
    };

    let mut lines = rendered.lines();
    lines
        .by_ref()
        .find(|line| line.trim() == "modules = [")
        .ok_or_else(|| missing("modules"))?;

    let mut modules = Vec::new();
    for line in lines {
        let entry = line.trim();
        if entry == "]," {
            return Ok(modules);
        }
        modules.push(entry.trim_end_matches(',').to_string());
    }
    Err(missing("modules terminator"))
}

fn parse_supertype_list(
    component: &MergedComponent,
    rendered: &str,
) -> Result<Vec<String>, CodegenError> {
    let line = rendered
        .lines()
        .find(|line| line.starts_with("interface "))
        .ok_or_else(|| CodegenError::MissingSection {
            component: component.origin.to_string(),
            section: "interface declaration".to_string(),
        })?;
    let (_, supertypes) = line.split_once(" : ").ok_or_else(|| CodegenError::MissingSection {
        component: component.origin.to_string(),
        section: "supertype clause".to_string(),
    })?;
    Ok(supertypes.split(", ").map(str::to_string).collect())
}
