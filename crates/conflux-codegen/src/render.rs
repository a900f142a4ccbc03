//! Deterministic source rendering.
//!
//! Every renderer writes the host-language surface syntax of one
//! generated declaration. Input lists are already in final merge order,
//! so rendering is a straight transcription; nothing here re-sorts or
//! filters. Output is byte-stable for equal inputs.

use std::fmt::Write;

use tracing::debug;

use conflux_core::{GeneratedHint, RootKind};
use conflux_engine::{BindingShim, MergedComponent};

use crate::error::CodegenError;

const GENERATED_HEADER: &str = "// Generated by conflux. Do not edit.";

fn merge_annotation(kind: RootKind) -> &'static str {
    match kind {
        RootKind::Component => "MergeComponent",
        RootKind::Subcomponent => "MergeSubcomponent",
        RootKind::InterfacesOnly => "MergeInterfaces",
        RootKind::ModulesOnly => "MergeModules",
    }
}

/// Render the merged component declaration.
pub fn render_component(component: &MergedComponent) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "{}", GENERATED_HEADER)?;
    writeln!(out, "package {}", component.package)?;
    writeln!(out)?;

    writeln!(out, "@{}(", merge_annotation(component.kind))?;
    writeln!(out, "    scope = {},", component.target_scope)?;
    if component.kind.merges_modules() {
        writeln!(out, "    modules = [")?;
        for module in &component.modules {
            writeln!(out, "        {},", module)?;
        }
        writeln!(out, "    ],")?;
    }
    writeln!(out, ")")?;

    write!(out, "interface {} : {}", component.name, component.origin)?;
    for supertype in &component.supertypes {
        write!(out, ", {}", supertype)?;
    }
    writeln!(out)?;

    debug!(component = %component.origin, bytes = out.len(), "rendered merged component");
    Ok(out)
}

/// Render one synthesized binding module.
pub fn render_shim(shim: &BindingShim) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "{}", GENERATED_HEADER)?;
    writeln!(out, "package {}", shim.module_name.package())?;
    writeln!(out)?;
    writeln!(out, "@Module")?;
    writeln!(out, "@ContributesTo(scope = {})", shim.scope)?;
    writeln!(out, "interface {} {{", shim.module_name.simple_name())?;

    write!(out, "    @Binds")?;
    if shim.multibinding {
        match &shim.map_key {
            Some(key) => write!(out, " @IntoMap @{}", key.canonical)?,
            None => write!(out, " @IntoSet")?,
        }
    }
    if let Some(qualifier) = &shim.qualifier {
        write!(out, " @{}", qualifier.canonical)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "    fun bind(impl: {}): {}",
        shim.origin, shim.bound_type
    )?;
    writeln!(out, "}}")?;
    Ok(out)
}

/// Render the hint marker declaration for one contribution.
pub fn render_hint(hint: &GeneratedHint) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "{}", GENERATED_HEADER)?;
    writeln!(out, "package {}", hint.property_name().package())?;
    writeln!(out)?;
    writeln!(
        out,
        "const val {}: String = \"{}\"",
        hint.property_name().simple_name(),
        hint.encode()
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_core::{QualifiedName, ScopeId};
    use pretty_assertions::assert_eq;

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::parse(s).unwrap()
    }

    fn component() -> MergedComponent {
        MergedComponent {
            package: "com.app".to_string(),
            name: "MergedAppComponent".to_string(),
            origin: qn("com.app.AppComponent"),
            kind: RootKind::Component,
            target_scope: ScopeId::parse("com.app.AppScope").unwrap(),
            modules: vec![qn("com.app.M0"), qn("com.app.M1")],
            supertypes: vec![qn("com.app.Callbacks")],
            shims: Vec::new(),
        }
    }

    #[test]
    fn component_rendering_is_stable() {
        let rendered = render_component(&component()).unwrap();
        assert_eq!(
            rendered,
            "// Generated by conflux. Do not edit.\n\
             package com.app\n\
             \n\
             @MergeComponent(\n\
             \x20   scope = com.app.AppScope,\n\
             \x20   modules = [\n\
             \x20       com.app.M0,\n\
             \x20       com.app.M1,\n\
             \x20   ],\n\
             )\n\
             interface MergedAppComponent : com.app.AppComponent, com.app.Callbacks\n"
        );
        // Byte-identical on repeat.
        assert_eq!(rendered, render_component(&component()).unwrap());
    }

    #[test]
    fn interfaces_only_component_has_no_module_block() {
        let mut component = component();
        component.kind = RootKind::InterfacesOnly;
        component.modules.clear();
        let rendered = render_component(&component).unwrap();
        assert!(rendered.contains("@MergeInterfaces("));
        assert!(!rendered.contains("modules = ["));
    }

    #[test]
    fn shim_rendering() {
        let shim = BindingShim {
            module_name: qn("conflux.generated.module.Shim"),
            origin: qn("com.app.RealRepo"),
            scope: ScopeId::parse("com.app.AppScope").unwrap(),
            bound_type: qn("com.app.Repo"),
            multibinding: false,
            map_key: None,
            qualifier: None,
        };
        let rendered = render_shim(&shim).unwrap();
        assert!(rendered.contains("package conflux.generated.module"));
        assert!(rendered.contains("@ContributesTo(scope = com.app.AppScope)"));
        assert!(rendered.contains("fun bind(impl: com.app.RealRepo): com.app.Repo"));
        assert!(!rendered.contains("@IntoSet"));
    }

    #[test]
    fn multibinding_shim_marks_into_set() {
        let shim = BindingShim {
            module_name: qn("conflux.generated.module.Shim"),
            origin: qn("com.app.PluginA"),
            scope: ScopeId::parse("com.app.AppScope").unwrap(),
            bound_type: qn("com.app.Plugin"),
            multibinding: true,
            map_key: None,
            qualifier: None,
        };
        assert!(render_shim(&shim).unwrap().contains("@Binds @IntoSet"));
    }

    #[test]
    fn hint_rendering_embeds_payload() {
        let hint = GeneratedHint::new(
            ScopeId::parse("com.app.AppScope").unwrap(),
            qn("com.app.Plugin"),
        );
        let rendered = render_hint(&hint).unwrap();
        assert!(rendered.contains("package conflux.hint"));
        assert!(rendered
            .contains("const val com_app_Plugin_hint: String = \"com.app.AppScope|com.app.Plugin\""));
    }
}
