//! Renders every component the engine merges for a realistic project
//! and verifies the structural/textual cross-check over all of them.

use pretty_assertions::assert_eq;

use conflux_codegen::{render_component, render_hint, render_shim, verify_component};
use conflux_core::annotation::{args, names};
use conflux_core::{
    Annotation, ArgValue, DeclKind, DeclSet, QualifiedName, RoundConfig, SourceDecl,
};
use conflux_engine::{Engine, RoundOutcome};

fn qn(s: &str) -> QualifiedName {
    QualifiedName::parse(s).unwrap()
}

fn class_ref(s: &str) -> ArgValue {
    ArgValue::ClassRef(qn(s))
}

fn project() -> DeclSet {
    let mut decls = DeclSet::new();
    decls.insert(SourceDecl::interface(qn("com.app.Repo")));
    decls.insert(
        SourceDecl::class(qn("com.app.RealRepo"))
            .with_supertype(qn("com.app.Repo"))
            .with_annotation(
                Annotation::new(qn(names::CONTRIBUTES_BINDING))
                    .with_arg(args::SCOPE, class_ref("com.app.AppScope")),
            ),
    );
    decls.insert(
        SourceDecl::new(qn("com.app.NetworkModule"), DeclKind::Object)
            .with_annotation(Annotation::new(qn(names::MODULE)))
            .with_annotation(
                Annotation::new(qn(names::CONTRIBUTES_TO))
                    .with_arg(args::SCOPE, class_ref("com.app.AppScope")),
            ),
    );
    decls.insert(
        SourceDecl::interface(qn("com.app.AppCallbacks")).with_annotation(
            Annotation::new(qn(names::CONTRIBUTES_TO))
                .with_arg(args::SCOPE, class_ref("com.app.AppScope")),
        ),
    );
    decls.insert(
        SourceDecl::interface(qn("com.app.UserComponent")).with_annotation(
            Annotation::new(qn(names::CONTRIBUTES_SUBCOMPONENT))
                .with_arg(args::SCOPE, class_ref("com.app.UserScope"))
                .with_arg(args::PARENT_SCOPE, class_ref("com.app.AppScope")),
        ),
    );
    decls.insert(
        SourceDecl::interface(qn("com.app.AppComponent")).with_annotation(
            Annotation::new(qn(names::MERGE_COMPONENT))
                .with_arg(args::SCOPE, class_ref("com.app.AppScope"))
                .with_arg(
                    args::MODULES,
                    ArgValue::ClassArray(vec![qn("com.app.AppModule")]),
                ),
        ),
    );
    decls
}

#[test]
fn every_merged_component_passes_the_crosscheck() {
    let mut engine = Engine::new(RoundConfig::default());
    let merged = engine.drain_until_empty(&project()).unwrap();
    assert_eq!(merged.len(), 2);

    for component in &merged {
        let rendered = render_component(component).unwrap();
        verify_component(component, &rendered).unwrap();
    }
}

#[test]
fn app_component_renders_all_merge_sources() {
    let mut engine = Engine::new(RoundConfig::default());
    let merged = engine.drain_until_empty(&project()).unwrap();
    let app = merged
        .iter()
        .find(|m| m.origin == qn("com.app.AppComponent"))
        .unwrap();

    let rendered = render_component(app).unwrap();
    assert!(rendered.contains("com.app.AppModule"));
    assert!(rendered.contains("com.app.NetworkModule"));
    assert!(rendered.contains("_BindingModule"));
    assert!(rendered.contains("interface MergedAppComponent : com.app.AppComponent, com.app.AppCallbacks"));

    // The shim itself renders as a standalone module.
    assert_eq!(app.shims.len(), 1);
    let shim = render_shim(&app.shims[0]).unwrap();
    assert!(shim.contains("fun bind(impl: com.app.RealRepo): com.app.Repo"));
}

#[test]
fn rendering_is_byte_stable_across_engines() {
    let render_all = || -> Vec<String> {
        let mut engine = Engine::new(RoundConfig::default());
        engine
            .drain_until_empty(&project())
            .unwrap()
            .iter()
            .map(|c| render_component(c).unwrap())
            .collect()
    };
    assert_eq!(render_all(), render_all());
}

#[test]
fn round_hints_render_and_round_trip() {
    let mut engine = Engine::new(RoundConfig::default());
    let RoundOutcome::Progressed { hints, .. } = engine.run_round(&project()).unwrap() else {
        panic!("first round must progress");
    };
    assert!(!hints.is_empty());

    for hint in &hints {
        let rendered = render_hint(hint).unwrap();
        assert!(rendered.contains("package conflux.hint"));
        assert!(rendered.contains(&hint.encode()));
        assert_eq!(
            conflux_core::GeneratedHint::decode(&hint.encode()).unwrap(),
            *hint
        );
    }
}
