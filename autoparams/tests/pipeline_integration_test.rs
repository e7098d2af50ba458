//! End-to-end resolution through the default pipeline and customizers.

use std::collections::BTreeMap;
use std::sync::Arc;

use autoparams::customization::{TypeRefAssetCustomizer, TypeRefSubstitution};
use autoparams::{
    CompositeCustomizer, Constructor, ConstructorKind, Customizer, Freeze, GenerationResult,
    GeneratorCustomizer, ObjectQuery, ParameterDescriptor, ResolutionConfig, ResolutionContext,
    ResolutionError, Resolvable, ResolveConstructorAggressively, SharedGenerator, TypeDescriptor,
    TypeMatchingGenerator, TypeRef, TypeRefCustomizer, from_fn,
};

#[derive(Debug, Clone, PartialEq, Default)]
struct Pair {
    x: i32,
    y: i32,
}

impl Resolvable for Pair {
    fn describe() -> Option<TypeDescriptor> {
        Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
            "new",
            ConstructorKind::Primary,
            vec![
                ParameterDescriptor::named::<i32>("x"),
                ParameterDescriptor::named::<i32>("y"),
            ],
            |mut args| {
                Ok(Pair {
                    x: args.take()?,
                    y: args.take()?,
                })
            },
        )]))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Invoice {
    number: u32,
    lines: Vec<String>,
    discount: Option<f64>,
}

impl Resolvable for Invoice {
    fn describe() -> Option<TypeDescriptor> {
        Some(TypeDescriptor::composite::<Self>(vec![
            Constructor::new(
                "empty",
                ConstructorKind::Synthesized,
                Vec::new(),
                |_| {
                    Ok(Invoice {
                        number: 0,
                        lines: Vec::new(),
                        discount: None,
                    })
                },
            ),
            Constructor::new(
                "full",
                ConstructorKind::Declared,
                vec![
                    ParameterDescriptor::named::<u32>("number"),
                    ParameterDescriptor::named::<Vec<String>>("lines"),
                    ParameterDescriptor::named::<Option<f64>>("discount"),
                ],
                |mut args| {
                    Ok(Invoice {
                        number: args.take()?,
                        lines: args.take()?,
                        discount: args.take()?,
                    })
                },
            ),
            Constructor::new(
                "numbered",
                ConstructorKind::Declared,
                vec![ParameterDescriptor::named::<u32>("number")],
                |mut args| {
                    Ok(Invoice {
                        number: args.take()?,
                        lines: Vec::new(),
                        discount: None,
                    })
                },
            ),
        ]))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Shipment {
    id: u64,
    origin: Option<String>,
    weight: Option<u32>,
    note: Option<String>,
    built_by: &'static str,
}

impl Shipment {
    fn build(
        built_by: &'static str,
        mut args: autoparams::ConstructorArgs,
        count: usize,
    ) -> Result<Self, autoparams::ConstructionError> {
        let id = args.take()?;
        let origin = if count > 1 { args.take()? } else { None };
        let weight = if count > 2 { args.take()? } else { None };
        let note = if count > 3 { args.take()? } else { None };
        Ok(Shipment {
            id,
            origin,
            weight,
            note,
            built_by,
        })
    }
}

impl Resolvable for Shipment {
    fn describe() -> Option<TypeDescriptor> {
        let id = || ParameterDescriptor::named::<u64>("id");
        let origin = || ParameterDescriptor::named::<Option<String>>("origin");
        let weight = || ParameterDescriptor::named::<Option<u32>>("weight");
        let note = || ParameterDescriptor::named::<Option<String>>("note");

        Some(TypeDescriptor::composite::<Self>(vec![
            Constructor::new("bare", ConstructorKind::Declared, vec![id()], |args| {
                Shipment::build("bare", args, 1)
            }),
            Constructor::new(
                "tagged",
                ConstructorKind::Properties(vec!["id", "origin", "weight"]),
                vec![id(), origin(), weight()],
                |args| Shipment::build("tagged", args, 3),
            ),
            Constructor::new(
                "routed",
                ConstructorKind::Primary,
                vec![id(), origin(), weight()],
                |args| Shipment::build("routed", args, 3),
            ),
            Constructor::new(
                "annotated",
                ConstructorKind::Declared,
                vec![id(), origin(), weight(), note()],
                |args| Shipment::build("annotated", args, 4),
            ),
        ]))
    }
}

fn seeded(seed: u64) -> ResolutionContext {
    ResolutionContext::with_config(ResolutionConfig::default().with_seed(seed))
}

#[test]
fn test_pair_fields_are_populated() {
    for seed in 0..20 {
        let pair: Pair = seeded(seed).resolve().unwrap();
        assert_ne!(pair, Pair::default());
        assert_ne!(pair.x, 0);
        assert_ne!(pair.y, 0);
    }
}

#[test]
fn test_synthesized_constructor_is_never_chosen() {
    let invoice: Invoice = seeded(1).resolve().unwrap();
    assert!(invoice.lines.is_empty());
    assert_ne!(invoice.number, 0);

    let mut context = seeded(1);
    context.apply_customizer(&ResolveConstructorAggressively);
    let invoice: Invoice = context.resolve().unwrap();
    assert_eq!(invoice.lines.len(), 3);
    assert!(invoice.lines.iter().all(|line| !line.is_empty()));
    assert!(invoice.discount.is_some());
}

#[test]
fn test_nested_collections() {
    let mut context = ResolutionContext::with_config(
        ResolutionConfig::default()
            .with_seed(3)
            .with_collection_size(2),
    );
    let grid: Vec<Vec<Pair>> = context.resolve().unwrap();

    assert_eq!(grid.len(), 2);
    assert!(grid.iter().all(|row| row.len() == 2));
}

#[test]
fn test_customizer_wins_only_for_its_type() {
    let mut context = seeded(9);
    context.apply_customizer(&GeneratorCustomizer::new(Arc::new(
        TypeMatchingGenerator::constant(Pair { x: 1, y: 2 }),
    )));

    assert_eq!(context.resolve::<Pair>().unwrap(), Pair { x: 1, y: 2 });
    assert_eq!(context.resolve::<Vec<Pair>>().unwrap().len(), 3);
    assert!(context.resolve::<i32>().is_ok());
    assert!(context.resolve::<Invoice>().is_ok());
}

#[test]
fn test_composite_customizer_order() {
    let composite = CompositeCustomizer::default()
        .with(Freeze::value(1i32))
        .with(Freeze::value(2i32));

    let mut context = seeded(4);
    context.apply_customizer(&composite);
    assert_eq!(context.resolve::<Pair>().unwrap(), Pair { x: 2, y: 2 });
}

#[test]
fn test_closure_generator_sees_parameter_names() {
    struct Tagging;

    impl Customizer for Tagging {
        fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
            Arc::new(from_fn(move |query: &ObjectQuery, context: &mut ResolutionContext| {
                match query.parameter_name() {
                    Some("y") if query.type_query().is::<i32>() => {
                        Ok(GenerationResult::of(-1i32, "Tagging"))
                    }
                    _ => generator.generate(query, context),
                }
            }))
        }
    }

    let mut context = seeded(6);
    context.apply_customizer(&Tagging);
    let pair: Pair = context.resolve().unwrap();
    assert_eq!(pair.y, -1);
    assert_ne!(pair.x, -1);
}

#[test]
fn test_type_ref_resolution() {
    let mut context = seeded(2);
    assert!(context.resolve::<TypeRef<Pair>>().is_err());

    context.apply_customizer(&TypeRefCustomizer);
    let reference: TypeRef<Pair> = context.resolve().unwrap();
    assert!(reference.token().is::<Pair>());
    assert!(context.resolve::<Pair>().is_ok());
}

#[test]
fn test_unresolvable_error_names_query() {
    #[derive(Debug, Clone)]
    struct Opaque;

    impl Resolvable for Opaque {}

    let error = seeded(0).resolve::<Vec<Opaque>>().unwrap_err();
    assert!(error.is_unresolvable());
    assert!(error.to_string().contains("Opaque"));
}

#[test]
fn test_construction_failure_is_reported() {
    #[derive(Debug, Clone)]
    struct Strict;

    impl Resolvable for Strict {
        fn describe() -> Option<TypeDescriptor> {
            Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
                "new",
                ConstructorKind::Primary,
                vec![ParameterDescriptor::named::<u8>("flag")],
                |_| -> Result<Strict, autoparams::ConstructionError> {
                    Err(autoparams::ConstructionError::new("always rejected"))
                },
            )]))
        }
    }

    let error = seeded(0).resolve::<Strict>().unwrap_err();
    match error {
        ResolutionError::ConstructionFailed { type_name, source } => {
            assert_eq!(type_name, "Strict");
            assert_eq!(source.message(), "always rejected");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_selected_constructor_gets_every_argument() {
    for seed in 0..10 {
        let shipment: Shipment = seeded(seed).resolve().unwrap();
        assert_eq!(shipment.built_by, "routed");
        assert!(shipment.origin.as_deref().is_some_and(|origin| origin.starts_with("origin")));
        assert!(shipment.weight.is_some());
        assert!(shipment.note.is_none());

        let mut aggressive = seeded(seed);
        aggressive.apply_customizer(&ResolveConstructorAggressively);
        let shipment: Shipment = aggressive.resolve().unwrap();
        assert_eq!(shipment.built_by, "tagged");
        assert!(shipment.origin.is_some());
        assert!(shipment.weight.is_some());
    }
}

fn assert_unrelated_types_unchanged(customizer: &dyn Customizer) {
    for seed in [0, 7, 42] {
        let mut plain = seeded(seed);
        let mut customized = seeded(seed);
        customized.apply_customizer(customizer);

        assert_eq!(
            customized.resolve::<Vec<String>>().unwrap(),
            plain.resolve::<Vec<String>>().unwrap()
        );
        assert_eq!(
            customized.resolve::<BTreeMap<u16, i64>>().unwrap(),
            plain.resolve::<BTreeMap<u16, i64>>().unwrap()
        );
        assert_eq!(
            customized.resolve::<Option<u8>>().unwrap(),
            plain.resolve::<Option<u8>>().unwrap()
        );
    }
}

fn assert_unrelated_composites_unchanged(customizer: &dyn Customizer) {
    for seed in [1, 8, 64] {
        let plain: Invoice = seeded(seed).resolve().unwrap();
        let mut customized = seeded(seed);
        customized.apply_customizer(customizer);
        assert_eq!(customized.resolve::<Invoice>().unwrap(), plain);
    }
}

#[test]
fn test_generator_customizer_leaves_unrelated_types_alone() {
    let customizer = GeneratorCustomizer::new(Arc::new(TypeMatchingGenerator::constant(Pair {
        x: 1,
        y: 2,
    })));
    assert_unrelated_types_unchanged(&customizer);
    assert_unrelated_composites_unchanged(&customizer);

    let freeze = Freeze::value(Pair { x: 3, y: 4 });
    assert_unrelated_types_unchanged(&freeze);
    assert_unrelated_composites_unchanged(&freeze);
}

#[test]
fn test_substitution_leaves_unrelated_types_alone() {
    assert_unrelated_types_unchanged(&TypeRefSubstitution);
    assert_unrelated_composites_unchanged(&TypeRefSubstitution);
}

#[test]
fn test_post_processing_leaves_unrelated_types_alone() {
    assert_unrelated_types_unchanged(&TypeRefAssetCustomizer);
    assert_unrelated_composites_unchanged(&TypeRefAssetCustomizer);
    assert_unrelated_types_unchanged(&TypeRefCustomizer);
}

#[test]
fn test_aggressive_resolution_leaves_non_composites_alone() {
    assert_unrelated_types_unchanged(&ResolveConstructorAggressively);
}
