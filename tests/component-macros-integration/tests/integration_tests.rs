//! 可注入类型派生宏集成测试

use component_macros::Injectable;
use di_abstractions::{Injectable as _, TypeKind};
use di_impl::{into_instance, same_instance, Container, Instance, Parameters, ServiceContainer};
use std::sync::Arc;

/// 输出目标
pub trait Sink: Send + Sync {
    fn write(&self, line: &str) -> String;
}

struct MemorySink;

impl Sink for MemorySink {
    fn write(&self, line: &str) -> String {
        format!("memory:{line}")
    }
}

#[derive(Debug, Injectable)]
pub struct SystemClock;

#[derive(Injectable)]
#[injectable(id = "Exporter")]
pub struct CsvExporter {
    clock: Arc<SystemClock>,
    sink: Arc<dyn Sink>,
    #[inject(default = "csv".to_string())]
    format: String,
    #[inject(default)]
    batch_size: usize,
    #[inject(id = "Metrics")]
    metrics: Option<Instance>,
    note: Option<String>,
}

#[derive(Debug, Injectable)]
#[injectable(bare_on_cycle)]
pub struct Session {
    #[inject(id = "Clock", optional)]
    clock: Option<Arc<SystemClock>>,
}

fn exporter_container() -> Container {
    let container = Container::new();
    container.register_type::<SystemClock>();
    container.register_type::<CsvExporter>();
    container.singleton("SystemClock", "SystemClock").unwrap();
    container
        .singleton_factory("Sink", |_, _| {
            let sink: Arc<dyn Sink> = Arc::new(MemorySink);
            Ok(into_instance(sink))
        })
        .unwrap();
    container
}

#[test]
fn test_unit_struct_descriptor() {
    let descriptor = SystemClock::type_descriptor();

    assert_eq!(descriptor.id, "SystemClock");
    assert_eq!(descriptor.kind, TypeKind::Concrete);
    assert!(descriptor.parameters.is_empty());
    assert!(!descriptor.bare_on_cycle);
}

#[test]
fn test_field_descriptors_follow_declaration_order() {
    let descriptor = CsvExporter::type_descriptor();
    let parameters = &descriptor.parameters;

    assert_eq!(descriptor.id, "Exporter");
    let names: Vec<_> = parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["clock", "sink", "format", "batch_size", "metrics", "note"]
    );
    assert!(parameters
        .iter()
        .enumerate()
        .all(|(index, parameter)| parameter.position == index));

    assert_eq!(parameters[0].declared_type.as_deref(), Some("SystemClock"));
    assert!(!parameters[0].has_fallback());
    assert_eq!(parameters[1].declared_type.as_deref(), Some("Sink"));
    assert!(parameters[2].declared_type.is_none());
    assert!(parameters[2].default_value.is_some());
    assert!(parameters[3].default_value.is_some());
    assert_eq!(parameters[4].declared_type.as_deref(), Some("Metrics"));
    assert!(parameters[4].is_optional);
    assert!(parameters[5].is_optional);
}

#[test]
fn test_derived_type_is_auto_wired() {
    let container = exporter_container();

    let exporter = container.make_as::<CsvExporter>("Exporter").unwrap();
    let clock = container.make("SystemClock").unwrap();

    assert!(same_instance(
        &(exporter.clock.clone() as Instance),
        &clock
    ));
    assert_eq!(exporter.sink.write("row"), "memory:row");
    assert_eq!(exporter.format, "csv");
    assert_eq!(exporter.batch_size, 0);
    assert!(exporter.metrics.is_none());
    assert!(exporter.note.is_none());
}

#[test]
fn test_values_come_from_overrides_and_context() {
    let container = exporter_container();
    container
        .when("Exporter")
        .needs("$note")
        .give_value("nightly".to_string());
    container.instance_of("Metrics", 0_u64).unwrap();

    let exporter = container
        .make_as_with::<CsvExporter>(
            "Exporter",
            Parameters::new()
                .with("format", "tsv".to_string())
                .with(3_usize, 500_usize),
        )
        .unwrap();

    assert_eq!(exporter.format, "tsv");
    assert_eq!(exporter.batch_size, 500);
    assert_eq!(exporter.note.as_deref(), Some("nightly"));
    assert!(exporter.metrics.is_some());
}

#[test]
fn test_bare_on_cycle_attribute() {
    let descriptor = Session::type_descriptor();
    assert!(descriptor.bare_on_cycle);
    assert_eq!(descriptor.parameters[0].declared_type.as_deref(), Some("Clock"));

    let container = Container::new();
    container.register_type::<Session>();
    let session = container.make_as::<Session>("Session").unwrap();
    assert!(session.clock.is_none());
}
