//! 服务容器端到端场景测试

use component_macros::Injectable;
use di_impl::{
    into_instance, same_instance, Container, DependencyError, Instance, Parameters,
    ServiceContainer, TypeDescriptor,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}

#[derive(Debug, Injectable)]
struct ConsoleLogger;

#[derive(Debug, Injectable)]
struct FileLogger;

trait Mailer: std::fmt::Debug + Send + Sync {
    fn transport(&self) -> &'static str;
}

#[derive(Debug, Injectable)]
#[injectable(provides(dyn Mailer))]
struct SmtpMailer;

impl Mailer for SmtpMailer {
    fn transport(&self) -> &'static str {
        "smtp"
    }
}

#[derive(Debug, Injectable)]
struct Notifier {
    mailer: Arc<dyn Mailer>,
}

#[derive(Debug, Injectable)]
struct A {
    b: Arc<B>,
}

#[derive(Debug, Injectable)]
struct B {
    a: Arc<A>,
}

#[derive(Debug, Injectable)]
struct PlainFormatter;

#[derive(Debug, Injectable)]
struct JsonFormatter;

#[derive(Debug, Injectable)]
struct ReportController {
    #[inject(id = "Formatter")]
    formatter: Instance,
}

#[derive(Debug, Injectable)]
struct AuditController {
    #[inject(id = "Formatter")]
    formatter: Instance,
}

#[derive(Debug, Injectable)]
struct Dashboard {
    #[inject(id = "RefreshInterval", default = 30)]
    refresh_seconds: u32,
    #[inject(id = "MissingLogger")]
    logger: Option<Arc<ConsoleLogger>>,
}

#[derive(Debug, Injectable)]
#[injectable(bare_on_cycle)]
struct Parent {
    child: Option<Arc<Child>>,
}

#[derive(Debug, Injectable)]
struct Child {
    parent: Arc<Parent>,
}

fn mail_container() -> Container {
    let container = Container::new();
    container.register_descriptor(TypeDescriptor::interface("Mailer"));
    container.register_type::<SmtpMailer>();
    container.register_type::<Notifier>();
    container.bind("Mailer", "SmtpMailer").unwrap();
    container
}

fn formatter_container() -> Container {
    let container = Container::new();
    container.register_descriptor(TypeDescriptor::interface("Formatter"));
    container.register_type::<PlainFormatter>();
    container.register_type::<JsonFormatter>();
    container.register_type::<ReportController>();
    container.register_type::<AuditController>();
    container.bind("Formatter", "PlainFormatter").unwrap();
    container
        .when("ReportController")
        .needs("Formatter")
        .give("JsonFormatter");
    container
}

#[test]
fn test_singleton_identity() {
    init_tracing();
    let container = Container::new();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    container
        .singleton_factory("Logger", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(into_instance(ConsoleLogger))
        })
        .unwrap();

    let first = container.make("Logger").unwrap();
    let second = container.make("Logger").unwrap();

    assert!(same_instance(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(first.downcast_ref::<ConsoleLogger>().is_some());
}

#[test]
fn test_transient_instances_are_distinct() {
    let container = mail_container();

    let first = container.make_as::<Notifier>("Notifier").unwrap();
    let second = container.make_as::<Notifier>("Notifier").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first.mailer, &second.mailer));
    assert_eq!(first.mailer.transport(), "smtp");
    assert!(!container.is_shared("Mailer"));

    let mailer = container.make_as::<Arc<dyn Mailer>>("Mailer").unwrap();
    assert_eq!(mailer.transport(), "smtp");
    assert!(container.make_as::<SmtpMailer>("SmtpMailer").is_ok());
}

#[test]
fn test_circular_dependency_reports_path() {
    init_tracing();
    let container = Container::new();
    container.register_type::<A>();
    container.register_type::<B>();

    let error = container.make("A").unwrap_err();
    match error {
        DependencyError::CircularDependency { path } => {
            assert_eq!(path, vec!["A", "B", "A"]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }

    // 失败后构建栈已清空，下一次解析的路径从头开始
    match container.make("B") {
        Err(DependencyError::CircularDependency { path }) => {
            assert_eq!(path, vec!["B", "A", "B"]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn test_override_parameter_wins_over_binding() {
    let container = mail_container();
    let custom: Arc<dyn Mailer> = Arc::new(SmtpMailer);

    let notifier = container
        .make_as_with::<Notifier>(
            "Notifier",
            Parameters::new().with("mailer", custom.clone()),
        )
        .unwrap();

    assert!(Arc::ptr_eq(&notifier.mailer, &custom));
}

#[test]
fn test_contextual_binding_is_scoped_to_consumer() {
    let container = formatter_container();

    let report = container.make_as::<ReportController>("ReportController").unwrap();
    let audit = container.make_as::<AuditController>("AuditController").unwrap();
    let direct = container.make("Formatter").unwrap();

    assert!(report.formatter.downcast_ref::<JsonFormatter>().is_some());
    assert!(audit.formatter.downcast_ref::<PlainFormatter>().is_some());
    assert!(direct.downcast_ref::<PlainFormatter>().is_some());
}

#[test]
fn test_instance_bypasses_construction() {
    let container = Container::new();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    container
        .bind_factory("Clock", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(into_instance(0_u64))
        })
        .unwrap();

    let clock = into_instance(42_u64);
    container.instance("Clock", clock.clone()).unwrap();

    let resolved = container.make("Clock").unwrap();
    assert!(same_instance(&clock, &resolved));
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rebind_fires_rebound_callback() {
    let container = Container::new();
    container
        .singleton_factory("Clock", |_, _| Ok(into_instance(1_u32)))
        .unwrap();
    container.make("Clock").unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let current = container
        .rebinding("Clock", move |instance, _| {
            if let Some(value) = instance.downcast_ref::<u32>() {
                sink.lock().unwrap().push(*value);
            }
        })
        .unwrap();
    assert_eq!(current.unwrap().downcast_ref::<u32>(), Some(&1));

    container
        .singleton_factory("Clock", |_, _| Ok(into_instance(2_u32)))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2]);
    assert_eq!(*container.make_as::<u32>("Clock").unwrap(), 2);
}

#[test]
fn test_rebind_over_registered_instance_fires_rebound_callback() {
    let container = Container::new();
    container.instance("Clock", into_instance(1_u32)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    container
        .rebinding("Clock", move |instance, _| {
            if let Some(value) = instance.downcast_ref::<u32>() {
                sink.lock().unwrap().push(*value);
            }
        })
        .unwrap();

    container
        .singleton_factory("Clock", |_, _| Ok(into_instance(2_u32)))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

#[test]
fn test_unsatisfiable_hint_falls_back_to_default() {
    let container = Container::new();
    container.register_type::<Dashboard>();

    let dashboard = container.make_as::<Dashboard>("Dashboard").unwrap();

    assert_eq!(dashboard.refresh_seconds, 30);
    assert!(dashboard.logger.is_none());
}

#[test]
fn test_tagged_services_are_identity_stable() {
    let container = Container::new();
    container.register_type::<FileLogger>();
    container.register_type::<ConsoleLogger>();
    container.singleton("FileLogger", "FileLogger").unwrap();
    container.singleton("ConsoleLogger", "ConsoleLogger").unwrap();
    container.tag("loggers", &["FileLogger", "ConsoleLogger"]);

    let first = container.tagged("loggers").unwrap();
    let second = container.tagged("loggers").unwrap();

    assert_eq!(first.len(), 2);
    assert!(first[0].downcast_ref::<FileLogger>().is_some());
    assert!(first[1].downcast_ref::<ConsoleLogger>().is_some());
    assert!(first
        .iter()
        .zip(second.iter())
        .all(|(left, right)| same_instance(left, right)));
}

#[test]
fn test_tagged_alias_and_target_resolve_once() {
    let container = Container::new();
    container.register_type::<ConsoleLogger>();
    container.singleton("ConsoleLogger", "ConsoleLogger").unwrap();
    container.alias("ConsoleLogger", "console").unwrap();
    container.tag("loggers", &["ConsoleLogger", "console"]);

    let loggers = container.tagged("loggers").unwrap();

    assert_eq!(loggers.len(), 1);
    assert!(loggers[0].downcast_ref::<ConsoleLogger>().is_some());
}

#[test]
fn test_empty_contextual_tag_is_unresolvable_inside_factory() {
    let container = Container::new();
    container
        .bind_factory("Consumer", |resolver, _| {
            let handlers = resolver.try_make("Handlers")?;
            Ok(into_instance(handlers.is_some()))
        })
        .unwrap();
    container
        .bind_factory("StrictConsumer", |resolver, _| resolver.make("Handlers"))
        .unwrap();
    container.when("Consumer").needs("Handlers").give_tagged("none");
    container
        .when("StrictConsumer")
        .needs("Handlers")
        .give_tagged("none");

    let found = container.make_as::<bool>("Consumer").unwrap();
    assert!(!*found);

    let error = container.make("StrictConsumer").unwrap_err();
    assert!(error.is_unresolvable());
    assert!(matches!(
        error,
        DependencyError::UnresolvableDependency { ref parameter, ref declaring_type }
            if parameter == "Handlers" && declaring_type == "StrictConsumer"
    ));
}

#[test]
fn test_unknown_type_is_target_not_found() {
    let container = Container::new();

    match container.make("UnknownType") {
        Err(DependencyError::TargetNotFound { target }) => assert_eq!(target, "UnknownType"),
        other => panic!("expected TargetNotFound, got {other:?}"),
    }
    assert!(container.try_make("UnknownType").unwrap().is_none());
}

#[test]
fn test_interface_without_binding_is_not_instantiable() {
    let container = Container::new();
    container.register_descriptor(TypeDescriptor::interface("Mailer"));
    container.register_type::<Notifier>();

    let error = container.make("Notifier").unwrap_err();
    assert!(matches!(
        error,
        DependencyError::TargetNotInstantiable { ref target, ref build_stack }
            if target == "Mailer" && build_stack == &vec!["Notifier".to_string()]
    ));
}

#[test]
fn test_bare_on_cycle_breaks_the_loop() {
    init_tracing();
    let container = Container::new();
    container.register_type::<Parent>();
    container.register_type::<Child>();

    let parent = container.make_as::<Parent>("Parent").unwrap();

    let child = parent.child.as_ref().unwrap();
    assert!(child.parent.child.is_none());
}

#[test]
fn test_make_bare_skips_dependency_resolution() -> anyhow::Result<()> {
    let container = Container::new();
    container.register_type::<Dashboard>();
    container.register_type::<ConsoleLogger>();
    container.bind("MissingLogger", "ConsoleLogger")?;

    let bare = container.make_bare("Dashboard")?;
    let dashboard = bare
        .downcast::<Dashboard>()
        .map_err(|_| anyhow::anyhow!("Dashboard 类型不符"))?;
    assert_eq!(dashboard.refresh_seconds, 30);
    assert!(dashboard.logger.is_none());

    let wired = container.make_as::<Dashboard>("Dashboard")?;
    assert!(wired.logger.is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_singleton_resolution() {
    let container = Arc::new(Container::new());
    container.register_type::<ConsoleLogger>();
    container.singleton("Logger", "ConsoleLogger").unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let container = container.clone();
            tokio::spawn(async move { container.make("Logger") })
        })
        .collect();

    let mut resolved = Vec::new();
    for handle in handles {
        resolved.push(handle.await.unwrap().unwrap());
    }

    let first = &resolved[0];
    assert!(resolved.iter().all(|instance| same_instance(first, instance)));
    assert_eq!(container.stats().active_singletons, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_keep_separate_build_stacks() {
    let container = Arc::new(Container::new());
    container.register_type::<A>();
    container.register_type::<B>();
    let container_for_mail = Arc::new(mail_container());

    let mut handles = Vec::new();
    for index in 0..16 {
        let cycles = container.clone();
        let mail = container_for_mail.clone();
        handles.push(tokio::spawn(async move {
            if index % 2 == 0 {
                matches!(
                    cycles.make("A"),
                    Err(DependencyError::CircularDependency { ref path }) if path.len() == 3
                )
            } else {
                mail.make_as::<Notifier>("Notifier").is_ok()
            }
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
}
