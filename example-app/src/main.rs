//! # 示例应用程序
//!
//! 演示服务容器的绑定、自动装配、上下文绑定、标签和循环依赖检测

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use component_macros::Injectable;
use di_impl::{
    into_instance, same_instance, Container, DependencyError, Instance, ServiceContainer,
    TypeDescriptor,
};
use infrastructure_composition::{ContainerBuilder, LoggingConfig, ServiceProvider};
use infrastructure_common::DependencyResult;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "服务容器示例应用")]
struct Args {
    /// 容器配置文件路径（可选）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,

    /// 要运行的演示场景
    #[arg(short, long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// 并发解析的任务数
    #[arg(long, default_value_t = 8)]
    tasks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    All,
    Singleton,
    Transient,
    Cycle,
    Contextual,
    Tagged,
    Unknown,
    Concurrent,
}

impl Scenario {
    fn includes(self, other: Scenario) -> bool {
        self == Scenario::All || self == other
    }
}

#[derive(Debug, Injectable)]
struct ConsoleLogger;

#[derive(Debug, Injectable)]
struct FileLogger;

/// 邮件发送接口
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
    #[inject(id = "Logger")]
    logger: Option<Arc<ConsoleLogger>>,
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
struct OrderService {
    payments: Arc<PaymentService>,
}

#[derive(Debug, Injectable)]
struct PaymentService {
    orders: Arc<OrderService>,
}

/// 日志相关服务
struct LoggingProvider;

impl ServiceProvider for LoggingProvider {
    fn name(&self) -> &str {
        "logging"
    }

    fn register(&self, container: &Container) -> DependencyResult<()> {
        container.register_type::<ConsoleLogger>();
        container.register_type::<FileLogger>();
        container.singleton("Logger", "ConsoleLogger")?;
        container.singleton("ConsoleLogger", "ConsoleLogger")?;
        container.singleton("FileLogger", "FileLogger")?;
        container.tag("loggers", &["FileLogger", "ConsoleLogger"]);
        Ok(())
    }
}

/// 邮件和报表服务
struct ApplicationProvider;

impl ServiceProvider for ApplicationProvider {
    fn name(&self) -> &str {
        "application"
    }

    fn register(&self, container: &Container) -> DependencyResult<()> {
        container.register_descriptor(TypeDescriptor::interface("Mailer"));
        container.register_descriptor(TypeDescriptor::interface("Formatter"));
        container.register_type::<SmtpMailer>();
        container.register_type::<Notifier>();
        container.register_type::<PlainFormatter>();
        container.register_type::<JsonFormatter>();
        container.register_type::<ReportController>();
        container.register_type::<OrderService>();
        container.register_type::<PaymentService>();

        container.bind("Mailer", "SmtpMailer")?;
        container.bind("Formatter", "PlainFormatter")?;
        container
            .when("ReportController")
            .needs("Formatter")
            .give("JsonFormatter");
        Ok(())
    }

    fn boot(&self, container: &Container) -> DependencyResult<()> {
        container.resolving("Notifier", |_, resolver| {
            info!("Notifier 已创建，构建栈深度 {}", resolver.build_stack().len());
        });
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: args.log_level,
        json_format: args.json_logs,
        ..LoggingConfig::default()
    };

    let mut builder = ContainerBuilder::new().with_logging(logging);
    if let Some(path) = &args.config {
        builder = builder
            .load_config_file(path)
            .with_context(|| format!("加载容器配置失败: {}", path.display()))?;
    }
    let container = Arc::new(
        builder
            .add_provider(LoggingProvider)
            .add_provider(ApplicationProvider)
            .build()?,
    );

    info!("启动服务容器示例应用，场景: {:?}", args.scenario);

    if args.scenario.includes(Scenario::Singleton) {
        demonstrate_singleton(&container)?;
    }
    if args.scenario.includes(Scenario::Transient) {
        demonstrate_transient(&container)?;
    }
    if args.scenario.includes(Scenario::Cycle) {
        demonstrate_cycle(&container)?;
    }
    if args.scenario.includes(Scenario::Contextual) {
        demonstrate_contextual(&container)?;
    }
    if args.scenario.includes(Scenario::Tagged) {
        demonstrate_tagged(&container)?;
    }
    if args.scenario.includes(Scenario::Unknown) {
        demonstrate_unknown(&container)?;
    }
    if args.scenario.includes(Scenario::Concurrent) {
        demonstrate_concurrent(container.clone(), args.tasks).await?;
    }

    let stats = serde_json::to_string_pretty(&container.stats())?;
    info!("容器统计:\n{}", stats);
    Ok(())
}

/// 单例在多次解析间保持同一实例
fn demonstrate_singleton(container: &Container) -> anyhow::Result<()> {
    let first = container.make("Logger")?;
    let second = container.make("Logger")?;
    if !same_instance(&first, &second) {
        bail!("Logger 单例两次解析得到了不同实例");
    }
    info!("Logger 单例两次解析得到同一实例");
    Ok(())
}

/// 非共享绑定每次解析都创建新实例
fn demonstrate_transient(container: &Container) -> anyhow::Result<()> {
    let first = container.make_as::<Notifier>("Notifier")?;
    let second = container.make_as::<Notifier>("Notifier")?;
    info!(
        "两次解析 Notifier: 实例相同={}，邮件服务相同={}，邮件通道={}，日志已注入={}",
        Arc::ptr_eq(&first, &second),
        Arc::ptr_eq(&first.mailer, &second.mailer),
        first.mailer.transport(),
        first.logger.is_some()
    );
    Ok(())
}

/// 互相依赖的类型报告完整的循环路径
fn demonstrate_cycle(container: &Container) -> anyhow::Result<()> {
    match container.make("OrderService") {
        Err(DependencyError::CircularDependency { path }) => {
            info!("检测到循环依赖: {}", path.join(" -> "));
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(_) => bail!("OrderService 应当因循环依赖而失败"),
    }
}

/// 上下文绑定只对指定的消费者生效
fn demonstrate_contextual(container: &Container) -> anyhow::Result<()> {
    let controller = container.make_as::<ReportController>("ReportController")?;
    let direct = container.make("Formatter")?;
    info!(
        "ReportController 使用 JsonFormatter={}，直接解析 Formatter 得到 PlainFormatter={}",
        controller.formatter.downcast_ref::<JsonFormatter>().is_some(),
        direct.downcast_ref::<PlainFormatter>().is_some()
    );
    Ok(())
}

/// 标签成员按登记顺序解析
fn demonstrate_tagged(container: &Container) -> anyhow::Result<()> {
    let first = container.tagged("loggers")?;
    let second = container.tagged("loggers")?;
    let stable = first
        .iter()
        .zip(second.iter())
        .all(|(left, right)| same_instance(left, right));
    info!("标签 loggers 共 {} 个成员，重复解析实例稳定={}", first.len(), stable);
    Ok(())
}

/// 未知类型直接报告目标不存在
fn demonstrate_unknown(container: &Container) -> anyhow::Result<()> {
    match container.make("UnknownType") {
        Err(e @ DependencyError::TargetNotFound { .. }) => {
            warn!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(_) => bail!("UnknownType 不应被解析"),
    }
}

/// 多个任务并发解析同一单例
async fn demonstrate_concurrent(container: Arc<Container>, tasks: usize) -> anyhow::Result<()> {
    let handles: Vec<_> = (0..tasks.max(1))
        .map(|_| {
            let container = container.clone();
            tokio::spawn(async move { container.make("Logger") })
        })
        .collect();

    let mut resolved = Vec::with_capacity(handles.len());
    for handle in handles {
        resolved.push(handle.await??);
    }

    let shared = resolved
        .windows(2)
        .all(|pair| same_instance(&pair[0], &pair[1]));
    info!("{} 个任务并发解析 Logger，实例一致={}", resolved.len(), shared);

    // 单独解析一个带依赖的实例，确认容器仍然可用
    let notifier = container.make_as::<Notifier>("Notifier")?;
    info!(
        "并发解析后仍可装配 Notifier，邮件通道 {}",
        notifier.mailer.transport()
    );

    // 单例可以在运行时被替换
    container.instance("Logger", into_instance(FileLogger))?;
    let replaced = container.make("Logger")?;
    info!(
        "替换后的 Logger 是 FileLogger={}",
        replaced.downcast_ref::<FileLogger>().is_some()
    );
    Ok(())
}
