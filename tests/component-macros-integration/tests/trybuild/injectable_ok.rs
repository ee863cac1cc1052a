use component_macros::Injectable;
use di_abstractions::{Injectable as _, Instance};
use std::sync::Arc;

trait TimeSource: Send + Sync {}

#[derive(Injectable)]
#[injectable(provides(dyn TimeSource))]
struct Clock;

impl TimeSource for Clock {}

#[derive(Injectable)]
#[injectable(id = "Scheduler", bare_on_cycle)]
struct Scheduler {
    clock: Arc<Clock>,
    #[inject(id = "Queue")]
    queue: Option<Instance>,
    #[inject(default = 4)]
    workers: usize,
    label: Option<String>,
}

fn main() {
    let descriptor = Scheduler::type_descriptor();
    assert_eq!(descriptor.id, "Scheduler");
    assert!(descriptor.bare_on_cycle);
    assert_eq!(descriptor.parameters.len(), 4);
    assert_eq!(Clock::type_descriptor().id, "Clock");
    assert!(Clock::type_descriptor().provides_interface("TimeSource"));
}
