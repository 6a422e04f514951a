//! Persisted profile store and a guarded router, wired through one context.

use std::sync::Arc;

use roost::logging::LoggingConfig;
use roost::{AppContext, MemoryStorage, NavigationOutcome, Storage};

fn main() -> roost::Result<()> {
    LoggingConfig::default().init();

    println!("=== Profile Example ===\n");

    let storage = MemoryStorage::new();
    let ctx = AppContext::new(Arc::new(storage.clone()));

    let demo = ctx.demo_store()?;
    println!("Initial state: {:?}", demo.get());

    demo.subscribe(|state| println!("State updated: {} ({})", state.name, state.age))
        .detach();

    demo.set("name", "李四")?;
    demo.update(|state| state.age = "19".to_string())?;
    println!("Persisted: {:?}", storage.get_item("demo")?);

    println!("\nReloading...");
    let reloaded = AppContext::new(Arc::new(storage.clone()));
    println!("Rehydrated state: {:?}", reloaded.demo_store()?.get());

    println!("\nEnabling the auth guard");
    reloaded.auth_guard().set_enabled(true);
    report(reloaded.router().push("/dashboard")?);

    storage.set_item("token", "t0k3n")?;
    report(reloaded.router().push("/dashboard")?);

    Ok(())
}

fn report(outcome: NavigationOutcome) {
    match outcome {
        NavigationOutcome::Committed(to) => println!("Now at {}", to.full_path()),
        NavigationOutcome::Redirected { from, to } => {
            println!("{} redirected to {}", from.full_path(), to.full_path())
        }
        NavigationOutcome::Aborted { to, reason } => {
            println!("{} aborted: {reason}", to.full_path())
        }
        NavigationOutcome::Duplicated(to) => println!("Already at {}", to.full_path()),
    }
}
