//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskdeck_core` wiring end to end: config, logging, store open
//!   and migration, service view.
//! - Keep output deterministic for quick local sanity checks.

use log::error;
use std::process::ExitCode;
use taskdeck_core::{init_logging_from_config, CoreConfig, TaskService, TaskStore};

#[tokio::main]
async fn main() -> ExitCode {
    println!("taskdeck_core ping={}", taskdeck_core::ping());
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    let config = CoreConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let store = match TaskStore::open(&config).await {
        Ok(store) => store,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={err}");
            eprintln!("failed to open task store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let service = TaskService::new(store);
    let selection = service.selection();
    let view = service.current_view();
    println!(
        "tasks={} sort={} filter={}",
        view.len(),
        selection.sort.display_name(),
        selection.filter.display_name()
    );
    for task in view {
        println!(
            "{:>6} [{}] {:<6} due={} {}",
            task.id,
            if task.is_completed { "x" } else { " " },
            task.priority,
            task.due_date,
            task.title
        );
    }

    ExitCode::SUCCESS
}
