// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;

use tokio::sync::mpsc;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error, info};

use crate::engine::controller::{ControllerCommand, ControllerStep, WatchController};
use crate::engine::WatchEvent;
use crate::errors::Result;
use crate::exec::{run_tests, RunServices};

/// Async shell around [`WatchController`].
///
/// Reads [`WatchEvent`]s, feeds them to the controller and carries out the
/// returned commands: runs and plugin activations are spawned as tasks
/// that report back on the same channel, so the controller only ever sees
/// one event at a time.
pub struct Runtime {
    controller: WatchController,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
    services: RunServices,
    tasks: JoinSet<()>,
    /// Run id per spawned run task, so a panicked run can still be reported.
    run_tasks: HashMap<Id, u64>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("controller", &self.controller)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// `event_tx` must feed `event_rx`; completions are sent through it.
    pub fn new(
        controller: WatchController,
        event_rx: mpsc::UnboundedReceiver<WatchEvent>,
        event_tx: mpsc::UnboundedSender<WatchEvent>,
        services: RunServices,
    ) -> Self {
        Self {
            controller,
            event_rx,
            event_tx,
            services,
            tasks: JoinSet::new(),
            run_tasks: HashMap::new(),
        }
    }

    /// Start the initial run and process events until the controller exits.
    ///
    /// Runs and plugin activations still in flight are aborted on return.
    pub async fn run(mut self) -> Result<WatchController> {
        info!("watch runtime started");

        let step = self.controller.start();
        let mut keep_running = self.execute(step);

        while keep_running {
            let event = tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("watch event channel closed; exiting");
                        break;
                    }
                },
                Some(joined) = self.tasks.join_next_with_id(), if !self.tasks.is_empty() => {
                    match self.task_finished(joined) {
                        Some(event) => event,
                        None => continue,
                    }
                }
            };
            debug!(?event, "watch runtime received event");

            let step = self.controller.step(event);
            keep_running = self.execute(step);
        }

        self.tasks.abort_all();
        info!("watch runtime exiting");
        Ok(self.controller)
    }

    fn execute(&mut self, step: ControllerStep) -> bool {
        for command in step.commands {
            match command {
                ControllerCommand::StartRun(plan) => {
                    let run_id = plan.run_id;
                    let services = self.services.clone();
                    let tx = self.event_tx.clone();
                    let handle = self.tasks.spawn(async move {
                        let outcome = run_tests(plan, &services).await.map_err(|err| err.to_string());
                        if tx.send(WatchEvent::RunFinished { run_id, outcome }).is_err() {
                            debug!(run_id, "runtime gone before run completion was delivered");
                        }
                    });
                    self.run_tasks.insert(handle.id(), run_id);
                }
                ControllerCommand::AwaitPlugin { activation, run } => {
                    let tx = self.event_tx.clone();
                    self.tasks.spawn(async move {
                        let outcome = run.await;
                        // Receiver gone means the runtime is shutting down.
                        let _ = tx.send(WatchEvent::PluginSettled { activation, outcome });
                    });
                }
                ControllerCommand::Exit => {
                    info!("controller requested exit");
                }
            }
        }
        step.keep_running
    }

    /// Turn a run task that died without reporting into a failed completion.
    fn task_finished(&mut self, joined: std::result::Result<(Id, ()), JoinError>) -> Option<WatchEvent> {
        match joined {
            Ok((id, ())) => {
                self.run_tasks.remove(&id);
                None
            }
            Err(err) => {
                let run_id = self.run_tasks.remove(&err.id())?;
                if !err.is_panic() {
                    return None;
                }
                error!(run_id, "test run task panicked");
                Some(WatchEvent::RunFinished {
                    run_id,
                    outcome: Err("Test run panicked".to_string()),
                })
            }
        }
    }
}
