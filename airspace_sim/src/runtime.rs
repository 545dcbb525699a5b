//! Supervisor - spawns, cancels and joins every simulator task.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Supervisor                         │
//! │  CancellationToken ──────────┬───────────┬──────────┐     │
//! │        │                     │           │          │     │
//! │  ┌─────▼─────┐ ┌──────────┐ ┌▼────────┐ ┌▼───────┐ ┌▼───┐ │
//! │  │ Agent × N │ │ Monitor  │ │ History │ │Display │ │Op. │ │
//! │  └─────┬─────┘ └────┬─────┘ └────┬────┘ └───┬────┘ └─┬──┘ │
//! │        └────────────┴─── AirspaceStore ─────┴────────┘    │
//! │                         JoinSet<TaskExit>                 │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Every task checks the token at its tick boundary, so shutdown takes
//! at most one period of the slowest task.

use airspace_core::{
    AgentExit, AircraftAgent, AircraftId, AirspaceStore, ConflictMonitor, EventSink, MonitorTotals,
    SlotIndex,
};
use airspace_env::AirspaceContext;
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SimConfig;
use crate::display;
use crate::history::HistoryLogger;
use crate::operator::OperatorConsole;
use crate::region::RegionPublisher;
use crate::summary::RunSummary;

/// How a supervised task finished.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskExit {
    Agent(AircraftId, AgentExit),
    Monitor(MonitorTotals),
    History(u64),
    Display(u64),
    Console,
}

/// Owns the task set of one simulation run.
pub struct Supervisor<Ctx: AirspaceContext> {
    config: SimConfig,
    ctx: Arc<Ctx>,
    store: AirspaceStore,
    sink: Arc<dyn EventSink>,
    shutdown: CancellationToken,
    tasks: JoinSet<TaskExit>,
    region: Option<RegionPublisher>,
}

impl<Ctx: AirspaceContext> Supervisor<Ctx> {
    pub fn new(config: SimConfig, ctx: Arc<Ctx>, store: AirspaceStore, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            ctx,
            store,
            sink,
            shutdown: CancellationToken::new(),
            tasks: JoinSet::new(),
            region: None,
        }
    }

    pub fn store(&self) -> &AirspaceStore {
        &self.store
    }

    /// Token cancelled by [`stop`](Self::stop); clone it to stop from elsewhere.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of tasks not yet joined.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Publishes the region every display tick and releases it on stop.
    pub fn attach_region(&mut self, publisher: RegionPublisher) {
        self.region = Some(publisher);
    }

    /// Spawns the motion task of one slot.
    pub fn spawn_agent(&mut self, id: AircraftId, slot: SlotIndex) {
        let agent = AircraftAgent::new(id, slot, self.store.clone(), self.sink.clone())
            .with_time_step(self.config.time_step_secs);
        let ctx = self.ctx.clone();
        let period = self.config.agent_period;
        let shutdown = self.shutdown.clone();

        self.tasks.spawn(async move {
            let exit = agent.run(ctx, period, shutdown).await;
            TaskExit::Agent(id, exit)
        });
    }

    /// Spawns one agent per active slot plus the monitor, history and
    /// display tasks. Returns the number of agents spawned.
    pub fn start(&mut self) -> usize {
        let mut agents = 0;
        for (index, record) in self.store.snapshot().iter().enumerate() {
            if record.active {
                self.spawn_agent(record.id, SlotIndex(index));
                agents += 1;
            }
        }

        let monitor = ConflictMonitor::new(self.store.clone(), self.sink.clone(), self.config.monitor);
        let (ctx, period, shutdown) = (self.ctx.clone(), self.config.monitor_period, self.shutdown.clone());
        self.tasks.spawn(async move { TaskExit::Monitor(monitor.run(ctx, period, shutdown).await) });

        let history = HistoryLogger::new(self.store.clone(), self.config.history_path.clone());
        let (ctx, period, shutdown) = (self.ctx.clone(), self.config.history_period, self.shutdown.clone());
        self.tasks.spawn(async move { TaskExit::History(history.run(ctx, period, shutdown).await) });

        self.spawn_display();

        info!(agents, "Simulation started");
        agents
    }

    fn spawn_display(&mut self) {
        let store = self.store.clone();
        let region = self.region.clone();
        let print_positions = self.config.print_positions;
        let (ctx, period, shutdown) = (self.ctx.clone(), self.config.display_period, self.shutdown.clone());

        self.tasks.spawn(async move {
            let mut frames = 0;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ctx.sleep(period) => {}
                }

                if print_positions {
                    print!("{}", display::render_positions(&store.snapshot()));
                }
                if let Some(region) = &region {
                    if let Err(e) = region.publish(&store) {
                        warn!("Region not published: {}", e);
                    }
                }
                frames += 1;
            }
            TaskExit::Display(frames)
        });
    }

    /// Runs the operator console on `input`, replying on `output`.
    pub fn spawn_console<R, W>(&mut self, console: OperatorConsole, input: R, output: W)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: Write + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            console.run(input, output, shutdown).await;
            TaskExit::Console
        });
    }

    /// Cancels every task, joins them, releases the region.
    pub async fn stop(mut self) -> RunSummary {
        info!("Shutting down simulation");
        self.shutdown.cancel();

        let mut summary = RunSummary::default();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(TaskExit::Agent(_, AgentExit::Deactivated)) => summary.agents_retired += 1,
                Ok(TaskExit::Agent(_, _)) => summary.agents_stopped += 1,
                Ok(TaskExit::Monitor(totals)) => summary.monitor = totals,
                Ok(TaskExit::History(entries)) => summary.history_entries = entries,
                Ok(TaskExit::Display(frames)) => summary.display_frames = frames,
                Ok(TaskExit::Console) => {}
                Err(e) => error!("Task failed: {}", e),
            }
        }

        if let Some(region) = self.region.take() {
            if let Err(e) = region.release() {
                warn!("Region not released: {}", e);
            }
        }

        summary.elapsed_secs = self.ctx.now().as_secs_f64();
        summary.aircraft = self.store.count();
        summary.active = self.store.active_count();
        summary
    }
}
