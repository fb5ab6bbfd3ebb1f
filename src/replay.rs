use crate::entities::EntityId;
use crate::error::Result;
use crate::grid::Position;
use crate::metrics::TickSnapshot;
use crate::simulation::FinishedReason;
use serde_json::json;
use std::{collections::HashMap, fs::File, io::BufWriter, io::Write};

pub fn create_replay_logger(
    filename: Option<String>,
    grid_width: usize,
    grid_height: usize,
    wrap: bool,
    seed: u64,
) -> Box<dyn ReplayLogger> {
    match filename {
        None => Box::new(NoOpReplayLogger {}),
        Some(filename) => Box::new(JsonReplayLogger::new(
            filename,
            grid_width,
            grid_height,
            wrap,
            seed,
        )),
    }
}

/// Receives what happens during a run so it can be replayed or charted later.
///
/// Every method defaults to doing nothing.
pub trait ReplayLogger: Send + Sync {
    #[allow(unused_variables)]
    fn log_tick(&mut self, snapshot: &TickSnapshot) {}

    #[allow(unused_variables)]
    fn log_end(&mut self, reason: FinishedReason) {}

    #[allow(unused_variables)]
    fn log_event(&mut self, tick: usize, event: Event) {}

    fn save(&self) -> Result<()> {
        Ok(())
    }

    fn log_move(&mut self, tick: usize, id: EntityId, location: Position, destination: Position) {
        self.log_event(
            tick,
            Event {
                event_type: EventType::Move,
                entity: "Cleaner".to_string(),
                entity_id: id,
                cleaner: None,
                location,
                destination: Some(destination),
            },
        );
    }

    fn log_clean(&mut self, tick: usize, cleaner: EntityId, dirt: EntityId, location: Position) {
        self.log_event(
            tick,
            Event {
                event_type: EventType::Remove,
                entity: "Dirt".to_string(),
                entity_id: dirt,
                cleaner: Some(cleaner),
                location,
                destination: None,
            },
        );
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
enum EventType {
    Remove,
    Move,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Event {
    event_type: EventType,
    entity: String,
    entity_id: EntityId,
    cleaner: Option<EntityId>,
    location: Position,
    destination: Option<Position>,
}

struct NoOpReplayLogger;
impl ReplayLogger for NoOpReplayLogger {}

struct JsonReplayLogger {
    filename: String,
    grid_width: usize,
    grid_height: usize,
    wrap: bool,
    seed: u64,
    ticks: Vec<TickSnapshot>,
    events: HashMap<usize, Vec<Event>>,
    finished_reason: Option<FinishedReason>,
}

impl JsonReplayLogger {
    pub fn new(
        filename: String,
        grid_width: usize,
        grid_height: usize,
        wrap: bool,
        seed: u64,
    ) -> JsonReplayLogger {
        JsonReplayLogger {
            filename,
            grid_width,
            grid_height,
            wrap,
            seed,
            ticks: Vec::new(),
            events: HashMap::new(),
            finished_reason: None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        let ticks: Vec<_> = self
            .ticks
            .iter()
            .map(|snapshot| {
                json!({
                    "tick": snapshot.model.tick,
                    "model": snapshot.model,
                    "agents": snapshot.agents,
                    "events": self.events.get(&snapshot.model.tick).unwrap_or(&Vec::new()),
                })
            })
            .collect();

        json!({
            "grid": {
                "width": self.grid_width,
                "height": self.grid_height,
                "wrap": self.wrap,
            },
            "seed": self.seed,
            "ticks": ticks,
            "finished_reason": self.finished_reason,
        })
    }
}

impl ReplayLogger for JsonReplayLogger {
    fn log_tick(&mut self, snapshot: &TickSnapshot) {
        self.ticks.push(snapshot.clone());
    }

    fn log_end(&mut self, reason: FinishedReason) {
        self.finished_reason = Some(reason);
    }

    fn log_event(&mut self, tick: usize, event: Event) {
        self.events.entry(tick).or_default().push(event);
    }

    fn save(&self) -> Result<()> {
        let file = File::create(&self.filename)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_json())?;
        writer.flush()?;

        Ok(())
    }
}
