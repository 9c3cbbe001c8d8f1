//! Snapshot runner for a demo ECS host.
//!
//! This binary:
//! 1. Builds an in-memory host with a few groups of entities
//! 2. Attaches it to a snapshot tree
//! 3. Steps the host and refreshes the tree on a schedule, logging each pass
//!
//! Configuration (environment):
//! - `SNAPSHOT_INTERVAL_MS` - time between refreshes (default 500)
//! - `SNAPSHOT_PASSES` - number of refresh passes before exiting (default 3)
//! - `SNAPSHOT_ENTITIES` - entities spawned into the demo host (default 8)

use std::sync::Arc;
use std::time::Instant;

use rgb_snapshot::visit::{self, TreeStats, Visitor};
use rgb_snapshot::{
    ComponentTypeKey, ComponentValue, EntityId, EntitySnapshot, GroupId, GroupSnapshot, LocalSlot,
    MemoryHost, RootSnapshot, SnapshotConfig, SnapshotTree, StructCapture,
};
use tracing::{debug, info};

const PLAYERS: GroupId = GroupId::new(0);
const ITEMS: GroupId = GroupId::new(1);
const STAGING: GroupId = GroupId::new(2);

/// Runner settings on top of the library's snapshot config.
struct RunnerConfig {
    snapshot: SnapshotConfig,
    passes: u32,
    entities: u32,
}

impl RunnerConfig {
    fn from_env() -> Self {
        let passes: u32 = std::env::var("SNAPSHOT_PASSES")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3);

        let entities: u32 = std::env::var("SNAPSHOT_ENTITIES")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8);

        Self {
            snapshot: SnapshotConfig::from_env(),
            passes,
            entities,
        }
    }
}

/// Renders a tree into the log, one line per node.
struct LogRenderer;

impl Visitor for LogRenderer {
    fn enter_root(&mut self, root: &RootSnapshot) {
        info!(
            "{} (generation {}, systems: {})",
            root.label(),
            root.generation(),
            root.systems().join(", ")
        );
    }

    fn enter_group(&mut self, group: &GroupSnapshot) {
        let locators = if group.has_locators() { "" } else { " [no locators]" };
        info!("  {} - {} entities{}", group.id(), group.entities().len(), locators);
    }

    fn enter_entity(&mut self, entity: &EntitySnapshot) {
        info!("    {}", entity.id());
    }

    fn component(&mut self, capture: &StructCapture) {
        let value = match capture.value() {
            ComponentValue::Json(json) => json.to_string(),
            ComponentValue::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            ComponentValue::Opaque { summary } => {
                summary.clone().unwrap_or_else(|| "(opaque)".to_string())
            }
        };
        info!("      {} = {}", capture.component(), value);
    }
}

fn build_host(entities: u32) -> Arc<MemoryHost> {
    let host = Arc::new(MemoryHost::new());
    host.add_system("movement");
    host.add_system("regeneration");

    for i in 0..entities {
        let id = EntityId::new(i + 1);
        if i % 2 == 0 {
            host.spawn(
                PLAYERS,
                id,
                [
                    (
                        "Position".into(),
                        ComponentValue::json(
                            serde_json::json!({"x": f64::from(i), "y": 64.0, "z": 0.0}),
                        ),
                    ),
                    ("Health".into(), ComponentValue::json(20.into())),
                    (
                        "Connection".into(),
                        ComponentValue::opaque(Some(format!("socket #{i}"))),
                    ),
                ],
            );
        } else {
            host.spawn(
                ITEMS,
                id,
                [("Stack".into(), ComponentValue::bytes(&i.to_le_bytes()))],
            );
        }
    }

    // Column data that no entity is located at yet.
    host.set_component(STAGING, LocalSlot::new(0), "Stack", ComponentValue::bytes(&[0; 4]));
    host
}

/// Advance every player one block along x.
fn step(host: &MemoryHost, entities: u32) {
    let position: ComponentTypeKey = "Position".into();
    for slot in 0..entities.div_ceil(2) {
        host.update_component(PLAYERS, LocalSlot::new(slot), &position, |value| {
            if let ComponentValue::Json(serde_json::Value::Object(fields)) = value {
                if let Some(x) = fields.get("x").and_then(serde_json::Value::as_f64) {
                    fields.insert("x".to_string(), serde_json::json!(x + 1.0));
                }
            }
        });
    }
}

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rgb_snapshot=info".parse()?)
                .add_directive("rgb_snapshot_cli=info".parse()?),
        )
        .init();

    let config = RunnerConfig::from_env();
    info!(
        "Snapshotting {} entities every {:?} for {} passes",
        config.entities, config.snapshot.interval, config.passes
    );

    let host = build_host(config.entities);
    let mut tree = SnapshotTree::new();
    let engine = tree.attach(&host, Some("demo"))?.id();

    tree.subscribe(|tree| {
        let stats = TreeStats::of(tree);
        debug!(
            roots = stats.roots,
            groups = stats.groups,
            entities = stats.entities,
            components = stats.components,
            "tree updated"
        );
    });

    let mut schedule = config.snapshot.schedule();
    let mut passes = 0;
    while passes < config.passes {
        let now = Instant::now();
        if !schedule.is_due(now) {
            let wait = schedule
                .next_due()
                .map_or(schedule.interval(), |due| due.saturating_duration_since(now));
            std::thread::sleep(wait);
            continue;
        }

        step(&host, config.entities);
        if tree.poll(&mut schedule, Instant::now())? {
            passes += 1;
            info!("Pass {passes}");
            visit::walk(&tree, &mut LogRenderer);
        }
    }

    let root = tree.detach(engine)?;
    info!("Detached {} after {} refreshes", root.label(), root.generation());
    Ok(())
}
