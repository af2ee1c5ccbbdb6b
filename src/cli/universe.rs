//! tdl universe command implementations.

use serde::Serialize;

use crate::cli::{load_context, output_options, EventOutput, GlobalOptions};
use crate::error::Result;
use crate::events::EventKind;
use crate::model::{Universe, UniverseId};
use crate::output::{emit_success, HumanOutput};

pub struct NewOptions {
    pub name: String,
    pub globals: GlobalOptions,
}

pub struct RmOptions {
    pub id: UniverseId,
    pub globals: GlobalOptions,
}

#[derive(Serialize)]
struct UniverseListOutput {
    total: usize,
    universes: Vec<Universe>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;

    let universe = ctx.store.create_universe(&options.name)?;
    let event_warning = events.emit(EventKind::UniverseCreated, &universe);

    let mut human = HumanOutput::new("Universe created");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", universe.id.to_string());
    human.push_summary("Name", universe.name.clone());
    human.push_summary("Position", universe.position.to_string());
    human.push_next_step(format!("tdl category new {} <name>", universe.id));

    emit_success(
        events.output_options(&options.globals),
        "universe new",
        &universe,
        Some(&human),
    )
}

pub fn run_list(globals: GlobalOptions) -> Result<()> {
    let ctx = load_context(globals.root.clone())?;
    let universes = ctx.store.list_universes()?;

    let mut human = HumanOutput::new("Universes");
    human.push_summary("Total", universes.len().to_string());
    for universe in &universes {
        human.push_detail(format!("#{} {} (pos {})", universe.id, universe.name, universe.position));
    }

    let output = UniverseListOutput {
        total: universes.len(),
        universes,
    };
    emit_success(output_options(&globals), "universe list", &output, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;

    let removed = ctx.store.delete_universe(options.id)?;
    let event_warning = events.emit(EventKind::UniverseDeleted, &removed);

    let mut human = HumanOutput::new("Universe deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", removed.id.to_string());
    human.push_summary("Name", removed.name.clone());

    emit_success(
        events.output_options(&options.globals),
        "universe rm",
        &removed,
        Some(&human),
    )
}
