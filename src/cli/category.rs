//! tdl category command implementations.

use serde::Serialize;

use crate::cli::{load_context, output_options, EventOutput, GlobalOptions};
use crate::error::Result;
use crate::events::EventKind;
use crate::model::{Category, CategoryId, UniverseId};
use crate::output::{emit_success, HumanOutput};

pub struct NewOptions {
    pub universe: UniverseId,
    pub name: String,
    pub globals: GlobalOptions,
}

pub struct ListOptions {
    pub universe: Option<UniverseId>,
    pub globals: GlobalOptions,
}

pub struct RmOptions {
    pub id: CategoryId,
    pub globals: GlobalOptions,
}

#[derive(Serialize)]
struct CategoryListOutput {
    total: usize,
    categories: Vec<Category>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;

    let category = ctx.store.create_category(options.universe, &options.name)?;
    let event_warning = events.emit(EventKind::CategoryCreated, &category);

    let mut human = HumanOutput::new("Category created");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", category.id.to_string());
    human.push_summary("Universe", category.universe_id.to_string());
    human.push_summary("Name", category.name.clone());
    human.push_summary("Position", category.position.to_string());
    human.push_next_step(format!("tdl item add {} <content>", category.id));

    emit_success(
        events.output_options(&options.globals),
        "category new",
        &category,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let categories = ctx.store.list_categories(options.universe)?;

    let mut human = HumanOutput::new("Categories");
    human.push_summary("Total", categories.len().to_string());
    if let Some(universe) = options.universe {
        human.push_summary("Universe", universe.to_string());
    }
    for category in &categories {
        human.push_detail(format!(
            "#{} {} (universe {}, pos {})",
            category.id, category.name, category.universe_id, category.position
        ));
    }

    let output = CategoryListOutput {
        total: categories.len(),
        categories,
    };
    emit_success(
        output_options(&options.globals),
        "category list",
        &output,
        Some(&human),
    )
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;

    let removed = ctx.store.delete_category(options.id)?;
    let event_warning = events.emit(EventKind::CategoryDeleted, &removed);

    let mut human = HumanOutput::new("Category deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", removed.id.to_string());
    human.push_summary("Name", removed.name.clone());

    emit_success(
        events.output_options(&options.globals),
        "category rm",
        &removed,
        Some(&human),
    )
}
