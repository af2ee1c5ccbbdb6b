//! tdl item command implementations.

use serde::Serialize;

use crate::cli::{
    format_item_line, load_context, local_today, output_options, parse_date_arg, EditArgs,
    EventOutput, GlobalOptions, MoveArgs,
};
use crate::error::Result;
use crate::events::EventKind;
use crate::ledger::KeyChange;
use crate::model::{
    CategoryId, Item, ItemId, ItemPatch, NewItem, Scope, TodayPosition, TodayWindow,
};
use crate::output::{emit_success, HumanOutput};
use crate::store::ItemFilter;

pub struct AddOptions {
    pub category: CategoryId,
    pub content: String,
    pub due: Option<String>,
    pub globals: GlobalOptions,
}

pub struct IdOptions {
    pub id: ItemId,
    pub globals: GlobalOptions,
}

pub struct EditOptions {
    pub args: EditArgs,
    pub globals: GlobalOptions,
}

pub struct MoveOptions {
    pub args: MoveArgs,
    pub globals: GlobalOptions,
}

pub struct ListOptions {
    pub category: Option<CategoryId>,
    pub date: Option<String>,
    pub globals: GlobalOptions,
}

#[derive(Serialize)]
struct ItemListOutput {
    total: usize,
    items: Vec<Item>,
}

#[derive(Serialize)]
struct PurgeOutput {
    removed: usize,
}

fn push_item_summary(human: &mut HumanOutput, item: &Item) {
    human.push_summary("ID", item.id.to_string());
    human.push_summary("Category", item.category_id.to_string());
    human.push_summary("Content", item.content.clone());
    human.push_summary("Completed", if item.is_completed { "yes" } else { "no" });
    human.push_summary(
        "Due",
        item.due_date
            .map(|due| due.to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    human.push_summary("Position", item.position.to_string());
    human.push_summary("Today position", item.today_position.to_string());
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;
    let due_date = options.due.as_deref().map(parse_date_arg).transpose()?;

    let item = ctx.store.create_item(NewItem {
        content: options.content,
        category_id: options.category,
        due_date,
    })?;
    let event_warning = events.emit(EventKind::ItemCreated, &item);

    let mut human = HumanOutput::new("Item added");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_item_summary(&mut human, &item);

    emit_success(
        events.output_options(&options.globals),
        "item add",
        &item,
        Some(&human),
    )
}

pub fn run_show(options: IdOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let item = ctx.store.get_item(options.id)?;

    let mut human = HumanOutput::new(format!("Item {}", item.id));
    push_item_summary(&mut human, &item);
    human.push_summary("Created", item.created_at.to_rfc3339());

    emit_success(
        output_options(&options.globals),
        "item show",
        &item,
        Some(&human),
    )
}

fn patch_from_args(args: &EditArgs) -> Result<ItemPatch> {
    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due
            .as_deref()
            .map(parse_date_arg)
            .transpose()?
            .map(Some)
    };
    let is_completed = match (args.done, args.undone) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let today_position = if args.clear_today_position {
        Some(TodayPosition::Unpositioned)
    } else {
        args.today_position.map(TodayPosition::Positioned)
    };

    Ok(ItemPatch {
        content: args.content.clone(),
        is_completed,
        due_date,
        position: args.position,
        today_position,
        category_id: args.category,
    })
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;
    let patch = patch_from_args(&options.args)?;

    let item = ctx.store.update_item(options.args.id, patch)?;
    let event_warning = events.emit(EventKind::ItemUpdated, &item);

    let mut human = HumanOutput::new("Item updated");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_item_summary(&mut human, &item);

    emit_success(
        events.output_options(&options.globals),
        "item edit",
        &item,
        Some(&human),
    )
}

pub fn run_set_completed(options: IdOptions, completed: bool) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;

    let item = ctx.store.update_item(
        options.id,
        ItemPatch {
            is_completed: Some(completed),
            ..ItemPatch::default()
        },
    )?;
    let (kind, header, command) = if completed {
        (EventKind::ItemCompleted, "Item completed", "item done")
    } else {
        (EventKind::ItemReopened, "Item reopened", "item undone")
    };
    let event_warning = events.emit(kind, &item);

    let mut human = HumanOutput::new(header);
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", item.id.to_string());
    human.push_summary("Content", item.content.clone());
    if completed {
        human.push_next_step("tdl item purge");
    }

    emit_success(
        events.output_options(&options.globals),
        command,
        &item,
        Some(&human),
    )
}

fn format_key_change(change: &KeyChange) -> String {
    let show = |value: Option<i64>| TodayPosition::from(value).to_string();
    format!("#{} {} -> {}", change.item_id, show(change.from), show(change.to))
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;
    let args = &options.args;

    let outcome = if args.today_view {
        let date = match args.date.as_deref() {
            Some(raw) => parse_date_arg(raw)?,
            None => local_today(),
        };
        let window = match args.window.as_deref() {
            Some(mode) => TodayWindow::from_mode(mode, date)?,
            None => ctx.config.today.window_for(date)?,
        };
        ctx.store
            .reorder_item(args.id, args.direction, Scope::today(window))?
    } else if let Some(category_id) = args.category {
        ctx.store
            .reorder_item(args.id, args.direction, Scope::category(category_id))?
    } else {
        ctx.store.reorder_within_category(args.id, args.direction)?
    };
    let event_warning = events.emit(EventKind::ItemReordered, &outcome);

    let mut human = HumanOutput::new(format!("Item moved {}", outcome.direction));
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("Item", outcome.moved.item_id.to_string());
    human.push_summary("View", outcome.scope.to_string());
    human.push_summary("Swapped with", outcome.displaced.item_id.to_string());
    human.push_detail(format_key_change(&outcome.moved));
    human.push_detail(format_key_change(&outcome.displaced));

    emit_success(
        events.output_options(&options.globals),
        "item move",
        &outcome,
        Some(&human),
    )
}

pub fn run_rm(options: IdOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let mut events = EventOutput::open(options.globals.events.as_deref())?;

    let removed = ctx.store.delete_item(options.id)?;
    let event_warning = events.emit(EventKind::ItemDeleted, &removed);

    let mut human = HumanOutput::new("Item deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", removed.id.to_string());
    human.push_summary("Content", removed.content.clone());

    emit_success(
        events.output_options(&options.globals),
        "item rm",
        &removed,
        Some(&human),
    )
}

pub fn run_purge(globals: GlobalOptions) -> Result<()> {
    let ctx = load_context(globals.root.clone())?;
    let mut events = EventOutput::open(globals.events.as_deref())?;

    let removed = ctx.store.delete_completed_items()?;
    let output = PurgeOutput { removed };
    let event_warning = events.emit(EventKind::CompletedItemsPurged, &output);

    let mut human = HumanOutput::new("Completed items deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("Removed", removed.to_string());

    emit_success(
        events.output_options(&globals),
        "item purge",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let filter = match (options.category, options.date.as_deref()) {
        (Some(category), _) => ItemFilter::Category(category),
        (None, Some(raw)) => ItemFilter::DueOn(parse_date_arg(raw)?),
        (None, None) => ItemFilter::All,
    };
    let items = ctx.store.list_items(filter)?;

    let mut human = HumanOutput::new("Items");
    human.push_summary("Total", items.len().to_string());
    match filter {
        ItemFilter::Category(category) => human.push_summary("Category", category.to_string()),
        ItemFilter::DueOn(date) => human.push_summary("Due", date.to_string()),
        ItemFilter::All => {}
    }
    for item in &items {
        human.push_detail(format_item_line(item));
    }

    let output = ItemListOutput {
        total: items.len(),
        items,
    };
    emit_success(
        output_options(&options.globals),
        "item list",
        &output,
        Some(&human),
    )
}
