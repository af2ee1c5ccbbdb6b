//! tdl overview / today command implementations.

use crate::cli::{format_item_line, load_context, local_today, output_options, parse_date_arg, GlobalOptions};
use crate::error::Result;
use crate::model::{TodayWindow, UniverseId};
use crate::output::{emit_success, HumanOutput};

pub struct OverviewOptions {
    pub universe: Option<UniverseId>,
    pub globals: GlobalOptions,
}

pub struct TodayOptions {
    pub date: Option<String>,
    pub window: Option<String>,
    pub globals: GlobalOptions,
}

pub fn run_overview(options: OverviewOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let overview = ctx.store.overview(options.universe)?;

    let mut human = HumanOutput::new("Overview");
    human.push_summary("Universes", overview.universes.len().to_string());
    for section in &overview.universes {
        human.push_detail(format!("{} (#{})", section.universe.name, section.universe.id));
        for category in &section.categories {
            human.push_detail(format!(
                "  {} (#{}, {} open, {} done)",
                category.category.name,
                category.category.id,
                category.items.len(),
                category.completed.len()
            ));
            for item in category.items.iter().chain(category.completed.iter()) {
                human.push_detail(format!("    {}", format_item_line(item)));
            }
        }
    }
    if overview.universes.is_empty() {
        human.push_next_step("tdl universe new <name>");
    }

    emit_success(
        output_options(&options.globals),
        "overview",
        &overview,
        Some(&human),
    )
}

pub fn run_today(options: TodayOptions) -> Result<()> {
    let ctx = load_context(options.globals.root.clone())?;
    let date = match options.date.as_deref() {
        Some(raw) => parse_date_arg(raw)?,
        None => local_today(),
    };
    let window = match options.window.as_deref() {
        Some(mode) => TodayWindow::from_mode(mode, date)?,
        None => ctx.config.today.window_for(date)?,
    };
    let view = ctx.store.today(window)?;

    let mut human = HumanOutput::new(format!("Today ({date})"));
    human.push_summary("Open", view.items.len().to_string());
    human.push_summary("Done", view.completed.len().to_string());
    for entry in view.items.iter().chain(view.completed.iter()) {
        human.push_detail(format!("{} [{}]", format_item_line(&entry.item), entry.category));
    }
    if let Some(first) = view.items.first() {
        human.push_next_step(format!("tdl item move {} down --today-view", first.item.id));
    }

    emit_success(output_options(&options.globals), "today", &view, Some(&human))
}
