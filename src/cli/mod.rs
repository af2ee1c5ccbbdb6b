//! Command-line interface for tdl
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::events::{EventDestination, EventKind, EventSink};
use crate::model::{parse_date, CategoryId, Direction, Item, ItemId, UniverseId};
use crate::output::OutputOptions;
use crate::storage::{Storage, ROOT_ENV};
use crate::store::TodoStore;

mod category;
mod init;
mod item;
mod universe;
mod view;

/// tdl - todo lists with a manual order per category and per day
///
/// Items live in categories, categories live in universes. Every item keeps
/// its own place in its category, and dated items also keep a place in the
/// cross-category today list.
#[derive(Parser, Debug)]
#[command(name = "tdl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding tdl.toml and store.json
    #[arg(long, global = true, env = ROOT_ENV)]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSONL change events to a file or '-' for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store and a default tdl.toml
    Init,

    /// Universe management
    #[command(subcommand)]
    Universe(UniverseCommands),

    /// Category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Item management and ordering
    #[command(subcommand)]
    Item(ItemCommands),

    /// Every universe and category with its items in order
    Overview {
        /// Only show this universe
        #[arg(long)]
        universe: Option<UniverseId>,
    },

    /// Dated items in today order
    Today {
        /// Reference date (YYYY-MM-DD or "today")
        #[arg(long)]
        date: Option<String>,

        /// Window around the date: on, on_or_before, all (default from tdl.toml)
        #[arg(long)]
        window: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UniverseCommands {
    /// Create a universe
    New {
        name: String,
    },

    /// List universes in order
    List,

    /// Delete an empty universe
    Rm {
        id: UniverseId,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create a category inside a universe
    New {
        universe: UniverseId,
        name: String,
    },

    /// List categories in order
    List {
        /// Only list categories of this universe
        #[arg(long)]
        universe: Option<UniverseId>,
    },

    /// Delete a category that has no items
    Rm {
        id: CategoryId,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Add an item at the end of a category
    Add {
        category: CategoryId,
        content: String,

        /// Due date (YYYY-MM-DD or "today")
        #[arg(long)]
        due: Option<String>,
    },

    /// Show one item
    Show {
        id: ItemId,
    },

    /// Change fields of an item
    Edit(EditArgs),

    /// Mark an item as completed
    Done {
        id: ItemId,
    },

    /// Mark a completed item as active again
    Undone {
        id: ItemId,
    },

    /// Move an item one step up or down in a view
    Move(MoveArgs),

    /// Delete an item
    Rm {
        id: ItemId,
    },

    /// Delete every completed item
    Purge,

    /// List items
    List {
        /// Only items of this category
        #[arg(long, conflicts_with = "date")]
        category: Option<CategoryId>,

        /// Only items due on this date
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: ItemId,

    #[arg(long)]
    pub content: Option<String>,

    /// Move the item to another category
    #[arg(long)]
    pub category: Option<CategoryId>,

    /// Due date (YYYY-MM-DD or "today")
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,

    #[arg(long, conflicts_with = "undone")]
    pub done: bool,

    #[arg(long)]
    pub undone: bool,

    /// Explicit position within the category
    #[arg(long, allow_negative_numbers = true)]
    pub position: Option<i64>,

    /// Explicit position in the today list
    #[arg(long, allow_negative_numbers = true, conflicts_with = "clear_today_position")]
    pub today_position: Option<i64>,

    #[arg(long)]
    pub clear_today_position: bool,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    pub id: ItemId,

    /// up or down
    pub direction: Direction,

    /// Reorder within a category
    #[arg(long, conflicts_with = "today_view", required_unless_present = "today_view")]
    pub category_view: bool,

    /// Category whose ordering to use (default: the item's own)
    #[arg(long, requires = "category_view")]
    pub category: Option<CategoryId>,

    /// Reorder within the today list
    #[arg(long)]
    pub today_view: bool,

    /// Reference date of the today view (YYYY-MM-DD or "today")
    #[arg(long, requires = "today_view")]
    pub date: Option<String>,

    /// Window of the today view: on, on_or_before, all
    #[arg(long, requires = "today_view")]
    pub window: Option<String>,
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub root: Option<PathBuf>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = GlobalOptions {
            root: self.root,
            events: self.events,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init => init::run(globals),
            Commands::Universe(cmd) => match cmd {
                UniverseCommands::New { name } => universe::run_new(universe::NewOptions { name, globals }),
                UniverseCommands::List => universe::run_list(globals),
                UniverseCommands::Rm { id } => universe::run_rm(universe::RmOptions { id, globals }),
            },
            Commands::Category(cmd) => match cmd {
                CategoryCommands::New { universe, name } => {
                    category::run_new(category::NewOptions {
                        universe,
                        name,
                        globals,
                    })
                }
                CategoryCommands::List { universe } => {
                    category::run_list(category::ListOptions { universe, globals })
                }
                CategoryCommands::Rm { id } => category::run_rm(category::RmOptions { id, globals }),
            },
            Commands::Item(cmd) => match cmd {
                ItemCommands::Add {
                    category,
                    content,
                    due,
                } => item::run_add(item::AddOptions {
                    category,
                    content,
                    due,
                    globals,
                }),
                ItemCommands::Show { id } => item::run_show(item::IdOptions { id, globals }),
                ItemCommands::Edit(args) => item::run_edit(item::EditOptions { args, globals }),
                ItemCommands::Done { id } => {
                    item::run_set_completed(item::IdOptions { id, globals }, true)
                }
                ItemCommands::Undone { id } => {
                    item::run_set_completed(item::IdOptions { id, globals }, false)
                }
                ItemCommands::Move(args) => item::run_move(item::MoveOptions { args, globals }),
                ItemCommands::Rm { id } => item::run_rm(item::IdOptions { id, globals }),
                ItemCommands::Purge => item::run_purge(globals),
                ItemCommands::List { category, date } => item::run_list(item::ListOptions {
                    category,
                    date,
                    globals,
                }),
            },
            Commands::Overview { universe } => {
                view::run_overview(view::OverviewOptions { universe, globals })
            }
            Commands::Today { date, window } => view::run_today(view::TodayOptions {
                date,
                window,
                globals,
            }),
        }
    }
}

struct Context {
    store: TodoStore,
    config: Config,
}

fn load_context(root: Option<PathBuf>) -> Result<Context> {
    let storage = Storage::resolve(root)?;
    let config = Config::load_from_root(storage.root());
    let store = TodoStore::open(storage, &config);
    Ok(Context { store, config })
}

/// Optional `--events` sink plus the output mode it implies.
struct EventOutput {
    sink: Option<EventSink>,
    to_stdout: bool,
}

impl EventOutput {
    fn open(events: Option<&str>) -> Result<Self> {
        let destination = EventDestination::parse(events);
        let sink = destination.as_ref().map(|dest| dest.open()).transpose()?;
        let to_stdout = matches!(destination, Some(EventDestination::Stdout));
        Ok(Self { sink, to_stdout })
    }

    /// Write one event; failures become a warning for the human output.
    fn emit<T: Serialize>(&mut self, kind: EventKind, data: &T) -> Option<String> {
        let sink = self.sink.as_mut()?;
        sink.record(kind, data)
            .err()
            .map(|err| format!("event output failed: {err}"))
    }

    /// Events on stdout replace the normal output.
    fn output_options(&self, globals: &GlobalOptions) -> OutputOptions {
        OutputOptions {
            json: globals.json && !self.to_stdout,
            quiet: globals.quiet || self.to_stdout,
        }
    }
}

fn output_options(globals: &GlobalOptions) -> OutputOptions {
    OutputOptions {
        json: globals.json,
        quiet: globals.quiet,
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_date(raw, local_today())
}

/// One-line rendering used by every item listing.
fn format_item_line(item: &Item) -> String {
    let mark = if item.is_completed { "x" } else { " " };
    let mut line = format!("[{mark}] #{} {}", item.id, item.content);
    let mut meta = vec![format!("pos {}", item.position)];
    if let Some(due) = item.due_date {
        meta.push(format!("due {due}"));
        meta.push(format!("today {}", item.today_position));
    }
    line.push_str(&format!(" ({})", meta.join(", ")));
    line
}
