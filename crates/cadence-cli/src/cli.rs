use cadence_core::calendar::ViewType;
use cadence_core::models::{EditScope, EntryStatus};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Cadence: tasks and time blocks on a recurring schedule
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a task or time block
    Add(AddCommand),
    /// Show the agenda for a view
    List(ListCommand),
    /// Show one entry in detail
    Show(ShowCommand),
    /// Show upcoming occurrences of a recurring entry
    Preview(PreviewCommand),
    /// Edit an entry or some of its occurrences
    Edit(EditCommand),
    /// Delete an entry or some of its occurrences
    Delete(DeleteCommand),
    /// Mark an entry or one occurrence as done
    Done(DoneCommand),
    /// Undo a completion
    Undone(DoneCommand),
    /// Completion statistics for a recurring entry
    Stats(StatsCommand),
    /// Calendar grid with the number of entries per day
    Grid(GridCommand),
}

/// Human-friendly recurrence shortcuts
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceShortcut {
    /// Every day
    Daily,
    /// Every week on the days given with --on (default: the start day)
    Weekly,
    /// Every month on the start day-of-month
    Monthly,
    /// Monday to Friday
    Weekdays,
    /// Saturday and Sunday
    Weekends,
}

/// Recurrence options shared by `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct RecurrenceArgs {
    /// Repeat the entry
    #[arg(long, value_enum)]
    pub every: Option<RecurrenceShortcut>,
    /// Step between occurrences, in days, weeks or months
    #[arg(long, requires = "every")]
    pub interval: Option<u32>,
    /// Days of week for weekly recurrence (e.g. "mon,wed,fri")
    #[arg(long, requires = "every")]
    pub on: Option<String>,
    /// Last day an occurrence may fall on
    #[arg(long, requires = "every", conflicts_with = "count")]
    pub until: Option<String>,
    /// Total number of occurrences
    #[arg(long, requires = "every")]
    pub count: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// Title of the entry
    pub title: String,
    /// When it starts (e.g. "2025-03-01 09:30", "tomorrow 9am")
    #[arg(short, long)]
    pub at: Option<String>,
    /// Create a time block instead of a task
    #[arg(long)]
    pub block: bool,
    /// Length in minutes
    #[arg(short, long)]
    pub duration: Option<u32>,
    /// Occupies the whole day
    #[arg(long)]
    pub all_day: bool,
    #[arg(short, long)]
    pub notes: Option<String>,
    /// ID of a parent entry
    #[arg(long)]
    pub parent: Option<String>,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Layout to show (day, 3days, week, 2weeks, month)
    #[arg(short, long)]
    pub view: Option<ViewType>,
    /// Day the view is anchored on (default: today)
    #[arg(short, long)]
    pub date: Option<String>,
    /// Move the view this many steps forward (negative: backward)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i32,
}

#[derive(Parser, Debug, Clone)]
pub struct GridCommand {
    #[arg(short, long)]
    pub view: Option<ViewType>,
    #[arg(short, long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// ID of the entry
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// ID of the entry
    pub id: String,
    /// Number of occurrences to show
    #[arg(short, long, default_value_t = 10)]
    pub count: usize,
    /// First day to consider (default: today)
    #[arg(long)]
    pub from: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// ID of the entry
    pub id: String,
    /// Occurrence the edit starts from (default: the current one)
    #[arg(long)]
    pub date: Option<String>,
    /// Which occurrences to change: this, future or all
    #[arg(long)]
    pub scope: Option<EditScope>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, conflicts_with = "notes")]
    pub notes_clear: bool,

    /// New time of day (e.g. "14:30")
    #[arg(long)]
    pub time: Option<String>,
    /// Reschedule a one-off entry
    #[arg(long, conflicts_with = "time")]
    pub at: Option<String>,

    #[arg(long, conflicts_with = "timed")]
    pub all_day: bool,
    #[arg(long)]
    pub timed: bool,

    #[arg(long)]
    pub duration: Option<u32>,
    #[arg(long, conflicts_with = "duration")]
    pub duration_clear: bool,

    #[arg(long)]
    pub status: Option<EntryStatus>,

    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
    /// Stop repeating
    #[arg(long, conflicts_with = "every")]
    pub recurrence_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// ID of the entry
    pub id: String,
    /// Occurrence the delete starts from (default: the current one)
    #[arg(long)]
    pub date: Option<String>,
    /// Which occurrences to delete: this, future or all
    #[arg(long)]
    pub scope: Option<EditScope>,
    /// Delete without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    /// ID of the entry
    pub id: String,
    /// Occurrence to mark (default: the current one)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct StatsCommand {
    /// ID of the entry
    pub id: String,
    /// First day counted (default: the first occurrence)
    #[arg(long)]
    pub from: Option<String>,
    /// Last day counted (default: today)
    #[arg(long)]
    pub to: Option<String>,
}
