//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::validate::FieldInput;

pub mod commands;

/// Tacboard CLI - shared TACREP board for a mission crew
#[derive(Parser, Debug)]
#[command(name = "tacboard", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Board document path (default: ~/.tacboard/board.json)
    #[arg(long, global = true, env = "TACBOARD_BOARD")]
    pub board: Option<PathBuf>,

    /// Crew position stamped on changes (e.g. TC, MC)
    #[arg(long, global = true, env = "TACBOARD_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output only the code or index (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// One line typed at the live prompt, parsed with the same commands.
#[derive(Parser, Debug)]
#[command(name = "tacboard", no_binary_name = true)]
pub struct LiveLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new board document
    Init {
        /// Mission block start (first code number)
        #[arg(long)]
        block_start: Option<u64>,

        /// Mission number
        #[arg(long, default_value = "")]
        mission: String,

        /// Aircraft callsign
        #[arg(long, default_value = "")]
        callsign: String,

        /// Overwrite an existing board
        #[arg(long)]
        force: bool,
    },

    /// Set the mission block start, or a per-type numbering floor
    Block {
        /// First code number
        #[arg(required_unless_present = "clear")]
        number: Option<u64>,

        /// Apply only to this TACREP type
        #[arg(long = "type", short = 't')]
        kind: Option<String>,

        /// Remove the per-type floor instead of setting it
        #[arg(long, requires = "kind", conflicts_with = "number")]
        clear: bool,
    },

    /// Show or set mission details
    Mission {
        /// Mission number
        #[arg(long)]
        number: Option<String>,

        /// Aircraft callsign
        #[arg(long)]
        callsign: Option<String>,
    },

    /// Set crew positions for a shift
    Crew(CrewArgs),

    /// Create a TACREP
    Add(AddArgs),

    /// Edit, correct, or update a TACREP
    Edit(EditArgs),

    /// Delete a TACREP (it moves to the deleted bucket)
    Delete {
        /// Code of the TACREP to delete
        code: String,
    },

    /// Restore a deleted TACREP by its original code
    Restore {
        /// Code the TACREP had before deletion
        code: String,
    },

    /// List TACREPs
    List {
        /// Only this TACREP type
        #[arg(value_name = "TYPE")]
        kind: Option<String>,

        /// List the deleted bucket instead
        #[arg(long)]
        deleted: bool,
    },

    /// Show one TACREP as report text
    Show {
        /// TACREP code
        code: String,
    },

    /// Correlation groups
    Correlate {
        #[command(subcommand)]
        command: CorrelateCommands,
    },

    /// Change history (newest first)
    History {
        /// Only entries for this code
        code: Option<String>,

        /// Maximum entries to show
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },

    /// Equipment faults
    Fault {
        #[command(subcommand)]
        command: FaultCommands,
    },

    /// Mission timeline (OFFDECK, ONSTA, OFFSTA, ONDECK)
    Timeline {
        #[command(subcommand)]
        command: TimelineCommands,
    },

    /// Write a timestamped copy of the board
    Export {
        /// Target directory (default: exportDir setting or current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show backend and sync status
    Status,

    /// Interactive mode: read commands from stdin with autosave and polling
    Live,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Record Commands
// ============================================================================

/// Form fields shared by `add` and `edit`. An empty value clears a field.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Time (HHMM Zulu)
    #[arg(long)]
    pub time: Option<String>,

    /// Position as "DD:MM:SS.ssH DDD:MM:SS.ssH"
    #[arg(long, short = 'p')]
    pub position: Option<String>,

    /// Course (0-359)
    #[arg(long)]
    pub course: Option<String>,

    /// Speed (knots)
    #[arg(long)]
    pub speed: Option<String>,

    /// Track number
    #[arg(long)]
    pub track: Option<String>,

    /// Minimum vessel length
    #[arg(long)]
    pub min_len: Option<String>,

    /// Additional information
    #[arg(long)]
    pub info: Option<String>,

    /// Vessel type (contact reports)
    #[arg(long)]
    pub vessel: Option<String>,

    /// Sensor (contact reports)
    #[arg(long)]
    pub sensor: Option<String>,

    /// System or platform (Echo)
    #[arg(long)]
    pub platform: Option<String>,

    /// Emitter name (Echo)
    #[arg(long)]
    pub emitter: Option<String>,

    /// Activity or function (Echo)
    #[arg(long)]
    pub activity: Option<String>,

    /// Frequency (Echo)
    #[arg(long)]
    pub frequency: Option<String>,
}

impl From<&FieldArgs> for FieldInput {
    fn from(args: &FieldArgs) -> Self {
        Self {
            time: args.time.clone(),
            position: args.position.clone(),
            course: args.course.clone(),
            speed: args.speed.clone(),
            track_number: args.track.clone(),
            min_vessel_len: args.min_len.clone(),
            info: args.info.clone(),
            vessel_type: args.vessel.clone(),
            sensor: args.sensor.clone(),
            system_or_platform: args.platform.clone(),
            emitter_name: args.emitter.clone(),
            activity_or_function: args.activity.clone(),
            frequency: args.frequency.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// TACREP type (India, Echo, AIS, Alpha, November, Golf, Other or i/e/a/n/g/o)
    #[arg(value_name = "TYPE")]
    pub kind: String,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Mark as already reported
    #[arg(long)]
    pub reported: bool,

    /// Reuse a code held by a deleted TACREP
    #[arg(long)]
    pub reactivate: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// TACREP code
    pub code: String,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Kind of change: edit, correct, update
    #[arg(long, short = 'k', default_value = "edit")]
    pub kind: String,

    /// Mark as reported
    #[arg(long, conflicts_with = "unreported")]
    pub reported: bool,

    /// Mark as not reported
    #[arg(long)]
    pub unreported: bool,
}

impl EditArgs {
    /// Requested reported flag, if either switch was given.
    #[must_use]
    pub const fn reported_flag(&self) -> Option<bool> {
        match (self.reported, self.unreported) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CrewArgs {
    /// Shift number (1-4)
    pub shift: usize,

    #[arg(long)]
    pub turnover: Option<String>,
    #[arg(long)]
    pub mc: Option<String>,
    #[arg(long)]
    pub tc: Option<String>,
    #[arg(long)]
    pub uac: Option<String>,
    #[arg(long)]
    pub sc: Option<String>,
    #[arg(long)]
    pub mpo1: Option<String>,
    #[arg(long)]
    pub mpo2: Option<String>,
}

// ============================================================================
// Correlation Commands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum CorrelateCommands {
    /// Create a group from two or more active codes
    New {
        /// Codes to correlate
        #[arg(required = true, num_args = 2..)]
        codes: Vec<String>,
    },

    /// Add a code to a group
    Add {
        /// Group number (from `correlate list`)
        group: usize,
        /// Code to add
        code: String,
    },

    /// Remove a code from a group (a group left with one code is dissolved)
    Remove {
        /// Group number
        group: usize,
        /// Code to remove
        code: String,
    },

    /// Delete a whole group
    Drop {
        /// Group number
        group: usize,
    },

    /// List groups
    List {
        /// Only groups containing this code
        #[arg(long)]
        code: Option<String>,
    },
}

// ============================================================================
// Fault / Timeline Commands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum FaultCommands {
    /// Log a fault
    Add {
        /// Fault code
        code: String,

        /// Time (HHMM Zulu, default: now)
        #[arg(long)]
        time: Option<String>,

        /// Comments
        #[arg(long, short = 'c', default_value = "")]
        comments: String,
    },

    /// List faults
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TimelineCommands {
    /// Log a timeline event
    Add {
        /// Event: OFFDECK, ONSTA, OFFSTA, ONDECK
        event: String,

        /// Time (HHMM Zulu, default: now)
        #[arg(long)]
        time: Option<String>,
    },

    /// List timeline events
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
        LiveLine::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_fields() {
        let cli = Cli::try_parse_from([
            "tacboard", "add", "i", "--time", "0930", "--course", "270", "--reported",
        ])
        .unwrap();
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.kind, "i");
        assert!(args.reported);
        let input = FieldInput::from(&args.fields);
        assert_eq!(input.time.as_deref(), Some("0930"));
        assert_eq!(input.course.as_deref(), Some("270"));
    }

    #[test]
    fn test_live_line_has_no_binary_name() {
        let line = LiveLine::try_parse_from(["correlate", "new", "I100", "E100"]).unwrap();
        assert!(matches!(
            line.command,
            Commands::Correlate {
                command: CorrelateCommands::New { .. }
            }
        ));
    }

    #[test]
    fn test_edit_reported_flags() {
        let cli = Cli::try_parse_from(["tacboard", "edit", "I100", "--unreported"]).unwrap();
        let Commands::Edit(args) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(args.reported_flag(), Some(false));
        assert!(Cli::try_parse_from(["tacboard", "edit", "I1", "--reported", "--unreported"]).is_err());
    }
}
