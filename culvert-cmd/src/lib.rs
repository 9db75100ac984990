//! Command implementations for the culvert CLI.
//!
//! Provides subcommands to size a crossing, keep the result as a field card
//! in a local SQLite file, and export cards as CSV or HTML.

use clap::{Args, Subcommand, ValueEnum};
use culvert_core::FieldForm;
use culvert_db::Database;
use std::io::Write;
use std::path::PathBuf;

pub mod cards;
pub mod sizing;

/// Channel and catchment measurements, as typed on the command line.
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// Drainage area in hectares
    #[arg(short = 'a', long)]
    pub drainage_area: String,

    /// Stream gradient in percent
    #[arg(short = 'g', long)]
    pub stream_gradient: String,

    /// Coastal, Interior or Northern
    #[arg(short = 'r', long)]
    pub region: String,

    /// CSP, HDPE or Concrete
    #[arg(short = 'm', long, default_value = "CSP")]
    pub material: String,

    /// Comma-separated top widths in metres (up to 5)
    #[arg(short = 'w', long)]
    pub top_widths: String,

    /// Bottom width in metres
    #[arg(short = 'b', long)]
    pub bottom_width: String,

    /// Comma-separated depths in metres (up to 5)
    #[arg(short = 'd', long)]
    pub depths: String,

    /// Scale the design flow for projected rainfall
    #[arg(long)]
    pub climate: bool,

    /// Projected design rainfall intensity in mm/hr
    #[arg(long)]
    pub projected_rainfall: Option<String>,

    /// Apply the transportability minimum size
    #[arg(long)]
    pub transportability: bool,
}

impl FormArgs {
    pub fn to_form(&self) -> FieldForm {
        FieldForm {
            drainage_area: self.drainage_area.clone(),
            stream_gradient: self.stream_gradient.clone(),
            region: self.region.clone(),
            culvert_material: self.material.clone(),
            top_widths: FieldForm::split_list(&self.top_widths),
            bottom_width: self.bottom_width.clone(),
            depths: FieldForm::split_list(&self.depths),
            use_climate_factors: self.climate,
            projected_rainfall: self.projected_rainfall.clone().unwrap_or_default(),
            use_transportability: self.transportability,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EstimatorKind {
    /// Regional power-law regression
    #[default]
    Power,
    /// Interpolated regional discharge table
    Lookup,
}

/// How the engine is set up for a run.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// JSON file overriding sizing constants
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Flow estimation method
    #[arg(long, value_enum, default_value_t = EstimatorKind::Power)]
    pub estimator: EstimatorKind,
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// Field-card database file
    #[arg(long, default_value = "culvert-cards.sqlite")]
    pub db: PathBuf,
}

impl DbArgs {
    pub fn open(&self) -> anyhow::Result<Database> {
        Database::open(&self.db)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Size a culvert and print the result as JSON
    Size {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Size a culvert and store it as a field card
    Save {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Latitude of the crossing
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,

        /// Longitude of the crossing
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,

        /// GPS accuracy in metres
        #[arg(long)]
        accuracy: Option<f64>,

        /// Free-text notes
        #[arg(short = 'n', long)]
        notes: Option<String>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// List stored field cards, newest first
    List {
        /// Only cards created at or after this RFC 3339 time
        #[arg(long)]
        since: Option<String>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Print one field card as JSON
    Show {
        id: String,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Delete a field card
    Delete {
        id: String,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Replace the notes on a field card (omit to clear them)
    Notes {
        id: String,

        notes: Option<String>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Export all field cards as CSV
    Export {
        /// Output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Render one field card as an HTML report
    Report {
        id: String,

        /// Output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Load field cards from a JSON array (as written by `dump`)
    Import {
        input: PathBuf,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Write all field cards as a JSON array
    Dump {
        /// Output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        db: DbArgs,
    },
}

/// Send `text` to `path`, or to `out` when no path was given.
pub(crate) fn emit(text: &str, path: Option<&PathBuf>, out: &mut dyn Write) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            log::info!("[Culvert] cmd: wrote {}", path.display());
        }
        None => out.write_all(text.as_bytes())?,
    }
    Ok(())
}

pub fn run(command: Command) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Size { form, engine } => {
            sizing::run_size(&form.to_form(), &engine, &mut out)?;
        }
        Command::Save {
            form,
            engine,
            latitude,
            longitude,
            accuracy,
            notes,
            db,
        } => {
            let location = sizing::location(latitude, longitude, accuracy);
            sizing::run_save(&db.open()?, &form.to_form(), &engine, location, notes, &mut out)?;
        }
        Command::List { since, db } => cards::run_list(&db.open()?, since.as_deref(), &mut out)?,
        Command::Show { id, db } => cards::run_show(&db.open()?, &id, &mut out)?,
        Command::Delete { id, db } => cards::run_delete(&db.open()?, &id, &mut out)?,
        Command::Notes { id, notes, db } => {
            cards::run_notes(&db.open()?, &id, notes.as_deref(), &mut out)?
        }
        Command::Export { output, db } => {
            cards::run_export(&db.open()?, output.as_ref(), &mut out)?
        }
        Command::Report { id, output, db } => {
            cards::run_report(&db.open()?, &id, output.as_ref(), &mut out)?
        }
        Command::Import { input, db } => cards::run_import(&db.open()?, &input, &mut out)?,
        Command::Dump { output, db } => cards::run_dump(&db.open()?, output.as_ref(), &mut out)?,
    }
    Ok(())
}
