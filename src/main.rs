use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medrec_core::constants::{DEFAULT_DATA_DIR, DEFAULT_STORAGE_KEY};
use medrec_core::{
    CorruptionPolicy, DraftSession, FileKeyValueStore, LocalFile, ObjectUrlRegistry,
    PatientRecord, RecordField, RecordId, RecordStore, StoreConfig,
};

#[derive(Parser)]
#[command(name = "medrec")]
#[command(about = "Local patient record store")]
struct Cli {
    /// Directory holding the stored records
    #[arg(long, global = true, env = "MEDREC_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Key the record list is stored under
    #[arg(long, global = true, env = "MEDREC_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    storage_key: String,

    /// What to do with unreadable stored data: "recover" or "fail"
    #[arg(long, global = true, env = "MEDREC_CORRUPTION_POLICY", default_value = "recover")]
    corruption_policy: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patient records, most recent first
    List,
    /// Find records whose name or diagnoses contain the query
    Search {
        /// Case-insensitive substring; empty matches everything
        query: String,
    },
    /// Show every field of one record
    Show {
        /// Record id
        id: String,
    },
    /// Add a new patient record
    Add {
        #[command(flatten)]
        fields: FieldArgs,
        /// Attach an image file (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Edit an existing patient record
    Edit {
        /// Record id
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
        /// Attach an image file (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
        /// Remove the image at this position, counting from 0 (repeatable)
        #[arg(long = "remove-image", value_name = "INDEX")]
        remove_images: Vec<usize>,
    },
    /// Delete a patient record
    Delete {
        /// Record id
        id: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Field values to write into a draft. Omitted options leave the field as it is.
#[derive(Args, Default)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    clinical_history: Option<String>,
    #[arg(long)]
    prior_conditions: Option<String>,
    #[arg(long)]
    symptoms: Option<String>,
    #[arg(long)]
    diagnoses: Option<String>,
    #[arg(long)]
    treatments: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

impl FieldArgs {
    fn into_pairs(self) -> Vec<(RecordField, String)> {
        [
            (RecordField::Name, self.name),
            (RecordField::Age, self.age),
            (RecordField::Gender, self.gender),
            (RecordField::ClinicalHistory, self.clinical_history),
            (RecordField::PriorConditions, self.prior_conditions),
            (RecordField::Symptoms, self.symptoms),
            (RecordField::Diagnoses, self.diagnoses),
            (RecordField::Treatments, self.treatments),
            (RecordField::Notes, self.notes),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

/// Entry point for the medrec command line.
///
/// # Environment Variables
/// - `MEDREC_DATA_DIR`: directory for the file-backed store (default: "medrec_data")
/// - `MEDREC_STORAGE_KEY`: key the record list is stored under (default: "patientRecords")
/// - `MEDREC_CORRUPTION_POLICY`: "recover" (default) or "fail"
/// - `RUST_LOG`: log filter, on top of the default `medrec=info`
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("medrec=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    run(cli, &mut stdin.lock(), &mut stdout)
}

fn run(cli: Cli, input: &mut impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        writeln!(out, "Use 'medrec --help' for commands")?;
        return Ok(());
    };

    let policy: CorruptionPolicy = cli.corruption_policy.parse()?;
    let cfg = StoreConfig::new(&cli.storage_key, policy)?;
    let substrate = FileKeyValueStore::open(&cli.data_dir)
        .with_context(|| format!("failed to open data directory {}", cli.data_dir.display()))?;
    let (mut store, report) = RecordStore::open(substrate, cfg)?;

    if report.recovered_from_corruption {
        writeln!(
            out,
            "Warning: stored records were unreadable and have been set aside as '{}'.",
            store.config().backup_key()
        )?;
    }

    // References only resolve while this process runs.
    let mut registry = ObjectUrlRegistry::new();
    let mut draft = DraftSession::new();

    match command {
        Commands::List => print_summaries(out, store.list().iter())?,
        Commands::Search { query } => print_summaries(out, store.search(&query).into_iter())?,
        Commands::Show { id } => {
            let id = RecordId::new(id);
            let record = store
                .get(&id)
                .with_context(|| format!("patient record not found: {}", id))?;
            print_record(out, record, &registry)?;
        }
        Commands::Add { fields, images } => {
            draft.start_new();
            for (field, value) in fields.into_pairs() {
                draft.set_field(field, value)?;
            }
            draft.attach_images(images.into_iter().map(LocalFile::new), &mut registry)?;

            let result = draft.commit(&mut store)?;
            writeln!(out, "Created patient record {}", result.record.id())?;
        }
        Commands::Edit {
            id,
            fields,
            images,
            mut remove_images,
        } => {
            let id = RecordId::new(id);
            let record = store
                .get(&id)
                .with_context(|| format!("patient record not found: {}", id))?;
            draft.start_edit(record);

            // Highest first, so each index still refers to the list as it was shown.
            remove_images.sort_unstable_by(|a, b| b.cmp(a));
            remove_images.dedup();
            for index in remove_images {
                let removed = draft.remove_image(index)?;
                if removed.orphaned {
                    registry.revoke(&removed.reference);
                }
            }
            for (field, value) in fields.into_pairs() {
                draft.set_field(field, value)?;
            }
            draft.attach_images(images.into_iter().map(LocalFile::new), &mut registry)?;

            let result = draft.commit(&mut store)?;
            writeln!(out, "Updated patient record {}", result.record.id())?;
        }
        Commands::Delete { id, yes } => {
            let id = RecordId::new(id);
            let Some(record) = store.get(&id) else {
                writeln!(out, "No patient record with id {}", id)?;
                return Ok(());
            };

            if !yes && !confirm(input, out, &format!("Delete record for {}?", record.name()))? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }

            store.delete(&id)?;
            writeln!(out, "Deleted patient record {}", id)?;
        }
    }

    Ok(())
}

fn print_summaries<'a>(
    out: &mut impl Write,
    records: impl Iterator<Item = &'a PatientRecord>,
) -> anyhow::Result<()> {
    let mut printed = 0usize;
    for record in records {
        writeln!(
            out,
            "ID: {}, Name: {}, Age: {}, Gender: {}, Diagnoses: {}, Created: {}",
            record.id(),
            record.name(),
            record.fields().age,
            record.fields().gender,
            record.diagnoses().unwrap_or("-"),
            record.created_at().format("%Y-%m-%d %H:%M")
        )?;
        printed += 1;
    }

    if printed == 0 {
        writeln!(out, "No patients found.")?;
    }
    Ok(())
}

fn print_record(
    out: &mut impl Write,
    record: &PatientRecord,
    registry: &ObjectUrlRegistry,
) -> anyhow::Result<()> {
    writeln!(out, "ID: {}", record.id())?;
    writeln!(out, "Created: {}", record.created_at().to_rfc3339())?;
    for field in RecordField::ALL {
        match record.fields().get(field) {
            Some(value) if value.contains('\n') => {
                writeln!(out, "{}:", field)?;
                for line in value.lines() {
                    writeln!(out, "  {}", line)?;
                }
            }
            Some(value) => writeln!(out, "{}: {}", field, value)?,
            None => writeln!(out, "{}: -", field)?,
        }
    }

    writeln!(out, "images: {}", record.images().len())?;
    for (index, image) in record.images().iter().enumerate() {
        let state = if registry.resolve(image).is_some() {
            ""
        } else {
            " (not available in this session)"
        };
        writeln!(out, "  [{}] {}{}", index, image, state)?;
    }
    Ok(())
}

fn confirm(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> anyhow::Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        bail!("no confirmation received; pass --yes to delete without asking");
    }
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
