use api_shared::{AdmissionReq, AdmissionService};
use clap::{Parser, Subcommand};
use medflow_core::{
    constants::DEFAULT_INVENTORY_FILENAME, inventory_from_env_value, AllocationStatus,
    ClinicalScorer, HospitalStateStore, InventoryConfig, Patient, QueryFilter, VitalSigns,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medflow")]
#[command(about = "MedFlow triage and resource allocation CLI")]
struct Cli {
    /// Inventory YAML file (default: MEDFLOW_INVENTORY, then the built-in reference hospital)
    #[arg(long, global = true)]
    inventory: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single patient
    Score {
        /// Age in whole years
        #[arg(long)]
        age: u32,
        /// Heart rate in bpm
        #[arg(long)]
        heart_rate: Option<f64>,
        /// Systolic blood pressure in mmHg
        #[arg(long)]
        bp_systolic: Option<f64>,
        /// Oxygen saturation in percent
        #[arg(long)]
        oxygen_saturation: Option<f64>,
        /// Presenting symptom (repeatable)
        #[arg(long = "symptom")]
        symptoms: Vec<String>,
    },
    /// Triage, rank and allocate a batch of patients from a JSON file
    Admit {
        /// JSON file: `{"patients": [...]}` or a bare array of patients
        batch: PathBuf,
        /// Print the full round as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a hospital status snapshot
    State {
        /// beds_only, staff_only, equipment_only or full
        #[arg(long, default_value = "full")]
        filter: String,
    },
    /// Print the current resource conflicts
    Conflicts,
    /// Print the reference inventory as YAML
    Inventory {
        /// Write it to inventory.yaml instead of printing
        #[arg(long)]
        write: bool,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Wrapped(AdmissionReq),
    Bare(Vec<Patient>),
}

impl BatchFile {
    fn into_patients(self) -> Vec<Patient> {
        match self {
            BatchFile::Wrapped(req) => req.patients,
            BatchFile::Bare(patients) => patients,
        }
    }
}

fn load_service(
    inventory: Option<PathBuf>,
) -> Result<AdmissionService, Box<dyn std::error::Error>> {
    let config = match inventory {
        Some(path) => InventoryConfig::load(&path)?,
        None => inventory_from_env_value(std::env::var("MEDFLOW_INVENTORY").ok())?,
    };
    let store = HospitalStateStore::new(&config)?;
    Ok(AdmissionService::new(Arc::new(store)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medflow=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Score {
            age,
            heart_rate,
            bp_systolic,
            oxygen_saturation,
            symptoms,
        }) => {
            let vitals = VitalSigns {
                heart_rate,
                bp_systolic,
                oxygen_saturation,
            };
            let patient = Patient::new("patient", age, vitals).with_symptoms(symptoms);
            if let Err(e) = patient.validate() {
                eprintln!("Error: {}", e);
                return Ok(());
            }
            let assessment = ClinicalScorer::assess(&patient);
            println!(
                "Score: {}, Severity: {}, Survival: {}%",
                assessment.clinical_score, assessment.severity, assessment.survival_probability
            );
            println!(
                "Department: {}, Max wait: {} min",
                assessment.recommended_department, assessment.max_wait_time_minutes
            );
            for factor in &assessment.risk_factors {
                println!("  - {}", factor);
            }
            if !assessment.required_specialists.is_empty() {
                let specialists: Vec<&str> = assessment
                    .required_specialists
                    .iter()
                    .map(|s| s.as_str())
                    .collect();
                println!("Specialists: {}", specialists.join(", "));
            }
        }
        Some(Commands::Admit { batch, json }) => {
            let service = load_service(cli.inventory)?;
            let text = std::fs::read_to_string(&batch)?;
            let patients = serde_json::from_str::<BatchFile>(&text)?.into_patients();
            match service.admit(&patients) {
                Ok(res) if json => println!("{}", serde_json::to_string_pretty(&res)?),
                Ok(res) => {
                    println!(
                        "Conflicts: {} ({})",
                        res.conflicts.severity,
                        res.order.conflict_label()
                    );
                    for result in &res.allocation.results {
                        let placement = match &result.bed {
                            Some(bed) => match &bed.bed_id {
                                Some(id) => format!("{} {}", bed.department, id),
                                None => bed.department.to_string(),
                            },
                            None => format!("waiting for {}", result.requested_department),
                        };
                        println!(
                            "#{} {} [{}] {:?}: {}, ready in {} min",
                            result.rank,
                            result.patient_id,
                            result.severity,
                            result.status,
                            placement,
                            result.estimated_ready_minutes
                        );
                        if result.status == AllocationStatus::Pending {
                            for issue in &result.issues {
                                println!("    issue: {:?}", issue);
                            }
                        }
                    }
                    if res.allocation.resources_exhausted {
                        println!(
                            "Resources exhausted; waiting: {:?}",
                            res.allocation.waiting_patients
                        );
                    }
                }
                Err(e) => eprintln!("Error admitting batch: {}", e),
            }
        }
        Some(Commands::State { filter }) => {
            let filter: QueryFilter = filter.parse()?;
            let service = load_service(cli.inventory)?;
            println!("{}", serde_json::to_string_pretty(&service.snapshot(filter))?);
        }
        Some(Commands::Conflicts) => {
            let service = load_service(cli.inventory)?;
            let report = service.conflicts();
            if !report.detected {
                println!("No conflicts detected.");
            }
            for conflict in &report.items {
                println!(
                    "[{}] {}: {} -> {}",
                    conflict.severity, conflict.kind, conflict.details, conflict.recommendation
                );
            }
        }
        Some(Commands::Inventory { write }) => {
            let yaml = InventoryConfig::default().to_yaml()?;
            if write {
                std::fs::write(DEFAULT_INVENTORY_FILENAME, yaml)?;
                println!("Wrote {}", DEFAULT_INVENTORY_FILENAME);
            } else {
                print!("{}", yaml);
            }
        }
        None => {
            println!("Use 'medflow --help' for commands");
        }
    }

    Ok(())
}
