use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use zeroize::Zeroizing;

use aicpa_lib::api::{ApiClient, ReportImage, ReportImageState};
use aicpa_lib::auth::{self, AuthFlow, AuthForm, Route};
use aicpa_lib::config::{self, ClientConfig};
use aicpa_lib::dashboard::{Dashboard, DashboardError};
use aicpa_lib::models::{Feedback, PatientData, UploadKind};
use aicpa_lib::render;
use aicpa_lib::session::{FileSessionStore, SessionStore};

#[derive(Parser)]
#[command(name = "aicpa", version, about = "AI clinical pharmacist assistant client")]
struct Cli {
    /// Prediction API origin (overrides AICPA_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides AICPA_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and store the session
    Signup {
        username: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        admin_code: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Predict ADR risk for a patient record (JSON file)
    Predict {
        #[arg(long)]
        patient: PathBuf,
        /// Save the result to history
        #[arg(long)]
        save: bool,
        /// Write the gauge figure JSON here
        #[arg(long)]
        gauge: Option<PathBuf>,
        /// Write the AI insights as HTML here
        #[arg(long)]
        insights_html: Option<PathBuf>,
    },
    /// Predict from an uploaded JSON or CSV file
    Upload {
        file: PathBuf,
        #[arg(long, default_value = "json")]
        kind: UploadKind,
    },
    /// List saved predictions
    History {
        /// Print the full report of one entry (0-based)
        #[arg(long)]
        show: Option<usize>,
    },
    /// List every user's predictions (admin only)
    AdminRecords,
    /// Model performance and bias audit table
    Metrics,
    /// Global feature importance
    FeatureImportance,
    /// Send workflow-efficiency feedback
    Feedback {
        #[arg(long)]
        usefulness: u8,
        #[arg(long)]
        accuracy: u8,
        #[arg(long)]
        response_time: u8,
        #[arg(long)]
        workload_reduction: u8,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// Download an evaluation report image
    ReportImage {
        name: ReportImage,
        #[arg(long)]
        out: PathBuf,
    },
    /// List drugs known to the static drug list
    Drugs,
    /// Build drugs.json from an ADR summary CSV
    GenerateDrugs { csv: PathBuf, out: PathBuf },
    /// Build metrics.json from an evaluation metrics CSV
    GenerateMetrics { csv: PathBuf, out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aicpa_lib::init_tracing();
    let cli = Cli::parse();

    let mut client_config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        client_config = ClientConfig::new(url);
    }
    let session_path = cli.session_file.clone().unwrap_or_else(config::session_file);
    let store: Arc<dyn SessionStore> = Arc::new(
        FileSessionStore::open(&session_path)
            .with_context(|| format!("opening session at {}", session_path.display()))?,
    );
    let client = ApiClient::new(client_config, store.clone());

    match cli.command {
        Command::Login { username, password } => {
            let password = read_secret(password, "Password")?;
            let form = AuthForm::login(&username, &password);
            sign_in(&client, &form).await
        }
        Command::Signup {
            username,
            password,
            admin_code,
        } => {
            let password = read_secret(password, "Password")?;
            let form = AuthForm::signup(&username, &password, admin_code.as_deref().unwrap_or(""));
            sign_in(&client, &form).await
        }
        Command::Logout => {
            auth::logout(store.as_ref())?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            require_session(store.as_ref())?;
            match store.get_user() {
                Some(user) => println!("{} ({}, id {})", user.username, user.role, user.id),
                None => println!("Signed in (user details unavailable)"),
            }
            Ok(())
        }
        Command::GenerateDrugs { csv, out } => {
            let list = aicpa_lib::assets::generate_drugs_json(&csv, &out)?;
            println!("Wrote {} drugs to {}", list.total, out.display());
            Ok(())
        }
        Command::GenerateMetrics { csv, out } => {
            let metrics = aicpa_lib::assets::generate_metrics_json(&csv, &out)?;
            println!("Wrote {} groups to {}", metrics.groups.len(), out.display());
            Ok(())
        }
        Command::Drugs => {
            let drugs = client.fetch_drug_list().await;
            if drugs.is_empty() {
                println!("No drug list available.");
            }
            for drug in drugs {
                println!("{drug}");
            }
            Ok(())
        }
        command => {
            require_session(store.as_ref())?;
            let mut dashboard = Dashboard::new(client);
            run_dashboard(&mut dashboard, command).await.map_err(explain)
        }
    }
}

async fn sign_in(client: &ApiClient, form: &AuthForm) -> anyhow::Result<()> {
    let mut flow = AuthFlow::new(client.session().as_ref());
    flow.submit(client, form).await?;
    if let Some(user) = flow.user() {
        println!("Signed in as {} ({})", user.username, user.role);
    }
    Ok(())
}

fn require_session(store: &dyn SessionStore) -> anyhow::Result<()> {
    if auth::gate(store, Route::Dashboard) == Route::Auth {
        bail!("Not signed in. Run `aicpa login <username>` first.");
    }
    Ok(())
}

fn explain(e: anyhow::Error) -> anyhow::Error {
    match e.downcast_ref::<DashboardError>() {
        Some(de) if de.is_unauthorized() => {
            anyhow::anyhow!("{de}. Your session may have expired; run `aicpa login` again.")
        }
        _ => e,
    }
}

fn read_secret(flag: Option<String>, prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = flag {
        return Ok(Zeroizing::new(value));
    }
    eprint!("{prompt}: ");
    let mut line = Zeroizing::new(String::new());
    std::io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
    Ok(Zeroizing::new(trimmed))
}

fn read_patient(path: &Path) -> anyhow::Result<PatientData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let data = serde_json::from_str(&raw)
        .with_context(|| format!("parsing patient record {}", path.display()))?;
    Ok(data)
}

fn print_current(dashboard: &Dashboard) {
    if let Some(result) = dashboard.current_prediction() {
        let drugs = dashboard.form().assemble().selected_drugs.len();
        print!("{}", render::prediction_report(result, drugs));
    }
}

async fn run_dashboard(dashboard: &mut Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Predict {
            patient,
            save,
            gauge,
            insights_html,
        } => {
            dashboard.form_mut().load(read_patient(&patient)?);
            dashboard.predict_manual().await?;
            print_current(dashboard);
            if let (Some(path), Some(result)) = (gauge, dashboard.current_prediction()) {
                let figure = render::gauge_figure(result.risk_score);
                std::fs::write(&path, serde_json::to_string_pretty(&figure)?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(path) = insights_html {
                let md = dashboard
                    .current_prediction()
                    .and_then(|r| r.ai_recommendations_md.as_deref())
                    .unwrap_or_default();
                std::fs::write(&path, render::markdown_to_html(md))
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if save {
                let record = dashboard.save_to_history().await?;
                println!("\nSaved to history as #{}", record.id);
            }
        }
        Command::Upload { file, kind } => {
            dashboard.predict_upload(kind, &file).await?;
            print_current(dashboard);
        }
        Command::History { show } => {
            let records = dashboard.load_history().await?;
            if records.is_empty() {
                println!("No saved predictions yet.");
            }
            for (i, record) in records.iter().enumerate() {
                let name = record.patient_name.as_deref().unwrap_or("Unnamed patient");
                println!("[{i}] {name}: {}", render::history_line(record));
            }
            if let Some(index) = show {
                dashboard.load_record(index)?;
                println!();
                print_current(dashboard);
            }
        }
        Command::AdminRecords => {
            let records = dashboard.load_admin_records().await?;
            for line in render::admin_lines(records) {
                println!("{line}");
            }
        }
        Command::Metrics => {
            let metrics = dashboard.load_metrics().await?;
            print!("{}", render::bias_audit_table(metrics));
        }
        Command::FeatureImportance => {
            let features = dashboard.load_feature_importance().await;
            if features.is_empty() {
                println!("Feature importance unavailable.");
            }
            for line in render::feature_importance_lines(features) {
                println!("{line}");
            }
        }
        Command::Feedback {
            usefulness,
            accuracy,
            response_time,
            workload_reduction,
            category,
            comments,
        } => {
            let feedback = Feedback {
                usefulness,
                accuracy,
                response_time,
                workload_reduction,
                comments,
                category,
            };
            dashboard.submit_feedback(&feedback).await?;
            println!("Thank you for your feedback.");
        }
        Command::ReportImage { name, out } => {
            match dashboard.client().report_image(name).await {
                ReportImageState::Available(bytes) => {
                    std::fs::write(&out, bytes)
                        .with_context(|| format!("writing {}", out.display()))?;
                    println!("{} saved to {}", name.title(), out.display());
                }
                ReportImageState::Unavailable => bail!("{} is not available", name.title()),
            }
        }
        Command::Login { .. }
        | Command::Signup { .. }
        | Command::Logout
        | Command::Whoami
        | Command::Drugs
        | Command::GenerateDrugs { .. }
        | Command::GenerateMetrics { .. } => {}
    }
    Ok(())
}
