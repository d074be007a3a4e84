//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::{api, storage::FileGateway, updater};
use chrono::Utc;
use kubel_core::{
    CategoryData, Config, Data, EvaluationSession, KubelError, Person, Selection,
    load_category_data, load_config, load_data, save_config, save_data, today,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// HELPERS
// =============================================================================

/// Directory with the files shipped next to the binary.
fn bundled_resources() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("resources")))
        .filter(|dir| dir.is_dir())
}

/// Validate output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, KubelError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        KubelError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(KubelError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| KubelError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// The three documents of one data directory, loaded and reconciled.
struct Store {
    gateway: FileGateway,
    schema: CategoryData,
    data: Data,
    config: Config,
}

impl Store {
    fn open(dir: &Path) -> Result<Self, KubelError> {
        let gateway = FileGateway::new(dir);
        gateway.bootstrap(bundled_resources().as_deref())?;

        let schema = load_category_data(&gateway)?;
        let mut data = load_data(&gateway)?;
        let config = load_config(&gateway)?;

        let report = data.sync_all(&schema);
        if !report.is_unchanged() {
            tracing::info!(?report, "Stored evaluations reconciled with category definitions");
            save_data(&gateway, &data)?;
        }

        Ok(Self {
            gateway,
            schema,
            data,
            config,
        })
    }

    fn save(&self) -> Result<(), KubelError> {
        save_data(&self.gateway, &self.data)
    }

    fn session(&self, id: &str) -> Result<EvaluationSession<'_>, KubelError> {
        let person = self.data.person(id)?.clone();
        Ok(EvaluationSession::open(person, &self.schema))
    }

    /// Apply `edit` to a session on person `id` and persist the store.
    fn edit<T>(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut EvaluationSession<'_>) -> Result<T, KubelError>,
    ) -> Result<(T, Person), KubelError> {
        let person = self.data.person(id)?.clone();
        let mut session = EvaluationSession::open(person, &self.schema);
        let value = edit(&mut session)?;
        let person = session.into_person();

        self.data.save_person(id, person, Utc::now());
        self.save()?;
        Ok((value, self.data.person(id)?.clone()))
    }
}

fn print_person_line(id: &str, person: &Person) {
    println!(
        "{}  {:<30} {:<12} {}",
        id,
        person.name,
        person.birthday.as_deref().unwrap_or("-"),
        person.last_changed
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(dir: &Path, host: &str, port: u16) -> Result<(), KubelError> {
    let gateway = FileGateway::new(dir);
    gateway.bootstrap(bundled_resources().as_deref())?;
    let state = api::AppState::load(Arc::new(gateway))?;

    println!("KuBel Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Data dir: {}", dir.display());
    println!();
    println!("Endpoints:");
    println!("  GET  /people                 - List people");
    println!("  POST /people/{{id}}/selections - Click an entry");
    println!("  GET  /people/{{id}}/chart      - Development chart");
    println!("  GET  /people/{{id}}/report     - Printable report");
    println!("  GET  /health                 - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Prepare the data directory.
pub fn cmd_init(dir: &Path, resources: Option<&Path>, json_mode: bool) -> Result<(), KubelError> {
    let resources = resources.map(Path::to_path_buf).or_else(bundled_resources);
    let report = FileGateway::new(dir).bootstrap(resources.as_deref())?;

    if json_mode {
        print_json(&serde_json::json!({
            "dataDir": dir.to_string_lossy(),
            "createdDir": report.created_dir,
            "copied": report.copied,
            "createdEmptyData": report.created_empty_data,
        }));
        return Ok(());
    }

    println!("Data directory: {}", dir.display());
    if report.created_dir {
        println!("  created");
    }
    for name in &report.copied {
        println!("  copied {}", name);
    }
    if report.created_empty_data {
        println!("  wrote empty data.json");
    }
    Ok(())
}

// =============================================================================
// PEOPLE COMMANDS
// =============================================================================

/// List people in the configured order.
pub fn cmd_people(dir: &Path, json_mode: bool) -> Result<(), KubelError> {
    let store = Store::open(dir)?;
    let (order, direction) = store.config.person_order();
    let people = store.data.people_sorted(order, direction);

    if json_mode {
        let rows: Vec<api::PersonSummary> = people
            .into_iter()
            .map(|(id, person)| api::PersonSummary::new(id, person))
            .collect();
        print_json(&rows);
        return Ok(());
    }

    if people.is_empty() {
        println!("No people yet. Add one with `kubel add <name>`.");
        return Ok(());
    }
    for (id, person) in people {
        print_person_line(id, person);
    }
    Ok(())
}

pub fn cmd_add(dir: &Path, name: &str, json_mode: bool) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    let id = store.data.add_person(name, &store.schema, Utc::now())?;
    store.save()?;
    tracing::info!(person = %id, "Person created");

    if json_mode {
        print_json(&api::PersonResponse {
            person: store.data.person(&id)?.clone(),
            id,
        });
    } else {
        println!("{}", id);
    }
    Ok(())
}

pub fn cmd_rename(dir: &Path, id: &str, name: &str, json_mode: bool) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    store.data.rename_person(id, name, Utc::now())?;
    store.save()?;

    let person = store.data.person(id)?;
    if json_mode {
        print_json(&api::PersonSummary::new(id, person));
    } else {
        print_person_line(id, person);
    }
    Ok(())
}

pub fn cmd_delete(dir: &Path, id: &str, json_mode: bool) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    let removed = store.data.delete_person(id);
    if removed.is_some() {
        store.save()?;
    }

    if json_mode {
        print_json(&serde_json::json!({ "id": id, "deleted": removed.is_some() }));
    } else if let Some(person) = removed {
        println!("Deleted {}", person.name);
    } else {
        println!("No person with id {}", id);
    }
    Ok(())
}

/// Show a person with the phase results of every category.
pub fn cmd_show(dir: &Path, id: &str, json_mode: bool) -> Result<(), KubelError> {
    let store = Store::open(dir)?;
    let session = store.session(id)?;
    let today = today();

    if json_mode {
        let mut categories = serde_json::Map::new();
        for category_id in store.schema.keys() {
            let summaries = session.phase_summaries(category_id, today)?;
            categories.insert(
                category_id.clone(),
                serde_json::to_value(summaries).unwrap_or_default(),
            );
        }
        print_json(&serde_json::json!({
            "id": id,
            "person": session.person(),
            "currentPhase": session.current_phase(today),
            "phases": categories,
        }));
        return Ok(());
    }

    let person = session.person();
    println!("{}", person.name);
    println!("Birthday: {}", person.birthday.as_deref().unwrap_or("-"));
    println!("Changed:  {}", person.last_changed);
    if let Some(phase) = session.current_phase(today) {
        println!("Phase by age: {}", phase);
    }
    if let Some(note) = &person.note {
        println!("Note: {}", note);
    }

    for (category_id, definition) in &store.schema {
        println!();
        println!("{}", definition.name);
        for summary in session.phase_summaries(category_id, today)? {
            println!(
                "  {} {:<20} {:>5.2}{}",
                if summary.is_current { '>' } else { ' ' },
                summary.name,
                summary.result,
                if summary.unknown > 0 {
                    format!("  ({} unknown)", summary.unknown)
                } else {
                    String::new()
                }
            );
        }
    }
    Ok(())
}

// =============================================================================
// EVALUATION COMMANDS
// =============================================================================

/// Click an entry and report the auto-completion.
pub fn cmd_select(
    dir: &Path,
    id: &str,
    category: &str,
    phase: &str,
    entry: usize,
    selection: Selection,
    json_mode: bool,
) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    let (outcome, person) = store.edit(id, |session| {
        session.select(category, phase, entry, selection)
    })?;

    if json_mode {
        print_json(&api::SelectionResponse::new(outcome, person));
        return Ok(());
    }

    println!(
        "{} / {} #{}: {} -> {}",
        category, phase, entry, outcome.previous, outcome.current
    );
    for message in outcome.cascade.messages() {
        println!("  {}", message);
    }
    Ok(())
}

pub fn cmd_birthday(
    dir: &Path,
    id: &str,
    birthday: Option<&str>,
    json_mode: bool,
) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    let (_, person) = store.edit(id, |session| match birthday {
        Some(value) if !value.trim().is_empty() => session.set_birthday(value, today()),
        _ => {
            session.clear_birthday();
            Ok(())
        }
    })?;

    if json_mode {
        print_json(&api::PersonSummary::new(id, &person));
    } else {
        print_person_line(id, &person);
    }
    Ok(())
}

pub fn cmd_note(dir: &Path, id: &str, note: &str, json_mode: bool) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    let (_, person) = store.edit(id, |session| session.set_note(note))?;

    if json_mode {
        print_json(&serde_json::json!({ "id": id, "note": person.note }));
    } else {
        println!("Note {}", if person.note.is_some() { "saved" } else { "removed" });
    }
    Ok(())
}

pub fn cmd_display(
    dir: &Path,
    id: &str,
    baseline: Option<f64>,
    min_value: Option<f64>,
    json_mode: bool,
) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    let (_, person) = store.edit(id, |session| {
        if let Some(baseline) = baseline {
            session.set_baseline(baseline)?;
        }
        if let Some(min_value) = min_value {
            session.set_min_value(min_value)?;
        }
        Ok(())
    })?;

    let settings = person.display_settings_or_default();
    if json_mode {
        print_json(&settings);
    } else {
        println!("Baseline:  {}", settings.baseline);
        println!("Min value: {}", settings.min_value);
    }
    Ok(())
}

// =============================================================================
// CHART / REPORT COMMANDS
// =============================================================================

pub fn cmd_chart(dir: &Path, id: &str, json_mode: bool) -> Result<(), KubelError> {
    let store = Store::open(dir)?;
    let points = store.session(id)?.chart(today())?;

    if json_mode {
        print_json(&points);
        return Ok(());
    }

    for point in &points {
        println!("{:<30} {:>5.2} (baseline {})", point.name, point.result, point.baseline);
    }
    Ok(())
}

/// Render the text report to a file or stdout.
pub fn cmd_report(
    dir: &Path,
    id: &str,
    output: Option<&Path>,
    json_mode: bool,
) -> Result<(), KubelError> {
    let store = Store::open(dir)?;
    let report = store.session(id)?.report(today())?;

    let rendered = if json_mode {
        serde_json::to_string_pretty(&report)
            .map_err(|e| KubelError::SerializationError(e.to_string()))?
    } else {
        report.render_text()
    };

    match output {
        Some(path) => {
            let path = validate_output_path(path)?;
            std::fs::write(&path, rendered).map_err(|e| {
                KubelError::IoError(format!("Cannot write '{}': {}", path.display(), e))
            })?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

// =============================================================================
// MAINTENANCE COMMANDS
// =============================================================================

/// Reconcile all people and save.
pub fn cmd_sync(dir: &Path, json_mode: bool) -> Result<(), KubelError> {
    let gateway = FileGateway::new(dir);
    let schema = load_category_data(&gateway)?;
    let mut data = load_data(&gateway)?;
    let report = data.sync_all(&schema);
    save_data(&gateway, &data)?;

    if json_mode {
        print_json(&report);
    } else if report.is_unchanged() {
        println!("All {} people already match the definitions", data.people.len());
    } else {
        println!("Reconciled {} people", data.people.len());
        println!("  categories: +{} -{}", report.categories_added, report.categories_removed);
        println!("  phases:     +{} -{}", report.phases_added, report.phases_removed);
        println!("  entries:    +{} -{}", report.entries_added, report.entries_removed);
    }
    Ok(())
}

/// Show the configuration, or change the people list order.
pub fn cmd_config(
    dir: &Path,
    order: Option<&str>,
    orderdir: Option<&str>,
    json_mode: bool,
) -> Result<(), KubelError> {
    let mut store = Store::open(dir)?;
    if order.is_some() || orderdir.is_some() {
        store.config.set_person_list_order(order, orderdir)?;
        save_config(&store.gateway, &store.config)?;
    }

    if json_mode {
        print_json(&store.config);
    } else {
        let (order, direction) = store.config.person_order();
        println!("People list order: {} {}", order, direction);
        println!("Open PDF after save: {}", store.config.open_pdf_after_save);
    }
    Ok(())
}

/// Check the release manifest.
pub async fn cmd_update(url: Option<String>, json_mode: bool) -> Result<(), KubelError> {
    let url = url.unwrap_or_else(updater::update_url_from_env);
    let state = updater::check_for_update(&url).await;

    if json_mode {
        print_json(&state);
        return Ok(());
    }

    match (&state.error, &state.update_version) {
        (Some(error), _) => return Err(KubelError::UpdateError(error.clone())),
        (None, Some(version)) if state.is_update_available => {
            println!("Update available: {} -> {}", state.current_version, version);
            if let Some(notes) = &state.notes {
                println!();
                println!("{}", notes);
            }
            if let Some(link) = &state.url {
                println!();
                println!("Download: {}", link);
            }
        }
        _ => println!("KuBel {} is up to date", state.current_version),
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
