use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use log::{error, info};
use serde::Deserialize;
use note_gen_core::config::PipelineConfig;
use note_gen_core::corpus::JsonlParser;
use note_gen_core::export::TextExporter;
use note_gen_core::io::{list_files, validate_folder};
use note_gen_core::model::progress::{read_progress, JsonFileSink, ProgressReporter};
use note_gen_core::model::seed::StartSeed;
use note_gen_core::pipeline::Session;

const DATA_DIR: &str = "./data/midi-json";
const OUTPUT_DIR: &str = "./output";
const STATE_FILE: &str = "./output/state.json";
/// Upper bound on notes generated by one request.
const MAX_NOTES: usize = 10_000;

/// Query parameters for the `/v1/train` endpoint.
///
/// Values are kept as strings and validated by `PipelineConfig::apply_settings`.
#[derive(Deserialize)]
struct TrainParams {
	epochs: Option<String>,
	notes: Option<String>,
	sequence_length: Option<String>,
}

/// Query parameters for the `/v1/generate` endpoint.
#[derive(Deserialize)]
struct GenerateParams {
	notes: Option<usize>,
	seed: Option<String> // random, window:<k> or custom:<t1>,<t2>,...
}

struct SharedData {
	config: PipelineConfig,
	session: Option<Arc<Session>>
}

/// Number of notes to generate, `requested` or else `default`, at most `MAX_NOTES`.
fn note_count(requested: Option<usize>, default: usize) -> Result<usize, String> {
	let notes = requested.unwrap_or(default);
	if notes > MAX_NOTES {
		return Err(format!("Cannot generate {} notes, the limit is {}", notes, MAX_NOTES));
	}
	Ok(notes)
}

impl TrainParams {
	fn settings(&self) -> HashMap<String, String> {
		[("epochs", &self.epochs), ("notes", &self.notes), ("sequence_length", &self.sequence_length)]
			.into_iter()
			.filter_map(|(key, value)| value.as_ref().map(|v| (key.to_owned(), v.clone())))
			.collect()
	}
}

/// Ingests the data folder, trains, generates `notes` notes and exports them.
///
/// Returns the trained session and the path of the exported notes.
fn run_training(config: PipelineConfig) -> Result<(Session, String), note_gen_core::error::NoteGenError> {
	let output = validate_folder(OUTPUT_DIR)?;
	let mut session = Session::prepare(Path::new(DATA_DIR), &JsonlParser, config)?;
	let mut reporter = ProgressReporter::new(JsonFileSink::new(STATE_FILE));
	session.train(&mut reporter)?;
	session.save_artifacts(&output.join("weights"))?;

	let notes = session.generate(&StartSeed::Random, session.config().notes)?;
	let path = session.export(&TextExporter, &notes, &output.join("notes"))?;
	Ok((session, path.display().to_string()))
}

#[put("/v1/train")]
async fn put_train(data: web::Data<Mutex<SharedData>>, query: web::Query<TrainParams>) -> impl Responder {
	let mut config = match data.lock() {
		Ok(shared_data) => shared_data.config.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	if let Err(e) = config.apply_settings(&query.settings()) {
		return HttpResponse::BadRequest().body(e.to_string());
	}
	if let Err(e) = note_count(None, config.notes) {
		return HttpResponse::BadRequest().body(e);
	}

	// Training is blocking work, keep it off the async workers
	let (session, path) = match web::block(move || run_training(config)).await {
		Ok(Ok(result)) => result,
		Ok(Err(e)) => {
			error!("Training failed: {}", e);
			return HttpResponse::InternalServerError().body(e.to_string());
		}
		Err(_) => return HttpResponse::InternalServerError().body("Training task failed"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	shared_data.config = session.config().clone();
	shared_data.session = Some(Arc::new(session));
	info!("Training finished, notes exported to {}", path);
	HttpResponse::Ok().body(path)
}

#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let seed = match &query.seed {
		None => StartSeed::Random,
		Some(s) => match StartSeed::parse(s) {
			Ok(seed) => seed,
			Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
		},
	};

	// The lock is only held to clone the session handle
	let session = match data.lock() {
		Ok(shared_data) => shared_data.session.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	let session = match session {
		Some(session) => session,
		None => return HttpResponse::Conflict().body("No trained session, call /v1/train first"),
	};
	let notes = match note_count(query.notes, session.config().notes) {
		Ok(notes) => notes,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	match web::block(move || session.generate(&seed, notes)).await {
		Ok(Ok(result)) => HttpResponse::Ok().body(result.join("\n")),
		Ok(Err(e)) => HttpResponse::InternalServerError().body(e.to_string()),
		Err(_) => HttpResponse::InternalServerError().body("Generation task failed"),
	}
}

#[get("/v1/progress")]
async fn get_progress() -> impl Responder {
	match read_progress(STATE_FILE) {
		Ok(progress) => HttpResponse::Ok().json(progress),
		Err(_) => HttpResponse::NotFound().body("No training progress recorded")
	}
}

#[get("/v1/files")]
async fn get_files(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let extension = match data.lock() {
		Ok(shared_data) => shared_data.config.extension.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	match list_files(DATA_DIR, extension.as_deref()) {
		Ok(files) => HttpResponse::Ok().body(
			files
				.iter()
				.filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
				.collect::<Vec<_>>()
				.join("\n"),
		),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list input files")
	}
}

/// Main entry point for the server.
///
/// Starts without a trained session; `PUT /v1/train` builds one from the
/// files in `DATA_DIR`. The session is wrapped in a `Mutex` and shared by
/// all workers.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - `./config.json` is loaded at startup when present.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = match PipelineConfig::load("./config.json") {
		Ok(config) => config,
		Err(e) => {
			info!("Using default configuration ({})", e);
			PipelineConfig::default()
		}
	};
	let shared_data = SharedData {
		config,
		session: None,
	};
	let shared_session = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.app_data(shared_session.clone())
			.service(put_train)
			.service(get_generated)
			.service(get_progress)
			.service(get_files)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
