use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use stat_text_core::io::{list_files, normalize_folder, read_corpus};
use stat_text_core::{MarkovModel, NGramStatistics, StatError};

const DATA_FOLDER: &str = "./data";

/// Largest text `/v1/generate` accepts to produce.
const MAX_GENERATE_SIZE: usize = 100_000;

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	size: Option<usize>,
	seed: Option<u64>, // fixed seed -> reproducible text
}

#[derive(Deserialize)]
struct ProbabilityParams {
	text: Option<String>,
	log: Option<bool>,
}

/// Query parameters shared by `/v1/entropy` and `/v1/distribution`
#[derive(Deserialize)]
struct NGramParams {
	length: Option<usize>,
	prefix: Option<String>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
	length: Option<usize>,
}

#[derive(Serialize)]
struct EntropyResponse {
	length: usize,
	prefix: Option<String>,
	entropy: f64,
}

/// Corpus currently loaded and the model fitted on it.
struct Fitted {
	name: String,
	statistics: NGramStatistics,
	model: MarkovModel,
}

struct SharedData {
	data_folder: PathBuf,
	fitted: Option<Fitted>,
}

impl SharedData {
	fn new(data_folder: PathBuf) -> Self {
		Self { data_folder, fitted: None }
	}
}

/// Why a corpus could not be loaded.
enum LoadError {
	Io(std::io::Error),
	Stat(StatError),
}

/// Maps a core error to an HTTP response.
fn error_response(error: StatError) -> HttpResponse {
	match error {
		StatError::InvalidArgument(_) => HttpResponse::BadRequest().body(error.to_string()),
		_ => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

fn no_corpus() -> HttpResponse {
	HttpResponse::Conflict().body("No corpus loaded, call /v1/load_corpus first")
}

/// Loads `{folder}/{name}.txt`, normalizes it and fits an n-gram model of `length`.
fn fit_corpus(folder: &Path, name: &str, length: usize) -> Result<Fitted, LoadError> {
	let raw = read_corpus(folder.join(format!("{name}.txt"))).map_err(LoadError::Io)?;
	let statistics = NGramStatistics::from_raw(&raw);
	let model = statistics.markov(length).map_err(LoadError::Stat)?;
	Ok(Fitted { name: name.to_owned(), statistics, model })
}

/// HTTP GET endpoint `/v1/generate`
///
/// Returns `size` characters (default 100) generated by the fitted model.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let size = query.size.unwrap_or(100);
	if size > MAX_GENERATE_SIZE {
		return HttpResponse::BadRequest().body(format!("size must be <= {MAX_GENERATE_SIZE}"));
	}

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(fitted) = &shared_data.fitted else {
		return no_corpus();
	};

	let result = match query.seed {
		Some(seed) => fitted.model.generate_text_with(size, &mut StdRng::seed_from_u64(seed)),
		None => fitted.model.generate_text(size),
	};

	match result {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/probability`
///
/// Returns the probability (or its natural log with `log=true`) of `text`.
#[get("/v1/probability")]
async fn get_probability(data: web::Data<Mutex<SharedData>>, query: web::Query<ProbabilityParams>) -> impl Responder {
	let text = match &query.text {
		Some(s) if !s.is_empty() => s,
		_ => return HttpResponse::BadRequest().body("Missing or empty text"),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(fitted) = &shared_data.fitted else {
		return no_corpus();
	};

	match fitted.model.string_probability(text, query.log.unwrap_or(false)) {
		Ok(probability) => HttpResponse::Ok().body(probability.to_string()),
		Err(e) => error_response(e),
	}
}

#[get("/v1/entropy")]
async fn get_entropy(data: web::Data<Mutex<SharedData>>, query: web::Query<NGramParams>) -> impl Responder {
	let length = query.length.unwrap_or(1);

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(fitted) = &shared_data.fitted else {
		return no_corpus();
	};

	match fitted.statistics.entropy(length, query.prefix.as_deref()) {
		Ok(entropy) => HttpResponse::Ok().json(EntropyResponse { length, prefix: query.prefix.clone(), entropy }),
		Err(e) => error_response(e),
	}
}

#[get("/v1/distribution")]
async fn get_distribution(data: web::Data<Mutex<SharedData>>, query: web::Query<NGramParams>) -> impl Responder {
	let length = query.length.unwrap_or(1);

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(fitted) = &shared_data.fitted else {
		return no_corpus();
	};

	match fitted.statistics.distribution(length, query.prefix.as_deref()) {
		Ok(distribution) => HttpResponse::Ok().json(distribution),
		Err(e) => error_response(e),
	}
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_folder = match data.lock() {
		Ok(m) => m.data_folder.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(data_folder, "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".txt", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared_data.fitted {
		Some(fitted) => HttpResponse::Ok().body(format!("{} ({}-grams)", fitted.name, fitted.model.n_gram_length())),
		None => no_corpus(),
	}
}

#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.contains("..") {
		return HttpResponse::BadRequest().body("Corpus name must be a plain file name");
	}
	let length = query.length.unwrap_or(2);

	let data_folder = match data.lock() {
		Ok(m) => m.data_folder.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	// Fit outside the lock, the counting pass is bounded by the corpus size
	let fitted = match fit_corpus(&data_folder, name, length) {
		Ok(f) => f,
		Err(LoadError::Io(e)) => return HttpResponse::NotFound().body(format!("Failed to load corpus: {e}")),
		Err(LoadError::Stat(e)) => return error_response(e),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	log::info!(
		"loaded corpus '{}': {} characters, {}-gram model",
		fitted.name,
		fitted.statistics.len(),
		fitted.model.n_gram_length()
	);
	shared_data.fitted = Some(fitted);

	HttpResponse::Ok().body("Corpus loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with no corpus; `/v1/load_corpus` fits a model from `./data/{name}.txt`.
/// The shared state is wrapped in a `Mutex` and the server binds to 127.0.0.1:5000.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let shared_model = web::Data::new(Mutex::new(SharedData::new(normalize_folder(DATA_FOLDER))));

	log::info!("listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_probability)
			.service(get_entropy)
			.service(get_distribution)
			.service(get_corpora)
			.service(get_loaded_corpus)
			.service(put_corpus)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
