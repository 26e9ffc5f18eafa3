use std::fs;
use std::path::Path;

use note_gen_core::config::{ParseErrorPolicy, PipelineConfig};
use note_gen_core::corpus::{JsonlParser, LineParser};
use note_gen_core::error::NoteGenError;
use note_gen_core::export::TextExporter;
use note_gen_core::model::generator::generate;
use note_gen_core::model::predictor::{Predictor, PredictorError};
use note_gen_core::model::progress::{read_progress, JsonFileSink, ProgressReporter, TrainingProgress};
use note_gen_core::model::seed::StartSeed;
use note_gen_core::model::vocabulary::{Vocabulary, VocabularyOrder};
use note_gen_core::model::window::build_windows;
use note_gen_core::pipeline::Session;
use tempfile::TempDir;

fn temp_workspace() -> TempDir {
	tempfile::tempdir().expect("create tempdir")
}

fn write_song(dir: &Path, name: &str, notes: &[(u8, f32)]) {
	let lines: Vec<String> = notes
		.iter()
		.map(|(pitch, duration)| format!("{{\"pitch\": {}, \"duration\": {}}}", pitch, duration))
		.collect();
	fs::write(dir.join(name), lines.join("\n")).expect("write song");
}

fn line_config(sequence_length: usize) -> PipelineConfig {
	PipelineConfig {
		sequence_length,
		on_parse_error: ParseErrorPolicy::Fail,
		vocabulary_order: VocabularyOrder::Encounter,
		epochs: 2,
		notes: 4,
		max_order: 2,
		extension: None,
	}
}

struct FavouriteIndex(usize);

impl Predictor for FavouriteIndex {
	fn input_len(&self) -> usize {
		2
	}

	fn predict(&self, _window: &[f32]) -> Result<Vec<f32>, PredictorError> {
		let mut scores = vec![0.0; 4];
		scores[self.0] = 1.0;
		Ok(scores)
	}
}

#[test]
fn scenario_from_two_files() {
	let workspace = temp_workspace();
	fs::write(workspace.path().join("a.txt"), "A\nB\nC\n").expect("write a");
	fs::write(workspace.path().join("b.txt"), "A\nB\nD\n").expect("write b");

	let session = Session::prepare(workspace.path(), &LineParser, line_config(2)).expect("prepare");
	let vocab = session.vocabulary();
	assert_eq!(vocab.tokens(), &["A", "B", "C", "D"]);

	// The window [C, A] spans both files.
	let windows = session.windows();
	assert_eq!(windows.windows(), &[vec![0, 1], vec![1, 2], vec![2, 0], vec![0, 1]]);
	assert_eq!(windows.target_indices(), &[2, 0, 1, 3]);

	let seed = session.seed_window(&StartSeed::Window(0)).expect("seed");
	let output = generate(&seed, &FavouriteIndex(3), vocab, 2).expect("generate");
	assert_eq!(output, vec!["D", "D"]);
}

#[test]
fn trains_generates_and_exports() {
	let workspace = temp_workspace();
	let data = workspace.path().join("data");
	fs::create_dir(&data).expect("create data");
	let motif = [(60, 0.5), (62, 0.5), (64, 1.0), (62, 0.5)];
	let song: Vec<(u8, f32)> = motif.iter().copied().cycle().take(40).collect();
	write_song(&data, "01_song.jsonl", &song);
	write_song(&data, "02_song.jsonl", &song[..12]);

	let config = PipelineConfig {
		sequence_length: 4,
		extension: Some("jsonl".to_owned()),
		epochs: 3,
		..PipelineConfig::default()
	};
	let mut session = Session::prepare(&data, &JsonlParser, config).expect("prepare");
	assert_eq!(session.vocabulary().len(), 3);
	assert_eq!(session.windows().len(), 52 - 4);

	let state_path = workspace.path().join("state.json");
	let mut reporter = ProgressReporter::new(JsonFileSink::new(&state_path));
	let summaries = session.train(&mut reporter).expect("train");
	assert_eq!(summaries.len(), 3);
	assert_eq!(summaries[2].accuracy, 1.0);

	let progress: TrainingProgress = read_progress(&state_path).expect("progress");
	assert_eq!((progress.epoch, progress.total_epochs), (3, 3));

	let notes = session.generate(&StartSeed::Window(0), 8).expect("generate");
	let first_window = session.vocabulary().decode_many(&session.windows().windows()[0]).expect("decode");
	let mut expected: Vec<String> = first_window.clone();
	for k in 0..8 {
		expected.push(expected[k].clone());
	}
	assert_eq!(notes, expected[4..].to_vec());

	let output_dir = workspace.path().join("output").join("midi");
	let path = session.export(&TextExporter, &notes, &output_dir).expect("export");
	assert!(path.starts_with(&output_dir));
	assert_eq!(fs::read_to_string(&path).expect("read export").lines().count(), 8);
}

#[test]
fn generation_is_repeatable_for_a_fixed_seed() {
	let workspace = temp_workspace();
	fs::write(workspace.path().join("song.txt"), "A\nB\nA\nC\nA\nB\nA\nD\nA\nB\n").expect("write song");

	let mut session = Session::prepare(workspace.path(), &LineParser, line_config(2)).expect("prepare");
	let mut reporter = ProgressReporter::new(Vec::<TrainingProgress>::new());
	session.train(&mut reporter).expect("train");

	let seed = StartSeed::Custom(vec!["A".to_owned(), "B".to_owned()]);
	let a = session.generate(&seed, 12).expect("first run");
	let b = session.generate(&seed, 12).expect("second run");
	assert_eq!(a, b);
	assert_eq!(a.len(), 12);
}

#[test]
fn untrained_session_refuses_to_generate() {
	let workspace = temp_workspace();
	fs::write(workspace.path().join("song.txt"), "A\nB\nC\nA\n").expect("write song");

	let session = Session::prepare(workspace.path(), &LineParser, line_config(2)).expect("prepare");
	let err = session.generate(&StartSeed::Random, 3).expect_err("untrained");
	assert!(matches!(err, NoteGenError::PredictorContract(_)));
	// Zero notes never reaches the predictor.
	assert!(session.generate(&StartSeed::Random, 0).expect("zero notes").is_empty());
}

#[test]
fn short_corpus_cannot_form_a_window() {
	let workspace = temp_workspace();
	fs::write(workspace.path().join("song.txt"), "A\nB\n").expect("write song");

	let err = Session::prepare(workspace.path(), &LineParser, line_config(2)).expect_err("too short");
	assert!(matches!(err, NoteGenError::WindowTooLong { length: 2, corpus_len: 2 }));
}

#[test]
fn artifacts_restore_the_same_generator() {
	let workspace = temp_workspace();
	let data = workspace.path().join("data");
	fs::create_dir(&data).expect("create data");
	fs::write(data.join("song.txt"), "A\nB\nC\nD\nA\nB\nC\nD\nA\n").expect("write song");

	let mut session = Session::prepare(&data, &LineParser, line_config(2)).expect("prepare");
	let mut reporter = ProgressReporter::new(Vec::<TrainingProgress>::new());
	session.train(&mut reporter).expect("train");

	let artifacts = workspace.path().join("weights");
	session.save_artifacts(&artifacts).expect("save");

	let restored = Session::restore(&data, &LineParser, line_config(2), &artifacts).expect("restore");
	assert!(restored.is_trained());
	assert_eq!(restored.vocabulary(), session.vocabulary());
	assert_eq!(
		restored.generate(&StartSeed::Window(1), 6).expect("restored"),
		session.generate(&StartSeed::Window(1), 6).expect("fresh session")
	);

	let err = Session::restore(&data, &LineParser, line_config(3), &artifacts).expect_err("shape mismatch");
	assert!(matches!(err, NoteGenError::InvalidConfig(_)));
}

#[test]
fn windows_over_a_sorted_vocabulary_keep_corpus_targets() {
	let corpus = ["E", "C", "D", "C", "E", "D"];
	let vocab = Vocabulary::fit(corpus, VocabularyOrder::Sorted).expect("fit");
	let windows = build_windows(&corpus, &vocab, 3).expect("windows");
	let targets = vocab.decode_many(windows.target_indices()).expect("decode");
	assert_eq!(targets, vec!["C", "E", "D"]);
}
