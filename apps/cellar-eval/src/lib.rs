use std::{
	fs,
	path::{Path, PathBuf},
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};

use cellar_service::{CellarService, ResolutionMethod, ResolvedLine, Stores};

#[derive(Debug, Parser)]
#[command(
	version = cellar_cli::VERSION,
	rename_all = "kebab",
	styles = cellar_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 's', value_name = "FILE")]
	pub snapshot: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	#[arg(long, short = 'k', value_name = "N", default_value_t = 5)]
	pub k: usize,
}

#[derive(Debug, Deserialize)]
struct EvalDataset {
	name: Option<String>,
	/// Client used for cases that do not name one.
	client_code: Option<String>,
	cases: Vec<EvalCase>,
}

#[derive(Debug, Deserialize)]
struct EvalCase {
	id: Option<String>,
	query: String,
	client_code: Option<String>,
	expected_item_no: String,
}

#[derive(Debug, Serialize)]
struct EvalOutput {
	dataset: EvalDatasetInfo,
	settings: EvalSettings,
	summary: EvalSummary,
	cases: Vec<CaseReport>,
}

#[derive(Debug, Serialize)]
struct EvalDatasetInfo {
	name: String,
	case_count: usize,
}

#[derive(Debug, Serialize)]
struct EvalSettings {
	config_path: String,
	snapshot_path: String,
	k: usize,
	confirm_threshold: f32,
}

#[derive(Debug, Serialize)]
struct EvalSummary {
	top1_accuracy: f64,
	hit_at_k: f64,
	mean_rr: f64,
	auto_confirm_rate: f64,
	/// Share of auto-confirmed cases whose chosen item was the expected one.
	auto_confirm_precision: f64,
	latency_ms_p50: f64,
	latency_ms_p95: f64,
}

#[derive(Debug, Serialize)]
struct CaseReport {
	id: String,
	query: String,
	expected_item_no: String,
	/// One-based position of the expected item among the candidates.
	rank: Option<usize>,
	resolved: bool,
	method: ResolutionMethod,
	chosen_item_no: Option<String>,
	top_score: Option<f32>,
	latency_ms: f64,
	candidate_item_nos: Vec<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cellar_config::load(&args.config)?;

	cellar_cli::init_tracing(&config.service.log_level);

	let dataset = load_dataset(&args.dataset)?;
	let stores = Stores::open(&config, Some(args.snapshot.as_path())).await?;
	let service = CellarService::new(config, stores);
	let k = args.k.max(1);
	let mut reports = Vec::with_capacity(dataset.cases.len());

	for (index, case) in dataset.cases.iter().enumerate() {
		let client = case.client_code.as_deref().or(dataset.client_code.as_deref());
		let started = Instant::now();
		let resolved = service.resolve_order_line(&case.query, None, client).await?;
		let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;

		reports.push(case_report(index, case, &resolved, latency_ms));
	}

	let summary = summarize(&reports, k);

	tracing::info!(
		cases = reports.len(),
		top1_accuracy = summary.top1_accuracy,
		auto_confirm_rate = summary.auto_confirm_rate,
		"Evaluation finished."
	);

	let output = EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.unwrap_or_else(|| "eval".to_string()),
			case_count: reports.len(),
		},
		settings: EvalSettings {
			config_path: args.config.display().to_string(),
			snapshot_path: args.snapshot.display().to_string(),
			k,
			confirm_threshold: service.cfg.resolution.confirm_threshold,
		},
		summary,
		cases: reports,
	};
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: EvalDataset = serde_json::from_str(&raw)?;

	if dataset.cases.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one case."));
	}
	if let Some(case) = dataset.cases.iter().find(|case| case.expected_item_no.trim().is_empty()) {
		return Err(eyre::eyre!("Case {:?} has an empty expected_item_no.", case.query));
	}

	Ok(dataset)
}

fn case_report(
	index: usize,
	case: &EvalCase,
	resolved: &ResolvedLine,
	latency_ms: f64,
) -> CaseReport {
	let candidates = resolved.result.candidates();
	let candidate_item_nos =
		candidates.iter().map(|candidate| candidate.item_no.clone()).collect::<Vec<_>>();
	let rank = candidate_item_nos
		.iter()
		.position(|item_no| *item_no == case.expected_item_no)
		.map(|pos| pos + 1);

	CaseReport {
		id: case.id.clone().unwrap_or_else(|| format!("case-{}", index + 1)),
		query: case.query.clone(),
		expected_item_no: case.expected_item_no.clone(),
		rank,
		resolved: resolved.result.resolved(),
		method: resolved.result.method(),
		chosen_item_no: resolved.result.chosen().map(|chosen| chosen.item_no.clone()),
		top_score: candidates.first().map(|candidate| candidate.score),
		latency_ms,
		candidate_item_nos,
	}
}

fn summarize(reports: &[CaseReport], k: usize) -> EvalSummary {
	let count = reports.len().max(1) as f64;
	let top1 = reports.iter().filter(|report| report.rank == Some(1)).count() as f64;
	let hits = reports.iter().filter(|report| report.rank.is_some_and(|rank| rank <= k)).count();
	let mean_rr = reports
		.iter()
		.map(|report| report.rank.map(|rank| 1.0 / rank as f64).unwrap_or(0.0))
		.sum::<f64>()
		/ count;
	let confirmed = reports.iter().filter(|report| report.resolved).collect::<Vec<_>>();
	let correct = confirmed
		.iter()
		.filter(|report| report.chosen_item_no.as_deref() == Some(report.expected_item_no.as_str()))
		.count();
	let auto_confirm_precision =
		if confirmed.is_empty() { 0.0 } else { correct as f64 / confirmed.len() as f64 };
	let mut latencies = reports.iter().map(|report| report.latency_ms).collect::<Vec<_>>();

	latencies.sort_by(|a, b| a.total_cmp(b));

	EvalSummary {
		top1_accuracy: top1 / count,
		hit_at_k: hits as f64 / count,
		mean_rr,
		auto_confirm_rate: confirmed.len() as f64 / count,
		auto_confirm_precision,
		latency_ms_p50: percentile(&latencies, 0.50),
		latency_ms_p95: percentile(&latencies, 0.95),
	}
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;

		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}
