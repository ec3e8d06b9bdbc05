mod logging;
mod measure;

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, ValueEnum};
use replen_core::{Solution, Solver, SolverConfig, WarmStart};
use replen_highs::HighsSolver;
use replen_policy::scenario::{reference_network, reference_network_with_capacity, single_chain};
use replen_policy::{
    BuildOptions, EmissionPricing, ModelBuilder, NetworkConfig, ReorderPolicy, Sourcing,
    WarmStartHeuristic,
};
use serde::Serialize;
use tracing::info;

use crate::measure::{MeasurementRecorder, StageMeasurement};

const SCHEMA_VERSION: u32 = 1;

/// Build and solve replenishment model variants, cold and warm, and record
/// per-stage timings as JSONL.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Networks to run
    #[arg(
        long = "scenario",
        value_enum,
        value_delimiter = ',',
        default_value = "chain"
    )]
    scenarios: Vec<Scenario>,

    /// Reorder-point formulations to run
    #[arg(
        long = "policy",
        value_enum,
        value_delimiter = ',',
        default_value = "explicit"
    )]
    policies: Vec<PolicyArg>,

    #[arg(long, value_enum, default_value = "home")]
    sourcing: SourcingArg,

    /// Cap inventory at storage capacity
    #[arg(long)]
    capacity: bool,

    /// Price emissions with this weight
    #[arg(long)]
    emission_weight: Option<f64>,

    /// Force ending inventory back to initial levels
    #[arg(long)]
    closed_horizon: bool,

    /// Solve without hints, with the heuristic start, or both
    #[arg(long, value_enum, default_value = "both")]
    start: StartArg,

    #[arg(long)]
    time_limit: Option<f64>,

    #[arg(long)]
    mip_gap: Option<f64>,

    /// Number of repetitions per case
    #[arg(long, default_value_t = 1)]
    repetitions: u32,

    /// JSONL output artifact path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log filter (overrides REPLEN_TRACE)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum Scenario {
    Chain,
    Reference,
    ReferenceCapacity,
}

impl Scenario {
    fn as_str(self) -> &'static str {
        match self {
            Scenario::Chain => "chain",
            Scenario::Reference => "reference",
            Scenario::ReferenceCapacity => "reference-capacity",
        }
    }

    fn network(self) -> Result<NetworkConfig, replen_policy::ConfigError> {
        match self {
            Scenario::Chain => single_chain(),
            Scenario::Reference => reference_network(),
            Scenario::ReferenceCapacity => reference_network_with_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum PolicyArg {
    Explicit,
    Simplified,
}

impl From<PolicyArg> for ReorderPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Explicit => ReorderPolicy::Explicit,
            PolicyArg::Simplified => ReorderPolicy::Simplified,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum SourcingArg {
    Home,
    Multi,
}

impl From<SourcingArg> for Sourcing {
    fn from(arg: SourcingArg) -> Self {
        match arg {
            SourcingArg::Home => Sourcing::Home,
            SourcingArg::Multi => Sourcing::Multi,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum StartArg {
    Cold,
    Warm,
    Both,
}

impl StartArg {
    fn modes(self) -> &'static [bool] {
        match self {
            StartArg::Cold => &[false],
            StartArg::Warm => &[true],
            StartArg::Both => &[false, true],
        }
    }
}

/// One JSONL line: a single stage of a single case.
#[derive(Debug, Clone, Serialize)]
struct StageRecord {
    schema_version: u32,
    run_id: String,
    scenario: &'static str,
    variant: String,
    start: &'static str,
    repetition: u32,
    variables: usize,
    constraints: usize,
    stage: &'static str,
    duration_ms: f64,
    solver_status: &'static str,
    objective_value: Option<f64>,
    mip_gap: Option<f64>,
    rss_before_bytes: Option<u64>,
    rss_after_bytes: Option<u64>,
    rss_delta_bytes: Option<i64>,
}

struct CaseExecution {
    variables: usize,
    constraints: usize,
    solution: Solution,
    stages: Vec<StageMeasurement>,
}

impl CaseExecution {
    fn stage_ms(&self, stage: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|measured| measured.stage == stage)
            .map(|measured| measured.duration_ms)
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::enable_logging(cli.log_level.clone())?;
    if cli.repetitions == 0 {
        return Err(boxed_input_error("repetitions must be greater than zero"));
    }

    let run_id = build_run_id()?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("artifacts/bench/{run_id}.jsonl")));
    let config = solver_config(&cli);
    config.validate()?;

    let mut records = Vec::new();
    for scenario in &cli.scenarios {
        let network = scenario.network()?;
        for policy in &cli.policies {
            let options = build_options(&cli, *policy);
            let variant = variant_name(&options);
            for warm in cli.start.modes() {
                for repetition in 1..=cli.repetitions {
                    let execution = execute_case(&network, &options, &config, *warm)?;
                    info!(
                        component = "bench",
                        operation = "run_case",
                        status = "success",
                        scenario = scenario.as_str(),
                        variant = variant.as_str(),
                        warm_start = *warm,
                        repetition,
                        solver_status = execution.solution.status_string(),
                        objective_value = execution.solution.objective_value,
                        build_ms = execution.stage_ms("build"),
                        heuristic_ms = execution.stage_ms("heuristic"),
                        solve_ms = execution.stage_ms("solve"),
                        duration_ms = execution.stage_ms("total"),
                        "Finished benchmark case"
                    );
                    records.extend(stage_records(
                        &run_id,
                        scenario.as_str(),
                        &variant,
                        *warm,
                        repetition,
                        &execution,
                    ));
                }
            }
        }
    }

    write_records_jsonl(&output_path, &records)?;
    println!("artifact: {}", output_path.display());
    Ok(())
}

fn build_options(cli: &Cli, policy: PolicyArg) -> BuildOptions {
    let mut options = BuildOptions::new()
        .with_reorder_policy(policy.into())
        .with_sourcing(cli.sourcing.into())
        .with_capacity_cap(cli.capacity)
        .with_closed_horizon(cli.closed_horizon);
    if let Some(weight) = cli.emission_weight {
        options = options.with_emissions(EmissionPricing::new(weight));
    }
    options
}

fn variant_name(options: &BuildOptions) -> String {
    let mut name = format!(
        "{}+{}",
        options.reorder_policy.as_str(),
        options.sourcing.as_str()
    );
    if options.capacity_cap {
        name.push_str("+capacity");
    }
    if options.emissions.is_some() {
        name.push_str("+emissions");
    }
    if options.closed_horizon {
        name.push_str("+closed");
    }
    name
}

fn solver_config(cli: &Cli) -> SolverConfig {
    let mut config = SolverConfig::new();
    if let Some(limit) = cli.time_limit {
        config = config.with_time_limit(limit);
    }
    if let Some(gap) = cli.mip_gap {
        config = config.with_mip_gap(gap);
    }
    config
}

fn execute_case(
    network: &NetworkConfig,
    options: &BuildOptions,
    config: &SolverConfig,
    warm: bool,
) -> Result<CaseExecution, Box<dyn std::error::Error>> {
    let mut recorder = MeasurementRecorder::new();
    let built = recorder.measure("build", || {
        ModelBuilder::new(network, options.clone()).build()
    })?;

    let start: Option<WarmStart> = if warm {
        let heuristic = WarmStartHeuristic::new(network);
        let start = recorder.measure("heuristic", || {
            heuristic
                .plan()
                .map(|plan| heuristic.apply(&plan, &built.handles))
        })?;
        Some(start)
    } else {
        None
    };

    let solution = recorder.measure("solve", || {
        HighsSolver::new().solve(&built.model, config, start.as_ref())
    })?;

    Ok(CaseExecution {
        variables: built.model.num_variables(),
        constraints: built.model.num_constraints(),
        solution,
        stages: recorder.finish(),
    })
}

fn stage_records(
    run_id: &str,
    scenario: &'static str,
    variant: &str,
    warm: bool,
    repetition: u32,
    execution: &CaseExecution,
) -> Vec<StageRecord> {
    execution
        .stages
        .iter()
        .map(|stage| StageRecord {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.to_string(),
            scenario,
            variant: variant.to_string(),
            start: if warm { "warm" } else { "cold" },
            repetition,
            variables: execution.variables,
            constraints: execution.constraints,
            stage: stage.stage,
            duration_ms: stage.duration_ms,
            solver_status: execution.solution.status_string(),
            objective_value: execution.solution.objective_value,
            mip_gap: execution.solution.mip_gap,
            rss_before_bytes: stage.rss_before_bytes,
            rss_after_bytes: stage.rss_after_bytes,
            rss_delta_bytes: stage.rss_delta_bytes(),
        })
        .collect()
}

fn write_records_jsonl(
    path: &Path,
    records: &[StageRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn build_run_id() -> Result<String, Box<dyn std::error::Error>> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| std::io::Error::other(err.to_string()))?
        .as_millis();
    Ok(format!("bench_{millis}"))
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("replen-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn variant_names_list_enabled_toggles() {
        let options = BuildOptions::new()
            .with_reorder_policy(ReorderPolicy::Simplified)
            .with_capacity_cap(true)
            .with_emissions(EmissionPricing::default());
        assert_eq!(variant_name(&options), "simplified+home+capacity+emissions");
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = parse(&[
            "--scenario",
            "chain,reference",
            "--policy",
            "explicit,simplified",
            "--start",
            "warm",
            "--mip-gap",
            "0.01",
        ]);
        assert_eq!(cli.scenarios, vec![Scenario::Chain, Scenario::Reference]);
        assert_eq!(cli.policies.len(), 2);
        assert_eq!(cli.start.modes(), &[true]);
        assert_eq!(solver_config(&cli).mip_gap, Some(0.01));
    }

    #[test]
    fn chain_case_records_every_stage() {
        let cli = parse(&["--start", "warm", "--mip-gap", "0"]);
        let network = single_chain().unwrap();
        let options = build_options(&cli, PolicyArg::Explicit);
        let execution = execute_case(&network, &options, &solver_config(&cli), true).unwrap();

        let records = stage_records("run", "chain", "explicit+home", true, 1, &execution);
        let stages: Vec<&str> = records.iter().map(|record| record.stage).collect();
        assert_eq!(stages, vec!["build", "heuristic", "solve", "total"]);
        assert!(records.iter().all(|record| record.start == "warm"));
        let objective = records[0].objective_value.unwrap();
        assert!((objective - 230.0).abs() < 1e-6, "objective={objective}");

        let line = serde_json::to_string(&records[3]).unwrap();
        assert!(line.contains("\"stage\":\"total\""));
    }

    #[test]
    fn artifact_holds_one_line_per_stage() {
        let cli = parse(&["--start", "cold"]);
        let network = single_chain().unwrap();
        let options = build_options(&cli, PolicyArg::Simplified);
        let execution = execute_case(&network, &options, &solver_config(&cli), false).unwrap();
        let records = stage_records("run", "chain", "simplified+home", false, 1, &execution);

        let path =
            std::env::temp_dir().join(format!("replen-bench-{}.jsonl", std::process::id()));
        write_records_jsonl(&path, &records).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written.lines().count(), 3);
        assert!(written.lines().all(|line| line.contains("\"start\":\"cold\"")));
    }
}
