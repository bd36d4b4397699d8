//! CLI entry point for the IDA* solver.
//!
//! Usage:
//!   ida-star maze <maze.json> [options]
//!   ida-star graph --stdin [options]
//!
//! Options:
//!   --max-iterations <n>      Bounded iterations before giving up (default: 1024)
//!   --visited-scope <scope>   Duplicate suppression: iteration | path (default: iteration)
//!   --progress                Print each progress event as a JSON line on stderr
//!   -v                        Raise log verbosity (repeat for more)

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ida_star::graph::Graph;
use ida_star::maze::Maze;
use ida_star::{
    AlgorithmFlag, AlgorithmState, IterativeDeepeningAStar, Node, ObservableAlgorithm,
    ProblemError, SearchConfig, SearchOutcome, SearchProblem, VisitedScope, MAX_ITERATIONS,
};

#[derive(Parser)]
#[command(name = "ida-star")]
#[command(about = "Least-cost path search with iterative deepening A*")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a grid maze
    Maze {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Solve a weighted graph
    Graph {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Path to the problem JSON file (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read the problem from stdin instead of a file
    #[arg(long)]
    stdin: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Maximum number of bounded iterations
    #[arg(long, default_value_t = MAX_ITERATIONS)]
    max_iterations: usize,

    /// Scope of duplicate suppression
    #[arg(long, value_enum, default_value_t = ScopeArg::Iteration)]
    visited_scope: ScopeArg,

    /// Print progress events on stderr
    #[arg(long)]
    progress: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    /// Never revisit a step within one iteration
    Iteration,
    /// Only reject steps on the current path
    Path,
}

impl From<ScopeArg> for VisitedScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Iteration => VisitedScope::Iteration,
            ScopeArg::Path => VisitedScope::Path,
        }
    }
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        SearchConfig {
            max_iterations: self.max_iterations,
            visited_scope: self.visited_scope.into(),
        }
    }
}

/// Output format for a search run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchReport<S> {
    outcome: &'static str,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<u64>,
    path: Vec<S>,
    iterations: usize,
    nodes_expanded: u64,
    time_elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<Vec<String>>,
}

/// One line of `--progress` output
#[derive(Serialize)]
struct ProgressEvent<'a, F, S> {
    flag: AlgorithmFlag,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'a S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    factor: Option<&'a F>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Maze { input, search } => read_input(input)
            .and_then(|json| Maze::from_json(&json))
            .map(|maze| {
                solve(
                    &maze,
                    search,
                    |goal| goal.level() as u64,
                    |steps| Some(maze.render(steps)),
                )
            })
            .and_then(print_report),
        Commands::Graph { input, search } => read_input(input)
            .and_then(|json| Graph::from_json(&json))
            .map(|graph| solve(&graph, search, |goal| goal.step().cost, |_| None))
            .and_then(print_report),
    };

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: &InputArgs) -> Result<String, ProblemError> {
    if input.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    match &input.file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Err(ProblemError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "must provide either a file path or --stdin",
        ))),
    }
}

fn solve<P>(
    problem: &P,
    args: &SearchArgs,
    cost: impl Fn(&Node<P::Factor, P::Step>) -> u64,
    render: impl Fn(&[P::Step]) -> Option<Vec<String>>,
) -> SearchReport<P::Step>
where
    P: SearchProblem,
    P::Step: Serialize,
    P::Factor: Serialize,
{
    let config = args.config();
    let algorithm = IterativeDeepeningAStar;
    let show_progress = args.progress;

    let mut observer = |state: &AlgorithmState<P::Factor, P::Step>| {
        if show_progress {
            print_progress(state);
        }
    };
    let result = algorithm.run_observed(problem, &config, &mut observer);

    let path = result.goal().map(|goal| goal.steps()).unwrap_or_default();
    let rendered = match &result.outcome {
        SearchOutcome::Found(_) => render(&path),
        _ => None,
    };

    SearchReport {
        outcome: result.outcome.name(),
        found: result.is_found(),
        cost: result.goal().map(|goal| cost(&**goal)),
        path,
        iterations: result.iterations,
        nodes_expanded: result.nodes_expanded,
        time_elapsed_ms: result.time_elapsed_ms,
        rendered,
    }
}

fn print_progress<F: Serialize, S: Serialize>(state: &AlgorithmState<F, S>) {
    let node = state.node();
    let event = ProgressEvent {
        flag: state.flag(),
        step: node.map(|n| n.step()),
        level: node.map(|n| n.level()),
        factor: node.map(|n| n.factor()),
    };
    match serde_json::to_string(&event) {
        Ok(line) => eprintln!("{}", line),
        Err(e) => tracing::warn!(error = %e, "failed to serialize progress event"),
    }
}

fn print_report<S: Serialize>(report: SearchReport<S>) -> Result<bool, ProblemError> {
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.found)
}
