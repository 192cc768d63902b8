use clap::{ArgGroup, Parser, Subcommand};
use mf_domain::*;
use mf_formal::*;
use mf_runner::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "mafia")]
#[command(about = "Encode Mafia games as Prover9/Mace4 theories and read back what Mace4 finds")]
#[command(version)]
struct Cli {
    /// Tracing filter such as `mf_formal=debug`. Falls back to RUST_LOG, then `warn`
    #[arg(long, global = true)]
    log_filter: Option<String>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mace4 executable, overrides the configuration
    #[arg(long, global = true)]
    mace4: Option<String>,

    /// Largest domain Mace4 may search
    #[arg(long, global = true)]
    max_domain: Option<usize>,

    /// Seconds to wait for one Mace4 run
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deal a new scenario and print it as JSON
    New {
        #[arg(long)]
        players: usize,
        #[arg(long)]
        mafia: Option<usize>,
        #[arg(long)]
        doctor: Option<usize>,
        #[arg(long)]
        cop: Option<usize>,
        /// Number of (empty) nights to start with
        #[arg(long, default_value_t = 0)]
        nights: usize,
        /// Shuffle the roles with this seed; unshuffled without it
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Write the theory of every given scenario file
    Generate {
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,
        /// Ground atom added to the assumptions, e.g. `-alive(d,n1)`
        #[arg(long)]
        query: Option<String>,
        /// Ground atom put in the goals list
        #[arg(long)]
        goal: Option<String>,
        /// Directory for the .in files, overrides the configuration
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Print the theories instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// Evaluate the win rule on a game state
    #[command(group(ArgGroup::new("input").required(true).args(["state", "inline"])))]
    CheckWin {
        /// JSON file with players, roles, alive and time
        #[arg(long, short)]
        state: Option<PathBuf>,
        /// The same JSON given inline
        #[arg(long, short)]
        inline: Option<String>,
        /// Ask Mace4 instead of counting heads
        #[arg(long)]
        solver: bool,
    },
    /// Read the first model out of saved Mace4 output
    Parse {
        output: PathBuf,
        /// Only list this predicate
        #[arg(long)]
        predicate: Option<String>,
        /// Argument pattern for the predicate: constants, element numbers or `_`
        #[arg(long, value_delimiter = ',')]
        args: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Ask Mace4 for a model of a scenario, or for one where an atom holds
    Query {
        scenario: PathBuf,
        atom: Option<String>,
    },
    /// Check whether a player can be alive, or dead, at a time point
    CheckAlive {
        scenario: PathBuf,
        player: String,
        /// Time point index, `1` for n1
        time: usize,
    },
    /// Replay a scenario without the solver
    Simulate { scenario: PathBuf },
    /// Suggest moves for a player's next night
    Suggest {
        scenario: PathBuf,
        player: String,
        /// Ask Mace4 whether each suggestion's effect is certain
        #[arg(long)]
        verify: bool,
    },
}

fn setup_tracing(filter: Option<&str>) -> Result<(), String> {
    let filter = match filter {
        Some(f) => {
            EnvFilter::try_new(f).map_err(|err| format!("Invalid log filter.\n{}", err))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> RunnerResult<RunnerConfig> {
    let mut config = RunnerConfig::load(cli.config.as_deref())?;
    if let Some(exe) = &cli.mace4 {
        config.solver.executable = exe.clone();
    }
    if let Some(n) = cli.max_domain {
        config.solver.max_domain = n;
    }
    if let Some(secs) = cli.timeout {
        config.solver.timeout_secs = secs;
    }
    Ok(config)
}

fn read_input(path: &Path) -> RunnerResult<String> {
    Ok(std::fs::read_to_string(path).map_err(MafiaError::from)?)
}

fn invalid_input(msg: &str) -> RunnerError {
    RunnerError::Domain(MafiaError::InvalidState(msg.to_owned()))
}

fn load_scenario(path: &Path) -> RunnerResult<Scenario> {
    Ok(Scenario::from_json(&read_input(path)?)?)
}

fn print_result(result: &ParseResult) {
    match result {
        ParseResult::Model(model) => {
            print!("{}", model);
            for d in &model.diagnostics {
                println!("skipped: {d}");
            }
        }
        ParseResult::RawFallback(raw) => println!("{:?}: {}", raw.reason, raw.detail),
    }
}

fn exit_code(errors: &[RunnerError]) -> ExitCode {
    if errors.is_empty() {
        ExitCode::SUCCESS
    } else if errors.iter().all(|e| e.is_bad_input()) {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

async fn run(cli: Cli) -> RunnerResult<ExitCode> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::New {
            players,
            mafia,
            doctor,
            cop,
            nights,
            seed,
            out,
        } => {
            let d = RoleCounts::default_for(players);
            let counts = RoleCounts::new(
                mafia.unwrap_or(d.mafia),
                doctor.unwrap_or(d.doctor),
                cop.unwrap_or(d.cop),
            );
            let scenario = match seed {
                Some(seed) => {
                    Scenario::from_counts_shuffled(players, counts, &mut StdRng::seed_from_u64(seed))?
                }
                None => Scenario::from_counts(players, counts)?,
            }
            .with_nights(nights);
            let json = scenario.to_json()?;
            match out {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }

        Command::Generate {
            scenarios,
            query,
            goal,
            out_dir,
            stdout,
        } => {
            let mode = match goal {
                Some(g) => Mode::Query(Atom::parse(&g)?),
                None => Mode::ModelFinding,
            };
            let query = query.as_deref().map(Atom::parse).transpose()?;
            let mut config = config;
            if let Some(dir) = out_dir {
                config.output_dir = dir;
            }
            if !stdout {
                std::fs::create_dir_all(&config.output_dir)?;
            }

            let results: Vec<(PathBuf, RunnerResult<(PathBuf, String)>)> = scenarios
                .par_iter()
                .map(|input| {
                    let theory = || -> RunnerResult<(PathBuf, String)> {
                        let scenario = load_scenario(input)?;
                        let mut text = generate(&scenario, &mode)?;
                        if let Some(q) = &query {
                            text = insert_assumption(&text, q)?;
                        }
                        let path = config.theory_path(&scenario);
                        if !stdout {
                            std::fs::write(&path, &text)?;
                        }
                        Ok((path, text))
                    };
                    (input.clone(), theory())
                })
                .collect();

            let mut errors = vec![];
            for (input, result) in results {
                match result {
                    Ok((_, text)) if stdout => print!("{text}"),
                    Ok((path, _)) => println!("{} -> {}", input.display(), path.display()),
                    Err(e) => {
                        eprintln!("{}: {}", input.display(), e);
                        errors.push(e);
                    }
                }
            }
            return Ok(exit_code(&errors));
        }

        Command::CheckWin {
            state,
            inline,
            solver,
        } => {
            let json = match (state, inline) {
                (Some(path), _) => read_input(&path)?,
                (None, Some(json)) => json,
                (None, None) => {
                    return Err(invalid_input("one of --state and --inline is required"))
                }
            };
            let state = GameState::from_json(&json)?;
            let verdict = check_state(&state)?;
            if solver {
                let session = SolverSession::locate(&config.solver)?;
                let check = session.check_state_win(Uuid::new_v4(), &state).await?;
                match check.verdict() {
                    Some(v) => println!("{v} (Mace4)"),
                    None => println!("Both win predicates hold (Mace4)"),
                }
            } else {
                println!("{verdict}");
            }
        }

        Command::Parse {
            output,
            predicate,
            args,
            json,
        } => {
            let text = read_input(&output)?;
            let result = parse(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(ExitCode::SUCCESS);
            }
            match (&result, predicate) {
                (ParseResult::Model(model), Some(p)) => {
                    let pattern: Vec<ArgPattern> = args.iter().map(|a| ArgPattern::parse(a)).collect();
                    match summarize(model, &p, &pattern) {
                        Summary::Facts(facts) => {
                            for f in facts {
                                println!("{f}");
                            }
                        }
                        Summary::NotFound => println!("the model has no relation {p}"),
                    }
                }
                _ => print_result(&result),
            }
        }

        Command::Query { scenario, atom } => {
            let scenario = load_scenario(&scenario)?;
            let session = SolverSession::locate(&config.solver)?;
            let result = match atom {
                Some(a) => session.query(&scenario, &Atom::parse(&a)?).await?,
                None => session.find_model(&scenario).await?,
            };
            print_result(&result);
        }

        Command::CheckAlive {
            scenario,
            player,
            time,
        } => {
            let scenario = load_scenario(&scenario)?;
            let session = SolverSession::locate(&config.solver)?;
            let check = session
                .check_alive(&scenario, &Player::from(player.as_str()), time)
                .await?;
            let at = time_point(time);
            match check.decided() {
                Some(true) => println!("{player} is alive at {at}"),
                Some(false) => println!("{player} is dead at {at}"),
                None if check.can_be_alive => println!("{player} may be alive or dead at {at}"),
                None => println!("no model of the scenario was found"),
            }
        }

        Command::Simulate { scenario } => {
            let scenario = load_scenario(&scenario)?;
            scenario.check()?;
            let timeline = scenario.simulate();
            for round in &timeline.rounds {
                let night = round.night;
                match (&round.killed, &round.saved) {
                    (Some(p), _) => println!("night {night}: {p} was killed"),
                    (None, Some(p)) => println!("night {night}: {p} was saved"),
                    (None, None) => println!("night {night}: nobody died"),
                }
                if let Some(tally) = &round.tally {
                    let counts: Vec<String> =
                        tally.counts.iter().map(|(p, n)| format!("{p}:{n}")).collect();
                    let out = tally
                        .eliminated
                        .as_ref()
                        .map_or("nobody".to_owned(), |p| p.to_string());
                    println!("day {night}: {} -> {out} voted out", counts.join(" "));
                }
                let alive: Vec<&str> = timeline
                    .at(night + 1)
                    .iter()
                    .map(|p| p.as_str())
                    .collect();
                println!("alive at {}: {}", time_point(night + 1), alive.join(" "));
            }
            println!("{}", evaluate(timeline.last(), &scenario.roles));
        }

        Command::Suggest {
            scenario,
            player,
            verify,
        } => {
            let game = GameSession::new(load_scenario(&scenario)?)?;
            let suggestions = suggest(&game, &player)?;
            let session = if verify {
                Some(SolverSession::locate(&config.solver)?)
            } else {
                None
            };
            for s in &suggestions {
                match &session {
                    Some(solver) => {
                        let ok = solver.verify(&game, &Player::from(player.as_str()), s).await?;
                        let note = if ok { "holds in every model" } else { "not guaranteed" };
                        println!("{s} [{note}]");
                    }
                    None => println!("{s}"),
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(msg) = setup_tracing(cli.log_filter.as_deref()) {
        eprintln!("{msg}");
        return ExitCode::from(2);
    }
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            exit_code(&[e])
        }
    }
}
