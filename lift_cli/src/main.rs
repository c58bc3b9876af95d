use clap::{Args, Parser, Subcommand};
use lift_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Terminal workout set logger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Args, Default)]
struct RemoteArgs {
    /// Override the API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Override the API token
    #[arg(long)]
    token: Option<String>,
}

#[derive(Args, Default)]
struct LogArgs {
    /// Workout type: legs, chest, back, arms, shoulders, full-body (or 1-6)
    #[arg(long = "type", value_name = "TYPE")]
    workout_type: Option<String>,

    /// Notes stored on the workout
    #[arg(long, default_value = "")]
    notes: String,

    /// Body weight to record before starting
    #[arg(long)]
    body_weight: Option<f64>,

    /// Log without a server; sets are kept in the local logbook only
    #[arg(long)]
    offline: bool,

    /// Do not run the background rest timer
    #[arg(long)]
    no_timer: bool,

    #[command(flatten)]
    remote: RemoteArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a workout interactively (default)
    Log(LogArgs),

    /// List known exercises
    Exercises {
        /// Show the built-in list instead of asking the server
        #[arg(long)]
        offline: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Show past workouts from the local logbook
    History {
        /// Maximum number of workouts to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    lift_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Log(args)) => cmd_log(data_dir, &args, &config),
        Some(Commands::Exercises { offline, remote }) => cmd_exercises(offline, &remote, &config),
        Some(Commands::History { limit }) => cmd_history(&data_dir, limit),
        // Bare invocation starts an interactive logging session
        None => cmd_log(data_dir, &LogArgs::default(), &config),
    }
}

fn cmd_log(data_dir: PathBuf, args: &LogArgs, config: &Config) -> Result<()> {
    let workout_type = resolve_workout_type(args.workout_type.as_deref())?;
    let logbook_path = data_dir.join("logbook.csv");

    if args.offline {
        println!("Offline session: sets are kept in the local logbook only.");
        let mut session = Session::offline();
        return run_log_session(&mut session, workout_type, args, &logbook_path);
    }

    let mut store = connect(&args.remote, config);
    let user = store.current_user()?;
    println!("Logged in as {}", user.name);

    // The catalog prefers the server's list so user-added exercises from
    // other devices are selectable; the built-in list covers an outage.
    let catalog = match store.list_exercises() {
        Ok(exercises) => ExerciseCatalog::from_exercises(exercises),
        Err(e) => {
            tracing::warn!("Could not load exercises from the server: {}", e);
            println!("Using the built-in exercise list.");
            ExerciseCatalog::with_seed()
        }
    };
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Exercise catalog problems:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Validation("Invalid exercise catalog".into()));
    }

    let mut session = Session::new(store, catalog);
    run_log_session(&mut session, workout_type, args, &logbook_path)
}

fn cmd_exercises(offline: bool, remote: &RemoteArgs, config: &Config) -> Result<()> {
    let exercises = if offline {
        seed_exercises().to_vec()
    } else {
        match connect(remote, config).list_exercises() {
            Ok(exercises) => exercises,
            Err(e) => {
                tracing::warn!("Could not load exercises from the server: {}", e);
                println!("Using the built-in exercise list.");
                seed_exercises().to_vec()
            }
        }
    };

    println!("Exercises:");
    for exercise in &exercises {
        println!("  [{}] {} ({})", exercise.id, exercise.name, exercise.muscle_group);
    }
    Ok(())
}

fn cmd_history(data_dir: &Path, limit: usize) -> Result<()> {
    let logbook_path = data_dir.join("logbook.csv");
    let sessions = read_sessions(&logbook_path)?;

    if sessions.is_empty() {
        println!("No workouts in the logbook yet.");
        return Ok(());
    }

    println!("Recent workouts:");
    for session in sessions.iter().take(limit) {
        println!(
            "  {}  {:<10} {} sets, {} lbs",
            session.date, session.workout_type, session.sets, session.total_volume
        );
    }
    Ok(())
}

fn connect(remote: &RemoteArgs, config: &Config) -> HttpWorkoutStore {
    let base_url = remote
        .api_url
        .clone()
        .unwrap_or_else(|| config.api.base_url.clone());
    let token = remote.token.clone().or_else(|| config.resolve_token());
    HttpWorkoutStore::new(&base_url, token)
}

fn resolve_workout_type(arg: Option<&str>) -> Result<WorkoutType> {
    match arg {
        Some(s) => parse_workout_type(s),
        None => prompt_workout_type(),
    }
}

fn parse_workout_type(s: &str) -> Result<WorkoutType> {
    WorkoutType::parse(s)
        .or_else(|| s.trim().parse::<i64>().ok().and_then(WorkoutType::from_code))
        .ok_or_else(|| {
            Error::Validation(format!(
                "Unknown workout type '{}' (legs, chest, back, arms, shoulders, full-body)",
                s
            ))
        })
}

fn prompt_workout_type() -> Result<WorkoutType> {
    println!("What are you training?");
    for code in 1..=6 {
        if let Some(workout_type) = WorkoutType::from_code(code) {
            println!("  {}. {}", code, workout_type.label());
        }
    }
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    parse_workout_type(input.trim())
}

/// Interactive logging loop, shared by the online and offline paths
fn run_log_session<S: WorkoutStore>(
    session: &mut Session<S>,
    workout_type: WorkoutType,
    args: &LogArgs,
    logbook_path: &Path,
) -> Result<()> {
    let workout = session.start(workout_type, &args.notes, args.body_weight)?;

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│  {} WORKOUT", workout.workout_type.label().to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Date: {}", workout.date);
    println!("  Type 'help' for commands, 'end' to finish.");
    println!();

    let timer = session.timer();
    let _ticker = if args.no_timer {
        None
    } else {
        Some(Ticker::spawn(timer.clone()))
    };

    let mut input = String::new();
    loop {
        print!("[{}] > ", timer.display());
        io::stdout().flush()?;

        input.clear();
        let bytes = io::stdin().read_line(&mut input)?;
        let line = input.trim();

        if bytes == 0 || line == "end" {
            match finish_workout(session, logbook_path) {
                Ok(()) => break,
                Err(e) => {
                    println!("✗ Could not end the workout: {}", e);
                    if bytes == 0 {
                        // Stdin is closed, so there is no way to retry.
                        return Err(e);
                    }
                    println!("  The workout is still active; try 'end' again.");
                    continue;
                }
            }
        }

        if line.is_empty() {
            continue;
        }

        if let Err(e) = handle_command(session, line) {
            println!("✗ {}", e);
        }
    }

    Ok(())
}

/// End the workout, print its summary and append the logbook.
///
/// Fails only when the store rejects the end; the workout then stays
/// active so the user can retry. Logbook problems are logged without
/// failing the finished workout.
fn finish_workout<S: WorkoutStore>(session: &mut Session<S>, logbook_path: &Path) -> Result<()> {
    let workout = session.end()?;
    let summary = session.summary()?;

    print_summary(&workout, &summary);

    match append_session(logbook_path, &workout, session.sets(), session.catalog()) {
        Ok(count) if count > 0 => println!("  Logbook: {}", logbook_path.display()),
        Ok(_) => {}
        Err(e) => tracing::warn!("Could not write the logbook: {}", e),
    }
    Ok(())
}

fn handle_command<S: WorkoutStore>(session: &mut Session<S>, line: &str) -> Result<()> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "set" => handle_set(session, rest),
        "drop" => handle_drop(session, rest),
        "cancel" => {
            handle_cancel(session);
            Ok(())
        }
        "edit" => handle_edit(session, rest),
        "del" => handle_del(session, rest),
        "new" => handle_new(session, rest),
        "list" => {
            print_exercises(session.catalog());
            Ok(())
        }
        "help" => {
            print_help();
            Ok(())
        }
        _ => Err(Error::Validation(format!(
            "Unknown command '{}' (try 'help')",
            command
        ))),
    }
}

fn handle_set<S: WorkoutStore>(session: &mut Session<S>, args: &str) -> Result<()> {
    const USAGE: &str =
        "Usage: set [exercise] <weight> <reps> [rpe=N] [feel=N] [tempo=T] [notes=...]";

    // notes= swallows the rest of the line, spaces included.
    let (args, notes) = match args.split_once("notes=") {
        Some((head, tail)) => (head.trim(), tail.trim().to_string()),
        None => (args, String::new()),
    };

    let tokens: Vec<&str> = args.split_whitespace().collect();

    // The exercise name may span several words; it ends where the
    // numbers start.
    let weight_pos = tokens
        .iter()
        .position(|t| t.parse::<f64>().is_ok())
        .ok_or_else(|| Error::Validation(USAGE.to_string()))?;
    if tokens.len() < weight_pos + 2 {
        return Err(Error::Validation(USAGE.to_string()));
    }

    // The name may be omitted once an exercise is selected; the
    // selection sticks across sets, and 'edit' and 'new' both set it.
    let exercise_id = if weight_pos == 0 {
        session.draft().exercise_id.ok_or_else(|| {
            Error::Validation(
                "No exercise selected; start with 'set <exercise> <weight> <reps>'".to_string(),
            )
        })?
    } else {
        let name = tokens[..weight_pos].join(" ");
        session
            .catalog()
            .find_by_name(&name)
            .map(|e| e.id)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Unknown exercise '{}' (try 'list', or 'new' to add it)",
                    name
                ))
            })?
    };

    let weight: f64 = tokens[weight_pos]
        .parse()
        .map_err(|_| Error::Validation("Weight must be a number".to_string()))?;
    let reps: u32 = tokens[weight_pos + 1]
        .parse()
        .map_err(|_| Error::Validation("Reps must be a whole number".to_string()))?;

    let mut draft = SetDraft {
        exercise_id: Some(exercise_id),
        weight: Some(weight),
        reps: Some(reps),
        ..SetDraft::default()
    };

    for token in &tokens[weight_pos + 2..] {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| Error::Validation(format!("Unrecognized option '{}'", token)))?;
        match key {
            "rpe" => {
                draft.rpe = Some(value.parse().map_err(|_| {
                    Error::Validation("RPE must be a number".to_string())
                })?);
            }
            "feel" => {
                draft.feel_rating = value.parse().map_err(|_| {
                    Error::Validation("Feel must be a whole number".to_string())
                })?;
            }
            "tempo" => {
                draft.tempo = Tempo::parse(value).ok_or_else(|| {
                    Error::Validation(format!(
                        "Unknown tempo '{}' (normal, pause, touch-and-go, full-reset, slow-eccentric)",
                        value
                    ))
                })?;
            }
            _ => return Err(Error::Validation(format!("Unrecognized option '{}'", key))),
        }
    }
    draft.notes = notes;

    let was_editing = matches!(session.mode(), InputMode::Editing(_));
    *session.draft_mut() = draft;
    let record = session.submit_set()?;

    let name = session
        .catalog()
        .name_of(record.exercise_id)
        .unwrap_or("Unknown exercise");
    if was_editing {
        println!("✓ Set [{}] updated", record.id);
    } else if let Some(parent) = record.dropset_parent_id {
        println!(
            "✓ Drop-set of [{}] logged: {} {}x{}",
            parent, name, record.weight, record.reps
        );
    } else {
        println!(
            "✓ Set #{} logged: {} {}x{}",
            record.set_number, name, record.weight, record.reps
        );
    }
    print_sets(session);
    Ok(())
}

fn handle_drop<S: WorkoutStore>(session: &mut Session<S>, args: &str) -> Result<()> {
    let parent_id = parse_id(args, "Usage: drop <set id>")?;
    session.mark_dropset(parent_id)?;
    println!(
        "Next set will be a drop-set of [{}]. Submit with 'set ...' or 'cancel'.",
        parent_id
    );
    Ok(())
}

fn handle_cancel<S: WorkoutStore>(session: &mut Session<S>) {
    match session.mode() {
        InputMode::Editing(id) => {
            session.cancel_edit();
            println!("Edit of [{}] cancelled", id);
        }
        InputMode::PendingDropset(id) => {
            session.cancel_dropset();
            println!("Drop-set mark on [{}] cancelled", id);
        }
        InputMode::Idle => println!("Nothing to cancel"),
    }
}

fn handle_edit<S: WorkoutStore>(session: &mut Session<S>, args: &str) -> Result<()> {
    let set_id = parse_id(args, "Usage: edit <set id>")?;
    session.begin_edit(set_id)?;

    let draft = session.draft();
    let name = draft
        .exercise_id
        .and_then(|id| session.catalog().name_of(id))
        .unwrap_or("Unknown exercise");
    println!(
        "Editing [{}]: {} {}x{}. Enter a full 'set' line to replace it, or 'cancel'.",
        set_id,
        name,
        draft.weight.unwrap_or_default(),
        draft.reps.unwrap_or_default()
    );
    Ok(())
}

fn handle_del<S: WorkoutStore>(session: &mut Session<S>, args: &str) -> Result<()> {
    let set_id = parse_id(args, "Usage: del <set id>")?;
    let removed = session.remove_set(set_id)?;
    println!("✓ Set [{}] removed", removed.id);
    print_sets(session);
    Ok(())
}

fn handle_new<S: WorkoutStore>(session: &mut Session<S>, args: &str) -> Result<()> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(Error::Validation(
            "Usage: new <exercise name> <muscle group>".to_string(),
        ));
    }

    let muscle_group = tokens[tokens.len() - 1];
    let name = tokens[..tokens.len() - 1].join(" ");
    let exercise = session.add_exercise(&name, muscle_group)?;
    println!(
        "✓ Added [{}] {} ({}); it is selected for the next set",
        exercise.id, exercise.name, exercise.muscle_group
    );
    Ok(())
}

fn parse_id(args: &str, usage: &str) -> Result<i64> {
    args.trim()
        .parse()
        .map_err(|_| Error::Validation(usage.to_string()))
}

fn print_sets<S: WorkoutStore>(session: &Session<S>) {
    println!();
    for set in session.display_sets() {
        let name = session
            .catalog()
            .name_of(set.exercise_id)
            .unwrap_or("Unknown exercise");
        if set.is_dropset {
            let parent = set
                .dropset_parent_id
                .map(|id| format!("[{}]", id))
                .unwrap_or_else(|| "?".to_string());
            println!(
                "  [{}] {} {}x{}  drop-set of {}",
                set.id, name, set.weight, set.reps, parent
            );
        } else {
            println!(
                "  [{}] {} set {}  {}x{}  rest {}",
                set.id,
                name,
                set.set_number,
                set.weight,
                set.reps,
                format_elapsed(set.rest_seconds)
            );
        }
    }
    println!();
}

fn print_exercises(catalog: &ExerciseCatalog) {
    println!("Exercises:");
    for exercise in catalog.iter() {
        println!("  [{}] {} ({})", exercise.id, exercise.name, exercise.muscle_group);
    }
}

fn print_summary(workout: &Workout, summary: &WorkoutSummary) {
    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│  WORKOUT COMPLETE");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {} ({})", workout.workout_type.label(), workout.date);
    println!();

    for exercise in &summary.exercises {
        println!("  {}", exercise.exercise_name);
        println!(
            "    → {} sets, {} lbs volume, top {} lbs, {} reps",
            exercise.sets_count, exercise.total_volume, exercise.top_weight, exercise.total_reps
        );
    }

    println!();
    println!("  Total Sets: {}", summary.total_sets);
    println!("  Total Volume: {} lbs", summary.total_volume);
    println!("  Minutes: {}", summary.duration_minutes);
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  set [exercise] <weight> <reps> [rpe=N] [feel=N] [tempo=T] [notes=...]");
    println!("      Log a set. The exercise carries over from the previous set when");
    println!("      omitted. While editing, the line replaces every field of the set.");
    println!("  drop <id>    Mark the next set as a drop-set of set <id>");
    println!("  cancel       Cancel a pending drop-set mark or an edit");
    println!("  edit <id>    Load a set for editing");
    println!("  del <id>     Delete a set");
    println!("  new <exercise name> <muscle group>");
    println!("      Add an exercise and select it");
    println!("  list         Show known exercises");
    println!("  end          Finish the workout and show the summary");
    println!();
    println!("Tempos: normal, pause, touch-and-go, full-reset, slow-eccentric");
}
