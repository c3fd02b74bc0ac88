use super::{
    app_helper::AppHelper, command::Command, AuthorsCommand, CheckCommand, EncodeCommand,
    SolveCommand,
};
use anyhow::{anyhow, Context, Result};
use cavsat::{
    config::Config,
    data::{ConstraintSet, Relation, Schema},
    encodings::{DuplicatePolicy, EncodingKind},
    io::{ConstraintsReader, DelimitedReader, RelationReader},
    sat::{
        DefaultSatSolverFactory, ExternalSatSolverFactory, SatSolverFactory, SolvingListener,
        SolvingResult,
    },
};
use clap::{Arg, ArgMatches};
use log::{debug, info, warn};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use strum::VariantNames;

pub(crate) fn create_app_helper() -> AppHelper<'static> {
    let app_name = option_env!("CARGO_PKG_NAME").unwrap_or("unknown app name");
    let app_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version");
    let authors = option_env!("CARGO_PKG_AUTHORS").unwrap_or("unknown authors");
    let mut app = AppHelper::new(
        app_name,
        app_version,
        authors,
        "CAvSAT, consistent query answering over inconsistent relations through SAT solving.",
    );
    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(AuthorsCommand::new(app_name, app_version, authors)),
        Box::new(CheckCommand::new()),
        Box::new(EncodeCommand::new()),
        Box::new(SolveCommand::new()),
    ];
    for c in commands {
        app.add_command(c);
    }
    app
}

pub(crate) const ARG_INPUT: &str = "INPUT";

pub(crate) fn input_args() -> Arg<'static, 'static> {
    Arg::with_name(ARG_INPUT)
        .short("f")
        .empty_values(false)
        .multiple(false)
        .help("the input file that contains the records")
        .required(true)
}

pub(crate) const ARG_CONSTRAINTS: &str = "CONSTRAINTS";

pub(crate) fn constraints_arg(required: bool) -> Arg<'static, 'static> {
    Arg::with_name(ARG_CONSTRAINTS)
        .short("c")
        .long("constraints")
        .empty_values(false)
        .multiple(false)
        .help("the file that contains the integrity constraints")
        .required(required)
}

const ARG_DELIMITER: &str = "DELIMITER";
const ARG_NO_HEADER: &str = "NO_HEADER";

pub(crate) fn reader_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_DELIMITER)
            .long("delimiter")
            .empty_values(false)
            .multiple(false)
            .default_value(",")
            .help("the field delimiter of the input file (and of the answers)")
            .required(false),
        Arg::with_name(ARG_NO_HEADER)
            .long("no-header")
            .takes_value(false)
            .help("the first line of the input file is a record, not a header")
            .required(false),
    ]
}

/// Returns the delimiter given on the command line.
pub(crate) fn delimiter(arg_matches: &ArgMatches<'_>) -> Result<char> {
    let s = arg_matches.value_of(ARG_DELIMITER).unwrap_or(",");
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '"' => Ok(c),
        _ => Err(anyhow!(r#"invalid delimiter "{}": expected a single character other than a quote"#, s)),
    }
}

const ARG_ENCODING: &str = "ENCODING";
const ARG_DUPLICATES: &str = "DUPLICATES";
const ARG_MAX_REPAIRS: &str = "MAX_REPAIRS";
const ARG_TIME_LIMIT: &str = "TIME_LIMIT";
const ARG_CONFLICT_LIMIT: &str = "CONFLICT_LIMIT";

pub(crate) fn encoding_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_ENCODING)
            .long("encoding")
            .empty_values(false)
            .multiple(false)
            .possible_values(EncodingKind::VARIANTS)
            .default_value("repair")
            .help("the encoding of the constraints (repair keeps maximal consistent subsets)")
            .required(false),
        Arg::with_name(ARG_DUPLICATES)
            .long("duplicates")
            .empty_values(false)
            .multiple(false)
            .possible_values(DuplicatePolicy::VARIANTS)
            .default_value("collapse")
            .help("the handling of records sharing the same values")
            .required(false),
    ]
}

pub(crate) fn solving_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_MAX_REPAIRS)
            .long("max-repairs")
            .empty_values(false)
            .multiple(false)
            .help("the maximal number of repairs to enumerate")
            .required(false),
        Arg::with_name(ARG_TIME_LIMIT)
            .long("time-limit")
            .empty_values(false)
            .multiple(false)
            .help("the time budget of the solving session, in seconds")
            .required(false),
        Arg::with_name(ARG_CONFLICT_LIMIT)
            .long("conflict-limit")
            .empty_values(false)
            .multiple(false)
            .help("the maximal number of conflicts of each SAT solver call")
            .required(false),
    ]
}

fn parse_arg<T>(arg_matches: &ArgMatches<'_>, arg: &str, flag: &str) -> Result<Option<T>>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    arg_matches
        .value_of(arg)
        .map(|s| {
            T::from_str(s).with_context(|| format!(r#"while parsing the value "{}" of {}"#, s, flag))
        })
        .transpose()
}

/// Builds the configuration from the command line arguments.
///
/// Arguments a command does not declare keep their default values.
pub(crate) fn read_config(arg_matches: &ArgMatches<'_>) -> Result<Config> {
    let mut config = Config::default();
    if let Some(e) = parse_arg::<EncodingKind>(arg_matches, ARG_ENCODING, "--encoding")? {
        config = config.with_encoding(e);
    }
    if let Some(d) = parse_arg::<DuplicatePolicy>(arg_matches, ARG_DUPLICATES, "--duplicates")? {
        config = config.with_duplicate_policy(d);
    }
    if let Some(n) = parse_arg::<usize>(arg_matches, ARG_MAX_REPAIRS, "--max-repairs")? {
        config = config.with_max_repairs(n);
    }
    if let Some(secs) = parse_arg::<f64>(arg_matches, ARG_TIME_LIMIT, "--time-limit")? {
        let limit = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid time limit {}", secs))?;
        config = config.with_time_limit(Some(limit));
    }
    if let Some(n) = parse_arg::<u32>(arg_matches, ARG_CONFLICT_LIMIT, "--conflict-limit")? {
        config = config.with_conflict_limit(Some(n));
    }
    info!(
        "using the {} encoding, {} duplicates",
        config.encoding().as_ref(),
        config.duplicate_policy().as_ref()
    );
    Ok(config)
}

/// Reads the relation given by the input argument.
pub(crate) fn read_relation(arg_matches: &ArgMatches<'_>) -> Result<Relation> {
    let file = arg_matches
        .value_of(ARG_INPUT)
        .ok_or_else(|| anyhow!("missing input file"))?;
    let mut reader = DelimitedReader::new(delimiter(arg_matches)?, !arg_matches.is_present(ARG_NO_HEADER));
    reader.add_warning_handler(Box::new(|line, msg| warn!("at line {}: {}", line, msg)));
    let relation = read_file_path_with(file, &|r| reader.read(r))?;
    info!(
        "the relation has {} field(s) and {} record(s)",
        relation.schema().arity(),
        relation.len()
    );
    Ok(relation)
}

/// Reads the constraints given by the constraints argument, if any.
pub(crate) fn read_constraints(
    arg_matches: &ArgMatches<'_>,
    schema: &Schema,
) -> Result<Option<ConstraintSet>> {
    let file = match arg_matches.value_of(ARG_CONSTRAINTS) {
        Some(f) => f,
        None => return Ok(None),
    };
    let mut reader = ConstraintsReader::default();
    reader.add_warning_handler(Box::new(|line, msg| warn!("at line {}: {}", line, msg)));
    let constraints = read_file_path_with(file, &|r| reader.read(r, schema))?;
    info!("read {} constraint(s)", constraints.len());
    Ok(Some(constraints))
}

pub(crate) fn read_file_path_with<F, R>(file_path: &str, reader: &F) -> Result<R>
where
    F: Fn(&mut dyn Read) -> Result<R>,
{
    let canonicalized = canonicalize_file_path(file_path)?;
    info!("reading input file {:?}", canonicalized);
    let mut file_reader = BufReader::new(File::open(&canonicalized)?);
    (reader)(&mut file_reader).with_context(|| format!("while reading file {:?}", canonicalized))
}

/// Canonicalize a path given by the user.
pub(crate) fn canonicalize_file_path(file_path: &str) -> Result<PathBuf> {
    fs::canonicalize(PathBuf::from(file_path))
        .with_context(|| format!(r#"while opening file "{}""#, file_path))
}

const ARG_EXTERNAL_SAT_SOLVER: &str = "EXTERNAL_SAT_SOLVER";
const ARG_EXTERNAL_SAT_SOLVER_OPTIONS: &str = "EXTERNAL_SAT_SOLVER_OPTIONS";

pub(crate) fn external_sat_solver_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_EXTERNAL_SAT_SOLVER)
            .long("external-sat-solver")
            .empty_values(false)
            .multiple(false)
            .help("a path to an external SAT solver to replace the embedded one")
            .required(false),
        Arg::with_name(ARG_EXTERNAL_SAT_SOLVER_OPTIONS)
            .long("external-sat-solver-opt")
            .requires(ARG_EXTERNAL_SAT_SOLVER)
            .empty_values(false)
            .multiple(true)
            .number_of_values(1)
            .allow_hyphen_values(true)
            .help("an option to give to the external SAT solver")
            .required(false),
    ]
}

pub(crate) fn create_sat_solver_factory(
    arg_matches: &ArgMatches<'_>,
) -> Result<Box<dyn SatSolverFactory>> {
    let external_solver_options = arg_matches
        .values_of(ARG_EXTERNAL_SAT_SOLVER_OPTIONS)
        .map(|v| v.map(|o| o.to_string()).collect::<Vec<String>>())
        .unwrap_or_default();
    let mut factory: Box<dyn SatSolverFactory> =
        if let Some(s) = arg_matches.value_of(ARG_EXTERNAL_SAT_SOLVER) {
            let path = canonicalize_file_path(s)?;
            check_executable(&path)?;
            info!("using {path:?} as SAT solver");
            let program = path
                .to_str()
                .ok_or_else(|| anyhow!("the path {:?} is not valid UTF-8", path))?
                .to_string();
            warn!("time and conflict limits are not applied to external SAT solvers");
            Box::new(ExternalSatSolverFactory::new(program, external_solver_options))
        } else {
            info!("using the default SAT solver");
            Box::<DefaultSatSolverFactory>::default()
        };
    factory.add_solver_listener(Box::new(|| {
        Box::<SatSolvingLogger>::default() as Box<dyn SolvingListener>
    }));
    Ok(factory)
}

fn check_executable(path: &Path) -> Result<()> {
    let metadata =
        fs::metadata(path).with_context(|| format!("while checking the SAT solver {:?}", path))?;
    if !metadata.is_file() {
        return Err(anyhow!("the SAT solver {:?} is not a file", path));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(anyhow!("the SAT solver {:?} is not executable", path));
        }
    }
    Ok(())
}

#[derive(Default)]
struct SatSolvingLogger;

impl SolvingListener for SatSolvingLogger {
    fn solving_start(&self, n_vars: usize, n_clauses: usize) {
        debug!(
            "launching SAT solver on an instance with {} variables and {} clauses",
            n_vars, n_clauses
        );
    }

    fn solving_end(&self, result: &SolvingResult) {
        debug!("SAT solver ended with result {}", result.as_str());
    }
}
