use super::{cli_manager, command::Command, common};
use anyhow::{anyhow, Context, Result};
use cavsat::{
    answers::{AnswerExtractor, AnswerMode, QueryAnswers},
    data::Schema,
    encodings::Encoding,
    io::{read_predicate, AnswerWriter, CsvWriter},
    solvers::{EnumerationStatus, RepairEnumerator, RepairSolver, SingleRepairComputer},
};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::{io::Write, str::FromStr};
use strum::VariantNames;

const CMD_NAME: &str = "solve";

const ARG_QUERY: &str = "QUERY";
const ARG_MODE: &str = "MODE";
const ARG_BY_ASSUMPTIONS: &str = "BY_ASSUMPTIONS";

pub(crate) struct SolveCommand;

impl SolveCommand {
    pub(crate) fn new() -> Self {
        SolveCommand
    }
}

impl<'a> Command<'a> for SolveCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Answers a query over the repairs of a relation")
            .setting(AppSettings::DisableVersion)
            .arg(common::input_args())
            .arg(common::constraints_arg(true))
            .arg(
                Arg::with_name(ARG_QUERY)
                    .short("q")
                    .long("query")
                    .empty_values(false)
                    .multiple(false)
                    .default_value("true")
                    .help("the selection predicate of the query")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_MODE)
                    .short("m")
                    .long("mode")
                    .empty_values(false)
                    .multiple(false)
                    .possible_values(AnswerMode::VARIANTS)
                    .default_value("certain")
                    .help("the semantics of the answers")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_BY_ASSUMPTIONS)
                    .long("by-assumptions")
                    .takes_value(false)
                    .help("check each matching record under assumptions instead of enumerating the repairs (certain and possible modes)")
                    .required(false),
            )
            .args(&common::reader_args())
            .args(&common::encoding_args())
            .args(&common::solving_args())
            .args(&common::external_sat_solver_args())
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let relation = common::read_relation(arg_matches)?;
        let constraints = common::read_constraints(arg_matches, relation.schema())?
            .ok_or_else(|| anyhow!("missing constraints file"))?;
        let str_query = arg_matches.value_of(ARG_QUERY).unwrap_or("true");
        let query = read_predicate(str_query, relation.schema())?;
        info!("query is {}", query);
        let mode = AnswerMode::from_str(arg_matches.value_of(ARG_MODE).unwrap_or("certain"))
            .context("while parsing the answer mode")?;
        let config = common::read_config(arg_matches)?;
        let encoding = Encoding::encode_relation(&relation, &constraints, &config)
            .context("while encoding the constraints")?;
        info!(
            "the encoding has {} variable(s) and {} clause(s)",
            encoding.cnf().n_vars(),
            encoding.cnf().n_clauses()
        );
        let mut solver = RepairSolver::new_with_sat_solver_factory(
            &encoding,
            common::create_sat_solver_factory(arg_matches)?,
        )
        .with_config(&config);
        let extractor = AnswerExtractor::new(&encoding);
        let writer = CsvWriter::new(common::delimiter(arg_matches)?);
        let mut out = std::io::stdout();
        let schema = relation.schema();
        match mode {
            AnswerMode::Single => {
                let outcome = solver.compute_one_repair();
                let answers = extractor.single_repair_answers(&outcome, &query)?;
                write_query_answers(&writer, &mut out, schema, &answers, mode)
            }
            AnswerMode::Certain | AnswerMode::Possible => {
                let answers = if arg_matches.is_present(ARG_BY_ASSUMPTIONS) {
                    info!("checking the matching records under assumptions");
                    extractor.consistent_answers_with_solver(&mut solver, &query)?
                } else {
                    let family = solver.enumerate_repairs(config.max_repairs());
                    log_enumeration(family.len(), family.status());
                    extractor.consistent_answers(&family, &query)?
                };
                write_query_answers(&writer, &mut out, schema, &answers, mode)
            }
            AnswerMode::Repairs => {
                let family = solver.enumerate_repairs(config.max_repairs());
                log_enumeration(family.len(), family.status());
                if family.is_unsatisfiable() {
                    writer.write_no_repair(&mut out)
                } else if family.is_empty() && family.status() == EnumerationStatus::Timeout {
                    writer.write_timeout(&mut out)
                } else {
                    let per_repair = extractor.per_repair_answers(&family, &query)?;
                    writer.write_per_repair_answers(&mut out, schema, &per_repair)
                }
            }
        }
    }
}

fn log_enumeration(n_repairs: usize, status: EnumerationStatus) {
    match status {
        EnumerationStatus::Complete => info!("enumerated all the {} repair(s)", n_repairs),
        EnumerationStatus::BoundExceeded { bound } => {
            warn!(
                "stopped the enumeration at {} repair(s), more exist (bound is {})",
                n_repairs, bound
            )
        }
        EnumerationStatus::Timeout => {
            warn!(
                "the solver budget was exhausted after {} repair(s)",
                n_repairs
            )
        }
    }
}

fn write_query_answers(
    writer: &dyn AnswerWriter,
    out: &mut dyn Write,
    schema: &Schema,
    answers: &QueryAnswers,
    mode: AnswerMode,
) -> Result<()> {
    match answers {
        QueryAnswers::SingleRepair(set) => writer.write_answers(out, schema, set),
        QueryAnswers::Consistent(consistent) => {
            if !consistent.is_exact() {
                warn!("the repairs were not all enumerated: the answers are approximate");
            }
            let set = if mode == AnswerMode::Possible {
                consistent.possible()
            } else {
                consistent.certain()
            };
            info!("found {} {} answer(s)", set.len(), mode.as_ref());
            writer.write_answers(out, schema, set)
        }
        QueryAnswers::NoRepair => writer.write_no_repair(out),
        QueryAnswers::Timeout => writer.write_timeout(out),
    }
}
