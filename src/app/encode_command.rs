use super::{cli_manager, command::Command, common};
use anyhow::{anyhow, Context, Result};
use cavsat::encodings::Encoding;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::info;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

const CMD_NAME: &str = "encode";

const ARG_OUT: &str = "ARG_OUT";

pub(crate) struct EncodeCommand;

impl EncodeCommand {
    pub(crate) fn new() -> Self {
        EncodeCommand
    }
}

impl<'a> Command<'a> for EncodeCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Writes the SAT encoding of a relation and its constraints")
            .setting(AppSettings::DisableVersion)
            .arg(common::input_args())
            .arg(common::constraints_arg(true))
            .args(&common::reader_args())
            .args(&common::encoding_args())
            .arg(
                Arg::with_name(ARG_OUT)
                    .short("o")
                    .long("output")
                    .empty_values(false)
                    .multiple(false)
                    .help("the output file for the encoding (default: standard output)")
                    .required(false),
            )
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let relation = common::read_relation(arg_matches)?;
        let constraints = common::read_constraints(arg_matches, relation.schema())?
            .ok_or_else(|| anyhow!("missing constraints file"))?;
        let config = common::read_config(arg_matches)?;
        let encoding = Encoding::encode_relation(&relation, &constraints, &config)
            .context("while encoding the constraints")?;
        info!(
            "the encoding has {} record variable(s), {} variable(s) and {} clause(s)",
            encoding.variable_map().len(),
            encoding.cnf().n_vars(),
            encoding.cnf().n_clauses()
        );
        let mut out: Box<dyn Write> = match arg_matches.value_of(ARG_OUT) {
            Some(path) => {
                info!("writing the encoding to {:?}", path);
                let file = File::create(path)
                    .with_context(|| format!(r#"while creating file "{}""#, path))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(std::io::stdout()),
        };
        encoding.cnf().write_dimacs(out.as_mut())
    }
}
