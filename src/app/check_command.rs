use super::{cli_manager, command::Command, common};
use anyhow::{Context, Result};
use cavsat::encodings::{ConflictHypergraph, VariableMap};
use clap::{App, AppSettings, ArgMatches, SubCommand};
use log::info;

const CMD_NAME: &str = "check";

pub(crate) struct CheckCommand;

impl CheckCommand {
    pub(crate) fn new() -> Self {
        CheckCommand
    }
}

impl<'a> Command<'a> for CheckCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Checks input files for errors")
            .setting(AppSettings::DisableVersion)
            .arg(common::input_args())
            .arg(common::constraints_arg(false))
            .args(&common::reader_args())
            .args(&common::encoding_args())
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let relation = common::read_relation(arg_matches)?;
        let config = common::read_config(arg_matches)?;
        let map = VariableMap::assign_with_policy(relation.records(), config.duplicate_policy())
            .context("while assigning variables to records")?;
        info!("{} distinct record(s) get a variable", map.len());
        if let Some(constraints) = common::read_constraints(arg_matches, relation.schema())? {
            let conflicts = ConflictHypergraph::from_constraints(&map, &constraints)
                .context("while computing the conflicts between records")?;
            let n_involved = conflicts.involvement().iter().filter(|b| **b).count();
            info!(
                "found {} conflict(s) involving {} record(s)",
                conflicts.len(),
                n_involved
            );
        }
        Ok(())
    }
}
