// crusti_app_helper
// Copyright (C) 2020  Univ. Artois & CNRS
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use super::{app_helper::init_logger_with_level, command::Command, writable_string::WritableString};
use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg};
use log::{info, LevelFilter};
use std::{ffi::OsString, str::FromStr};
use sysinfo::System;

pub(crate) const APP_HELPER_LOGGING_LEVEL_ARG: &str = "APP_HELPER_LOGGING_LEVEL_ARG";

/// The argument setting the minimal level of the messages sent to the logger.
pub(crate) fn logging_level_cli_arg<'a>() -> Arg<'a, 'a> {
    Arg::with_name(APP_HELPER_LOGGING_LEVEL_ARG)
        .long("logging-level")
        .multiple(false)
        .default_value("info")
        .possible_values(&["trace", "debug", "info", "warn", "error", "off"])
        .help("set the minimal logging level")
}

/// Matches the CLI arguments against the registered commands and runs the selected one.
pub(crate) struct CliManager<'a> {
    app_name: &'a str,
    version: &'a str,
    author: &'a str,
    about: &'a str,
    commands: Vec<Box<dyn Command<'a>>>,
}

impl<'a> CliManager<'a> {
    pub(crate) fn new(app_name: &'a str, version: &'a str, author: &'a str, about: &'a str) -> Self {
        CliManager {
            app_name,
            version,
            author,
            about,
            commands: vec![],
        }
    }

    pub(crate) fn add_command(&mut self, command: Box<dyn Command<'a>>) {
        self.commands.push(command);
    }

    fn clap_app(&self) -> App<'a, 'a> {
        let mut app = App::new(self.app_name)
            .global_setting(AppSettings::DisableVersion)
            .global_setting(AppSettings::VersionlessSubcommands)
            .setting(AppSettings::NeedsSubcommandHelp)
            .setting(AppSettings::SubcommandRequired)
            .version(self.version)
            .author(self.author)
            .about(self.about);
        for c in self.commands.iter() {
            app = app.subcommand(c.clap_subcommand());
        }
        app
    }

    pub(crate) fn parse_cli<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.into()).collect();
        match self.clap_app().get_matches_from_safe(args.clone()) {
            Ok(matches) => {
                let (name, sub_matches) = matches.subcommand();
                let sub_matches =
                    sub_matches.ok_or_else(|| anyhow!("no subcommand was provided"))?;
                let command = self
                    .commands
                    .iter()
                    .find(|c| c.name() == name)
                    .ok_or_else(|| anyhow!("unknown subcommand {}", name))?;
                let log_level = sub_matches
                    .value_of(APP_HELPER_LOGGING_LEVEL_ARG)
                    .and_then(|l| LevelFilter::from_str(l).ok())
                    .unwrap_or(LevelFilter::Info);
                init_logger_with_level(log_level);
                info!("{} {}", self.app_name, self.version);
                sys_info();
                command.execute(sub_matches)
            }
            Err(clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            }) => {
                init_logger_with_level(LevelFilter::Info);
                self.print_help(&args)
            }
            Err(e) => {
                init_logger_with_level(LevelFilter::Info);
                info!("{} {}", self.app_name, self.version);
                Err(anyhow!("{}", e))
            }
        }
    }

    fn print_help(&self, args: &[OsString]) -> Result<()> {
        const HELP_STRINGS: [&str; 3] = ["help", "-h", "--help"];
        let context = "while writing the help message";
        let words = args
            .iter()
            .skip(1)
            .map(|a| a.to_string_lossy().to_string())
            .collect::<Vec<String>>();
        let requested = match words.as_slice() {
            [first, second, ..] if HELP_STRINGS.contains(&first.as_str()) => Some(second),
            [first, ..] if !HELP_STRINGS.contains(&first.as_str()) => Some(first),
            _ => None,
        };
        let mut message = WritableString::default();
        let written = match requested.and_then(|r| self.commands.iter().find(|c| c.name() == r.as_str())) {
            Some(c) => c.clap_subcommand().write_long_help(&mut message),
            None => self.clap_app().write_long_help(&mut message),
        };
        written.context(context)?;
        message.lines().iter().for_each(|l| info!("{}", l));
        info!("");
        Ok(())
    }
}

fn sys_info() {
    info!("----------------------------------------");
    let unknown = || "[unknown]".to_string();
    info!("running on {}", System::host_name().unwrap_or_else(unknown));
    info!(
        "OS is {} {} with kernel {}",
        System::name().unwrap_or_else(unknown),
        System::os_version().unwrap_or_else(unknown),
        System::kernel_version().unwrap_or_else(unknown)
    );
    let sys = System::new_all();
    let mut cpu_kinds: Vec<&str> = sys.cpus().iter().map(|c| c.brand()).collect();
    cpu_kinds.sort_unstable();
    cpu_kinds.dedup();
    info!("logical CPU count: {} {:?}", sys.cpus().len(), cpu_kinds);
    info!("total memory: {} MB", sys.total_memory() >> 20);
    info!("----------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::SubCommand;
    use std::{cell::RefCell, rc::Rc};

    struct LocalCommand {
        command_involved: Rc<RefCell<bool>>,
        argument_set: Rc<RefCell<bool>>,
    }

    impl<'a> Command<'a> for LocalCommand {
        fn name(&self) -> &str {
            "local_command_name"
        }

        fn clap_subcommand(&self) -> App<'a, 'a> {
            SubCommand::with_name("local_command_name")
                .about("local_command_about")
                .arg(Arg::with_name("arg_name").short("a"))
                .arg(logging_level_cli_arg())
        }

        fn execute(&self, arg_matches: &clap::ArgMatches<'_>) -> Result<()> {
            *self.command_involved.borrow_mut() = true;
            if arg_matches.is_present("arg_name") {
                *self.argument_set.borrow_mut() = true;
            }
            Ok(())
        }
    }

    fn run(args: Vec<&'static str>) -> Result<(bool, bool)> {
        let mut manager = CliManager::new("app_name", "app_version", "author", "about");
        let command_involved = Rc::new(RefCell::new(false));
        let argument_set = Rc::new(RefCell::new(false));
        manager.add_command(Box::new(LocalCommand {
            command_involved: Rc::clone(&command_involved),
            argument_set: Rc::clone(&argument_set),
        }));
        manager.parse_cli(args)?;
        let result = (*command_involved.borrow(), *argument_set.borrow());
        Ok(result)
    }

    #[test]
    fn test_command_involved() {
        assert_eq!((true, false), run(vec!["app_name", "local_command_name"]).unwrap());
    }

    #[test]
    fn test_command_and_arg_involved() {
        assert_eq!(
            (true, true),
            run(vec!["app_name", "local_command_name", "-a", "--logging-level", "off"]).unwrap()
        );
    }

    #[test]
    fn test_wrong_invocations() {
        assert!(run(vec!["app_name"]).is_err());
        assert!(run(vec!["app_name", "foo"]).is_err());
        assert!(run(vec!["app_name", "local_command_name", "-b"]).is_err());
        assert!(run(vec!["app_name", "local_command_name", "--logging-level", "all"]).is_err());
    }

    #[test]
    fn test_help() {
        for args in [
            vec!["app_name", "-h"],
            vec!["app_name", "help"],
            vec!["app_name", "help", "local_command_name"],
            vec!["app_name", "local_command_name", "-h"],
        ] {
            assert_eq!((false, false), run(args).unwrap());
        }
    }
}
