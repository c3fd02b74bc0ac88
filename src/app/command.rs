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

use anyhow::Result;
use clap::{App, ArgMatches};

/// A subcommand of the `cavsat` binary.
///
/// A command declares its own arguments as a clap subcommand,
/// and runs given the arguments clap matched for it.
/// Names must be unique among the commands of the app.
pub(crate) trait Command<'a> {
    /// Returns the name used to invoke the command.
    fn name(&self) -> &str;

    /// Returns the clap subcommand declaring the arguments of this command.
    fn clap_subcommand(&self) -> App<'a, 'a>;

    /// Runs the command.
    ///
    /// An error makes the app log the error chain and exit with status 1.
    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()>;
}
