use super::{
    buffered_sat_solver::{BufferedSatSolver, DimacsInstanceRead},
    sat_solver::{SatSolverFactory, SolvingListener, SolvingListenerFactory, SolvingResult},
    Literal, SatSolver,
};
use std::{
    io::{Cursor, Read, Write},
    process::{Command, Stdio},
};

/// A SAT solver which execution is made by a system command.
///
/// The system command is composed by an executable program, and a potential list of CLI arguments.
///
/// The SAT solver must read from the standard input (if it does not by default, this may be possible with the right CLI arguments).
/// The input and output formats must follow the ones from the SAT competitions.
/// Time and conflict budgets are not forwarded to external solvers.
pub struct ExternalSatSolver {
    buffered_sat_solver: BufferedSatSolver,
}

impl ExternalSatSolver {
    /// Builds a new external SAT solver.
    ///
    /// The `program` argument is the path to the software to execute.
    /// The `options` parameter is the CLI options to provide to the software under execution.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use cavsat::sat::{ExternalSatSolver, Literal, SatSolver};
    /// let mut solver = ExternalSatSolver::new(
    ///     "/usr/local/bin/kissat".to_string(),
    ///     vec!["-q".to_string()],
    /// );
    /// solver.add_clause(vec![Literal::from(-1), Literal::from(-2)]);
    /// solver.add_clause(vec![Literal::from(-1), Literal::from(2)]);
    /// let model = solver.solve().unwrap_model().unwrap();
    /// assert_eq!(Some(false), model.value_of(1));
    /// ```
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self {
            buffered_sat_solver: BufferedSatSolver::new(Box::new(move |r| {
                exec_solver(r, &program, &options)
            })),
        }
    }
}

impl SatSolver for ExternalSatSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        self.buffered_sat_solver.add_clause(cl)
    }

    fn solve(&mut self) -> SolvingResult {
        self.buffered_sat_solver.solve()
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult {
        self.buffered_sat_solver
            .solve_under_assumptions(assumptions)
    }

    fn n_vars(&self) -> usize {
        self.buffered_sat_solver.n_vars()
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.buffered_sat_solver.add_listener(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.buffered_sat_solver.reserve(new_max_id)
    }
}

fn exec_solver(mut reader: DimacsInstanceRead, program: &str, options: &[String]) -> Box<dyn Read> {
    let mut child = match Command::new(program)
        .args(options)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => panic!(r#"failed to spawn external SAT solver "{}": {}"#, program, e),
    };
    if let Some(mut stdin) = child.stdin.take() {
        std::thread::spawn(move || {
            let mut buffer = String::new();
            if reader.read_to_string(&mut buffer).is_ok() {
                // the solver may exit without reading its whole input
                let _ = stdin.write_all(buffer.as_bytes());
                let _ = stdin.flush();
            }
        });
    }
    match child.wait_with_output() {
        Ok(output) => Box::new(Cursor::new(output.stdout)),
        Err(e) => panic!(r#"failed to wait for external SAT solver "{}": {}"#, program, e),
    }
}

/// A factory for [`ExternalSatSolver`] objects.
pub struct ExternalSatSolverFactory {
    program: String,
    options: Vec<String>,
    listener_factories: Vec<SolvingListenerFactory>,
}

impl ExternalSatSolverFactory {
    /// Builds a factory for external solvers launched with the given program and options.
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self {
            program,
            options,
            listener_factories: vec![],
        }
    }
}

impl SatSolverFactory for ExternalSatSolverFactory {
    fn new_solver(&self) -> Box<dyn SatSolver> {
        let mut solver = ExternalSatSolver::new(self.program.clone(), self.options.clone());
        self.listener_factories
            .iter()
            .for_each(|f| solver.add_listener((f)()));
        Box::new(solver)
    }

    fn add_solver_listener(&mut self, listener_factory: SolvingListenerFactory) {
        self.listener_factories.push(listener_factory);
    }
}
