use super::{
    sat_solver::{SolvingListener, SolvingResult},
    Assignment, Literal, SatSolver,
};
use std::io::{BufRead, BufReader, Cursor, Read};

/// The type of the functions run on a DIMACS instance, returning the output of a SAT solver.
pub type SolvingFn = dyn Fn(DimacsInstanceRead) -> Box<dyn Read>;

/// A reader over a DIMACS instance: the preamble, the buffered clauses and the assumptions as unit clauses.
pub struct DimacsInstanceRead {
    parts: [Cursor<String>; 3],
    current: usize,
}

impl DimacsInstanceRead {
    fn new(preamble: String, clauses: String, assumptions: String) -> Self {
        Self {
            parts: [
                Cursor::new(preamble),
                Cursor::new(clauses),
                Cursor::new(assumptions),
            ],
            current: 0,
        }
    }
}

impl Read for DimacsInstanceRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.current < self.parts.len() {
            let r = self.parts[self.current].read(buf)?;
            if r > 0 {
                return Ok(r);
            }
            self.current += 1;
        }
        Ok(0)
    }
}

const DEFAULT_BUFFER_CAP: usize = 1 << 16;

const OUTPUT_CONTEXT: &str = "error while reading solving function output in BufferedSatSolver";

/// A SAT solver which buffers the clauses and delegates each solver call to a function reading a DIMACS instance.
///
/// The solving function must return an output following the SAT competition format
/// (`s SATISFIABLE`/`s UNSATISFIABLE` status line, `v` lines for the model, `c` lines for comments).
/// An output which does not follow this format makes the solver panic.
pub struct BufferedSatSolver {
    n_vars: usize,
    n_clauses: usize,
    clauses: String,
    solving_fn: Box<SolvingFn>,
    listeners: Vec<Box<dyn SolvingListener>>,
}

impl BufferedSatSolver {
    /// Builds a buffered solver given the solving function.
    pub fn new(solving_fn: Box<SolvingFn>) -> Self {
        Self {
            n_vars: 0,
            n_clauses: 0,
            clauses: String::with_capacity(DEFAULT_BUFFER_CAP),
            solving_fn,
            listeners: Vec::new(),
        }
    }
}

impl SatSolver for BufferedSatSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        for l in cl.iter() {
            self.n_vars = usize::max(self.n_vars, usize::from(l.var()));
            self.clauses.push_str(&l.to_string());
            self.clauses.push(' ');
        }
        self.clauses.push_str("0\n");
        self.n_clauses += 1;
    }

    fn solve(&mut self) -> SolvingResult {
        self.solve_under_assumptions(&[])
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult {
        self.listeners
            .iter()
            .for_each(|l| l.solving_start(self.n_vars, self.n_clauses));
        let preamble = format!(
            "p cnf {} {}\n",
            self.n_vars,
            self.n_clauses + assumptions.len()
        );
        let assumptions = assumptions
            .iter()
            .map(|a| format!("{} 0\n", a))
            .collect::<String>();
        let instance = DimacsInstanceRead::new(preamble, self.clauses.clone(), assumptions);
        let output = (self.solving_fn)(instance);
        let result = read_solver_output(output, self.n_vars);
        self.listeners.iter().for_each(|l| l.solving_end(&result));
        result
    }

    fn n_vars(&self) -> usize {
        self.n_vars
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.n_vars = usize::max(self.n_vars, new_max_id);
    }
}

fn read_value_line(line: &str, n_vars: usize, assignment: &mut [Option<bool>], ended: &mut bool) {
    for w in line.split_ascii_whitespace().skip(1) {
        let n = match w.parse::<isize>() {
            Ok(n) => n,
            Err(_) => panic!(r#"{}: "{}" is not a literal"#, OUTPUT_CONTEXT, w),
        };
        if n == 0 {
            if *ended {
                panic!("{}: multiple zeroes on value line", OUTPUT_CONTEXT)
            }
            *ended = true;
            continue;
        }
        let index = n.unsigned_abs() - 1;
        if index >= n_vars {
            panic!("{}: a variable in value line is out of bounds", OUTPUT_CONTEXT)
        }
        assignment[index] = Some(n > 0);
    }
}

fn read_solver_output(output: Box<dyn Read>, n_vars: usize) -> SolvingResult {
    let mut status = None;
    let mut assignment = vec![None; n_vars];
    let mut value_line_seen = false;
    let mut value_lines_ended = false;
    for line in BufReader::new(output).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => panic!("{}: {}", OUTPUT_CONTEXT, e),
        };
        let new_status = match line.as_str() {
            "s SATISFIABLE" => Some(true),
            "s UNSATISFIABLE" => Some(false),
            _ => None,
        };
        if new_status.is_some() {
            if status.is_some() {
                panic!("{}: multiple status lines", OUTPUT_CONTEXT)
            }
            status = new_status;
        } else if line.starts_with("v ") {
            value_line_seen = true;
            read_value_line(&line, n_vars, &mut assignment, &mut value_lines_ended);
        } else if !(line.is_empty()
            || line == "c"
            || line == "v"
            || line == "s UNKNOWN"
            || line.starts_with("c "))
        {
            panic!(r#"{}: unexpected line "{}""#, OUTPUT_CONTEXT, line)
        }
    }
    match status {
        Some(true) if value_line_seen => SolvingResult::Satisfiable(Assignment::new(assignment)),
        Some(false) => SolvingResult::Unsatisfiable,
        _ => SolvingResult::Unknown,
    }
}
