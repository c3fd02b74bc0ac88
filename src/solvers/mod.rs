//! Computation of repairs with SAT solvers.

mod repair;
pub use repair::EnumerationStatus;
pub use repair::Repair;
pub use repair::RepairFamily;
pub use repair::RepairOutcome;

mod repair_solver;
pub use repair_solver::RepairSolver;

mod specs;
pub use specs::AcceptanceStatus;
pub use specs::CertainAnswerComputer;
pub use specs::PossibleAnswerComputer;
pub use specs::RepairEnumerator;
pub use specs::SingleRepairComputer;
