use biodivine_lib_bdd::Bdd;

use crate::bdd_ite;
use crate::route::BddRoute;
use crate::transfer::param::TransferParam;

/// The outcome of a policy run: the rewritten route and the predicate over
/// input routes under which the policy accepts.
#[derive(Clone, Debug)]
pub struct TransferReturn {
    pub route: BddRoute,
    pub accept: Bdd,
}

impl TransferReturn {
    pub fn ite(&self, condition: &Bdd, other: &TransferReturn) -> TransferReturn {
        TransferReturn {
            route: self.route.ite(condition, &other.route),
            accept: bdd_ite(condition, &self.accept, &other.accept),
        }
    }
}

/// Evaluation result with control-flow bookkeeping. The three flow
/// predicates record, per input route, whether execution has already hit an
/// exit statement, a return statement, or fallen through a chain element.
/// Exit and return are mutually exclusive by construction.
#[derive(Clone, Debug)]
pub struct TransferResult {
    pub return_value: TransferReturn,
    pub exit_assigned: Bdd,
    pub return_assigned: Bdd,
    pub fallthrough: Bdd,
}

impl TransferResult {
    pub fn new(route: BddRoute) -> TransferResult {
        let f = route.mk_false();
        TransferResult {
            return_value: TransferReturn {
                accept: f.clone(),
                route,
            },
            exit_assigned: f.clone(),
            return_assigned: f.clone(),
            fallthrough: f,
        }
    }

    /// Inputs on which no further statement is evaluated.
    pub fn unreachable(&self) -> Bdd {
        self.exit_assigned.or(&self.return_assigned)
    }

    pub fn with_return_value(&self, return_value: TransferReturn) -> TransferResult {
        let mut copy = self.clone();
        copy.return_value = return_value;
        copy
    }

    pub fn with_exit_assigned(&self, exit_assigned: Bdd) -> TransferResult {
        let mut copy = self.clone();
        copy.exit_assigned = exit_assigned;
        copy
    }

    pub fn with_return_assigned(&self, return_assigned: Bdd) -> TransferResult {
        let mut copy = self.clone();
        copy.return_assigned = return_assigned;
        copy
    }

    pub fn with_fallthrough(&self, fallthrough: Bdd) -> TransferResult {
        let mut copy = self.clone();
        copy.fallthrough = fallthrough;
        copy
    }

    /// Per-input merge of two results along `condition`.
    pub fn ite(&self, condition: &Bdd, other: &TransferResult) -> TransferResult {
        TransferResult {
            return_value: self.return_value.ite(condition, &other.return_value),
            exit_assigned: bdd_ite(condition, &self.exit_assigned, &other.exit_assigned),
            return_assigned: bdd_ite(condition, &self.return_assigned, &other.return_assigned),
            fallthrough: bdd_ite(condition, &self.fallthrough, &other.fallthrough),
        }
    }
}

/// A param/result pair kept in lock step while statements execute.
///
/// The invariant is that the param's route and the result's route are the
/// same object state; violating it means a statement committed an update to
/// one side only, which is a bug rather than a recoverable condition.
#[derive(Clone, Debug)]
pub struct TransferState {
    pub param: TransferParam,
    pub result: TransferResult,
}

impl TransferState {
    pub fn new(param: TransferParam, result: TransferResult) -> TransferState {
        assert!(
            param.data.equal_attributes(&result.return_value.route),
            "evaluation state out of sync between context and result"
        );
        TransferState { param, result }
    }

    /// Rebuilds the state around an updated result, re-syncing the param's
    /// route to the result's.
    pub fn from_result(param: &TransferParam, result: TransferResult) -> TransferState {
        let param = param.with_data(result.return_value.route.clone());
        TransferState { param, result }
    }
}
