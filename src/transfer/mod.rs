//! The symbolic transfer function: interprets a routing policy over a
//! symbolic route, producing the predicate under which the policy accepts
//! and the rewritten route attributes as functions of the input.
//!
//! Statements never branch the analysis: each commit is an if-then-else
//! against the pre-statement value, gated on the inputs that actually reach
//! the statement. `If` evaluates both branches from the same pre-guard
//! state and merges them on the guard afterwards.

pub mod as_path;
pub mod communities;
mod param;
mod result;

#[cfg(test)]
mod tests;

pub use param::{CallContext, TransferParam};
pub use result::{TransferResult, TransferReturn, TransferState};

use std::collections::HashMap;

use biodivine_lib_bdd::Bdd;
use log::{debug, warn};

use crate::aps::AtomicPredicateCatalogue;
use crate::bdd_ite;
use crate::error::{AnalysisError, AnalysisResult};
use crate::policy::{
    BooleanExpr, IntComparator, LineAction, LongExpr, NextHopExpr, PolicyConfig, Prefix,
    PrefixExpr, PrefixRange, PrefixSetExpr, Statement,
};
use crate::route::{
    ALL_OSPF_METRIC_TYPES, BddRoute, MED_WIDTH, NextHopKind, NEXT_HOP_WIDTH, TAG_WIDTH,
    WEIGHT_WIDTH, ADMIN_DISTANCE_WIDTH, LOCAL_PREF_WIDTH, OspfMetricType,
};
use crate::symbolic::{SymbolicDomain, SymbolicInteger};
use crate::transfer::communities::CommunityMatcher;

/// Outcome of a boolean expression: the match predicate, the chain
/// fall-through signal, the inputs on which a called policy exited the
/// whole evaluation, and whether an unencodable construct was consulted.
struct ExprOutcome {
    predicate: Bdd,
    fallthrough: Bdd,
    exit_assigned: Bdd,
    unsupported: bool,
}

impl ExprOutcome {
    fn plain(predicate: Bdd, route: &BddRoute) -> ExprOutcome {
        ExprOutcome {
            predicate,
            fallthrough: route.mk_false(),
            exit_assigned: route.mk_false(),
            unsupported: false,
        }
    }
}

/// Symbolic interpreter for one routing policy.
pub struct TransferBdd<'a> {
    catalogue: &'a AtomicPredicateCatalogue,
    config: &'a PolicyConfig,
    policy_name: String,
    original: BddRoute,
    use_output_attributes: bool,
    communities: CommunityMatcher<'a>,
    /// Callee results, keyed by policy name and scoped to this analysis.
    call_cache: HashMap<String, TransferResult>,
}

impl<'a> TransferBdd<'a> {
    pub fn new(
        catalogue: &'a AtomicPredicateCatalogue,
        config: &'a PolicyConfig,
        policy_name: &str,
    ) -> TransferBdd<'a> {
        TransferBdd {
            catalogue,
            config,
            policy_name: policy_name.to_string(),
            original: BddRoute::new(catalogue),
            use_output_attributes: false,
            communities: CommunityMatcher::new(catalogue, config),
            call_cache: HashMap::new(),
        }
    }

    /// Make match expressions consult the transformed attributes instead of
    /// the input route, for vendor semantics that match on the outgoing
    /// attributes.
    pub fn with_output_attributes(mut self, use_output_attributes: bool) -> TransferBdd<'a> {
        self.use_output_attributes = use_output_attributes;
        self
    }

    /// The untransformed input route; every result formula is a function of
    /// its variables.
    pub fn original_route(&self) -> &BddRoute {
        &self.original
    }

    /// Runs the policy and returns its symbolic denotation. The accept
    /// predicate and its negation partition the input space.
    pub fn compute(&mut self) -> AnalysisResult<TransferResult> {
        let policy = self
            .config
            .policy(&self.policy_name)
            .ok_or_else(|| AnalysisError::UndefinedPolicy(self.policy_name.clone()))?
            .clone();
        debug!("computing transfer function for policy `{}`", self.policy_name);

        let param = TransferParam::new(self.original.clone());
        let result = TransferResult::new(self.original.clone());
        let state = self.eval_stmts(&policy.statements, TransferState::new(param, result))?;

        // Inputs that neither exited nor returned take the default action.
        let result = self.exit_value(&state.result, state.param.default_accept);
        debug!(
            "policy `{}` accepts on {}",
            self.policy_name,
            crate::log_bdd(&result.return_value.accept)
        );
        Ok(result)
    }

    fn route_for_matching<'s>(&'s self, param: &'s TransferParam) -> &'s BddRoute {
        if self.use_output_attributes {
            &param.data
        } else {
            &self.original
        }
    }

    // ----- statements -----

    fn eval_stmts(
        &mut self,
        statements: &[Statement],
        mut state: TransferState,
    ) -> AnalysisResult<TransferState> {
        for stmt in statements {
            if state.result.unreachable().is_true() {
                break;
            }
            match self.eval_stmt(stmt, state.clone()) {
                Ok(next) => state = next,
                Err(AnalysisError::UnsupportedFeature(what)) => {
                    warn!("tolerating unsupported construct: {what}");
                    state = flag_unsupported(state);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(state)
    }

    fn eval_stmt(&mut self, stmt: &Statement, state: TransferState) -> AnalysisResult<TransferState> {
        let reach = state.result.unreachable().not();
        match stmt {
            Statement::ExitAccept => {
                state.param.trace("ExitAccept");
                Ok(TransferState::from_result(
                    &state.param,
                    self.exit_value(&state.result, true),
                ))
            }
            Statement::ExitReject => {
                state.param.trace("ExitReject");
                Ok(TransferState::from_result(
                    &state.param,
                    self.exit_value(&state.result, false),
                ))
            }
            Statement::ReturnTrue => {
                state.param.trace("ReturnTrue");
                Ok(TransferState::from_result(
                    &state.param,
                    self.return_value(&state.result, true),
                ))
            }
            Statement::ReturnFalse => {
                state.param.trace("ReturnFalse");
                Ok(TransferState::from_result(
                    &state.param,
                    self.return_value(&state.result, false),
                ))
            }
            Statement::ReturnLocalDefaultAction => {
                state.param.trace("ReturnLocalDefaultAction");
                if state.param.chain_context {
                    // Inside a chain the local default action is not a
                    // verdict; the next element decides.
                    let result = state
                        .result
                        .with_fallthrough(state.result.fallthrough.or(&reach))
                        .with_return_assigned(state.result.return_assigned.or(&reach));
                    return Ok(TransferState::from_result(&state.param, result));
                }
                let accept = state.param.default_accept_local;
                Ok(TransferState::from_result(
                    &state.param,
                    self.return_value(&state.result, accept),
                ))
            }
            Statement::SetDefaultActionAccept => {
                Ok(TransferState::new(state.param.with_default_accept(true), state.result))
            }
            Statement::SetDefaultActionReject => {
                Ok(TransferState::new(state.param.with_default_accept(false), state.result))
            }
            Statement::SetLocalDefaultActionAccept => Ok(TransferState::new(
                state.param.with_default_accept_local(true),
                state.result,
            )),
            Statement::SetLocalDefaultActionReject => Ok(TransferState::new(
                state.param.with_default_accept_local(false),
                state.result,
            )),
            Statement::Fallthrough => {
                state.param.trace("Fallthrough");
                let result = state
                    .result
                    .with_fallthrough(state.result.fallthrough.or(&reach))
                    .with_return_assigned(state.result.return_assigned.or(&reach));
                Ok(TransferState::from_result(&state.param, result))
            }
            Statement::SetDefaultPolicy(name) => {
                state.param.trace("SetDefaultPolicy");
                Ok(TransferState::new(state.param.with_default_policy(name), state.result))
            }
            Statement::If { guard, then_branch, else_branch } => {
                self.eval_if(guard, then_branch, else_branch, state)
            }
            Statement::SetMetric(expr) => {
                state.param.trace("SetMetric");
                let med = apply_long_expr(&state.param.data.med, expr, MED_WIDTH);
                let mut route = state.param.data.clone();
                route.med = med.ite(&reach, &route.med);
                Ok(self.commit_route(state, route))
            }
            Statement::SetLocalPreference(expr) => {
                state.param.trace("SetLocalPreference");
                let lp = apply_long_expr(&state.param.data.local_pref, expr, LOCAL_PREF_WIDTH);
                let mut route = state.param.data.clone();
                route.local_pref = lp.ite(&reach, &route.local_pref);
                Ok(self.commit_route(state, route))
            }
            Statement::SetTag(expr) => {
                state.param.trace("SetTag");
                let tag = apply_long_expr(&state.param.data.tag, expr, TAG_WIDTH);
                let mut route = state.param.data.clone();
                route.tag = tag.ite(&reach, &route.tag);
                Ok(self.commit_route(state, route))
            }
            Statement::SetWeight(value) => {
                state.param.trace("SetWeight");
                let mut route = state.param.data.clone();
                let w = SymbolicInteger::constant(route.variable_set(), WEIGHT_WIDTH, *value);
                route.weight = w.ite(&reach, &route.weight);
                Ok(self.commit_route(state, route))
            }
            Statement::SetAdminDistance(value) => {
                state.param.trace("SetAdminDistance");
                let mut route = state.param.data.clone();
                let ad = SymbolicInteger::constant(route.variable_set(), ADMIN_DISTANCE_WIDTH, *value);
                route.admin_distance = ad.ite(&reach, &route.admin_distance);
                Ok(self.commit_route(state, route))
            }
            Statement::SetOspfMetricType(metric_type) => {
                state.param.trace("SetOspfMetricType");
                let mut route = state.param.data.clone();
                let value: SymbolicDomain<OspfMetricType> = SymbolicDomain::constant(
                    route.variable_set(),
                    ALL_OSPF_METRIC_TYPES.to_vec(),
                    metric_type,
                );
                route.ospf_metric_type = value.ite(&reach, &route.ospf_metric_type);
                Ok(self.commit_route(state, route))
            }
            Statement::SetOrigin(_) => {
                Err(AnalysisError::UnsupportedFeature("set origin".to_string()))
            }
            Statement::SetCommunities(expr) => {
                state.param.trace("SetCommunities");
                let dispositions = self.communities.dispositions(expr);
                let mut route = state.param.data.clone();
                route.community_aps =
                    communities::updated_community_bits(&route, &dispositions, &reach);
                Ok(self.commit_route(state, route))
            }
            Statement::AddCommunities(exprs) => {
                state.param.trace("AddCommunities");
                let mut route = state.param.data.clone();
                for expr in exprs {
                    for ap in self.communities.entailed_aps(expr) {
                        route.community_aps[ap] =
                            bdd_ite(&reach, &route.mk_true(), &route.community_aps[ap]);
                    }
                }
                Ok(self.commit_route(state, route))
            }
            Statement::DeleteCommunities(expr) => {
                state.param.trace("DeleteCommunities");
                let mut route = state.param.data.clone();
                for ap in self.communities.entailed_aps(expr) {
                    route.community_aps[ap] =
                        bdd_ite(&reach, &route.mk_false(), &route.community_aps[ap]);
                }
                Ok(self.commit_route(state, route))
            }
            Statement::PrependAsPath(ases) => {
                state.param.trace("PrependAsPath");
                let mut route = state.param.data.clone();
                // The metric serves as a path-length proxy; prepending
                // lengthens the path by the number of prepended ASNs.
                let lengthened = route.med.add(&SymbolicInteger::constant(
                    route.variable_set(),
                    MED_WIDTH,
                    ases.len() as u64,
                ));
                route.med = lengthened.ite(&reach, &route.med);
                let mut prepended = ases.clone();
                prepended.extend(route.prepended_ases.iter().copied());
                route.prepended_ases = prepended;
                Ok(self.commit_route(state, route))
            }
            Statement::SetNextHop(expr) => {
                state.param.trace("SetNextHop");
                let mut route = state.param.data.clone();
                match expr {
                    NextHopExpr::Ip(ip) => {
                        let value = SymbolicInteger::constant(
                            route.variable_set(),
                            NEXT_HOP_WIDTH,
                            *ip as u64,
                        );
                        route.next_hop = value.ite(&reach, &route.next_hop);
                        route.next_hop_kind = NextHopKind::Ip;
                    }
                    NextHopExpr::Discard => route.next_hop_kind = NextHopKind::Discarded,
                    NextHopExpr::SelfIp => route.next_hop_kind = NextHopKind::SelfIp,
                    NextHopExpr::BgpPeerAddress => {
                        route.next_hop_kind = NextHopKind::BgpPeerAddress
                    }
                }
                route.next_hop_set = true;
                Ok(self.commit_route(state, route))
            }
            Statement::SetTunnelAttribute(name) => {
                state.param.trace("SetTunnelAttribute");
                if !self.catalogue.tunnel_attributes().iter().any(|t| t == name) {
                    return Err(AnalysisError::UnsupportedFeature(format!(
                        "tunnel attribute `{name}` outside the configured set"
                    )));
                }
                let mut route = state.param.data.clone();
                let value = SymbolicDomain::constant(
                    route.variable_set(),
                    route.tunnel_attribute.values().to_vec(),
                    &Some(name.clone()),
                );
                route.tunnel_attribute = value.ite(&reach, &route.tunnel_attribute);
                Ok(self.commit_route(state, route))
            }
            Statement::RemoveTunnelAttribute => {
                state.param.trace("RemoveTunnelAttribute");
                let mut route = state.param.data.clone();
                let value = SymbolicDomain::constant(
                    route.variable_set(),
                    route.tunnel_attribute.values().to_vec(),
                    &None,
                );
                route.tunnel_attribute = value.ite(&reach, &route.tunnel_attribute);
                Ok(self.commit_route(state, route))
            }
            Statement::Call(name) => {
                state.param.trace("CallStatement");
                let result = self.eval_call_statement(name, &state)?;
                Ok(TransferState::from_result(&state.param, result))
            }
            Statement::Buffered(inner) => {
                // Device-side buffering has no symbolic effect.
                self.eval_stmt(inner, state)
            }
            Statement::Traceable(inner) => self.eval_stmts(inner, state),
        }
    }

    fn eval_if(
        &mut self,
        guard: &BooleanExpr,
        then_branch: &[Statement],
        else_branch: &[Statement],
        state: TransferState,
    ) -> AnalysisResult<TransferState> {
        state.param.trace("If");
        let pre_unreachable = state.result.unreachable();
        let outcome = self.eval_expr(guard, &state)?;

        // A guard that exits the whole policy (a called policy hitting an
        // Exit statement) decides those inputs right here: they take the
        // callee's verdict and neither branch runs for them.
        let mut entry = state.result.clone();
        if !outcome.exit_assigned.is_false() {
            let exited = outcome.exit_assigned.and(&pre_unreachable.not());
            entry = entry
                .with_return_value(TransferReturn {
                    route: entry.return_value.route.clone(),
                    accept: bdd_ite(&exited, &outcome.predicate, &entry.return_value.accept),
                })
                .with_exit_assigned(entry.exit_assigned.or(&exited));
        }

        // Both branches run from the same pre-guard state over their own
        // copies of the route, so updates cannot alias.
        let branch_param = state.param.indented();
        let then_state = self.eval_stmts(
            then_branch,
            TransferState::new(branch_param.clone(), entry.clone()),
        )?;
        let else_state = self.eval_stmts(
            else_branch,
            TransferState::new(branch_param, entry),
        )?;

        let merged = then_state.result.ite(&outcome.predicate, &else_state.result);
        // Where this statement was never reached, the pre-statement result
        // survives untouched.
        let mut result = state.result.ite(&pre_unreachable, &merged);
        if outcome.unsupported {
            let mut route = result.return_value.route.clone();
            route.unsupported = true;
            result = result.with_return_value(TransferReturn {
                route,
                accept: result.return_value.accept.clone(),
            });
        }
        Ok(TransferState::from_result(&state.param, result))
    }

    // ----- expressions -----

    fn eval_expr(&mut self, expr: &BooleanExpr, state: &TransferState) -> AnalysisResult<ExprOutcome> {
        // Constants come from the state's route; match expressions consult
        // `route_for_matching` (the same variable set either way).
        let data = &state.param.data;
        match expr {
            BooleanExpr::Lit(true) => {
                state.param.trace("True");
                Ok(ExprOutcome::plain(data.mk_true(), data))
            }
            BooleanExpr::Lit(false) => {
                state.param.trace("False");
                Ok(ExprOutcome::plain(data.mk_false(), data))
            }
            BooleanExpr::CallExprContext => {
                state.param.trace("CallExprContext");
                let holds = state.param.call_context == CallContext::ExprCall;
                Ok(ExprOutcome::plain(mk_const(data, holds), data))
            }
            BooleanExpr::CallStatementContext => {
                state.param.trace("CallStatementContext");
                let holds = state.param.call_context == CallContext::StmtCall;
                Ok(ExprOutcome::plain(mk_const(data, holds), data))
            }
            BooleanExpr::MatchProtocol(protocols) => {
                state.param.trace("MatchProtocol");
                let route = self.route_for_matching(&state.param);
                Ok(ExprOutcome::plain(route.protocol.any_of(protocols), data))
            }
            BooleanExpr::MatchPrefixSet { prefix, prefixes } => {
                state.param.trace("MatchPrefixSet");
                // Prefix matches always consult the input route, as the
                // concrete evaluator reads the original destination.
                let pred = self.match_prefix_set(prefix, prefixes)?;
                Ok(ExprOutcome::plain(pred, data))
            }
            BooleanExpr::MatchTag(cmp, value) => {
                state.param.trace("MatchTag");
                let route = self.route_for_matching(&state.param);
                Ok(ExprOutcome::plain(
                    match_int_comparison(*cmp, *value, &route.tag),
                    data,
                ))
            }
            BooleanExpr::MatchCommunities(expr) => {
                state.param.trace("MatchCommunities");
                let route = self.route_for_matching(&state.param).clone();
                let mut unsupported = false;
                let pred = self.communities.set_match(&route, expr, &mut unsupported);
                Ok(ExprOutcome {
                    predicate: pred,
                    fallthrough: route.mk_false(),
                    exit_assigned: route.mk_false(),
                    unsupported,
                })
            }
            BooleanExpr::MatchAsPath(expr) => {
                state.param.trace("MatchAsPath");
                let route = self.route_for_matching(&state.param);
                let mut unsupported = false;
                let pred =
                    as_path::as_path_match(self.catalogue, self.config, route, expr, &mut unsupported);
                Ok(ExprOutcome {
                    predicate: pred,
                    fallthrough: route.mk_false(),
                    exit_assigned: route.mk_false(),
                    unsupported,
                })
            }
            BooleanExpr::MatchSourceVrf(name) => {
                state.param.trace("MatchSourceVrf");
                let route = self.route_for_matching(&state.param);
                let value = Some(name.clone());
                if route.source_vrf.values().contains(&value) {
                    Ok(ExprOutcome::plain(route.source_vrf.value(&value), data))
                } else {
                    warn!("source VRF `{name}` is not in the configured set; it matches nothing");
                    Ok(ExprOutcome::plain(data.mk_false(), data))
                }
            }
            BooleanExpr::TrackSucceeded(name) => {
                state.param.trace("TrackSucceeded");
                let route = self.route_for_matching(&state.param);
                match self.catalogue.tracks().iter().position(|t| t == name) {
                    Some(i) => Ok(ExprOutcome::plain(route.tracks[i].clone(), data)),
                    None => {
                        warn!("track `{name}` is not in the configured set; it matches nothing");
                        Ok(ExprOutcome::plain(data.mk_false(), data))
                    }
                }
            }
            BooleanExpr::Not(inner) => {
                state.param.trace("Not");
                let outcome = self.eval_expr(inner, state)?;
                Ok(ExprOutcome {
                    predicate: outcome.predicate.not(),
                    fallthrough: outcome.fallthrough,
                    exit_assigned: outcome.exit_assigned,
                    unsupported: outcome.unsupported,
                })
            }
            BooleanExpr::Conjunction(exprs) => {
                state.param.trace("Conjunction");
                let mut predicate = data.mk_true();
                let mut exit_assigned = data.mk_false();
                let mut unsupported = false;
                for e in exprs {
                    let outcome = self.eval_expr(e, state)?;
                    // A conjunct is only consulted where every earlier one
                    // held, so its exits apply on those inputs only.
                    exit_assigned = exit_assigned.or(&predicate.and(&outcome.exit_assigned));
                    predicate = predicate.and(&outcome.predicate);
                    unsupported |= outcome.unsupported;
                }
                Ok(ExprOutcome {
                    predicate,
                    fallthrough: state.param.data.mk_false(),
                    exit_assigned,
                    unsupported,
                })
            }
            BooleanExpr::Disjunction(exprs) => {
                state.param.trace("Disjunction");
                let mut predicate = data.mk_false();
                let mut exit_assigned = data.mk_false();
                let mut unsupported = false;
                for e in exprs {
                    let outcome = self.eval_expr(e, state)?;
                    exit_assigned =
                        exit_assigned.or(&predicate.not().and(&outcome.exit_assigned));
                    predicate = predicate.or(&outcome.predicate);
                    unsupported |= outcome.unsupported;
                }
                Ok(ExprOutcome {
                    predicate,
                    fallthrough: state.param.data.mk_false(),
                    exit_assigned,
                    unsupported,
                })
            }
            BooleanExpr::ConjunctionChain(exprs) => {
                state.param.trace("ConjunctionChain");
                self.eval_chain(exprs, state, true)
            }
            BooleanExpr::FirstMatchChain(exprs) => {
                state.param.trace("FirstMatchChain");
                self.eval_chain(exprs, state, false)
            }
            BooleanExpr::Call(name) => {
                state.param.trace("CallExpr");
                let result = self.eval_call_expr(name, state)?;
                Ok(ExprOutcome {
                    predicate: result.return_value.accept.clone(),
                    fallthrough: result.fallthrough.clone(),
                    exit_assigned: result.exit_assigned.clone(),
                    unsupported: result.return_value.route.unsupported,
                })
            }
        }
    }

    /// Right-to-left fold over chain elements keyed on each element's
    /// fall-through signal; the context's default policy, if any, acts as
    /// the final element.
    fn eval_chain(
        &mut self,
        exprs: &[BooleanExpr],
        state: &TransferState,
        conjunction: bool,
    ) -> AnalysisResult<ExprOutcome> {
        let data = &state.param.data;
        let mut elements: Vec<BooleanExpr> = exprs.to_vec();
        if let Some(default_policy) = &state.param.default_policy {
            elements.push(BooleanExpr::Call(default_policy.clone()));
        }
        if elements.is_empty() {
            if conjunction {
                // An empty conjunction chain holds vacuously.
                return Ok(ExprOutcome::plain(data.mk_true(), data));
            }
            return Err(AnalysisError::EmptyChain);
        }

        let chain_param = state
            .param
            .without_default_policy()
            .with_chain_context(true)
            .indented();
        let chain_state = TransferState::new(chain_param, state.result.clone());

        let mut acc = data.mk_false();
        let mut exit_acc = data.mk_false();
        let mut unsupported = false;
        for element in elements.iter().rev() {
            let outcome = self.eval_expr(element, &chain_state)?;
            // On inputs where this element falls through, the later
            // elements (already folded into `acc`) decide.
            acc = bdd_ite(&outcome.fallthrough, &acc, &outcome.predicate);
            // The element itself always runs when the chain reaches it;
            // the rest only runs where it fell through.
            exit_acc = outcome
                .exit_assigned
                .or(&outcome.fallthrough.and(&exit_acc));
            unsupported |= outcome.unsupported;
        }
        Ok(ExprOutcome {
            predicate: acc,
            fallthrough: state.param.data.mk_false(),
            exit_assigned: exit_acc,
            unsupported,
        })
    }

    // ----- calls -----

    /// Runs a called policy as a statement. Effects re-apply at every call
    /// site, so there is no memoization here: the callee starts from the
    /// caller's current state with a fresh return signal (prior exits still
    /// gate its statements), and its own returns stop the callee only.
    fn eval_call_statement(
        &mut self,
        name: &str,
        state: &TransferState,
    ) -> AnalysisResult<TransferResult> {
        let policy = self.resolve_call(name, &state.param)?;
        let saved_return = state.result.return_assigned.clone();
        let callee_param = state
            .param
            .with_call_context(CallContext::StmtCall)
            .enter_scope(name);
        let entry = state
            .result
            .with_return_assigned(state.result.return_value.route.mk_false());
        let callee_state = self.eval_stmts(
            &policy.statements,
            TransferState::from_result(&callee_param, entry),
        )?;
        Ok(callee_state.result.with_return_assigned(saved_return))
    }

    /// Runs a called policy as an expression, memoized per policy name.
    ///
    /// The callee is evaluated against a clean control-flow state, so the
    /// cached result describes the callee alone: its accept, fall-through,
    /// and exit predicates. Each call site folds those back into its own
    /// state (the `If`/chain machinery gates them on reachability), which
    /// keeps replays correct even when exits accrued between call sites.
    fn eval_call_expr(
        &mut self,
        name: &str,
        state: &TransferState,
    ) -> AnalysisResult<TransferResult> {
        let policy = self.resolve_call(name, &state.param)?;
        if let Some(cached) = self.call_cache.get(name) {
            state.param.trace("(cached)");
            return Ok(cached.clone());
        }
        let callee_param = state
            .param
            .with_call_context(CallContext::ExprCall)
            .enter_scope(name);
        let entry = TransferResult::new(state.param.data.clone());
        let callee_state = self
            .eval_stmts(&policy.statements, TransferState::new(callee_param, entry))?;
        self.call_cache
            .insert(name.to_string(), callee_state.result.clone());
        Ok(callee_state.result)
    }

    fn resolve_call(
        &self,
        name: &str,
        param: &TransferParam,
    ) -> AnalysisResult<crate::policy::RoutingPolicy> {
        if param.in_scope(name) {
            return Err(AnalysisError::UnsupportedFeature(format!(
                "recursive call to policy `{name}`"
            )));
        }
        self.config
            .policy(name)
            .cloned()
            .ok_or_else(|| AnalysisError::UndefinedPolicy(name.to_string()))
    }

    // ----- commit helpers -----

    fn commit_route(&self, state: TransferState, route: BddRoute) -> TransferState {
        let result = state.result.with_return_value(TransferReturn {
            route,
            accept: state.result.return_value.accept.clone(),
        });
        TransferState::from_result(&state.param, result)
    }

    fn exit_value(&self, result: &TransferResult, accept: bool) -> TransferResult {
        let reach = result.unreachable().not();
        let route = &result.return_value.route;
        let verdict = mk_const(route, accept);
        result
            .with_return_value(TransferReturn {
                route: route.clone(),
                accept: bdd_ite(&reach, &verdict, &result.return_value.accept),
            })
            .with_exit_assigned(result.exit_assigned.or(&reach))
    }

    fn return_value(&self, result: &TransferResult, accept: bool) -> TransferResult {
        let reach = result.unreachable().not();
        let route = &result.return_value.route;
        let verdict = mk_const(route, accept);
        result
            .with_return_value(TransferReturn {
                route: route.clone(),
                accept: bdd_ite(&reach, &verdict, &result.return_value.accept),
            })
            .with_return_assigned(result.return_assigned.or(&reach))
    }

    // ----- prefix matching -----

    fn match_prefix_set(
        &self,
        prefix: &PrefixExpr,
        prefixes: &PrefixSetExpr,
    ) -> AnalysisResult<Bdd> {
        let route = &self.original;
        match prefixes {
            PrefixSetExpr::Explicit(ranges) => Ok(ranges.iter().fold(route.mk_false(), |acc, r| {
                acc.or(&self.is_relevant_for(prefix, r))
            })),
            PrefixSetExpr::Named(name) => match self.config.route_filter_list(name) {
                Some(list) => Ok(list.lines.iter().rev().fold(route.mk_false(), |acc, line| {
                    let matched = self.is_relevant_for(prefix, &line.range);
                    let verdict = mk_const(route, line.action == LineAction::Permit);
                    bdd_ite(&matched, &verdict, &acc)
                })),
                None => {
                    warn!("route filter list `{name}` is not defined; it matches nothing");
                    Ok(route.mk_false())
                }
            },
        }
    }

    fn is_relevant_for(&self, prefix: &PrefixExpr, range: &PrefixRange) -> Bdd {
        let route = &self.original;
        let Prefix { ip, length } = range.prefix;
        match prefix {
            PrefixExpr::DestinationNetwork => {
                let (low, high) = range.length_range;
                route
                    .prefix
                    .matches_prefix(ip, length)
                    .and(&route.prefix_length.range(low as u64, high as u64))
            }
            // The next-hop address has no associated length to range over.
            PrefixExpr::NextHopIp => route.next_hop.matches_prefix(ip, length),
        }
    }
}

fn mk_const(route: &BddRoute, value: bool) -> Bdd {
    if value { route.mk_true() } else { route.mk_false() }
}

fn flag_unsupported(state: TransferState) -> TransferState {
    let mut route = state.result.return_value.route.clone();
    route.unsupported = true;
    let result = state.result.with_return_value(TransferReturn {
        route,
        accept: state.result.return_value.accept.clone(),
    });
    TransferState::from_result(&state.param, result)
}

fn apply_long_expr(current: &SymbolicInteger, expr: &LongExpr, width: u16) -> SymbolicInteger {
    match expr {
        LongExpr::Literal(value) => {
            SymbolicInteger::constant(current.variable_set(), width, *value)
        }
        LongExpr::IncrementBy(value) => {
            current.add(&SymbolicInteger::constant(current.variable_set(), width, *value))
        }
        LongExpr::DecrementBy(value) => {
            current.sub(&SymbolicInteger::constant(current.variable_set(), width, *value))
        }
    }
}

/// Constraint tying `int` to a comparison against a literal.
fn match_int_comparison(cmp: IntComparator, value: u64, int: &SymbolicInteger) -> Bdd {
    match cmp {
        IntComparator::Eq => int.value(value),
        IntComparator::Ge => int.geq(value),
        IntComparator::Gt => int.geq(value).and(&int.value(value).not()),
        IntComparator::Le => int.leq(value),
        IntComparator::Lt => int.leq(value).and(&int.value(value).not()),
    }
}
