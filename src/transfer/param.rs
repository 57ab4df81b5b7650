use log::debug;

use crate::route::BddRoute;

/// How the currently evaluated policy was entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallContext {
    None,
    ExprCall,
    StmtCall,
}

/// Immutable evaluation context threaded through the interpreter. Updates
/// go through the `with_*` methods, which copy; branches of an `If` can
/// therefore evolve independent contexts from one parent.
#[derive(Clone, Debug)]
pub struct TransferParam {
    pub data: BddRoute,
    pub call_context: CallContext,
    /// Whether evaluation sits inside a chain element, where a bare
    /// `ReturnLocalDefaultAction` means "fall through" rather than a
    /// definitive verdict.
    pub chain_context: bool,
    pub default_accept: bool,
    pub default_accept_local: bool,
    pub default_policy: Option<String>,
    scopes: Vec<String>,
    indent: usize,
}

impl TransferParam {
    pub fn new(data: BddRoute) -> TransferParam {
        TransferParam {
            data,
            call_context: CallContext::None,
            chain_context: false,
            default_accept: false,
            default_accept_local: false,
            default_policy: None,
            scopes: Vec::new(),
            indent: 0,
        }
    }

    pub fn with_data(&self, data: BddRoute) -> TransferParam {
        let mut copy = self.clone();
        copy.data = data;
        copy
    }

    pub fn with_call_context(&self, call_context: CallContext) -> TransferParam {
        let mut copy = self.clone();
        copy.call_context = call_context;
        copy
    }

    pub fn with_chain_context(&self, chain_context: bool) -> TransferParam {
        let mut copy = self.clone();
        copy.chain_context = chain_context;
        copy
    }

    /// Sets both the global and the local default action.
    pub fn with_default_accept(&self, accept: bool) -> TransferParam {
        let mut copy = self.clone();
        copy.default_accept = accept;
        copy.default_accept_local = accept;
        copy
    }

    pub fn with_default_accept_local(&self, accept: bool) -> TransferParam {
        let mut copy = self.clone();
        copy.default_accept_local = accept;
        copy
    }

    pub fn with_default_policy(&self, name: &str) -> TransferParam {
        let mut copy = self.clone();
        copy.default_policy = Some(name.to_string());
        copy
    }

    pub fn without_default_policy(&self) -> TransferParam {
        let mut copy = self.clone();
        copy.default_policy = None;
        copy
    }

    /// Enters a called policy's scope; used for cycle detection and trace
    /// indentation.
    pub fn enter_scope(&self, name: &str) -> TransferParam {
        let mut copy = self.clone();
        copy.scopes.push(name.to_string());
        copy.indent += 1;
        copy
    }

    pub fn in_scope(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s == name)
    }

    pub fn indented(&self) -> TransferParam {
        let mut copy = self.clone();
        copy.indent += 1;
        copy
    }

    pub fn trace(&self, message: &str) {
        debug!("{:indent$}{message}", "", indent = 2 * self.indent);
    }
}
