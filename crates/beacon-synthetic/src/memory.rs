//! In-memory monitoring provider for tests and dry runs.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::client::SyntheticApi;
use crate::error::{SyntheticError, SyntheticResult};
use crate::types::{CheckSpec, Probe, SyntheticCheck};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticOp {
    ListChecks,
    AddCheck,
    UpdateCheck,
    DeleteCheck,
    ListProbes,
}

/// A recorded mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticCall {
    Add(CheckSpec),
    Update { id: i64, spec: CheckSpec },
    Delete(i64),
}

pub struct InMemorySynthetic {
    checks: RefCell<Vec<SyntheticCheck>>,
    probes: RefCell<Vec<Probe>>,
    calls: RefCell<Vec<SyntheticCall>>,
    failing: RefCell<HashSet<SyntheticOp>>,
    next_id: Cell<i64>,
}

impl Default for InMemorySynthetic {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySynthetic {
    pub fn new() -> Self {
        Self {
            checks: RefCell::new(Vec::new()),
            probes: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            next_id: Cell::new(100),
        }
    }

    /// Add an existing check without recording a call.
    pub fn seed_check(&self, spec: &CheckSpec) -> SyntheticCheck {
        let check = self.materialize(self.fresh_id(), spec);
        self.checks.borrow_mut().push(check.clone());
        check
    }

    pub fn seed_probe(&self, id: i64, name: &str, region: &str) {
        self.probes.borrow_mut().push(Probe {
            id,
            name: name.to_string(),
            region: region.to_string(),
            public: true,
            online: true,
        });
    }

    pub fn fail(&self, op: SyntheticOp) {
        self.failing.borrow_mut().insert(op);
    }

    pub fn recover(&self, op: SyntheticOp) {
        self.failing.borrow_mut().remove(&op);
    }

    pub fn calls(&self) -> Vec<SyntheticCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn checks(&self) -> Vec<SyntheticCheck> {
        self.checks.borrow().clone()
    }

    fn check(&self, op: SyntheticOp) -> SyntheticResult<()> {
        if self.failing.borrow().contains(&op) {
            return Err(SyntheticError::Api {
                status: 503,
                body: format!("{op:?} unavailable"),
            });
        }
        Ok(())
    }

    fn fresh_id(&self) -> i64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn materialize(&self, id: i64, spec: &CheckSpec) -> SyntheticCheck {
        SyntheticCheck {
            id,
            tenant_id: 1,
            job: spec.job.clone(),
            target: spec.target.clone(),
            frequency: spec.frequency,
            timeout: spec.timeout,
            probes: spec.probes.clone(),
            enabled: true,
            settings: spec.settings(),
        }
    }
}

impl SyntheticApi for InMemorySynthetic {
    fn list_checks(&self) -> SyntheticResult<Vec<SyntheticCheck>> {
        self.check(SyntheticOp::ListChecks)?;
        Ok(self.checks())
    }

    fn add_check(&self, spec: &CheckSpec) -> SyntheticResult<SyntheticCheck> {
        self.check(SyntheticOp::AddCheck)?;
        self.calls.borrow_mut().push(SyntheticCall::Add(spec.clone()));
        let created = self.materialize(self.fresh_id(), spec);
        self.checks.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn update_check(&self, id: i64, spec: &CheckSpec) -> SyntheticResult<SyntheticCheck> {
        self.check(SyntheticOp::UpdateCheck)?;
        self.calls.borrow_mut().push(SyntheticCall::Update {
            id,
            spec: spec.clone(),
        });
        let updated = self.materialize(id, spec);
        let mut checks = self.checks.borrow_mut();
        let slot = checks
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SyntheticError::NotFound(id))?;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_check(&self, id: i64) -> SyntheticResult<()> {
        self.check(SyntheticOp::DeleteCheck)?;
        self.calls.borrow_mut().push(SyntheticCall::Delete(id));
        let mut checks = self.checks.borrow_mut();
        let before = checks.len();
        checks.retain(|c| c.id != id);
        if checks.len() == before {
            return Err(SyntheticError::NotFound(id));
        }
        Ok(())
    }

    fn list_probes(&self) -> SyntheticResult<Vec<Probe>> {
        self.check(SyntheticOp::ListProbes)?;
        Ok(self.probes.borrow().clone())
    }
}
