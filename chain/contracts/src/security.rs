//! Shared security primitives for contract modules
//!
//! Provides the reentrancy guard serializing mutating calls and the
//! role-based access control used by the exchange and registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use types::ids::AccountId;

/// Reentrancy guard serializing state-changing calls.
///
/// A mutating operation enters the guard before touching state and holds the
/// returned [`Entered`] token until it has committed (or bailed out). While
/// the token is alive:
///
/// - a nested call on the same thread (e.g. from an event callback) fails
///   immediately with [`ReentrancyError`];
/// - a call from another thread blocks until the token is dropped, even when
///   the holder spawned that thread and is waiting on it.
///
/// Dropping the token releases the guard on every exit path, including early
/// `?` returns.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    inner: Arc<GuardState>,
}

#[derive(Debug, Default)]
struct GuardState {
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
}

/// Returned when a guarded call is re-entered before it committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReentrancyError;

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the guard, waiting for any call in flight on another thread.
    pub fn enter(&self) -> Result<Entered, ReentrancyError> {
        let me = thread::current().id();
        let mut owner = self.lock_owner();
        loop {
            let holder = *owner;
            match holder {
                None => break,
                Some(holder) if holder == me => return Err(ReentrancyError),
                Some(_) => {
                    owner = self
                        .inner
                        .released
                        .wait(owner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        *owner = Some(me);
        Ok(Entered {
            state: Arc::clone(&self.inner),
        })
    }

    /// Check if a call is currently in flight.
    pub fn is_locked(&self) -> bool {
        self.lock_owner().is_some()
    }

    fn lock_owner(&self) -> MutexGuard<'_, Option<ThreadId>> {
        // The guarded value is a plain Option, so a poisoned lock is still consistent.
        self.inner
            .owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of having entered a [`ReentrancyGuard`]. Releases it on drop.
#[derive(Debug)]
pub struct Entered {
    state: Arc<GuardState>,
}

impl Drop for Entered {
    fn drop(&mut self) {
        let mut owner = self
            .state
            .owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *owner = None;
        self.state.released.notify_one();
    }
}

/// Access control roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full system control
    Admin,
    /// Operational tasks (e.g., assigning verification tiers)
    Operator,
}

/// Role-based access control manager.
///
/// Maps callers to their assigned roles. The primary admin cannot be revoked.
#[derive(Debug, Clone)]
pub struct AccessControl {
    roles: HashMap<AccountId, Role>,
    admin: AccountId,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: AccountId) -> Self {
        let mut roles = HashMap::new();
        roles.insert(admin, Role::Admin);
        Self { roles, admin }
    }

    /// Check if a caller has the specified role.
    pub fn has_role(&self, caller: &AccountId, role: Role) -> bool {
        self.roles.get(caller).is_some_and(|r| *r == role)
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &AccountId) -> bool {
        self.has_role(caller, Role::Admin)
    }

    /// Admin or operator.
    pub fn is_privileged(&self, caller: &AccountId) -> bool {
        self.roles.contains_key(caller)
    }

    /// Assign a role to a caller. Only admin can assign roles.
    pub fn grant_role(&mut self, admin_caller: &AccountId, target: AccountId, role: Role) -> bool {
        if !self.is_admin(admin_caller) {
            return false;
        }
        self.roles.insert(target, role);
        true
    }

    /// Remove a role from a caller. Only admin can revoke.
    pub fn revoke_role(&mut self, admin_caller: &AccountId, target: &AccountId) -> bool {
        if !self.is_admin(admin_caller) || *target == self.admin {
            return false;
        }
        self.roles.remove(target);
        true
    }
}
