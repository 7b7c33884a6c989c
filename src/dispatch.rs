// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of diaglog.
//
// diaglog is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// diaglog is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with diaglog.  If not,
// see <http://www.gnu.org/licenses/>.
//! Fanning finalized messages out to observers.
//!
//! A [`Dispatcher`] is an explicitly constructed registry of [`Observer`]s. Call sites hold a
//! reference to it (every [`Log`] is opened against one), and observers are attached via
//! [`Dispatcher::register`], which hands back a [`Registration`]: the observer stays attached for
//! exactly as long as that handle lives. The dispatcher itself only keeps a [`Weak`] reference, so
//! it never extends an observer's lifetime; an observer that goes away without being unregistered
//! is simply skipped.
//!
//! [`Log`]: crate::log::Log
//!
//! # Threading
//!
//! Delivery is synchronous & happens on the caller's thread: [`Dispatcher::dispatch`] returns only
//! after every observer's [`Observer::receive`] has returned. The registry uses [`RefCell`] and so
//! is neither `Send` nor `Sync`; if messages can originate from more than one execution context
//! (an interrupt handler & main-line code, say) the embedding system must serialize access itself.

use crate::severity::Severity;

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

/// Anything that can consume finalized log messages.
///
/// `text` is the complete message; its length is the message length.
pub trait Observer {
    fn receive(&self, severity: Severity, text: &str);
}

struct Entry {
    id: u64,
    observer: Weak<dyn Observer>,
}

/// An ordered registry of observers.
///
/// Observers are notified in the order in which they were registered. Registering the same
/// observer twice produces two entries (and two notifications per message).
pub struct Dispatcher {
    // Always sorted by `id`, since ids are handed out in increasing order & entries are only ever
    // appended.
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
    /// Attach `observer`; it will receive every message finalized until the returned
    /// [`Registration`] is dropped.
    pub fn register<O: Observer + 'static>(&self, observer: &Rc<O>) -> Registration<'_> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let observer: Weak<O> = Rc::downgrade(observer);
        let observer: Weak<dyn Observer> = observer;
        let mut entries = self.entries.borrow_mut();
        prune(&mut entries);
        entries.push(Entry { id, observer });
        tracing::trace!(id, "observer registered");
        Registration {
            dispatcher: self,
            id,
        }
    }
    /// Detach every observer. Outstanding [`Registration`]s become no-ops.
    pub fn unregister_all(&self) {
        self.entries.borrow_mut().clear();
        tracing::trace!("all observers unregistered");
    }
    /// The number of live registrations; entries whose observer has been dropped aren't counted
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.observer.strong_count() > 0)
            .count()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Deliver a message to every registered observer, in registration order.
    ///
    /// The set of recipients is fixed when this method is entered: observers registered while the
    /// message is being delivered won't see it. No borrow of the registry is held while an
    /// observer runs, so observers are free to log, register or unregister from within
    /// [`Observer::receive`].
    pub fn dispatch(&self, severity: Severity, text: &str) {
        let limit = self.next_id.get();
        let mut last: Option<u64> = None;
        loop {
            let next = {
                let entries = self.entries.borrow();
                let idx = match last {
                    Some(last) => entries.partition_point(|e| e.id <= last),
                    None => 0,
                };
                entries
                    .get(idx)
                    .filter(|e| e.id < limit)
                    .map(|e| (e.id, e.observer.clone()))
            };
            let Some((id, observer)) = next else {
                break;
            };
            last = Some(id);
            if let Some(observer) = observer.upgrade() {
                observer.receive(severity, text);
            }
        }
    }
    fn unregister(&self, id: u64) {
        let mut entries = self.entries.borrow_mut();
        if let Ok(idx) = entries.binary_search_by_key(&id, |e| e.id) {
            entries.remove(idx);
            tracing::trace!(id, "observer unregistered");
        }
        prune(&mut entries);
    }
}

/// Drop entries whose observer has gone away without unregistering.
fn prune(entries: &mut Vec<Entry>) {
    let before = entries.len();
    entries.retain(|e| e.observer.strong_count() > 0);
    if entries.len() != before {
        tracing::trace!(pruned = before - entries.len(), "dead observers pruned");
    }
}

impl std::default::Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("observers", &self.len())
            .finish()
    }
}

/// Keeps an observer attached to a [`Dispatcher`]; dropping it detaches the observer.
#[must_use = "dropping a Registration immediately unregisters the observer"]
pub struct Registration<'d> {
    dispatcher: &'d Dispatcher,
    id: u64,
}

impl<'d> Registration<'d> {
    /// Detach the observer now (equivalent to dropping the handle).
    pub fn unregister(self) {}
    /// Give up the handle, leaving the observer attached for as long as it (and the dispatcher)
    /// live, or until [`Dispatcher::unregister_all`].
    pub fn forget(self) {
        std::mem::forget(self)
    }
}

impl<'d> Drop for Registration<'d> {
    fn drop(&mut self) {
        self.dispatcher.unregister(self.id)
    }
}

impl<'d> std::fmt::Debug for Registration<'d> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}
