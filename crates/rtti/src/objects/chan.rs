// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message queue backed by a crossbeam bounded channel.
//!
//! Capacity 0 gives a rendezvous channel. Queued messages are [`Stored`] in
//! the installed heap. Closing drops the object's sender and a second,
//! message-less signal channel: senders parked at that moment wake on the
//! signal and raise, receivers drain what is buffered, then observe the
//! close.

use super::Stored;
use crate::error::{raise, Error};
use crate::types::Type;
use crossbeam::channel::{self, select_biased, Receiver, RecvError, Sender, TryRecvError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a receive.
pub(crate) enum Recv {
    Value(Stored),
    /// The channel is closed and drained.
    Closed,
    /// Non-blocking receive found nothing.
    Empty,
}

/// Channel object referenced by a chan value's word.
pub struct ChanObject {
    elem: Type,
    cap: usize,
    tx: RwLock<Option<Sender<Stored>>>,
    rx: Receiver<Stored>,
    /// Never carries a message; disconnects when the channel closes.
    closing_tx: RwLock<Option<Sender<()>>>,
    closing_rx: Receiver<()>,
    closed: AtomicBool,
}

impl std::fmt::Debug for ChanObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChanObject")
            .field("elem", &self.elem)
            .field("cap", &self.cap)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ChanObject {
    #[must_use]
    pub fn new(elem: Type, cap: usize) -> Self {
        let (tx, rx) = channel::bounded(cap);
        let (closing_tx, closing_rx) = channel::bounded(0);
        Self {
            elem,
            cap,
            tx: RwLock::new(Some(tx)),
            rx,
            closing_tx: RwLock::new(Some(closing_tx)),
            closing_rx,
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn elem_type(&self) -> Type {
        self.elem
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Buffered element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn sender(&self, method: &'static str) -> Sender<Stored> {
        match self.tx.read().as_ref() {
            Some(tx) => tx.clone(),
            None => raise(Error::ClosedChan { method }),
        }
    }

    /// Blocking send. Raises when the channel is closed, including when it
    /// closes while this send is parked.
    pub(crate) fn send(&self, v: Stored) {
        // The lock is released before blocking so that close never waits on
        // a parked sender. The close signal is listed first: once the
        // channel is closed it always wins over a ready send.
        let tx = self.sender("send");
        select_biased! {
            recv(self.closing_rx) -> _ => raise(Error::ClosedChan { method: "send" }),
            send(tx, v) -> res => {
                if res.is_err() {
                    raise(Error::ClosedChan { method: "send" });
                }
            }
        }
    }

    /// Non-blocking send; `false` when no receiver or buffer slot is ready.
    pub(crate) fn try_send(&self, v: Stored) -> bool {
        let tx = self.sender("send");
        select_biased! {
            recv(self.closing_rx) -> _ => raise(Error::ClosedChan { method: "send" }),
            send(tx, v) -> res => {
                if res.is_err() {
                    raise(Error::ClosedChan { method: "send" });
                }
                true
            }
            default => false,
        }
    }

    /// Blocking receive.
    pub(crate) fn recv(&self) -> Recv {
        match self.rx.recv() {
            Ok(b) => Recv::Value(b),
            Err(RecvError) => Recv::Closed,
        }
    }

    pub(crate) fn try_recv(&self) -> Recv {
        match self.rx.try_recv() {
            Ok(b) => Recv::Value(b),
            Err(TryRecvError::Empty) if !self.is_closed() => Recv::Empty,
            // Closed: a sender racing the close may still have delivered.
            Err(TryRecvError::Empty) => match self.rx.try_recv() {
                Ok(b) => Recv::Value(b),
                Err(_) => Recv::Closed,
            },
            Err(TryRecvError::Disconnected) => Recv::Closed,
        }
    }

    /// Close the channel. Raises on a second close.
    pub(crate) fn close(&self) {
        let tx = self.tx.write().take();
        if tx.is_none() {
            raise(Error::ClosedChan { method: "close" });
        }
        self.closed.store(true, Ordering::Release);
        // Wakes parked senders.
        drop(self.closing_tx.write().take());
        log::debug!("[chan] closed chan {} (cap {})", self.elem, self.cap);
    }
}
