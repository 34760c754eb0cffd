//! Contexto ambiente de la ejecución en curso: lineage activo e
//! identificador de correlación.
//!
//! Ambos se apilan por hilo alrededor de una invocación de step (push al
//! entrar, pop al salir, también cuando el step falla o hace panic) y están
//! vacíos fuera de cualquier ejecución.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::history::History;

thread_local! {
    static HISTORY: RefCell<Vec<History>> = const { RefCell::new(Vec::new()) };
    static CORRELATION: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Lineage del step que se está ejecutando en este hilo.
pub fn active_history() -> Option<History> {
    HISTORY.with(|h| h.borrow().last().cloned())
}

/// Identificador de correlación del step en ejecución.
pub fn correlation_id() -> Option<String> {
    CORRELATION.with(|c| c.borrow().last().cloned())
}

/// Guard que mantiene `history` como lineage activo hasta el drop.
pub struct HistoryScope {
    _not_send: PhantomData<*const ()>,
}

impl HistoryScope {
    pub fn enter(history: History) -> Self {
        HISTORY.with(|h| h.borrow_mut().push(history));
        Self { _not_send: PhantomData }
    }
}

impl Drop for HistoryScope {
    fn drop(&mut self) {
        HISTORY.with(|h| {
                   h.borrow_mut().pop();
               });
    }
}

pub struct CorrelationScope {
    _not_send: PhantomData<*const ()>,
}

impl CorrelationScope {
    pub fn enter(id: impl Into<String>) -> Self {
        CORRELATION.with(|c| c.borrow_mut().push(id.into()));
        Self { _not_send: PhantomData }
    }
}

impl Drop for CorrelationScope {
    fn drop(&mut self) {
        CORRELATION.with(|c| {
                       c.borrow_mut().pop();
                   });
    }
}
