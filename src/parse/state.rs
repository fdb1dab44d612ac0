//! Parser state and the stack that models its nesting.

use log::trace;

/// Where the parser currently is, lexically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Outer context: words, operators, escapes.
    Free,
    InSingleQuotes,
    InDoubleQuotes,
    /// Just saw `>`; a second `>` makes it an append.
    InWriteAppendOrRedirectionPath,
    /// Accumulating the target path of the latest redirection.
    InRedirectionPath,
}

/// Push/pop stack of [`State`]s. `Free` sits at the bottom and cannot be popped.
#[derive(Debug, Clone)]
pub struct StateStack {
    states: Vec<State>,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStack {
    pub fn new() -> Self {
        Self {
            states: vec![State::Free],
        }
    }

    pub fn current(&self) -> State {
        self.states.last().copied().unwrap_or(State::Free)
    }

    pub fn push(&mut self, state: State) {
        trace!("push {state:?} (depth {})", self.states.len() + 1);
        self.states.push(state);
    }

    /// Pop the top state. Returns `None` (and leaves the stack alone) when
    /// only the base `Free` remains.
    pub fn pop(&mut self) -> Option<State> {
        if self.states.len() <= 1 {
            return None;
        }
        let popped = self.states.pop();
        trace!("pop {popped:?} (depth {})", self.states.len());
        popped
    }

    /// Pop then push in one step.
    pub fn replace_top(&mut self, state: State) {
        self.pop();
        self.push(state);
    }

    /// Is `state` anywhere on the stack?
    pub fn contains(&self, state: State) -> bool {
        self.states.contains(&state)
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn at_rest(&self) -> bool {
        self.states.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_free() {
        let stack = StateStack::new();
        assert_eq!(stack.current(), State::Free);
        assert_eq!(stack.depth(), 1);
        assert!(stack.at_rest());
    }

    #[test]
    fn cannot_pop_base() {
        let mut stack = StateStack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.current(), State::Free);
    }

    #[test]
    fn push_pop_nesting() {
        let mut stack = StateStack::new();
        stack.push(State::InRedirectionPath);
        stack.push(State::InDoubleQuotes);
        assert_eq!(stack.current(), State::InDoubleQuotes);
        assert!(stack.contains(State::InRedirectionPath));
        assert_eq!(stack.pop(), Some(State::InDoubleQuotes));
        assert_eq!(stack.current(), State::InRedirectionPath);
        assert!(!stack.contains(State::InDoubleQuotes));
    }

    #[test]
    fn replace_top_keeps_depth() {
        let mut stack = StateStack::new();
        stack.push(State::InWriteAppendOrRedirectionPath);
        stack.replace_top(State::InRedirectionPath);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current(), State::InRedirectionPath);
    }
}
