//! Scoped middleware frames, one stack per verb.

use std::collections::HashMap;

use crate::handler::BoxedHandler;
use crate::method::Verb;

/// The handlers one middleware file contributed, pushed and popped as a unit.
pub type Frame = Vec<BoxedHandler>;

/// Middleware in scope at the directory being visited.
#[derive(Debug, Default)]
pub struct MiddlewareStack {
    frames: HashMap<Verb, Vec<Frame>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, verb: Verb, frame: Frame) {
        self.frames.entry(verb).or_default().push(frame);
    }

    pub fn pop(&mut self, verb: Verb) -> Option<Frame> {
        let frames = self.frames.get_mut(&verb)?;
        let frame = frames.pop();
        if frames.is_empty() {
            self.frames.remove(&verb);
        }
        frame
    }

    /// Pushes every frame in order and returns the verbs to hand back to
    /// [`pop_all`](Self::pop_all).
    pub fn push_all(&mut self, frames: Vec<(Verb, Frame)>) -> Vec<Verb> {
        frames
            .into_iter()
            .map(|(verb, frame)| {
                self.push(verb, frame);
                verb
            })
            .collect()
    }

    /// Pops what [`push_all`](Self::push_all) pushed, last first.
    pub fn pop_all(&mut self, pushed: &[Verb]) {
        for verb in pushed.iter().rev() {
            self.pop(*verb);
        }
    }

    pub fn depth(&self, verb: Verb) -> usize {
        self.frames.get(&verb).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// The middleware a route for `verb` runs behind: every `all` frame in
    /// push order, then every frame for `verb` itself in push order.
    ///
    /// Always a fresh vector; callers may mutate it freely.
    pub fn resolve(&self, verb: Verb) -> Vec<BoxedHandler> {
        let mut chain: Vec<BoxedHandler> = self.frames_for(Verb::All).flatten().cloned().collect();
        if verb != Verb::All {
            chain.extend(self.frames_for(verb).flatten().cloned());
        }
        chain
    }

    fn frames_for(&self, verb: Verb) -> impl Iterator<Item = &Frame> {
        self.frames.get(&verb).into_iter().flatten()
    }
}
