use thiserror::Error;

// Both variants point at a bug in the caller (a grammar rule consuming
// without checking its FIRST set), not at bad user input.
#[derive(Error, PartialEq, Eq, Debug, Clone, Copy)]
pub enum LookaheadError {
    #[error("n must be greater than or equal to 1, got {0}")]
    InvalidCount(usize),

    #[error("out of range: requested {requested} elements but only {remaining} remain")]
    Exhausted { requested: usize, remaining: usize },
}

/// Bounded lookahead over a finite sequence.
///
/// The backing vector is never mutated, a cursor marks how much of it has
/// been consumed. Elements handed back through [`Lookahead::unget`] sit on a
/// small stack in front of the cursor and are always served first, so
/// `peek` is plain index arithmetic over those two regions.
#[derive(Debug, Clone)]
pub struct Lookahead<T> {
    items: Vec<T>,
    cursor: usize,
    // Last element is the front of the buffer.
    pushed_back: Vec<T>,
}

impl<T: Clone> Lookahead<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: 0,
            pushed_back: Vec::new(),
        }
    }

    /// Number of elements not yet consumed, including ungot ones.
    pub fn remaining(&self) -> usize {
        self.pushed_back.len() + (self.items.len() - self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume `n` elements and return the last one consumed.
    ///
    /// Nothing is consumed when fewer than `n` elements remain.
    pub fn get(&mut self, n: usize) -> Result<T, LookaheadError> {
        check_count(n)?;

        let remaining = self.remaining();
        if n > remaining {
            return Err(LookaheadError::Exhausted {
                requested: n,
                remaining,
            });
        }

        for _ in 1..n {
            self.advance();
        }

        Ok(self.advance())
    }

    /// Push `item` back so that it becomes the next element returned by `get(1)`.
    pub fn unget(&mut self, item: T) {
        self.pushed_back.push(item);
    }

    /// Return the `n`-th element ahead without consuming anything, `None` if
    /// fewer than `n` elements remain.
    pub fn peek(&self, n: usize) -> Result<Option<&T>, LookaheadError> {
        check_count(n)?;

        let pushed = self.pushed_back.len();
        if n <= pushed {
            return Ok(self.pushed_back.get(pushed - n));
        }

        Ok(self.items.get(self.cursor + (n - pushed) - 1))
    }

    /// Shorthand for `peek(1)`, which can never fail on its count.
    pub fn current(&self) -> Option<&T> {
        self.pushed_back.last().or_else(|| self.items.get(self.cursor))
    }

    // Callers guarantee at least one element remains.
    fn advance(&mut self) -> T {
        match self.pushed_back.pop() {
            Some(item) => item,
            None => {
                let item = self.items[self.cursor].clone();
                self.cursor += 1;
                item
            }
        }
    }
}

impl<T: Clone> From<Vec<T>> for Lookahead<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Clone> FromIterator<T> for Lookahead<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn check_count(n: usize) -> Result<(), LookaheadError> {
    if n < 1 {
        Err(LookaheadError::InvalidCount(n))
    } else {
        Ok(())
    }
}
