//! Flow tokens and the token tree
//!
//! Tokens are stored in an arena. Each slot owns its token and refers to its
//! successor and children by index, so the tree has no back-references.
//! Indices can still describe a cycle, which is why every traversal runs
//! through a `VisitGuard`.

use std::sync::Arc;

use crate::accumulator::FlowAccumulator;
use crate::error::{FlowError, Result};

/// Index of a token inside a `TokenTree`
pub type TokenId = usize;

/// The runtime contribution of one authored node
pub trait FlowToken: Send + Sync {
    /// Human-readable label used in logs and events
    fn label(&self) -> &str;

    /// Append this token's units to the accumulator
    ///
    /// Called at most once per compilation or execution pass.
    fn resolve(&self, accumulator: &mut FlowAccumulator) -> Result<()>;
}

/// A token backed by a closure
pub struct FnToken<F> {
    label: String,
    resolve: F,
}

impl<F> FnToken<F>
where
    F: Fn(&mut FlowAccumulator) -> Result<()> + Send + Sync,
{
    /// Create a closure-backed token
    pub fn new(label: impl Into<String>, resolve: F) -> Self {
        Self {
            label: label.into(),
            resolve,
        }
    }
}

impl<F> FlowToken for FnToken<F>
where
    F: Fn(&mut FlowAccumulator) -> Result<()> + Send + Sync,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve(&self, accumulator: &mut FlowAccumulator) -> Result<()> {
        (self.resolve)(accumulator)
    }
}

struct TokenSlot {
    token: Arc<dyn FlowToken>,
    successor: Option<TokenId>,
    children: Vec<TokenId>,
}

/// Arena holding a tree of tokens
#[derive(Default)]
pub struct TokenTree {
    slots: Vec<TokenSlot>,
    root: Option<TokenId>,
}

impl TokenTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token; the first token added becomes the root
    pub fn push(&mut self, token: impl FlowToken + 'static) -> TokenId {
        self.push_arc(Arc::new(token))
    }

    /// Add a shared token; the first token added becomes the root
    pub fn push_arc(&mut self, token: Arc<dyn FlowToken>) -> TokenId {
        let id = self.slots.len();
        self.slots.push(TokenSlot {
            token,
            successor: None,
            children: Vec::new(),
        });
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Choose the start token
    pub fn set_root(&mut self, id: TokenId) -> Result<()> {
        self.slot(id)?;
        self.root = Some(id);
        Ok(())
    }

    /// The start token
    pub fn root(&self) -> Result<TokenId> {
        self.root.ok_or(FlowError::MissingRoot)
    }

    /// Link `next` as the successor of `id`
    pub fn set_successor(&mut self, id: TokenId, next: TokenId) -> Result<()> {
        self.slot(next)?;
        self.slot_mut(id)?.successor = Some(next);
        Ok(())
    }

    /// Append `child` to the children of `parent`
    pub fn add_child(&mut self, parent: TokenId, child: TokenId) -> Result<()> {
        self.slot(child)?;
        self.slot_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Add tokens linked as a successor chain, returning the first ID
    pub fn push_chain<I>(&mut self, tokens: I) -> Result<Option<TokenId>>
    where
        I: IntoIterator<Item = Arc<dyn FlowToken>>,
    {
        let mut first = None;
        let mut previous: Option<TokenId> = None;
        for token in tokens {
            let id = self.push_arc(token);
            match previous {
                Some(prev) => self.set_successor(prev, id)?,
                None => first = Some(id),
            }
            previous = Some(id);
        }
        Ok(first)
    }

    /// The token stored at `id`
    pub fn token(&self, id: TokenId) -> Result<&Arc<dyn FlowToken>> {
        Ok(&self.slot(id)?.token)
    }

    /// Label of the token stored at `id`
    pub fn label(&self, id: TokenId) -> Result<&str> {
        Ok(self.slot(id)?.token.label())
    }

    /// Successor of `id`
    pub fn successor(&self, id: TokenId) -> Result<Option<TokenId>> {
        Ok(self.slot(id)?.successor)
    }

    /// Children of `id`, in execution order
    pub fn children(&self, id: TokenId) -> Result<&[TokenId]> {
        Ok(&self.slot(id)?.children)
    }

    /// Number of tokens in the arena
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, id: TokenId) -> Result<&TokenSlot> {
        self.slots.get(id).ok_or(FlowError::UnknownToken(id))
    }

    fn slot_mut(&mut self, id: TokenId) -> Result<&mut TokenSlot> {
        self.slots.get_mut(id).ok_or(FlowError::UnknownToken(id))
    }
}

/// Per-pass record of visited tokens
///
/// Rejects a token reached twice and bounds the total number of visits.
pub(crate) struct VisitGuard {
    seen: Vec<bool>,
    visited: usize,
    max_tokens: usize,
}

impl VisitGuard {
    pub(crate) fn new(tree: &TokenTree, max_tokens: usize) -> Self {
        Self {
            seen: vec![false; tree.len()],
            visited: 0,
            max_tokens,
        }
    }

    pub(crate) fn visit(&mut self, tree: &TokenTree, id: TokenId) -> Result<()> {
        let label = tree.label(id)?;
        let seen = self.seen.get_mut(id).ok_or(FlowError::UnknownToken(id))?;
        if *seen {
            return Err(FlowError::TokenRevisited {
                id,
                label: label.to_string(),
            });
        }
        *seen = true;

        self.visited += 1;
        if self.visited > self.max_tokens {
            return Err(FlowError::TokenLimitExceeded(self.max_tokens));
        }
        Ok(())
    }
}
