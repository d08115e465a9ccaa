//! Token tree construction from flow connections
//!
//! Walks `Flow` connections from a start node. The flow output named
//! [`FLOW_NEXT`] continues the current branch (the token's successor); every
//! other flow output opens a child branch, in port declaration order.
//! Tokens inside a child branch are guarded by the port that opened it.

use std::collections::HashSet;
use std::sync::Arc;

use flow_engine::{FlowError, GraphModel, NodeId, NodeToken, PortId, Result, TokenId, TokenTree};

/// Name of the flow input every flow node declares
pub const FLOW_IN: &str = "exec";

/// Name of the flow output that continues the current branch
pub const FLOW_NEXT: &str = "next";

/// Build the token tree rooted at `start`
///
/// Fails if `start` is unknown or if any node is reachable through more
/// than one flow path (including flow loops).
pub fn build_token_tree(model: &Arc<GraphModel>, start: &str) -> Result<TokenTree> {
    let mut builder = TreeBuilder {
        model,
        tree: TokenTree::new(),
        seen: HashSet::new(),
    };
    let root = builder.branch(start, &[])?;
    builder.tree.set_root(root)?;
    log::debug!(
        "Built token tree from '{}' with {} token(s)",
        start,
        builder.tree.len()
    );
    Ok(builder.tree)
}

struct TreeBuilder<'a> {
    model: &'a Arc<GraphModel>,
    tree: TokenTree,
    seen: HashSet<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    /// Push `start` and its `next` chain; returns the first token
    fn branch(&mut self, start: &str, guards: &[(NodeId, PortId)]) -> Result<TokenId> {
        let model = self.model;
        let mut first = None;
        let mut previous: Option<TokenId> = None;
        let mut current = Some(start.to_string());

        while let Some(node_id) = current.take() {
            let node = model
                .find_node(&node_id)
                .ok_or_else(|| FlowError::NodeNotFound(node_id.clone()))?;
            if !self.seen.insert(node_id.clone()) {
                return Err(FlowError::DuplicateFlowPath(node_id));
            }

            let token =
                NodeToken::new(model.clone(), node_id.as_str()).with_guards(guards.to_vec());
            let id = self.tree.push(token);
            match previous {
                Some(prev) => self.tree.set_successor(prev, id)?,
                None => first = Some(id),
            }

            for port in node.flow_outputs() {
                let Some(target) = model
                    .connections_of_port(&port.id)
                    .find(|c| c.source_port == port.id)
                    .map(|c| c.target_node.clone())
                else {
                    continue;
                };

                if port.name == FLOW_NEXT {
                    current = Some(target);
                } else {
                    let mut branch_guards = guards.to_vec();
                    branch_guards.push((node.id.clone(), port.id.clone()));
                    let child = self.branch(&target, &branch_guards)?;
                    self.tree.add_child(id, child)?;
                }
            }

            previous = Some(id);
        }

        first.ok_or_else(|| FlowError::NodeNotFound(start.to_string()))
    }
}
