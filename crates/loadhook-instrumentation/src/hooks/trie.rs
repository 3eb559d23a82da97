//! Module-name trie: hooks keyed by `/`-separated module name segments.
//!
//! A registration for `pkg` is stored on the `pkg` node, one for
//! `pkg/lib/file.js` on the `pkg -> lib -> file.js` chain. A search walks the
//! chain of the requested name and collects hooks from the nodes it visits.

use std::collections::HashMap;

use super::definitions::Hooked;

/// Separator between module name segments.
pub const MODULE_NAME_SEPARATOR: char = '/';

/// Options controlling [`ModuleNameTrie::search`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Return matches in registration order.
    pub maintain_insertion_order: bool,
    /// Only return hooks registered at exactly the requested name.
    pub full_only: bool,
}

/// Hook stored on a node together with its registration sequence number.
#[derive(Debug)]
struct TrieEntry {
    hook: Hooked,
    insertion_id: u64,
}

#[derive(Debug, Default)]
struct TrieNode {
    hooks: Vec<TrieEntry>,
    children: HashMap<String, TrieNode>,
}

/// Prefix tree of registered hooks.
#[derive(Debug, Default)]
pub struct ModuleNameTrie {
    root: TrieNode,
    counter: u64,
}

impl ModuleNameTrie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a hook at the node of its module name, creating intermediate
    /// nodes as needed. Hooks registered for the same name accumulate.
    pub fn insert(&mut self, hook: Hooked) {
        let mut node = &mut self.root;
        for part in hook.module_name.split(MODULE_NAME_SEPARATOR) {
            node = node.children.entry(part.to_string()).or_default();
        }

        node.hooks.push(TrieEntry {
            hook,
            insertion_id: self.counter,
        });
        self.counter += 1;
    }

    /// Returns the hooks matching `module_name`.
    ///
    /// Without `full_only`, every node on the walked path contributes its
    /// hooks and a walk that stops early still returns what it collected.
    /// With `full_only`, only the terminal node counts and only when every
    /// segment was found.
    pub fn search(&self, module_name: &str, options: SearchOptions) -> Vec<Hooked> {
        let mut node = &self.root;
        let mut results: Vec<&TrieEntry> = Vec::new();
        let mut found_full = true;

        for part in module_name.split(MODULE_NAME_SEPARATOR) {
            let Some(next) = node.children.get(part) else {
                found_full = false;
                break;
            };
            if !options.full_only {
                results.extend(next.hooks.iter());
            }
            node = next;
        }

        if options.full_only && found_full {
            results.extend(node.hooks.iter());
        }

        match results.len() {
            0 => Vec::new(),
            1 => vec![results[0].hook.clone()],
            _ => {
                if options.maintain_insertion_order {
                    results.sort_by_key(|entry| entry.insertion_id);
                }
                results.into_iter().map(|entry| entry.hook.clone()).collect()
            }
        }
    }

    /// Number of hooks registered so far.
    pub fn len(&self) -> usize {
        self.counter as usize
    }

    /// Whether no hook has been registered.
    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }
}
