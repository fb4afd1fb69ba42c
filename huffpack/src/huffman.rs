use crate::error::{Error, FormatError, Result};
use crate::frequency::FrequencyEntry;
use std::collections::VecDeque;

/// Longest code the table format can hold.
pub const MAX_CODE_LENGTH: u8 = 32;

/// Huffman tree stored as an arena. Children are addressed by index into `nodes`.
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
}

#[derive(Debug, Default, Clone)]
pub struct CodeTable {
    entries: Vec<CodeEntry>,
    lookup: Vec<Option<PrefixCode>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEntry {
    pub symbol: u8,
    pub code: PrefixCode,
}

/// Code bits are right-aligned in `code`; the first bit on the wire is bit `length - 1`.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct PrefixCode {
    pub code: u32,
    pub length: u8,
}

/// Position inside a tree while decoding bit by bit.
#[derive(Debug, Clone, Copy)]
pub struct WalkIterator {
    pub idx: usize,
    pub symbol: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        zero: Option<usize>,
        one: Option<usize>,
    },
}

impl Node {
    fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    fn child(&self, bit: bool) -> Option<usize> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { zero, one, .. } => {
                if bit {
                    *one
                } else {
                    *zero
                }
            }
        }
    }

    fn empty_internal() -> Node {
        Node::Internal {
            weight: 0,
            zero: None,
            one: None,
        }
    }
}

impl PrefixCode {
    fn update(prefix_code: PrefixCode, bit: bool) -> PrefixCode {
        PrefixCode {
            code: (prefix_code.code << 1) | bit as u32,
            length: prefix_code.length.saturating_add(1),
        }
    }

    fn bit(&self, idx: u8) -> bool {
        (self.code >> idx) & 1 != 0
    }
}

impl std::fmt::Display for PrefixCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for idx in (0..self.length).rev() {
            f.write_str(if self.bit(idx) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PrefixCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PrefixCode {{ code: {}, length: {} }}",
            self, self.length
        )
    }
}

impl HuffmanTree {
    /// Builds a tree by repeatedly merging the two lightest nodes.
    ///
    /// Nodes are kept in a list sorted by weight instead of a heap so that ties
    /// resolve the same way on every run: leaves of equal weight keep ascending
    /// symbol order, and a merged node goes before the first node whose weight
    /// is not lower than its own.
    /// The first node taken from the list becomes the one-branch.
    pub fn build(freqs: &[FrequencyEntry]) -> Result<HuffmanTree> {
        if freqs.is_empty() {
            return Err(Error::EmptyFrequencyTable);
        }

        let mut nodes = Vec::with_capacity(2 * freqs.len() - 1);
        let mut order: Vec<usize> = Vec::with_capacity(freqs.len());

        for entry in freqs {
            order.push(nodes.len());
            nodes.push(Node::Leaf {
                symbol: entry.symbol,
                weight: entry.count,
            });
        }
        order.sort_by_key(|&idx| nodes[idx].weight());

        let mut list: VecDeque<usize> = order.into();

        while list.len() > 1 {
            let (Some(one), Some(zero)) = (list.pop_front(), list.pop_front()) else {
                break;
            };

            let weight = nodes[one].weight() + nodes[zero].weight();
            let internal_idx = nodes.len();
            nodes.push(Node::Internal {
                weight,
                zero: Some(zero),
                one: Some(one),
            });

            let position = list
                .iter()
                .position(|&idx| nodes[idx].weight() >= weight)
                .unwrap_or(list.len());
            list.insert(position, internal_idx);
        }

        let root = list.pop_front().ok_or(Error::EmptyFrequencyTable)?;
        tracing::trace!(
            symbols = freqs.len(),
            nodes = nodes.len(),
            weight = nodes[root].weight(),
            "built huffman tree"
        );

        Ok(HuffmanTree { nodes, root })
    }

    /// Rebuilds the tree described by a table read from a compressed stream.
    ///
    /// A single entry with a zero length is accepted and becomes a tree whose
    /// root is the leaf itself. Node weights are not stored in the table and
    /// read back as zero.
    pub fn from_table(table: &CodeTable) -> std::result::Result<HuffmanTree, FormatError> {
        let entries = table.entries();

        if let [entry] = entries {
            if entry.code.length == 0 {
                return Ok(HuffmanTree {
                    nodes: vec![Node::Leaf {
                        symbol: entry.symbol,
                        weight: 0,
                    }],
                    root: 0,
                });
            }
        }

        let mut nodes = Vec::with_capacity(2 * entries.len().max(1) - 1);
        nodes.push(Node::empty_internal());
        let root = 0;
        let mut seen = [false; 256];

        for entry in entries {
            let CodeEntry { symbol, code } = *entry;

            if std::mem::replace(&mut seen[symbol as usize], true) {
                return Err(FormatError::DuplicateSymbol { symbol });
            }

            if code.length > MAX_CODE_LENGTH {
                return Err(FormatError::CodeLengthOutOfRange {
                    symbol,
                    length: code.length,
                });
            }
            if code.length == 0 {
                return Err(FormatError::AmbiguousEmptyCode { symbol });
            }

            let mut crawler_idx = root;
            for bit_idx in (1..code.length).rev() {
                let bit = code.bit(bit_idx);
                crawler_idx = match nodes[crawler_idx].child(bit) {
                    Some(idx) => match nodes[idx] {
                        Node::Leaf { .. } => return Err(FormatError::ConflictingCode { symbol }),
                        Node::Internal { .. } => idx,
                    },
                    None => {
                        let idx = nodes.len();
                        nodes.push(Node::empty_internal());
                        Self::attach(&mut nodes, crawler_idx, bit, idx);
                        idx
                    }
                };
            }

            let bit = code.bit(0);
            if nodes[crawler_idx].child(bit).is_some() {
                return Err(FormatError::ConflictingCode { symbol });
            }
            let leaf_idx = nodes.len();
            nodes.push(Node::Leaf { symbol, weight: 0 });
            Self::attach(&mut nodes, crawler_idx, bit, leaf_idx);
        }

        Ok(HuffmanTree { nodes, root })
    }

    fn attach(nodes: &mut [Node], parent: usize, bit: bool, child: usize) {
        if let Node::Internal { zero, one, .. } = &mut nodes[parent] {
            if bit {
                *one = Some(child);
            } else {
                *zero = Some(child);
            }
        }
    }

    /// Sum of all leaf weights, i.e. the number of symbols the tree was built from.
    pub fn weight(&self) -> u64 {
        self.nodes[self.root].weight()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Symbol of the root when the tree is a single leaf.
    pub fn root_symbol(&self) -> Option<u8> {
        match self.nodes[self.root] {
            Node::Leaf { symbol, .. } => Some(symbol),
            Node::Internal { .. } => None,
        }
    }

    pub fn create_walk_iter(&self) -> WalkIterator {
        WalkIterator {
            idx: self.root,
            symbol: self.root_symbol(),
        }
    }

    /// Follows one branch from `iter`. Stepping into a branch the tree does not have is an error.
    pub fn walk(
        &self,
        iter: WalkIterator,
        bit: bool,
    ) -> std::result::Result<WalkIterator, FormatError> {
        let idx = self.nodes[iter.idx]
            .child(bit)
            .ok_or(FormatError::InvalidCode)?;

        let symbol = match self.nodes[idx] {
            Node::Leaf { symbol, .. } => Some(symbol),
            Node::Internal { .. } => None,
        };

        Ok(WalkIterator { idx, symbol })
    }
}

impl CodeTable {
    /// Derives codes by walking the tree, one-branch before zero-branch.
    ///
    /// A tree that is a single leaf has no path to encode; its symbol gets the
    /// fixed 1-bit code `0` so every symbol costs at least one bit in the payload.
    pub fn from_tree(tree: &HuffmanTree) -> Result<CodeTable> {
        let mut table = CodeTable::default();

        if let Some(symbol) = tree.root_symbol() {
            table.push(CodeEntry {
                symbol,
                code: PrefixCode { code: 0, length: 1 },
            });
        } else {
            Self::build_impl(tree, tree.root, PrefixCode::default(), 0, &mut table)?;
        }

        table.entries.sort_by_key(|entry| entry.symbol);
        Ok(table)
    }

    fn build_impl(
        tree: &HuffmanTree,
        idx: usize,
        code: PrefixCode,
        depth: usize,
        table: &mut CodeTable,
    ) -> Result<()> {
        match tree.nodes[idx] {
            Node::Leaf { symbol, .. } => {
                if depth > MAX_CODE_LENGTH as usize {
                    return Err(Error::CodeTooLong {
                        symbol,
                        length: depth,
                    });
                }
                table.push(CodeEntry { symbol, code });
            }
            Node::Internal { zero, one, .. } => {
                if let Some(one) = one {
                    Self::build_impl(tree, one, PrefixCode::update(code, true), depth + 1, table)?;
                }
                if let Some(zero) = zero {
                    Self::build_impl(tree, zero, PrefixCode::update(code, false), depth + 1, table)?;
                }
            }
        }

        Ok(())
    }

    /// Table in the order its entries were read. No validation happens here;
    /// `HuffmanTree::from_table` rejects inconsistent entries.
    pub fn from_entries(entries: Vec<CodeEntry>) -> CodeTable {
        let mut table = CodeTable {
            entries: Vec::with_capacity(entries.len()),
            lookup: Vec::new(),
        };
        for entry in entries {
            table.push(entry);
        }
        table
    }

    fn push(&mut self, entry: CodeEntry) {
        if self.lookup.is_empty() {
            self.lookup = vec![None; 256];
        }
        self.lookup[entry.symbol as usize] = Some(entry.code);
        self.entries.push(entry);
    }

    pub fn code(&self, symbol: u8) -> Option<&PrefixCode> {
        self.lookup.get(symbol as usize).and_then(Option::as_ref)
    }

    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_length(&self) -> u8 {
        self.entries
            .iter()
            .map(|entry| entry.code.length)
            .max()
            .unwrap_or(0)
    }
}

impl std::fmt::Display for CodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            let glyph = if entry.symbol.is_ascii_graphic() {
                entry.symbol as char
            } else {
                '.'
            };
            writeln!(
                f,
                "{:#04x} {} {:>2} {}",
                entry.symbol, glyph, entry.code.length, entry.code
            )?;
        }
        Ok(())
    }
}
